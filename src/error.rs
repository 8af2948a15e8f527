use std::path::PathBuf;

use snafu::Snafu;

#[derive(Snafu, Debug)]
#[snafu(visibility(pub(crate)))]
pub enum DrillError {
    #[snafu(display("cannot access {}: {source}", path.display()))]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("malformed store {}: {source}", path.display()))]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[snafu(display("malformed config {}: {source}", path.display()))]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[snafu(display("cannot replace {}: {source}", path.display()))]
    Persist {
        path: PathBuf,
        source: tempfile::PersistError,
    },
    #[snafu(display("item refers to word #{index}, which does not exist"))]
    DanglingWord { index: usize },
    #[snafu(display("no lesson number in {}", path.display()))]
    MissingLesson { path: PathBuf },
    #[snafu(display("no text in file name {}", path.display()))]
    MissingText { path: PathBuf },
    #[snafu(display("practice item has an empty history"))]
    EmptyHistory,
    #[snafu(display("invalid config: {reason}"))]
    InvalidConfig { reason: String },
    #[snafu(display("terminal failure: {source}"))]
    Terminal { source: std::io::Error },
    #[snafu(display("background writer stopped unexpectedly"))]
    WriterGone,
}

pub type Result<T, E = DrillError> = std::result::Result<T, E>;
