mod audio;
mod config;
mod dataset;
mod due;
mod error;
mod history;
mod ingest;
mod item;
mod persist;
mod priority;
mod selection;
mod session;
mod stats;
mod terminal;
#[cfg(test)]
mod test_helpers;

pub use audio::CommandPlayer;
pub use config::Config;
pub use dataset::Dataset;
pub use due::{DEFAULT_BASE, DEFAULT_SLACK, DueModel, MAX_LEVEL};
pub use error::{DrillError, Result};
pub use history::{History, HistoryEntry, ReviewReport};
pub use ingest::{
    Added, add_dialogs, add_sentences, add_words, add_words_with_text, complete,
    text_from_file_name,
};
pub use item::{ItemKind, PracticeItem, Step, Variant, Weights, Word, lesson_of};
pub use persist::{BackgroundWriter, JsonStore, Store};
pub use priority::{Candidate, compare, sort as sort_candidates};
pub use selection::{Budget, Selection, candidates, plan_session, select};
pub use session::{
    AudioPlayer, KeyMap, KeyReceiver, KeySender, KeySource, Presenter, Response, Session,
    State, Summary, key_queue,
};
pub use stats::{Stats, VariantCounts};
pub use terminal::{Terminal, spawn_key_reader};

