//! Adding audio files to the dataset and filling in missing word texts.
//!
//! Every batch is checked before anything is inserted, so a rejected file
//! leaves the dataset as it was.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info};
use snafu::ResultExt;

use crate::dataset::Dataset;
use crate::error::{DrillError, IoSnafu, Result};
use crate::item::{ItemKind, Variant, lesson_of};
use crate::session::AudioPlayer;

/// Outcome of one attempted insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Added {
    pub variant: Variant,
    pub audio: PathBuf,
    /// `false` when an item with the same signature already existed.
    pub added: bool,
}

/// `path` relative to `files_root` when it lies inside it, unchanged otherwise.
pub fn relative_to(files_root: &Path, path: &Path) -> PathBuf {
    let absolute = |p: &Path| std::path::absolute(p).unwrap_or_else(|_| p.to_path_buf());
    let root = absolute(files_root);
    match absolute(path).strip_prefix(&root) {
        Ok(relative) => relative.to_path_buf(),
        Err(_) => path.to_path_buf(),
    }
}

/// The part of the file stem after its first space, e.g. `03 good morning.mp3`
/// gives `good morning`.
pub fn text_from_file_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let (_, text) = stem.split_once(' ')?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn checked(files_root: &Path, path: &Path) -> Result<PathBuf> {
    let relative = relative_to(files_root, path);
    if lesson_of(&relative).is_none() {
        return Err(DrillError::MissingLesson { path: relative });
    }
    Ok(relative)
}

fn insert(
    dataset: &mut Dataset,
    kind: ItemKind,
    audio: &Path,
    now: DateTime<Utc>,
) -> Result<Added> {
    let added = Added {
        variant: kind.variant(),
        audio: audio.to_path_buf(),
        added: dataset.add(kind, now)?,
    };
    let verb = if added.added { "added" } else { "skip" };
    info!("{verb} {} {}", added.variant, added.audio.display());
    Ok(added)
}

fn add_word_items(
    dataset: &mut Dataset,
    audio: &Path,
    text: &str,
    now: DateTime<Utc>,
) -> Result<Vec<Added>> {
    let word = dataset.word_index(audio, text);
    if dataset.words()[word].text.trim().is_empty() && !text.is_empty() {
        dataset.set_text(word, text);
    }
    let mut report = Vec::with_capacity(2);
    for kind in [ItemKind::AudioToWord { word }, ItemKind::WordToAudio { word }] {
        report.push(insert(dataset, kind, audio, now)?);
    }
    Ok(report)
}

/// Adds both word items for every file, with the text left blank for
/// [`complete`].
pub fn add_words(
    dataset: &mut Dataset,
    files_root: &Path,
    files: &[PathBuf],
    now: DateTime<Utc>,
) -> Result<Vec<Added>> {
    let audio = files
        .iter()
        .map(|f| checked(files_root, f))
        .collect::<Result<Vec<_>>>()?;
    let mut report = Vec::new();
    for path in audio {
        report.extend(add_word_items(dataset, &path, "", now)?);
    }
    Ok(report)
}

/// Adds both word items for every file with an accepted extension, taking the
/// text from the file name. Other files are ignored.
pub fn add_words_with_text(
    dataset: &mut Dataset,
    files_root: &Path,
    files: &[PathBuf],
    extensions: &[String],
    now: DateTime<Utc>,
) -> Result<Vec<Added>> {
    let accepted = |path: &Path| {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
    };
    let mut words = Vec::new();
    for file in files {
        if !accepted(file) {
            debug!("ignoring {}", file.display());
            continue;
        }
        let path = checked(files_root, file)?;
        let text = text_from_file_name(&path)
            .ok_or_else(|| DrillError::MissingText { path: path.clone() })?;
        words.push((path, text));
    }
    let mut report = Vec::new();
    for (path, text) in words {
        report.extend(add_word_items(dataset, &path, &text, now)?);
    }
    Ok(report)
}

fn add_audio_items(
    dataset: &mut Dataset,
    files_root: &Path,
    files: &[PathBuf],
    now: DateTime<Utc>,
    kind: fn(PathBuf) -> ItemKind,
) -> Result<Vec<Added>> {
    let audio = files
        .iter()
        .map(|f| checked(files_root, f))
        .collect::<Result<Vec<_>>>()?;
    let mut report = Vec::with_capacity(audio.len());
    for path in audio {
        report.push(insert(dataset, kind(path.clone()), &path, now)?);
    }
    Ok(report)
}

pub fn add_sentences(
    dataset: &mut Dataset,
    files_root: &Path,
    files: &[PathBuf],
    now: DateTime<Utc>,
) -> Result<Vec<Added>> {
    add_audio_items(dataset, files_root, files, now, sentence)
}

pub fn add_dialogs(
    dataset: &mut Dataset,
    files_root: &Path,
    files: &[PathBuf],
    now: DateTime<Utc>,
) -> Result<Vec<Added>> {
    add_audio_items(dataset, files_root, files, now, dialog)
}

fn sentence(audio: PathBuf) -> ItemKind {
    ItemKind::Sentence { audio }
}

fn dialog(audio: PathBuf) -> ItemKind {
    ItemKind::Dialog { audio }
}

/// Plays every word that has no text yet and reads its text from `input`, one
/// line per word. `save` runs after each stored text. Blank lines leave the
/// word for a later pass; end of input stops early.
///
/// Returns the number of words completed.
pub fn complete<A, R, W, S>(
    dataset: &mut Dataset,
    audio: &mut A,
    mut input: R,
    mut output: W,
    mut save: S,
) -> Result<usize>
where
    A: AudioPlayer,
    R: BufRead,
    W: Write,
    S: FnMut(&Dataset) -> Result<()>,
{
    let console = Path::new("<console>");
    let blank = dataset.blank_words();
    info!("{} words without text", blank.len());
    let mut completed = 0;
    for word in blank {
        let path = dataset.words()[word].audio_file.clone();
        writeln!(output, "{}", path.display()).context(IoSnafu { path: console })?;
        output.flush().context(IoSnafu { path: console })?;
        audio.play(&path);

        let mut line = String::new();
        if input.read_line(&mut line).context(IoSnafu { path: console })? == 0 {
            break;
        }
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        dataset.set_text(word, text);
        save(dataset)?;
        completed += 1;
    }
    Ok(completed)
}
