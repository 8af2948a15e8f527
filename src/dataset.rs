use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{DrillError, Result};
use crate::history::{History, HistoryEntry};
use crate::item::{ItemKind, PracticeItem, Word, lesson_of};

/// All words and practice items of one learner.
///
/// Items refer to words by index into `words`; words are never removed, so the
/// indices stay valid for the lifetime of the store. After loading, call
/// [`Dataset::init`] before using the dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    words: Vec<Word>,
    items: Vec<PracticeItem>,
    #[serde(skip)]
    signatures: HashSet<String>,
    #[serde(skip)]
    word_lookup: HashMap<PathBuf, usize>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the lookup tables and resolves every item's lesson.
    pub fn init(&mut self) -> Result<()> {
        self.word_lookup = self
            .words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.audio_file.clone(), i))
            .collect();
        self.signatures = self.items.iter().map(PracticeItem::signature).collect();
        for i in 0..self.items.len() {
            let lesson = self.resolve_lesson(&self.items[i].kind)?;
            self.items[i].lesson = lesson;
        }
        debug!(
            "dataset ready: {} items, {} words",
            self.items.len(),
            self.words.len()
        );
        Ok(())
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn items(&self) -> &[PracticeItem] {
        &self.items
    }

    pub fn item(&self, index: usize) -> &PracticeItem {
        &self.items[index]
    }

    /// Index of the word recorded for `audio_file`, inserting it when unknown.
    /// An existing word keeps its text.
    pub fn word_index(&mut self, audio_file: &Path, text: &str) -> usize {
        if let Some(&index) = self.word_lookup.get(audio_file) {
            return index;
        }
        self.words.push(Word {
            audio_file: audio_file.to_path_buf(),
            text: text.to_string(),
        });
        let index = self.words.len() - 1;
        self.word_lookup.insert(audio_file.to_path_buf(), index);
        index
    }

    pub fn set_text(&mut self, word: usize, text: &str) {
        self.words[word].text = text.to_string();
    }

    /// Words still waiting for their text.
    pub fn blank_words(&self) -> Vec<usize> {
        self.words
            .iter()
            .enumerate()
            .filter(|(_, w)| w.text.trim().is_empty())
            .map(|(i, _)| i)
            .collect()
    }

    /// Adds a new item seeded with a level 0 history entry. Returns `false` and
    /// leaves the dataset untouched if an item with the same signature exists.
    pub fn add(&mut self, kind: ItemKind, now: DateTime<Utc>) -> Result<bool> {
        let signature = kind.signature();
        if self.signatures.contains(&signature) {
            return Ok(false);
        }
        let lesson = self.resolve_lesson(&kind)?;
        self.items.push(PracticeItem::new(kind, History::new(now), lesson));
        self.signatures.insert(signature);
        Ok(true)
    }

    pub fn level_up(&mut self, index: usize, now: DateTime<Utc>) -> HistoryEntry {
        self.items[index].history.level_up(now)
    }

    pub fn reset(&mut self, index: usize, now: DateTime<Utc>) -> HistoryEntry {
        self.items[index].history.reset(now)
    }

    pub fn audio_of<'a>(&'a self, item: &'a PracticeItem) -> &'a Path {
        match &item.kind {
            ItemKind::AudioToWord { word } | ItemKind::WordToAudio { word } => {
                &self.words[*word].audio_file
            }
            ItemKind::Sentence { audio } | ItemKind::Dialog { audio } => audio,
        }
    }

    pub fn text_of(&self, item: &PracticeItem) -> Option<&str> {
        item.kind.word().map(|w| self.words[w].text.as_str())
    }

    fn resolve_lesson(&self, kind: &ItemKind) -> Result<u32> {
        let audio = match kind {
            ItemKind::AudioToWord { word } | ItemKind::WordToAudio { word } => {
                &self
                    .words
                    .get(*word)
                    .ok_or(DrillError::DanglingWord { index: *word })?
                    .audio_file
            }
            ItemKind::Sentence { audio } | ItemKind::Dialog { audio } => audio,
        };
        lesson_of(audio).ok_or_else(|| DrillError::MissingLesson {
            path: audio.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::at;

    #[test]
    fn adding_twice_keeps_one_item() -> Result<()> {
        let mut dataset = Dataset::new();
        let word = dataset.word_index(Path::new("l3/01 cat.mp3"), "cat");
        assert!(dataset.add(ItemKind::AudioToWord { word }, at(0))?);
        assert!(!dataset.add(ItemKind::AudioToWord { word }, at(5))?);
        assert_eq!(dataset.items().len(), 1);
        assert_eq!(dataset.item(0).history.len(), 1);
        assert_eq!(dataset.item(0).history.last_review(), at(0));
        assert_eq!(dataset.item(0).lesson(), 3);
        Ok(())
    }

    #[test]
    fn words_are_identified_by_audio() {
        let mut dataset = Dataset::new();
        let first = dataset.word_index(Path::new("l1/a.mp3"), "a");
        let again = dataset.word_index(Path::new("l1/a.mp3"), "other");
        let second = dataset.word_index(Path::new("l1/b.mp3"), "");
        assert_eq!(first, again);
        assert_ne!(first, second);
        assert_eq!(dataset.words()[first].text, "a");
        assert_eq!(dataset.blank_words(), vec![second]);
    }

    #[test]
    fn add_requires_lesson_and_word() {
        let mut dataset = Dataset::new();
        let err = dataset
            .add(
                ItemKind::Sentence {
                    audio: "intro.mp3".into(),
                },
                at(0),
            )
            .unwrap_err();
        assert!(matches!(err, DrillError::MissingLesson { .. }));

        let err = dataset
            .add(ItemKind::WordToAudio { word: 9 }, at(0))
            .unwrap_err();
        assert!(matches!(err, DrillError::DanglingWord { index: 9 }));
        assert!(dataset.items().is_empty());
    }

    #[test]
    fn init_restores_lookups_after_reload() -> Result<()> {
        let mut dataset = Dataset::new();
        let word = dataset.word_index(Path::new("l4/02 dog.mp3"), "dog");
        dataset.add(ItemKind::WordToAudio { word }, at(0))?;
        dataset.add(
            ItemKind::Dialog {
                audio: "l5/talk.mp3".into(),
            },
            at(0),
        )?;

        let json = serde_json::to_string(&dataset).unwrap();
        let mut reloaded: Dataset = serde_json::from_str(&json).unwrap();
        reloaded.init()?;

        assert_eq!(reloaded.item(0).lesson(), 4);
        assert_eq!(reloaded.item(1).lesson(), 5);
        assert_eq!(reloaded.text_of(reloaded.item(0)), Some("dog"));
        assert_eq!(reloaded.audio_of(reloaded.item(1)), Path::new("l5/talk.mp3"));
        assert!(!reloaded.add(ItemKind::WordToAudio { word }, at(1))?);
        assert_eq!(reloaded.word_index(Path::new("l4/02 dog.mp3"), ""), word);
        Ok(())
    }

    #[test]
    fn init_rejects_dangling_word() {
        let json = r#"{"words":[],"items":[{"kind":"audio_to_word","word":0,"history":[{"level":0,"time":"2024-01-01T00:00:00Z"}]}]}"#;
        let mut dataset: Dataset = serde_json::from_str(json).unwrap();
        assert!(matches!(
            dataset.init(),
            Err(DrillError::DanglingWord { index: 0 })
        ));
    }

    #[test]
    fn responses_append_history() -> Result<()> {
        let mut dataset = Dataset::new();
        dataset.add(
            ItemKind::Sentence {
                audio: "l2/s.mp3".into(),
            },
            at(0),
        )?;
        dataset.level_up(0, at(1));
        dataset.level_up(0, at(2));
        assert_eq!(dataset.item(0).history.current_level(), 2);
        dataset.reset(0, at(3));
        assert_eq!(dataset.item(0).history.current_level(), 0);
        assert_eq!(dataset.item(0).history.len(), 4);
        Ok(())
    }
}
