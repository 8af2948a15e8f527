use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::history::History;

static LESSON_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[0-9]+").expect("lesson pattern compiles"));

/// The first run of digits in an audio path, e.g. `lesson12/03 hello.mp3` is lesson 12.
/// The extension is not looked at, so `intro/hello.mp3` has no lesson.
pub fn lesson_of(path: &Path) -> Option<u32> {
    LESSON_PATTERN
        .find(&path.with_extension("").to_string_lossy())
        .and_then(|m| m.as_str().parse().ok())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    /// Relative to the files directory. Identifies the word.
    pub audio_file: PathBuf,
    /// Empty until filled in by ingest or the completion pass.
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, Display)]
pub enum Variant {
    AudioToWord,
    WordToAudio,
    Sentence,
    Dialog,
}

impl Variant {
    /// Rank among new items of the same lesson: recognition before production.
    pub fn practice_order(self) -> u8 {
        match self {
            Variant::AudioToWord => 1,
            Variant::Sentence => 2,
            Variant::WordToAudio => 3,
            Variant::Dialog => 4,
        }
    }

    /// What happens before the level decision is asked for.
    pub fn prompt(self) -> &'static [Step] {
        match self {
            Variant::AudioToWord => &[
                Step::Play,
                Step::Acknowledge("press any key to show answer"),
                Step::Reveal,
            ],
            Variant::WordToAudio => &[
                Step::Reveal,
                Step::Acknowledge("press any key to play audio"),
                Step::Play,
            ],
            Variant::Sentence | Variant::Dialog => &[Step::Play],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Play,
    Reveal,
    /// Wait for any key, showing the given hint.
    Acknowledge(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemKind {
    AudioToWord { word: usize },
    WordToAudio { word: usize },
    Sentence { audio: PathBuf },
    Dialog { audio: PathBuf },
}

impl ItemKind {
    pub fn variant(&self) -> Variant {
        match self {
            ItemKind::AudioToWord { .. } => Variant::AudioToWord,
            ItemKind::WordToAudio { .. } => Variant::WordToAudio,
            ItemKind::Sentence { .. } => Variant::Sentence,
            ItemKind::Dialog { .. } => Variant::Dialog,
        }
    }

    /// Deduplication key; re-adding an item with the same signature is a no-op.
    pub fn signature(&self) -> String {
        match self {
            ItemKind::AudioToWord { word } => format!("atw-{word}"),
            ItemKind::WordToAudio { word } => format!("wta-{word}"),
            ItemKind::Sentence { audio } => format!("sen-{}", audio.display()),
            ItemKind::Dialog { audio } => format!("dia-{}", audio.display()),
        }
    }

    pub fn word(&self) -> Option<usize> {
        match self {
            ItemKind::AudioToWord { word } | ItemKind::WordToAudio { word } => Some(*word),
            ItemKind::Sentence { .. } | ItemKind::Dialog { .. } => None,
        }
    }
}

/// Budget cost per item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub item: u32,
    /// First exposure of a word→audio item follows its audio→word sibling and is cheap.
    pub new_word_to_audio: u32,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            item: 10,
            new_word_to_audio: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeItem {
    #[serde(flatten)]
    pub kind: ItemKind,
    pub history: History,
    /// Resolved from the audio path by `Dataset::init` or on insertion.
    #[serde(skip)]
    pub(crate) lesson: u32,
}

impl PracticeItem {
    pub(crate) fn new(kind: ItemKind, history: History, lesson: u32) -> Self {
        Self {
            kind,
            history,
            lesson,
        }
    }

    pub fn variant(&self) -> Variant {
        self.kind.variant()
    }

    pub fn signature(&self) -> String {
        self.kind.signature()
    }

    pub fn lesson(&self) -> u32 {
        self.lesson
    }

    pub fn practice_order(&self) -> u8 {
        self.variant().practice_order()
    }

    pub fn weight(&self, weights: &Weights) -> u32 {
        match self.variant() {
            Variant::WordToAudio if self.history.is_new() => weights.new_word_to_audio,
            _ => weights.item,
        }
    }

    pub fn prompt(&self) -> &'static [Step] {
        self.variant().prompt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::at;
    use strum::IntoEnumIterator;

    #[test]
    fn lesson_is_first_number_in_path() {
        assert_eq!(lesson_of(Path::new("/lesson12/03 hello.mp3")), Some(12));
        assert_eq!(lesson_of(Path::new("7-dialog.aac")), Some(7));
        assert_eq!(lesson_of(Path::new("intro/hello.mp3")), None);
        assert_eq!(lesson_of(Path::new("intro/hello.m4a")), None);
        assert_eq!(lesson_of(Path::new("lesson9/a.mp3")), Some(9));
    }

    #[test]
    fn practice_order_is_recognition_first() {
        let ordered = Variant::iter()
            .map(|v| (v.practice_order(), v))
            .collect::<std::collections::BTreeMap<_, _>>();
        assert_eq!(
            ordered.into_values().collect::<Vec<_>>(),
            vec![
                Variant::AudioToWord,
                Variant::Sentence,
                Variant::WordToAudio,
                Variant::Dialog
            ]
        );
    }

    #[test]
    fn signatures_depend_on_variant_and_payload() {
        let atw = ItemKind::AudioToWord { word: 3 };
        let wta = ItemKind::WordToAudio { word: 3 };
        let sen = ItemKind::Sentence {
            audio: "l1/a.mp3".into(),
        };
        let dia = ItemKind::Dialog {
            audio: "l1/a.mp3".into(),
        };
        assert_eq!(atw.signature(), "atw-3");
        assert_eq!(wta.signature(), "wta-3");
        assert_eq!(sen.signature(), "sen-l1/a.mp3");
        assert_eq!(dia.signature(), "dia-l1/a.mp3");
    }

    #[test]
    fn new_word_to_audio_is_cheaper() {
        let weights = Weights::default();
        let mut item = PracticeItem::new(ItemKind::WordToAudio { word: 0 }, History::new(at(0)), 1);
        assert_eq!(item.weight(&weights), 5);
        item.history.level_up(at(1));
        assert_eq!(item.weight(&weights), 10);

        let sentence = PracticeItem::new(
            ItemKind::Sentence {
                audio: "1.mp3".into(),
            },
            History::new(at(0)),
            1,
        );
        assert_eq!(sentence.weight(&weights), 10);
    }

    #[test]
    fn sentence_and_dialog_share_protocol() {
        assert_eq!(Variant::Sentence.prompt(), Variant::Dialog.prompt());
        assert_eq!(Variant::AudioToWord.prompt()[0], Step::Play);
        assert_eq!(Variant::WordToAudio.prompt()[0], Step::Reveal);
    }

    #[test]
    fn stored_form_is_tagged() {
        let item = PracticeItem::new(ItemKind::AudioToWord { word: 2 }, History::new(at(0)), 4);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["kind"], "audio_to_word");
        assert_eq!(json["word"], 2);
        assert!(json.get("lesson").is_none());
    }
}
