use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::thread;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::dataset::Dataset;
use crate::error::{DrillError, Result};
use crate::item::ItemKind;
use crate::persist::Store;
use crate::session::{AudioPlayer, KeySource, Presenter};

/// 2024-01-01T00:00Z plus `hours`.
pub fn at(hours: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hours)
}

/// Three words over two lessons, each with both word items, followed by a
/// lesson 1 sentence and a lesson 2 dialog. All created at `at(0)`.
///
/// Item 0 is the audio→word item of "one".
pub fn lesson_dataset() -> Result<Dataset> {
    let mut dataset = Dataset::new();
    for (audio, text) in [
        ("l1/01 one.mp3", "one"),
        ("l1/02 two.mp3", "two"),
        ("l2/01 three.mp3", "three"),
    ] {
        let word = dataset.word_index(Path::new(audio), text);
        dataset.add(ItemKind::AudioToWord { word }, at(0))?;
        dataset.add(ItemKind::WordToAudio { word }, at(0))?;
    }
    dataset.add(
        ItemKind::Sentence {
            audio: "l1/s1.mp3".into(),
        },
        at(0),
    )?;
    dataset.add(
        ItemKind::Dialog {
            audio: "l2/d1.mp3".into(),
        },
        at(0),
    )?;
    Ok(dataset)
}

/// Keeps every saved snapshot in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saved: Arc<Mutex<Vec<Dataset>>>,
    fail: bool,
    delay: std::time::Duration,
}

impl MemoryStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// Every save sleeps for `delay`, then fails.
    pub fn failing_after(delay: std::time::Duration) -> Self {
        Self {
            fail: true,
            delay,
            ..Default::default()
        }
    }

    pub fn saved(&self) -> Vec<Dataset> {
        self.saved.lock().unwrap().clone()
    }
}

impl Store for MemoryStore {
    fn load(&self) -> Result<Dataset> {
        Ok(self.saved().pop().unwrap_or_default())
    }

    fn save(&self, dataset: &Dataset) -> Result<()> {
        thread::sleep(self.delay);
        if self.fail {
            return Err(DrillError::Io {
                path: PathBuf::from("memory"),
                source: io::Error::other("disk full"),
            });
        }
        self.saved.lock().unwrap().push(dataset.clone());
        Ok(())
    }
}

/// Hands out a fixed sequence of keys, then reports closed input.
pub struct ScriptedKeys(VecDeque<char>);

impl ScriptedKeys {
    pub fn new(keys: &str) -> Self {
        Self(keys.chars().collect())
    }
}

impl KeySource for ScriptedKeys {
    fn next_key(&mut self) -> Option<char> {
        self.0.pop_front()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shown {
    Hint(String),
    Text(String),
    Info(String),
    Play(PathBuf),
}

/// Records screen updates and playback in one shared log.
#[derive(Debug, Clone, Default)]
pub struct Recorder(Rc<RefCell<Vec<Shown>>>);

impl Recorder {
    pub fn shown(&self) -> Vec<Shown> {
        self.0.borrow().clone()
    }

    pub fn plays(&self) -> Vec<PathBuf> {
        self.0
            .borrow()
            .iter()
            .filter_map(|s| match s {
                Shown::Play(path) => Some(path.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Presenter for Recorder {
    fn set_hint(&mut self, text: &str) {
        self.0.borrow_mut().push(Shown::Hint(text.to_string()));
    }

    fn set_text(&mut self, text: &str) {
        self.0.borrow_mut().push(Shown::Text(text.to_string()));
    }

    fn set_info(&mut self, text: &str) {
        self.0.borrow_mut().push(Shown::Info(text.to_string()));
    }
}

impl AudioPlayer for Recorder {
    fn play(&mut self, path: &Path) {
        self.0.borrow_mut().push(Shown::Play(path.to_path_buf()));
    }
}
