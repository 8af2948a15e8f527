//! One review session: items are presented one at a time and the learner's
//! answer moves the item's level up or back to zero.

use std::path::Path;
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};

use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::Result;
use crate::item::Step;
use crate::persist::BackgroundWriter;

pub trait Presenter {
    fn set_hint(&mut self, text: &str);
    fn set_text(&mut self, text: &str);
    fn set_info(&mut self, text: &str);
}

/// Plays a file to completion. Failures are the player's business.
pub trait AudioPlayer {
    fn play(&mut self, path: &Path);
}

pub trait KeySource {
    /// Blocks until a key arrives. `None` once input is closed.
    fn next_key(&mut self) -> Option<char>;
}

/// Producer half of a key queue that holds at most one pending key.
#[derive(Debug, Clone)]
pub struct KeySender(SyncSender<char>);

impl KeySender {
    /// Never blocks. The key is dropped if one is already pending.
    pub fn offer(&self, key: char) -> bool {
        match self.0.try_send(key) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

#[derive(Debug)]
pub struct KeyReceiver(Receiver<char>);

impl KeySource for KeyReceiver {
    fn next_key(&mut self) -> Option<char> {
        self.0.recv().ok()
    }
}

pub fn key_queue() -> (KeySender, KeyReceiver) {
    let (sender, receiver) = mpsc::sync_channel(1);
    (KeySender(sender), KeyReceiver(receiver))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    LevelUp,
    LevelReset,
    Repeat,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyMap {
    pub start: char,
    pub level_up: char,
    pub reset: char,
    pub repeat: char,
    pub quit: char,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            start: 'f',
            level_up: 'g',
            reset: 't',
            repeat: ' ',
            quit: 'q',
        }
    }
}

impl KeyMap {
    pub fn bindings(&self) -> [char; 5] {
        [self.start, self.level_up, self.reset, self.repeat, self.quit]
    }

    pub fn response(&self, key: char) -> Option<Response> {
        match key {
            k if k == self.level_up => Some(Response::LevelUp),
            k if k == self.reset => Some(Response::LevelReset),
            k if k == self.repeat => Some(Response::Repeat),
            k if k == self.quit => Some(Response::Quit),
            _ => None,
        }
    }

    fn start_hint(&self) -> String {
        format!("press {} to start", label(self.start))
    }

    fn response_hint(&self) -> String {
        format!(
            "press {} to level up, {} to reset level, {} to repeat",
            label(self.level_up),
            label(self.reset),
            label(self.repeat)
        )
    }
}

fn label(key: char) -> String {
    match key {
        ' ' => "Space".to_string(),
        '\n' => "Enter".to_string(),
        k => k.to_uppercase().to_string(),
    }
}

/// Where the session is. `slot` is a position in the session plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    AwaitingStart,
    /// Running step `step` of the item's prompt.
    Presenting { slot: usize, step: usize },
    Repeating { slot: usize },
    AwaitingResponse { slot: usize },
    LeveledUp { slot: usize },
    LeveledReset { slot: usize },
    Exited,
    Finished,
}

impl State {
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Exited | State::Finished)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub presented: usize,
    pub leveled_up: usize,
    pub reset: usize,
    /// The learner quit before the plan ran out.
    pub quit: bool,
}

pub struct Session<'a, P, A, K> {
    dataset: &'a mut Dataset,
    plan: Vec<usize>,
    keys: KeyMap,
    presenter: P,
    audio: A,
    input: K,
    writer: BackgroundWriter,
    summary: Summary,
}

impl<'a, P: Presenter, A: AudioPlayer, K: KeySource> Session<'a, P, A, K> {
    /// `plan` holds item indices in presentation order. Every level change is
    /// handed to `writer` as a snapshot of the whole dataset.
    pub fn new(
        dataset: &'a mut Dataset,
        plan: Vec<usize>,
        keys: KeyMap,
        presenter: P,
        audio: A,
        input: K,
        writer: BackgroundWriter,
    ) -> Self {
        Self {
            dataset,
            plan,
            keys,
            presenter,
            audio,
            input,
            writer,
            summary: Summary::default(),
        }
    }

    /// Runs until the plan is exhausted or the learner quits, then waits for
    /// all pending saves. A failed save ends the session with that error.
    pub fn run(mut self) -> Result<Summary> {
        let mut state = State::AwaitingStart;
        let outcome = loop {
            match self.advance(state) {
                Ok(next) if next.is_terminal() => break Ok(next),
                Ok(next) => state = next,
                Err(e) => break Err(e),
            }
        };
        let saved = self.writer.finish();
        let end = outcome?;
        saved?;
        self.summary.quit = end == State::Exited;
        info!(
            "session over: {} presented, {} up, {} reset",
            self.summary.presented, self.summary.leveled_up, self.summary.reset
        );
        Ok(self.summary)
    }

    /// Performs the work of `state` and returns the state that follows.
    pub fn advance(&mut self, state: State) -> Result<State> {
        let next = match state {
            State::AwaitingStart => {
                self.presenter.set_hint(&self.keys.start_hint());
                loop {
                    match self.input.next_key() {
                        Some(key) if key == self.keys.start => break,
                        Some(_) => continue,
                        None => return Ok(State::Exited),
                    }
                }
                self.presenter.set_hint("");
                self.enter(0)?
            }
            State::Presenting { slot, step } => {
                let item = self.dataset.item(self.plan[slot]);
                match item.prompt().get(step) {
                    None => State::AwaitingResponse { slot },
                    Some(Step::Play) => {
                        self.play(slot);
                        State::Presenting {
                            slot,
                            step: step + 1,
                        }
                    }
                    Some(Step::Reveal) => {
                        let text = self.dataset.text_of(item).unwrap_or_default().to_string();
                        self.presenter.set_text(&text);
                        State::Presenting {
                            slot,
                            step: step + 1,
                        }
                    }
                    Some(Step::Acknowledge(hint)) => {
                        self.presenter.set_hint(hint);
                        if self.input.next_key().is_none() {
                            return Ok(State::Exited);
                        }
                        self.presenter.set_hint("");
                        State::Presenting {
                            slot,
                            step: step + 1,
                        }
                    }
                }
            }
            State::Repeating { slot } => {
                self.play(slot);
                State::AwaitingResponse { slot }
            }
            State::AwaitingResponse { slot } => {
                self.presenter.set_hint(&self.keys.response_hint());
                match self.input.next_key().map(|k| self.keys.response(k)) {
                    None | Some(Some(Response::Quit)) => {
                        self.presenter.set_text("");
                        self.presenter.set_hint("exit...");
                        State::Exited
                    }
                    Some(Some(Response::LevelUp)) => State::LeveledUp { slot },
                    Some(Some(Response::LevelReset)) => State::LeveledReset { slot },
                    Some(Some(Response::Repeat)) => State::Repeating { slot },
                    Some(None) => State::AwaitingResponse { slot },
                }
            }
            State::LeveledUp { slot } => {
                let entry = self.dataset.level_up(self.plan[slot], Utc::now());
                debug!("item {} up to level {}", self.plan[slot], entry.level);
                self.summary.leveled_up += 1;
                self.writer.submit(self.dataset.clone())?;
                self.enter(slot + 1)?
            }
            State::LeveledReset { slot } => {
                self.dataset.reset(self.plan[slot], Utc::now());
                debug!("item {} reset", self.plan[slot]);
                self.summary.reset += 1;
                self.writer.submit(self.dataset.clone())?;
                self.enter(slot + 1)?
            }
            State::Exited | State::Finished => state,
        };
        Ok(next)
    }

    /// Prepares the screen for the item at `slot`, if any.
    fn enter(&mut self, slot: usize) -> Result<State> {
        self.writer.settle()?;
        let Some(&index) = self.plan.get(slot) else {
            return Ok(State::Finished);
        };
        let item = self.dataset.item(index);
        let info = format!(
            "level {} lesson {}",
            item.history.current_level(),
            item.lesson()
        );
        self.presenter.set_hint("");
        self.presenter.set_text("");
        self.presenter.set_info(&info);
        self.summary.presented += 1;
        Ok(State::Presenting { slot, step: 0 })
    }

    fn play(&mut self, slot: usize) {
        let item = self.dataset.item(self.plan[slot]);
        let audio = self.dataset.audio_of(item).to_path_buf();
        self.presenter.set_hint("playing...");
        self.audio.play(&audio);
        self.presenter.set_hint("");
    }
}
