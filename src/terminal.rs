//! Full-screen terminal front-end: three centered lines (info, text, hint) on
//! the alternate screen, with keys read on a separate thread.

use std::io::{self, Stdout, Write};
use std::thread::{self, JoinHandle};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    self, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use crossterm::{cursor, execute, queue, style};
use log::{debug, error};
use snafu::ResultExt;

use crate::error::{Result, TerminalSnafu};
use crate::session::{KeySender, Presenter};

pub struct Terminal {
    out: Stdout,
    info: String,
    text: String,
    hint: String,
}

impl Terminal {
    /// Switches to raw mode on the alternate screen until dropped.
    pub fn enter() -> Result<Self> {
        enable_raw_mode().context(TerminalSnafu)?;
        let mut out = io::stdout();
        execute!(out, EnterAlternateScreen, cursor::Hide).context(TerminalSnafu)?;
        let mut terminal = Self {
            out,
            info: String::new(),
            text: String::new(),
            hint: String::new(),
        };
        terminal.redraw()?;
        Ok(terminal)
    }

    fn redraw(&mut self) -> Result<()> {
        let (width, height) = terminal::size().context(TerminalSnafu)?;
        let middle = height / 2;
        queue!(self.out, terminal::Clear(terminal::ClearType::All)).context(TerminalSnafu)?;
        let lines = [
            (1, &self.info),
            (middle, &self.text),
            (height.saturating_sub(2), &self.hint),
        ];
        for (row, line) in lines {
            queue!(
                self.out,
                cursor::MoveTo(centered(width, line), row),
                style::Print(line)
            )
            .context(TerminalSnafu)?;
        }
        self.out.flush().context(TerminalSnafu)
    }

    fn show(&mut self) {
        if let Err(e) = self.redraw() {
            error!("redraw failed: {e}");
        }
    }
}

fn centered(width: u16, line: &str) -> u16 {
    let len = u16::try_from(line.chars().count()).unwrap_or(u16::MAX);
    width.saturating_sub(len) / 2
}

impl Presenter for Terminal {
    fn set_hint(&mut self, text: &str) {
        self.hint = text.to_string();
        self.show();
    }

    fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.show();
    }

    fn set_info(&mut self, text: &str) {
        self.info = text.to_string();
        self.show();
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = execute!(self.out, cursor::Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

/// Maps a key press to the character the session sees. Ctrl-C and Esc become
/// `quit`.
pub fn key_char(key: KeyEvent, quit: char) -> Option<char> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(quit),
        KeyCode::Esc => Some(quit),
        KeyCode::Char(c) => Some(c.to_ascii_lowercase()),
        KeyCode::Enter => Some('\n'),
        _ => None,
    }
}

/// Forwards key presses to `keys` until the terminal stops producing events.
pub fn spawn_key_reader(keys: KeySender, quit: char) -> JoinHandle<()> {
    thread::spawn(move || {
        loop {
            match event::read() {
                Ok(Event::Key(key)) => match key_char(key, quit) {
                    Some(c) if !keys.offer(c) => debug!("dropped key {c:?}"),
                    _ => {}
                },
                Ok(_) => {}
                Err(e) => {
                    error!("reading keys failed: {e}");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn keys_map_to_session_chars() {
        let none = KeyModifiers::NONE;
        assert_eq!(key_char(press(KeyCode::Char('g'), none), 'q'), Some('g'));
        assert_eq!(
            key_char(press(KeyCode::Char('G'), KeyModifiers::SHIFT), 'q'),
            Some('g')
        );
        assert_eq!(key_char(press(KeyCode::Char(' '), none), 'q'), Some(' '));
        assert_eq!(
            key_char(press(KeyCode::Char('c'), KeyModifiers::CONTROL), 'x'),
            Some('x')
        );
        assert_eq!(key_char(press(KeyCode::Esc, none), 'q'), Some('q'));
        assert_eq!(key_char(press(KeyCode::Left, none), 'q'), None);

        let mut release = press(KeyCode::Char('g'), none);
        release.kind = KeyEventKind::Release;
        assert_eq!(key_char(release, 'q'), None);
    }

    #[test]
    fn lines_are_centered() {
        assert_eq!(centered(20, "abcd"), 8);
        assert_eq!(centered(3, "abcdef"), 0);
    }
}
