use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, warn};

use crate::session::AudioPlayer;

/// Plays files by running an external player, e.g. `mpg123 -q <file>`, and
/// waiting for it to exit.
#[derive(Debug, Clone)]
pub struct CommandPlayer {
    program: Vec<String>,
    files_root: PathBuf,
}

impl CommandPlayer {
    /// `program` is the command and its leading arguments; relative audio paths
    /// are resolved against `files_root`.
    pub fn new(program: Vec<String>, files_root: impl Into<PathBuf>) -> Self {
        Self {
            program,
            files_root: files_root.into(),
        }
    }

    pub fn command(&self, path: &Path) -> Option<Command> {
        let (program, args) = self.program.split_first()?;
        let mut command = Command::new(program);
        command
            .args(args)
            .arg(self.files_root.join(path))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        Some(command)
    }
}

impl AudioPlayer for CommandPlayer {
    fn play(&mut self, path: &Path) {
        let Some(mut command) = self.command(path) else {
            warn!("no player configured");
            return;
        };
        debug!("playing {}", path.display());
        match command.status() {
            Ok(status) if status.success() => {}
            Ok(status) => warn!("player exited with {status} for {}", path.display()),
            Err(e) => warn!("cannot run player for {}: {e}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_appends_resolved_path() {
        let player = CommandPlayer::new(vec!["mpg123".into(), "-q".into()], "/data/files");
        let command = player.command(Path::new("l1/a.mp3")).unwrap();
        assert_eq!(command.get_program(), "mpg123");
        let args = command.get_args().collect::<Vec<_>>();
        assert_eq!(args, vec!["-q", "/data/files/l1/a.mp3"]);
    }

    #[test]
    fn failures_are_swallowed() {
        let mut player = CommandPlayer::new(vec!["/nonexistent/player".into()], "/data");
        player.play(Path::new("l1/a.mp3"));
        let mut silent = CommandPlayer::new(vec![], "/data");
        assert!(silent.command(Path::new("a.mp3")).is_none());
        silent.play(Path::new("a.mp3"));
    }
}
