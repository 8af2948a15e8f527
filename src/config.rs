use std::fs;
use std::path::Path;

use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::due::{DEFAULT_BASE, DEFAULT_SLACK, DueModel};
use crate::error::{ConfigSnafu, DrillError, IoSnafu, Result};
use crate::item::Weights;
use crate::selection::Budget;
use crate::session::KeyMap;

/// Tunable knobs, read from `config.toml` in the data directory. Every field is
/// optional there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Growth factor between consecutive level intervals.
    pub base: f64,
    /// Grace multiplier applied to the interval before an item counts as late.
    pub slack: f64,
    pub budget: Budget,
    pub weights: Weights,
    pub keys: KeyMap,
    /// Player command; the audio path is appended as the last argument.
    pub player: Vec<String>,
    /// Extensions accepted by `add-words-with-text`.
    pub audio_extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE,
            slack: DEFAULT_SLACK,
            budget: Budget::default(),
            weights: Weights::default(),
            keys: KeyMap::default(),
            player: vec!["mpg123".into(), "-q".into()],
            audio_extensions: vec!["mp3".into(), "aac".into()],
        }
    }
}

impl Config {
    /// Defaults when `path` does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).context(IoSnafu { path })?;
        let config: Self = toml::from_str(&text).context(ConfigSnafu { path })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| -> Result<()> {
            Err(DrillError::InvalidConfig {
                reason: reason.to_string(),
            })
        };
        if !(self.base > 1.0 && self.base.is_finite()) {
            return invalid("base must be a finite number above 1");
        }
        if !(self.slack >= 1.0 && self.slack.is_finite()) {
            return invalid("slack must be a finite number of at least 1");
        }
        let Budget {
            max_total_weight,
            max_review_weight,
            max_new_weight,
        } = self.budget;
        if max_total_weight == 0 || max_review_weight == 0 || max_new_weight == 0 {
            return invalid("budgets must be positive");
        }
        if self.weights.item == 0 || self.weights.new_word_to_audio == 0 {
            return invalid("weights must be positive");
        }
        if !self.keys.bindings().iter().all_unique() {
            return invalid("each key may only be bound once");
        }
        // the terminal delivers letters in lowercase
        if self.keys.bindings().iter().any(|k| k.is_uppercase()) {
            return invalid("keys must be lowercase");
        }
        if self.player.is_empty() {
            return invalid("player command is empty");
        }
        Ok(())
    }

    pub fn due_model(&self) -> DueModel {
        DueModel::new(self.base, self.slack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("config.toml"))?;
        assert_eq!(config, Config::default());
        assert_eq!(config.budget.max_total_weight, 250);
        assert_eq!(config.keys.level_up, 'g');
        Ok(())
    }

    #[test]
    fn partial_file_overrides_defaults() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "base = 2.2\nslack = 1.15\n\n[budget]\nmax_total_weight = 500\nmax_review_weight = 300\n\n[keys]\nrepeat = 'r'\n",
        )
        .unwrap();
        let config = Config::load(&path)?;
        assert_eq!(config.base, 2.2);
        assert_eq!(config.slack, 1.15);
        assert_eq!(config.budget.max_total_weight, 500);
        assert_eq!(config.budget.max_review_weight, 300);
        assert_eq!(config.budget.max_new_weight, 50);
        assert_eq!(config.keys.repeat, 'r');
        assert_eq!(config.keys.quit, 'q');
        Ok(())
    }

    #[test]
    fn rejects_bad_values() {
        let bad = [
            Config {
                base: 1.0,
                ..Default::default()
            },
            Config {
                slack: 0.9,
                ..Default::default()
            },
            Config {
                budget: Budget {
                    max_new_weight: 0,
                    ..Default::default()
                },
                ..Default::default()
            },
            Config {
                keys: KeyMap {
                    reset: 'g',
                    ..Default::default()
                },
                ..Default::default()
            },
            Config {
                player: vec![],
                ..Default::default()
            },
            Config {
                keys: KeyMap {
                    level_up: 'G',
                    ..Default::default()
                },
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(matches!(
                config.validate(),
                Err(DrillError::InvalidConfig { .. })
            ));
        }
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn uppercase_key_in_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[keys]\nlevel_up = 'G'\n").unwrap();
        assert!(matches!(
            Config::load(&path),
            Err(DrillError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "base = \"fast\"").unwrap();
        assert!(matches!(
            Config::load(&path),
            Err(DrillError::Config { .. })
        ));
    }
}
