//! Loading quiz configuration from TOML.
//!
//! See `QuizConfig` and `CardSettings` for the expected schema. Every field has
//! a default, so an absent or partial file still yields a runnable setup.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

use crate::audio::CueNames;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct QuizConfig {
  /// Root directory the question bank path is resolved against.
  pub assets_dir: String,
  pub question_bank: String,
  pub shuffle: bool,
  pub reshuffle_on_wrap: bool,
  pub tick_hz: u32,
  pub cues: CueNames,
  /// Simulated playback length per cue name, in seconds.
  pub cue_durations: HashMap<String, f64>,
  pub card: CardSettings,
}

impl Default for QuizConfig {
  fn default() -> Self {
    Self {
      assets_dir: "assets".into(),
      question_bank: "questions.json".into(),
      shuffle: true,
      reshuffle_on_wrap: false,
      tick_hz: 60,
      cues: CueNames::default(),
      cue_durations: HashMap::from([
        ("reveal-roll".to_string(), 2.0),
        ("win".to_string(), 1.2),
        ("lose".to_string(), 1.2),
      ]),
      card: CardSettings::default(),
    }
  }
}

impl QuizConfig {
  /// Cue durations as `Duration`s; negative or non-finite values count as zero.
  pub fn cue_durations(&self) -> Vec<(String, Duration)> {
    self.cue_durations
      .iter()
      .map(|(name, secs)| {
        let secs = if secs.is_finite() && *secs > 0.0 { *secs } else { 0.0 };
        (name.clone(), Duration::from_secs_f64(secs))
      })
      .collect()
  }

  pub fn tick_interval(&self) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(self.tick_hz.max(1)))
  }
}

/// Card animation tuning.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct CardSettings {
  /// Pause between an animation step finishing and the next transition.
  pub settle_delay_secs: f64,
  /// Slerp factor applied once per tick.
  pub blend: f64,
  /// Angular distance at which the card snaps onto its target.
  pub tolerance_degrees: f64,
  pub flip_yaw_degrees: f64,
  pub flip_tilt_degrees: f64,
}

impl Default for CardSettings {
  fn default() -> Self {
    Self {
      settle_delay_secs: 0.3,
      blend: 0.05,
      tolerance_degrees: 0.5,
      flip_yaw_degrees: 180.0,
      flip_tilt_degrees: 35.0,
    }
  }
}

pub fn parse_config(s: &str) -> Result<QuizConfig, toml::de::Error> {
  toml::from_str::<QuizConfig>(s)
}

/// Load from QUIZ_CONFIG_PATH (defaults on any problem), then apply QUIZ_BANK_PATH.
pub fn load_config_from_env() -> QuizConfig {
  let path = std::env::var("QUIZ_CONFIG_PATH").ok();
  let cfg = load_config(path.as_deref());
  apply_bank_override(cfg, std::env::var("QUIZ_BANK_PATH").ok())
}

/// Read and parse the TOML file at `path`; defaults when absent, unreadable or invalid.
pub fn load_config(path: Option<&str>) -> QuizConfig {
  let Some(path) = path else {
    info!(target: "quizcard", "QUIZ_CONFIG_PATH not set; using defaults");
    return QuizConfig::default();
  };
  match std::fs::read_to_string(path) {
    Ok(s) => match parse_config(&s) {
      Ok(cfg) => {
        info!(target: "quizcard", %path, "Loaded quiz config (TOML)");
        cfg
      }
      Err(e) => {
        error!(target: "quizcard", %path, error = %e, "Failed to parse TOML config; using defaults");
        QuizConfig::default()
      }
    },
    Err(e) => {
      error!(target: "quizcard", %path, error = %e, "Failed to read TOML config file; using defaults");
      QuizConfig::default()
    }
  }
}

/// A non-empty `bank` replaces `question_bank`.
pub fn apply_bank_override(mut cfg: QuizConfig, bank: Option<String>) -> QuizConfig {
  if let Some(bank) = bank.filter(|b| !b.trim().is_empty()) {
    info!(target: "quizcard", %bank, "Question bank overridden from env");
    cfg.question_bank = bank;
  }
  cfg
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_file_gives_defaults() {
    assert_eq!(parse_config("").unwrap(), QuizConfig::default());
  }

  #[test]
  fn partial_file_keeps_other_defaults() {
    let cfg = parse_config(
      r#"
question_bank = "capitals.toml"
reshuffle_on_wrap = true

[cues]
reveal = "Drum roll"

[card]
settle_delay_secs = 0.5
"#,
    )
    .unwrap();
    assert_eq!(cfg.question_bank, "capitals.toml");
    assert!(cfg.reshuffle_on_wrap);
    assert_eq!(cfg.cues.reveal, "Drum roll");
    assert_eq!(cfg.cues.win, "win");
    assert_eq!(cfg.card.settle_delay_secs, 0.5);
    assert_eq!(cfg.card.blend, 0.05);
    assert_eq!(cfg.tick_hz, 60);
  }

  #[test]
  fn cue_durations_clamp_bad_values() {
    let cfg = parse_config("[cue_durations]\nwin = -1.0\nlose = 0.25\n").unwrap();
    let d: HashMap<_, _> = cfg.cue_durations().into_iter().collect();
    assert_eq!(d["win"], Duration::ZERO);
    assert_eq!(d["lose"], Duration::from_millis(250));
    assert!(!d.contains_key("reveal-roll"));
  }

  #[test]
  fn tick_interval_never_divides_by_zero() {
    let cfg = QuizConfig { tick_hz: 0, ..QuizConfig::default() };
    assert_eq!(cfg.tick_interval(), Duration::from_secs(1));
  }

  #[test]
  fn bank_override_replaces_configured_bank() {
    let cfg = apply_bank_override(QuizConfig::default(), Some("capitals.toml".into()));
    assert_eq!(cfg.question_bank, "capitals.toml");
    assert_eq!(cfg.assets_dir, "assets");
  }

  #[test]
  fn absent_or_blank_bank_override_keeps_config() {
    assert_eq!(apply_bank_override(QuizConfig::default(), None).question_bank, "questions.json");
    assert_eq!(apply_bank_override(QuizConfig::default(), Some("  ".into())).question_bank, "questions.json");
  }

  #[test]
  fn load_config_reads_file_and_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("quiz.toml");
    std::fs::write(&good, "tick_hz = 30\n").unwrap();
    let bad = dir.path().join("bad.toml");
    std::fs::write(&bad, "tick_hz = \"fast\"\n").unwrap();

    assert_eq!(load_config(good.to_str()).tick_hz, 30);
    assert_eq!(load_config(bad.to_str()), QuizConfig::default());
    assert_eq!(load_config(dir.path().join("missing.toml").to_str()), QuizConfig::default());
    assert_eq!(load_config(None), QuizConfig::default());
  }
}
