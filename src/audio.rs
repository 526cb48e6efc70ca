//! Sound cues: the dispatcher contract the card plays through, plus a wall-clock
//! implementation for running without an audio engine.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{debug, warn};

/// Fire-and-forget playback of named cues with a queryable "still playing" status.
pub trait SoundCues {
  fn play(&mut self, cue: &str);
  fn is_playing(&self, cue: &str) -> bool;
}

/// Cue names the card uses. Configuration, not contract.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CueNames {
  pub reveal: String,
  pub win: String,
  pub lose: String,
}

impl Default for CueNames {
  fn default() -> Self {
    Self { reveal: "reveal-roll".into(), win: "win".into(), lose: "lose".into() }
  }
}

/// Cues that "play" for a configured duration measured against `Instant::now()`.
#[derive(Debug, Default)]
pub struct TimedCues {
  durations: HashMap<String, Duration>,
  playing_until: HashMap<String, Instant>,
}

impl TimedCues {
  pub fn new(durations: impl IntoIterator<Item = (String, Duration)>) -> Self {
    Self { durations: durations.into_iter().collect(), playing_until: HashMap::new() }
  }
}

impl SoundCues for TimedCues {
  fn play(&mut self, cue: &str) {
    let Some(len) = self.durations.get(cue) else {
      warn!(target: "audio", %cue, "Sound not found");
      return;
    };
    debug!(target: "audio", %cue, secs = len.as_secs_f64(), "Playing cue");
    self.playing_until.insert(cue.to_string(), Instant::now() + *len);
  }

  fn is_playing(&self, cue: &str) -> bool {
    self.playing_until
      .get(cue)
      .map(|until| Instant::now() < *until)
      .unwrap_or(false)
  }
}
