//! Quiz Card · terminal runner
//!
//! - Loads the question bank and starts a shuffled session
//! - Drives the card at a fixed frame rate (tokio interval)
//! - Reads answers from stdin; sound cues are simulated with wall-clock durations
//!
//! Important env variables:
//!   QUIZ_CONFIG_PATH : path to TOML config (bank, cues, card timing)
//!   QUIZ_BANK_PATH   : overrides `question_bank` from the config
//!   LOG_LEVEL        : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT       : "pretty" (default) or "json"
//!
//! Input: `1`-`4` answers, Enter or `d` dismisses the explanation, `q` quits.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use quizcard::audio::TimedCues;
use quizcard::bank::{self, FsLoader, ResourceLoader};
use quizcard::config::load_config_from_env;
use quizcard::presentation::{ConsoleSurface, PresentationSurface};
use quizcard::{telemetry, InputOutcome, LoadError, QuestionBank, QuizCard, QuizSession, SLOT_COUNT};

#[derive(Debug, PartialEq, Eq)]
enum Command {
  Answer(usize),
  Dismiss,
  Quit,
  Unknown,
}

fn parse_command(line: &str) -> Command {
  match line.trim() {
    "" | "d" => Command::Dismiss,
    "q" => Command::Quit,
    other => match other.parse::<usize>() {
      Ok(n) if (1..=SLOT_COUNT).contains(&n) => Command::Answer(n - 1),
      _ => Command::Unknown,
    },
  }
}

/// Load the bank; on failure show it on the surface and hand the error back so
/// no session is started.
fn load_bank_or_report(
  loader: &impl ResourceLoader,
  source: &str,
  surface: &mut impl PresentationSurface,
) -> Result<Arc<QuestionBank>, LoadError> {
  match bank::load(loader, source) {
    Ok(b) => Ok(Arc::new(b)),
    Err(e) => {
      error!(target: "quizcard", error = %e, "Cannot start quiz");
      surface.show_failure(&e.to_string());
      Err(e)
    }
  }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();
  let cfg = load_config_from_env();

  let mut surface = ConsoleSurface::stdout();
  let loader = FsLoader::new(&cfg.assets_dir);
  let bank = load_bank_or_report(&loader, &cfg.question_bank, &mut surface)?;

  let mut session = QuizSession::new(StdRng::from_entropy()).with_reshuffle_on_wrap(cfg.reshuffle_on_wrap);
  session.start(bank, cfg.shuffle);
  let cues = TimedCues::new(cfg.cue_durations());
  let mut card = QuizCard::new(session, cues, surface, cfg.cues.clone(), &cfg.card)?;

  let mut lines = BufReader::new(tokio::io::stdin()).lines();
  let mut ticker = tokio::time::interval(cfg.tick_interval());
  ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
  let ctrl_c = tokio::signal::ctrl_c();
  tokio::pin!(ctrl_c);

  info!(target: "quizcard", tick_hz = cfg.tick_hz, "Quiz running");
  let mut last = Instant::now();
  loop {
    tokio::select! {
      now = ticker.tick() => {
        let dt = now.saturating_duration_since(last).as_secs_f64();
        last = now;
        card.tick(dt)?;
      }
      line = lines.next_line() => {
        let Some(line) = line? else { break };
        let outcome = match parse_command(&line) {
          Command::Answer(slot) => card.answer_selected(slot)?,
          Command::Dismiss => card.explanation_dismissed(),
          Command::Quit => break,
          Command::Unknown => InputOutcome::Ignored,
        };
        debug!(target: "quizcard", input = %line.trim(), ?outcome, state = ?card.state(), "Input handled");
      }
      _ = &mut ctrl_c => break,
    }
  }

  let tally = card.tally();
  info!(target: "quizcard", correct = tally.correct, incorrect = tally.incorrect, "Quiz finished");
  Ok(())
}
