//! Presentation surface contract and a plain-terminal implementation.

use std::io::Write;

use tracing::{trace, warn};

use crate::domain::{Verdict, SLOT_COUNT};
use crate::rotation::{FlipDirection, Quaternion};

/// Everything shown for one question display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionView {
  pub text: String,
  pub explanation: String,
  pub options: [String; SLOT_COUNT],
}

/// What the card tells the outside world. Input flows the other way, through
/// `QuizCard::answer_selected` and `QuizCard::explanation_dismissed`.
pub trait PresentationSurface {
  /// New question: reset option highlights, show the question side.
  fn show_question(&mut self, view: &QuestionView);
  /// The player picked `slot`; evaluation is still pending.
  fn mark_selected(&mut self, slot: usize);
  /// Verdict for the selected slot (and where the right answer was).
  fn reveal_verdict(&mut self, selected: usize, verdict: Verdict);
  /// Swap to the explanation side.
  fn show_explanation(&mut self);
  fn set_answer_controls_enabled(&mut self, enabled: bool);
  fn set_dismiss_enabled(&mut self, enabled: bool);
  fn set_orientation(&mut self, orientation: Quaternion);
  fn flip_completed(&mut self, _direction: FlipDirection) {}
  /// Startup could not produce a session.
  fn show_failure(&mut self, message: &str);
}

/// Renders the card as text lines on any writer (stdout in the binary).
pub struct ConsoleSurface<W: Write> {
  out: W,
  explanation: String,
  options: [String; SLOT_COUNT],
}

impl ConsoleSurface<std::io::Stdout> {
  pub fn stdout() -> Self {
    Self::new(std::io::stdout())
  }
}

impl<W: Write> ConsoleSurface<W> {
  pub fn new(out: W) -> Self {
    Self { out, explanation: String::new(), options: Default::default() }
  }

  pub fn into_inner(self) -> W { self.out }

  fn line(&mut self, text: &str) {
    if let Err(e) = writeln!(self.out, "{text}").and_then(|_| self.out.flush()) {
      warn!(target: "quizcard", error = %e, "Console write failed");
    }
  }
}

impl<W: Write> PresentationSurface for ConsoleSurface<W> {
  fn show_question(&mut self, view: &QuestionView) {
    self.explanation = view.explanation.clone();
    self.options = view.options.clone();
    self.line("");
    self.line(&format!("Q: {}", view.text));
    for (i, label) in view.options.iter().enumerate() {
      self.line(&format!("  [{}] {}", i + 1, label));
    }
  }

  fn mark_selected(&mut self, slot: usize) {
    let label = self.options.get(slot).cloned().unwrap_or_default();
    self.line(&format!("You picked [{}] {} ...", slot + 1, label));
  }

  fn reveal_verdict(&mut self, selected: usize, verdict: Verdict) {
    match verdict {
      Verdict::Correct => self.line(&format!("[{}] is correct!", selected + 1)),
      Verdict::Incorrect { correct_slot } => {
        let right = self.options.get(correct_slot).cloned().unwrap_or_default();
        self.line(&format!("[{}] is wrong. The answer was [{}] {}", selected + 1, correct_slot + 1, right));
      }
    }
  }

  fn show_explanation(&mut self) {
    let text = self.explanation.clone();
    self.line(&format!("-- {text}"));
  }

  fn set_answer_controls_enabled(&mut self, enabled: bool) {
    if enabled {
      self.line("Answer with 1-4.");
    }
  }

  fn set_dismiss_enabled(&mut self, enabled: bool) {
    if enabled {
      self.line("Press Enter for the next question.");
    }
  }

  fn set_orientation(&mut self, orientation: Quaternion) {
    trace!(target: "card", w = orientation.w, x = orientation.x, y = orientation.y, z = orientation.z, "Orientation");
  }

  fn flip_completed(&mut self, direction: FlipDirection) {
    trace!(target: "card", ?direction, "Flip settled");
  }

  fn show_failure(&mut self, message: &str) {
    self.line(&format!("Cannot start quiz: {message}"));
  }
}
