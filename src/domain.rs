//! Domain models: questions, the loaded bank, per-display option assignment and verdicts.

/// Number of answer slots on the card (one correct + three wrong).
pub const SLOT_COUNT: usize = 4;

/// One immutable quiz record. All fields are non-empty once loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Question {
  pub text: String,
  pub correct_answer: String,
  pub correct_answer_description: String,
  /// Wrong answers in declared order (`wrongAnswer1..3`).
  pub wrong_answers: [String; 3],
}

/// Ordered, non-empty sequence of questions. Built only by the bank loader.
#[derive(Clone, Debug)]
pub struct QuestionBank {
  questions: Vec<Question>,
}

impl QuestionBank {
  pub(crate) fn from_validated(questions: Vec<Question>) -> Self {
    debug_assert!(!questions.is_empty());
    Self { questions }
  }

  pub fn len(&self) -> usize { self.questions.len() }

  /// Always false for a loaded bank; kept for clippy's `len_without_is_empty`.
  pub fn is_empty(&self) -> bool { self.questions.is_empty() }

  pub fn get(&self, index: usize) -> Option<&Question> { self.questions.get(index) }

  pub fn questions(&self) -> &[Question] { &self.questions }
}

/// Labels for the four slots, plus where the correct one landed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionAssignment {
  pub slots: [String; SLOT_COUNT],
  pub correct_slot: usize,
}

/// Outcome of evaluating a selected slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
  Correct,
  Incorrect { correct_slot: usize },
}

impl Verdict {
  pub fn is_correct(&self) -> bool { matches!(self, Verdict::Correct) }
}
