//! Quiz session: shuffled question order, cursor, and per-display option assignment.
//!
//! The session owns no presentation or audio concerns. The card drives it:
//!   - `start` once with a loaded bank
//!   - `assign_options` every time a question is shown
//!   - `submit_answer` to evaluate a slot (pure)
//!   - `advance` to move to the next question (wraps)

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::{OptionAssignment, Question, QuestionBank, Verdict, SLOT_COUNT};
use crate::error::SessionError;

struct Started {
    bank: Arc<QuestionBank>,
    order: Vec<usize>,
    cursor: usize,
    assignment: Option<OptionAssignment>,
}

pub struct QuizSession<R: Rng> {
    id: Uuid,
    rng: R,
    reshuffle_on_wrap: bool,
    state: Option<Started>,
}

impl<R: Rng> QuizSession<R> {
    pub fn new(rng: R) -> Self {
        Self { id: Uuid::new_v4(), rng, reshuffle_on_wrap: false, state: None }
    }

    /// Reshuffle the order each time the cursor wraps back to the first position.
    pub fn with_reshuffle_on_wrap(mut self, enabled: bool) -> Self {
        self.reshuffle_on_wrap = enabled;
        self
    }

    pub fn id(&self) -> Uuid { self.id }

    pub fn is_started(&self) -> bool { self.state.is_some() }

    /// Build the question order and reset the cursor.
    #[instrument(level = "info", skip(self, bank), fields(session = %self.id, questions = bank.len()))]
    pub fn start(&mut self, bank: Arc<QuestionBank>, shuffle: bool) {
        let mut order: Vec<usize> = (0..bank.len()).collect();
        if shuffle {
            fisher_yates(&mut order, &mut self.rng);
        }
        debug!(target: "quiz", session = %self.id, ?order, "Question order built");
        self.state = Some(Started { bank, order, cursor: 0, assignment: None });
        info!(target: "quiz", session = %self.id, %shuffle, "Session started");
    }

    pub fn cursor(&self) -> Result<usize, SessionError> {
        Ok(self.started()?.cursor)
    }

    pub fn order(&self) -> Result<&[usize], SessionError> {
        self.started().map(|s| s.order.as_slice())
    }

    pub fn len(&self) -> usize {
        self.state.as_ref().map(|s| s.order.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn current_question(&self) -> Result<&Question, SessionError> {
        let s = self.started()?;
        Ok(&s.bank.questions()[s.order[s.cursor]])
    }

    /// The assignment made by the last `assign_options` call, if still valid.
    pub fn current_assignment(&self) -> Option<&OptionAssignment> {
        self.state.as_ref().and_then(|s| s.assignment.as_ref())
    }

    /// Roll a fresh correct slot and lay out the four labels.
    ///
    /// Wrong answers fill the remaining slots in ascending slot order, taken
    /// from the last declared wrong answer to the first.
    #[instrument(level = "debug", skip(self), fields(session = %self.id))]
    pub fn assign_options(&mut self) -> Result<OptionAssignment, SessionError> {
        let correct_slot = self.rng.gen_range(0..SLOT_COUNT);
        let s = self.state.as_mut().ok_or(SessionError::NotStarted)?;
        let q = &s.bank.questions()[s.order[s.cursor]];

        let mut slots: [String; SLOT_COUNT] = Default::default();
        slots[correct_slot] = q.correct_answer.clone();
        let wrong_slots = (0..SLOT_COUNT).filter(|slot| *slot != correct_slot);
        for (slot, label) in wrong_slots.zip(q.wrong_answers.iter().rev()) {
            slots[slot] = label.clone();
        }

        let assignment = OptionAssignment { slots, correct_slot };
        s.assignment = Some(assignment.clone());
        debug!(target: "quiz", session = %self.id, cursor = s.cursor, correct_slot, "Options assigned");
        Ok(assignment)
    }

    /// Evaluate a slot against the current assignment. Does not move the cursor.
    pub fn submit_answer(&self, slot: usize) -> Result<Verdict, SessionError> {
        let s = self.started()?;
        if slot >= SLOT_COUNT {
            return Err(SessionError::InvalidSlot(slot));
        }
        let assignment = s.assignment.as_ref().ok_or(SessionError::OptionsNotAssigned)?;
        if slot == assignment.correct_slot {
            Ok(Verdict::Correct)
        } else {
            Ok(Verdict::Incorrect { correct_slot: assignment.correct_slot })
        }
    }

    /// Move to the next question, wrapping to the start of the same order.
    #[instrument(level = "debug", skip(self), fields(session = %self.id))]
    pub fn advance(&mut self) -> Result<(), SessionError> {
        let s = self.state.as_mut().ok_or(SessionError::NotStarted)?;
        s.cursor = (s.cursor + 1) % s.order.len();
        s.assignment = None;
        if s.cursor == 0 {
            if self.reshuffle_on_wrap {
                fisher_yates(&mut s.order, &mut self.rng);
                info!(target: "quiz", session = %self.id, "Wrapped around; order reshuffled");
            } else {
                info!(target: "quiz", session = %self.id, "Wrapped around; repeating order");
            }
        }
        Ok(())
    }

    fn started(&self) -> Result<&Started, SessionError> {
        self.state.as_ref().ok_or(SessionError::NotStarted)
    }
}

/// Unbiased in-place shuffle: position i swaps with a uniform pick from [i, n-1].
fn fisher_yates(order: &mut [usize], rng: &mut impl Rng) {
    let n = order.len();
    for i in 0..n {
        let j = rng.gen_range(i..n);
        order.swap(i, j);
    }
}
