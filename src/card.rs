//! The quiz card: answer/reveal/explain/return flow driven by input events and a
//! per-frame tick.
//!
//! Flow:
//!   ShowingQuestion --answer--> Revealing (reveal cue, then win/lose cue, flip, settle)
//!   ShowingAnswer --dismiss--> Returning (flip back, settle) --> advance --> ShowingQuestion
//!
//! Waiting is never blocking: each tick checks the cue dispatcher and the flip
//! animator once and moves on when the condition holds. Input that arrives in
//! `Revealing` or `Returning` is ignored. A flip never starts while the previous
//! one is still running; the transition that wants it waits on the tick instead.

use rand::Rng;
use tracing::{debug, info, instrument};

use crate::audio::{CueNames, SoundCues};
use crate::config::CardSettings;
use crate::domain::{Verdict, SLOT_COUNT};
use crate::error::SessionError;
use crate::presentation::{PresentationSurface, QuestionView};
use crate::rotation::{FlipAnimator, FlipDirection, FlipStep};
use crate::session::QuizSession;

/// Slack for accumulated frame-time rounding when comparing against the settle delay.
const SETTLE_EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardState {
  ShowingQuestion,
  Revealing,
  ShowingAnswer,
  Returning,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputOutcome {
  Accepted,
  Ignored,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
  pub correct: u32,
  pub incorrect: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
  Question,
  /// Reveal cue playing.
  Rolling { selected: usize },
  /// Win/lose cue playing; the forward flip starts once it ends.
  Verdict,
  RevealSettle { elapsed: f64 },
  Answer,
  /// Waiting for any running flip before flipping back.
  ReturnPending,
  ReturnSettle { elapsed: f64 },
}

impl Phase {
  fn state(self) -> CardState {
    match self {
      Phase::Question => CardState::ShowingQuestion,
      Phase::Rolling { .. } | Phase::Verdict | Phase::RevealSettle { .. } => CardState::Revealing,
      Phase::Answer => CardState::ShowingAnswer,
      Phase::ReturnPending | Phase::ReturnSettle { .. } => CardState::Returning,
    }
  }
}

pub struct QuizCard<C: SoundCues, P: PresentationSurface, R: Rng> {
  session: QuizSession<R>,
  cues: C,
  surface: P,
  cue_names: CueNames,
  settle_delay: f64,
  flip: FlipAnimator,
  phase: Phase,
  tally: Tally,
}

impl<C: SoundCues, P: PresentationSurface, R: Rng> QuizCard<C, P, R> {
  /// Wire the card to its collaborators and display the first question.
  /// The session must already be started.
  pub fn new(
    session: QuizSession<R>,
    cues: C,
    surface: P,
    cue_names: CueNames,
    settings: &CardSettings,
  ) -> Result<Self, SessionError> {
    if !session.is_started() {
      return Err(SessionError::NotStarted);
    }
    let flip = FlipAnimator::new(
      settings.flip_yaw_degrees,
      settings.flip_tilt_degrees,
      settings.blend,
      settings.tolerance_degrees,
    );
    let mut card = Self {
      session,
      cues,
      surface,
      cue_names,
      settle_delay: settings.settle_delay_secs.max(0.0),
      flip,
      phase: Phase::Question,
      tally: Tally::default(),
    };
    card.surface.set_orientation(card.flip.orientation());
    card.display_question()?;
    Ok(card)
  }

  pub fn state(&self) -> CardState { self.phase.state() }

  pub fn session(&self) -> &QuizSession<R> { &self.session }

  pub fn surface(&self) -> &P { &self.surface }

  pub fn cues_mut(&mut self) -> &mut C { &mut self.cues }

  pub fn flip(&self) -> &FlipAnimator { &self.flip }

  pub fn tally(&self) -> Tally { self.tally }

  /// Player picked an option. Only accepted while the question is showing.
  #[instrument(level = "debug", skip(self), fields(session = %self.session.id()))]
  pub fn answer_selected(&mut self, slot: usize) -> Result<InputOutcome, SessionError> {
    if self.phase != Phase::Question {
      debug!(target: "card", slot, state = ?self.state(), "Answer ignored");
      return Ok(InputOutcome::Ignored);
    }
    if slot >= SLOT_COUNT {
      return Err(SessionError::InvalidSlot(slot));
    }
    self.surface.mark_selected(slot);
    self.surface.set_answer_controls_enabled(false);
    self.cues.play(&self.cue_names.reveal);
    self.enter(Phase::Rolling { selected: slot });
    Ok(InputOutcome::Accepted)
  }

  /// Player closed the explanation. Only accepted while the answer is showing.
  #[instrument(level = "debug", skip(self), fields(session = %self.session.id()))]
  pub fn explanation_dismissed(&mut self) -> InputOutcome {
    if self.phase != Phase::Answer {
      debug!(target: "card", state = ?self.state(), "Dismiss ignored");
      return InputOutcome::Ignored;
    }
    self.surface.set_dismiss_enabled(false);
    self.enter(Phase::ReturnPending);
    InputOutcome::Accepted
  }

  /// One frame: step the rotation, then check whatever the current phase waits on.
  pub fn tick(&mut self, dt: f64) -> Result<(), SessionError> {
    match self.flip.step() {
      FlipStep::Idle => {}
      FlipStep::Moving(q) => self.surface.set_orientation(q),
      FlipStep::Completed(direction, q) => {
        self.surface.set_orientation(q);
        self.surface.flip_completed(direction);
        debug!(target: "card", ?direction, "Flip complete");
      }
    }

    match self.phase {
      Phase::Question | Phase::Answer => {}
      Phase::Rolling { selected } => {
        if !self.cues.is_playing(&self.cue_names.reveal) {
          self.reveal(selected)?;
        }
      }
      Phase::Verdict => {
        let verdict_playing =
          self.cues.is_playing(&self.cue_names.win) || self.cues.is_playing(&self.cue_names.lose);
        if !verdict_playing && self.flip.begin(FlipDirection::Forward) {
          self.enter(Phase::RevealSettle { elapsed: 0.0 });
        }
      }
      Phase::RevealSettle { elapsed } => {
        let elapsed = elapsed + dt;
        if elapsed + SETTLE_EPSILON >= self.settle_delay {
          self.surface.show_explanation();
          self.surface.set_dismiss_enabled(true);
          self.enter(Phase::Answer);
        } else {
          self.phase = Phase::RevealSettle { elapsed };
        }
      }
      Phase::ReturnPending => {
        if self.flip.begin(FlipDirection::Return) {
          self.enter(Phase::ReturnSettle { elapsed: 0.0 });
        }
      }
      Phase::ReturnSettle { elapsed } => {
        let elapsed = elapsed + dt;
        if elapsed + SETTLE_EPSILON >= self.settle_delay {
          self.session.advance()?;
          self.display_question()?;
        } else {
          self.phase = Phase::ReturnSettle { elapsed };
        }
      }
    }
    Ok(())
  }

  fn reveal(&mut self, selected: usize) -> Result<(), SessionError> {
    let verdict = self.session.submit_answer(selected)?;
    match verdict {
      Verdict::Correct => {
        self.tally.correct += 1;
        self.cues.play(&self.cue_names.win);
      }
      Verdict::Incorrect { .. } => {
        self.tally.incorrect += 1;
        self.cues.play(&self.cue_names.lose);
      }
    }
    self.surface.reveal_verdict(selected, verdict);
    info!(
      target: "card",
      session = %self.session.id(),
      selected,
      correct = verdict.is_correct(),
      tally_correct = self.tally.correct,
      tally_incorrect = self.tally.incorrect,
      "Answer evaluated"
    );
    self.enter(Phase::Verdict);
    Ok(())
  }

  fn display_question(&mut self) -> Result<(), SessionError> {
    let assignment = self.session.assign_options()?;
    let q = self.session.current_question()?;
    let view = QuestionView {
      text: q.text.clone(),
      explanation: q.correct_answer_description.clone(),
      options: assignment.slots,
    };
    self.surface.show_question(&view);
    self.surface.set_dismiss_enabled(false);
    self.surface.set_answer_controls_enabled(true);
    self.enter(Phase::Question);
    Ok(())
  }

  fn enter(&mut self, next: Phase) {
    let (from, to) = (self.phase.state(), next.state());
    if from != to {
      info!(target: "card", session = %self.session.id(), ?from, ?to, "Card state change");
    }
    self.phase = next;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::bank::parse_json;
  use std::collections::HashSet;
  use std::sync::Arc;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  #[derive(Default)]
  struct FakeCues {
    playing: HashSet<String>,
    played: Vec<String>,
  }

  impl FakeCues {
    fn finish(&mut self, cue: &str) {
      self.playing.remove(cue);
    }
  }

  impl SoundCues for FakeCues {
    fn play(&mut self, cue: &str) {
      self.playing.insert(cue.to_string());
      self.played.push(cue.to_string());
    }
    fn is_playing(&self, cue: &str) -> bool {
      self.playing.contains(cue)
    }
  }

  #[derive(Debug, Clone, PartialEq)]
  enum Event {
    Question(QuestionView),
    Selected(usize),
    Verdict(usize, Verdict),
    Explanation,
    AnswerControls(bool),
    Dismiss(bool),
    FlipDone(FlipDirection),
  }

  #[derive(Default)]
  struct Recorder {
    events: Vec<Event>,
    orientation_updates: usize,
  }

  impl Recorder {
    fn count(&self, f: impl Fn(&Event) -> bool) -> usize {
      self.events.iter().filter(|&e| f(e)).count()
    }
  }

  impl PresentationSurface for Recorder {
    fn show_question(&mut self, view: &QuestionView) { self.events.push(Event::Question(view.clone())); }
    fn mark_selected(&mut self, slot: usize) { self.events.push(Event::Selected(slot)); }
    fn reveal_verdict(&mut self, selected: usize, verdict: Verdict) { self.events.push(Event::Verdict(selected, verdict)); }
    fn show_explanation(&mut self) { self.events.push(Event::Explanation); }
    fn set_answer_controls_enabled(&mut self, enabled: bool) { self.events.push(Event::AnswerControls(enabled)); }
    fn set_dismiss_enabled(&mut self, enabled: bool) { self.events.push(Event::Dismiss(enabled)); }
    fn set_orientation(&mut self, _q: crate::rotation::Quaternion) { self.orientation_updates += 1; }
    fn flip_completed(&mut self, direction: FlipDirection) { self.events.push(Event::FlipDone(direction)); }
    fn show_failure(&mut self, _message: &str) {}
  }

  type Card = QuizCard<FakeCues, Recorder, StdRng>;

  const DT: f64 = 0.1;

  fn card(n: usize) -> Card {
    card_with(n, &CardSettings::default())
  }

  fn card_with(n: usize, settings: &CardSettings) -> Card {
    let records: Vec<String> = (0..n)
      .map(|i| format!(r#"{{"question":"q{i}","correctAnswer":"a{i}","correctAnswerDescription":"d{i}","wrongAnswer1":"x","wrongAnswer2":"y","wrongAnswer3":"z"}}"#))
      .collect();
    let bank = Arc::new(parse_json(format!("[{}]", records.join(",")).as_bytes()).unwrap());
    let mut session = QuizSession::new(StdRng::seed_from_u64(7));
    session.start(bank, false);
    QuizCard::new(session, FakeCues::default(), Recorder::default(), CueNames::default(), settings).unwrap()
  }

  fn correct_slot(c: &Card) -> usize {
    c.session().current_assignment().unwrap().correct_slot
  }

  fn tick_until(c: &mut Card, what: &str, done: impl Fn(&Card) -> bool) -> usize {
    for n in 1..=2_000 {
      c.tick(DT).unwrap();
      if done(&*c) {
        return n;
      }
    }
    panic!("never reached: {what}");
  }

  /// Drive from ShowingQuestion to ShowingAnswer with `slot` as the pick.
  fn answer_and_reveal(c: &mut Card, slot: usize) {
    assert_eq!(c.answer_selected(slot).unwrap(), InputOutcome::Accepted);
    c.tick(DT).unwrap();
    c.cues_mut().finish("reveal-roll");
    c.tick(DT).unwrap();
    c.cues_mut().finish("win");
    c.cues_mut().finish("lose");
    tick_until(c, "answer side", |c| c.state() == CardState::ShowingAnswer);
  }

  #[test]
  fn new_requires_started_session() {
    let session = QuizSession::new(StdRng::seed_from_u64(1));
    let r = QuizCard::new(session, FakeCues::default(), Recorder::default(), CueNames::default(), &CardSettings::default());
    assert!(matches!(r, Err(SessionError::NotStarted)));
  }

  #[test]
  fn first_question_is_displayed_on_construction() {
    let c = card(3);
    assert_eq!(c.state(), CardState::ShowingQuestion);
    let a = c.session().current_assignment().unwrap().clone();
    assert_eq!(
      c.surface().events,
      vec![
        Event::Question(QuestionView { text: "q0".into(), explanation: "d0".into(), options: a.slots }),
        Event::Dismiss(false),
        Event::AnswerControls(true),
      ]
    );
  }

  #[test]
  fn dismiss_while_question_showing_does_nothing() {
    let mut c = card(2);
    let before = c.surface().events.len();
    assert_eq!(c.explanation_dismissed(), InputOutcome::Ignored);
    c.tick(DT).unwrap();
    assert_eq!(c.state(), CardState::ShowingQuestion);
    assert_eq!(c.surface().events.len(), before);
  }

  #[test]
  fn out_of_range_slot_is_rejected_without_side_effects() {
    let mut c = card(2);
    assert_eq!(c.answer_selected(4).unwrap_err(), SessionError::InvalidSlot(4));
    assert_eq!(c.state(), CardState::ShowingQuestion);
    assert!(c.cues_mut().played.is_empty());
  }

  #[test]
  fn reveal_waits_for_reveal_cue() {
    let mut c = card(2);
    let slot = correct_slot(&c);
    c.answer_selected(slot).unwrap();
    assert_eq!(c.state(), CardState::Revealing);
    assert_eq!(c.cues_mut().played, vec!["reveal-roll".to_string()]);
    for _ in 0..30 {
      c.tick(DT).unwrap();
    }
    assert_eq!(c.surface().count(|e| matches!(e, Event::Verdict(..))), 0);
    c.cues_mut().finish("reveal-roll");
    c.tick(DT).unwrap();
    assert_eq!(c.surface().events.last(), Some(&Event::Verdict(slot, Verdict::Correct)));
    assert_eq!(c.cues_mut().played.last().map(String::as_str), Some("win"));
    assert_eq!(c.tally(), Tally { correct: 1, incorrect: 0 });
  }

  #[test]
  fn wrong_answer_plays_lose_and_reports_correct_slot() {
    let mut c = card(2);
    let right = correct_slot(&c);
    let wrong = (right + 1) % SLOT_COUNT;
    c.answer_selected(wrong).unwrap();
    c.cues_mut().finish("reveal-roll");
    c.tick(DT).unwrap();
    assert_eq!(c.surface().events.last(), Some(&Event::Verdict(wrong, Verdict::Incorrect { correct_slot: right })));
    assert_eq!(c.cues_mut().played.last().map(String::as_str), Some("lose"));
    assert_eq!(c.tally(), Tally { correct: 0, incorrect: 1 });
  }

  #[test]
  fn inputs_during_revealing_are_ignored() {
    let mut c = card(2);
    c.answer_selected(0).unwrap();
    assert_eq!(c.answer_selected(1).unwrap(), InputOutcome::Ignored);
    assert_eq!(c.explanation_dismissed(), InputOutcome::Ignored);
    assert_eq!(c.surface().count(|e| matches!(e, Event::Selected(_))), 1);
    assert_eq!(c.cues_mut().played.len(), 1);
  }

  #[test]
  fn forward_flip_waits_for_verdict_cue_then_settles() {
    let mut c = card(2);
    let slot = correct_slot(&c);
    c.answer_selected(slot).unwrap();
    c.cues_mut().finish("reveal-roll");
    c.tick(DT).unwrap();
    for _ in 0..10 {
      c.tick(DT).unwrap();
    }
    assert!(!c.flip().is_busy());
    assert_eq!(c.state(), CardState::Revealing);

    c.cues_mut().finish("win");
    c.tick(DT).unwrap();
    assert_eq!(c.flip().active(), Some(FlipDirection::Forward));
    let ticks = tick_until(&mut c, "answer side", |c| c.state() == CardState::ShowingAnswer);
    assert!(ticks >= 3, "settled after {ticks} ticks");
    assert!(c.surface().events.ends_with(&[Event::Explanation, Event::Dismiss(true)]));
  }

  #[test]
  fn full_cycle_advances_to_next_question() {
    let mut c = card(3);
    let slot = correct_slot(&c);
    answer_and_reveal(&mut c, slot);

    assert_eq!(c.explanation_dismissed(), InputOutcome::Accepted);
    assert_eq!(c.state(), CardState::Returning);
    assert_eq!(c.answer_selected(0).unwrap(), InputOutcome::Ignored);
    assert_eq!(c.explanation_dismissed(), InputOutcome::Ignored);

    tick_until(&mut c, "next question", |c| c.state() == CardState::ShowingQuestion);
    assert_eq!(c.session().cursor().unwrap(), 1);
    assert_eq!(c.session().current_question().unwrap().text, "q1");
    assert!(c.session().current_assignment().is_some());
    assert_eq!(c.surface().count(|e| matches!(e, Event::Question(_))), 2);
    assert!(c.surface().events.ends_with(&[Event::Dismiss(false), Event::AnswerControls(true)]));
  }

  #[test]
  fn return_flip_waits_for_running_forward_flip() {
    let mut c = card(2);
    let slot = correct_slot(&c);
    answer_and_reveal(&mut c, slot);
    // settle is much shorter than the flip, so it is still turning
    assert_eq!(c.flip().active(), Some(FlipDirection::Forward));

    c.explanation_dismissed();
    c.tick(DT).unwrap();
    assert_eq!(c.state(), CardState::Returning);
    assert_eq!(c.flip().active(), Some(FlipDirection::Forward));

    tick_until(&mut c, "return flip start", |c| c.flip().active() == Some(FlipDirection::Return));
    assert_eq!(c.surface().count(|e| *e == Event::FlipDone(FlipDirection::Forward)), 1);
    tick_until(&mut c, "next question", |c| c.state() == CardState::ShowingQuestion);
  }

  #[test]
  fn forward_flip_waits_for_running_return_flip() {
    let mut c = card(2);
    let slot = correct_slot(&c);
    answer_and_reveal(&mut c, slot);
    tick_until(&mut c, "forward flip done", |c| !c.flip().is_busy());
    c.explanation_dismissed();
    tick_until(&mut c, "next question", |c| c.state() == CardState::ShowingQuestion);
    assert_eq!(c.flip().active(), Some(FlipDirection::Return));

    // answer again right away; both cues end before the card has turned back
    let slot = correct_slot(&c);
    c.answer_selected(slot).unwrap();
    c.cues_mut().finish("reveal-roll");
    c.tick(DT).unwrap();
    c.cues_mut().finish("win");
    c.tick(DT).unwrap();
    assert_eq!(c.flip().active(), Some(FlipDirection::Return));
    assert_eq!(c.state(), CardState::Revealing);

    tick_until(&mut c, "forward flip start", |c| c.flip().active() == Some(FlipDirection::Forward));
    assert_eq!(c.state(), CardState::Revealing);
    tick_until(&mut c, "answer side", |c| c.state() == CardState::ShowingAnswer);
  }

  #[test]
  fn orientation_lands_exactly_on_targets() {
    let mut c = card(1);
    let slot = correct_slot(&c);
    answer_and_reveal(&mut c, slot);
    tick_until(&mut c, "forward flip done", |c| !c.flip().is_busy());
    assert_eq!(c.flip().orientation(), c.flip().target(FlipDirection::Forward));
    assert!(c.surface().orientation_updates > 10);

    c.explanation_dismissed();
    tick_until(&mut c, "return flip done", |c| {
      c.state() == CardState::ShowingQuestion && !c.flip().is_busy()
    });
    assert_eq!(c.flip().orientation(), c.flip().target(FlipDirection::Return));
  }

  #[test]
  fn zero_blend_setting_does_not_strand_the_card() {
    let settings = CardSettings { blend: 0.0, tolerance_degrees: -1.0, ..CardSettings::default() };
    let mut c = card_with(2, &settings);
    let slot = correct_slot(&c);
    answer_and_reveal(&mut c, slot);
    assert_eq!(c.explanation_dismissed(), InputOutcome::Accepted);
    tick_until(&mut c, "next question", |c| c.state() == CardState::ShowingQuestion);
    assert_eq!(c.session().cursor().unwrap(), 1);
  }
}
