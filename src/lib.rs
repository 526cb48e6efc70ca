//! Quiz card core: question bank loading, shuffled quiz sessions, and the
//! card flip state machine that sequences answer, reveal and explanation.
//!
//! Audio and presentation are collaborators handed in at construction
//! (`audio::SoundCues`, `presentation::PresentationSurface`); the crate never
//! looks them up on its own.

pub mod audio;
pub mod bank;
pub mod card;
pub mod config;
pub mod domain;
pub mod error;
pub mod presentation;
pub mod rotation;
pub mod session;
pub mod telemetry;

pub use card::{CardState, InputOutcome, QuizCard, Tally};
pub use domain::{OptionAssignment, Question, QuestionBank, Verdict, SLOT_COUNT};
pub use error::{LoadError, SessionError};
pub use session::QuizSession;
