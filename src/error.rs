use std::fmt;

/// Failure to produce a question bank. Fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
  NotFound { path: String },
  Unreadable { path: String, reason: String },
  Malformed { reason: String },
}

impl fmt::Display for LoadError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      LoadError::NotFound { path } => write!(f, "question bank not found: {path}"),
      LoadError::Unreadable { path, reason } => write!(f, "question bank unreadable ({path}): {reason}"),
      LoadError::Malformed { reason } => write!(f, "malformed question bank: {reason}"),
    }
  }
}

impl std::error::Error for LoadError {}

/// Integration errors from driving a session out of order or with bad input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
  NotStarted,
  InvalidSlot(usize),
  OptionsNotAssigned,
}

impl fmt::Display for SessionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SessionError::NotStarted => write!(f, "quiz session has not been started"),
      SessionError::InvalidSlot(slot) => write!(f, "answer slot {slot} is out of range"),
      SessionError::OptionsNotAssigned => write!(f, "no answer options assigned for the current question"),
    }
  }
}

impl std::error::Error for SessionError {}
