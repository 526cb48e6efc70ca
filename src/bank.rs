//! Question bank loading: resource lookup, decoding (JSON or TOML) and validation.
//!
//! A bank is all-or-nothing. One bad record fails the whole load, so a session
//! never sees a question it cannot assign four options for.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, error, info, instrument};

use crate::domain::{Question, QuestionBank};
use crate::error::LoadError;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Reads raw bytes for a resource identifier.
pub trait ResourceLoader {
  fn read_text(&self, path: &str) -> Result<Vec<u8>, LoadError>;
}

/// Resolves identifiers relative to an assets directory on disk.
#[derive(Clone, Debug)]
pub struct FsLoader {
  root: PathBuf,
}

impl FsLoader {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  fn resolve(&self, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() { p.to_path_buf() } else { self.root.join(p) }
  }
}

impl ResourceLoader for FsLoader {
  fn read_text(&self, path: &str) -> Result<Vec<u8>, LoadError> {
    let full = self.resolve(path);
    std::fs::read(&full).map_err(|e| {
      let shown = full.display().to_string();
      if e.kind() == std::io::ErrorKind::NotFound {
        LoadError::NotFound { path: shown }
      } else {
        LoadError::Unreadable { path: shown, reason: e.to_string() }
      }
    })
  }
}

/// Record shape as stored in the bank file. Every field is optional here so a
/// missing one can be reported by name instead of as a serde error.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct QuestionRecord {
  #[serde(default)] question: Option<String>,
  #[serde(default)] correct_answer: Option<String>,
  #[serde(default)] correct_answer_description: Option<String>,
  #[serde(default)] wrong_answer1: Option<String>,
  #[serde(default)] wrong_answer2: Option<String>,
  #[serde(default)] wrong_answer3: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuestionCollection {
  questions: Vec<QuestionRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonBank {
  Wrapped(QuestionCollection),
  Bare(Vec<QuestionRecord>),
}

/// Load and validate a bank. TOML when the identifier ends in `.toml`, JSON otherwise.
#[instrument(level = "info", skip(loader))]
pub fn load(loader: &impl ResourceLoader, source: &str) -> Result<QuestionBank, LoadError> {
  let bytes = loader.read_text(source).map_err(|e| {
    error!(target: "quizcard", %source, error = %e, "Failed to read question bank");
    e
  })?;
  let bank = if source.ends_with(".toml") {
    parse_toml(&bytes)
  } else {
    parse_json(&bytes)
  }?;
  info!(target: "quizcard", %source, questions = bank.len(), "Loaded question bank");
  Ok(bank)
}

/// Decode a JSON bank: `{ "questions": [...] }` or a bare array.
pub fn parse_json(bytes: &[u8]) -> Result<QuestionBank, LoadError> {
  let text = decode_utf8(bytes)?;
  let records = match serde_json::from_str::<JsonBank>(text) {
    Ok(JsonBank::Wrapped(c)) => c.questions,
    Ok(JsonBank::Bare(v)) => v,
    Err(e) => return Err(LoadError::Malformed { reason: format!("invalid JSON: {e}") }),
  };
  validate(records)
}

/// Decode a TOML bank made of `[[questions]]` tables.
pub fn parse_toml(bytes: &[u8]) -> Result<QuestionBank, LoadError> {
  let text = decode_utf8(bytes)?;
  let c = toml::from_str::<QuestionCollection>(text)
    .map_err(|e| LoadError::Malformed { reason: format!("invalid TOML: {e}") })?;
  validate(c.questions)
}

fn decode_utf8(bytes: &[u8]) -> Result<&str, LoadError> {
  let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
  if body.len() != bytes.len() {
    debug!(target: "quizcard", "Stripped UTF-8 byte-order mark");
  }
  std::str::from_utf8(body).map_err(|e| LoadError::Malformed { reason: format!("not UTF-8: {e}") })
}

fn validate(records: Vec<QuestionRecord>) -> Result<QuestionBank, LoadError> {
  if records.is_empty() {
    return Err(LoadError::Malformed { reason: "question list is empty".into() });
  }
  let questions = records
    .into_iter()
    .enumerate()
    .map(|(i, r)| to_question(i, r))
    .collect::<Result<Vec<_>, _>>()?;
  Ok(QuestionBank::from_validated(questions))
}

fn to_question(index: usize, r: QuestionRecord) -> Result<Question, LoadError> {
  let field = |value: Option<String>, name: &str| -> Result<String, LoadError> {
    match value {
      Some(s) if !s.trim().is_empty() => Ok(s),
      Some(_) => Err(LoadError::Malformed { reason: format!("question {index}: field '{name}' is blank") }),
      None => Err(LoadError::Malformed { reason: format!("question {index}: missing field '{name}'") }),
    }
  };
  let q = Question {
    text: field(r.question, "question")?,
    correct_answer: field(r.correct_answer, "correctAnswer")?,
    correct_answer_description: field(r.correct_answer_description, "correctAnswerDescription")?,
    wrong_answers: [
      field(r.wrong_answer1, "wrongAnswer1")?,
      field(r.wrong_answer2, "wrongAnswer2")?,
      field(r.wrong_answer3, "wrongAnswer3")?,
    ],
  };
  check_distinct_answers(index, &q)?;
  Ok(q)
}

/// The four options must be pairwise different (compared trimmed), or a slot
/// other than the correct one would carry the correct label.
fn check_distinct_answers(index: usize, q: &Question) -> Result<(), LoadError> {
  const NAMES: [&str; 4] = ["correctAnswer", "wrongAnswer1", "wrongAnswer2", "wrongAnswer3"];
  let answers = [&q.correct_answer, &q.wrong_answers[0], &q.wrong_answers[1], &q.wrong_answers[2]];
  for later in 1..answers.len() {
    for earlier in 0..later {
      if answers[earlier].trim() == answers[later].trim() {
        return Err(LoadError::Malformed {
          reason: format!(
            "question {index}: field '{}' duplicates '{}'",
            NAMES[later], NAMES[earlier]
          ),
        });
      }
    }
  }
  Ok(())
}
