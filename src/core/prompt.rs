//! Value resolution and interactive prompts
//!
//! Values that may be missing from the command line (release index, build
//! index, versions, token) are resolved through an ordered list of sources.
//! Terminal input is behind the [`Prompt`] trait so commands run unattended
//! with [`NoPrompt`] and tests script the answers.

use crate::core::error::{ReleaseResult, SelectionError};
use std::io::{self, BufRead, Write};

/// Source of answers to interactive questions
pub trait Prompt {
  /// Ask a question and return the trimmed answer
  fn ask(&mut self, question: &str) -> ReleaseResult<String>;
}

/// Reads answers from stdin
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
  fn ask(&mut self, question: &str) -> ReleaseResult<String> {
    print!("{}", question);
    io::stdout().flush()?;

    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
      return Err(SelectionError::MissingValue {
        what: question.trim().trim_end_matches(':').to_string(),
      }
      .into());
    }

    Ok(line.trim().to_string())
  }
}

/// Refuses every question; used with `--non-interactive`
pub struct NoPrompt;

impl Prompt for NoPrompt {
  fn ask(&mut self, question: &str) -> ReleaseResult<String> {
    Err(
      SelectionError::MissingValue {
        what: question.trim().trim_end_matches(':').to_string(),
      }
      .into(),
    )
  }
}

/// Print an indexed list and ask for an index into it
pub fn choose_index(prompt: &mut dyn Prompt, what: &str, question: &str, len: usize) -> ReleaseResult<usize> {
  let answer = prompt.ask(question)?;

  match answer.parse::<usize>() {
    Ok(idx) if idx < len => Ok(idx),
    _ => Err(
      SelectionError::InvalidIndex {
        what: what.to_string(),
        input: answer,
      }
      .into(),
    ),
  }
}

/// Where a value may come from
#[derive(Debug, Clone)]
pub enum ValueSource {
  /// Command-line argument (may be absent)
  Explicit(Option<String>),
  /// Environment variable
  Env(String),
  /// Ask the user
  Interactive(String),
}

/// Ordered list of value sources; the first one that yields wins
#[derive(Debug, Clone)]
pub struct Resolver {
  what: String,
  sources: Vec<ValueSource>,
}

impl Resolver {
  pub fn new(what: impl Into<String>) -> Self {
    Self {
      what: what.into(),
      sources: Vec::new(),
    }
  }

  pub fn explicit(mut self, value: Option<String>) -> Self {
    self.sources.push(ValueSource::Explicit(value));
    self
  }

  pub fn env(mut self, key: impl Into<String>) -> Self {
    self.sources.push(ValueSource::Env(key.into()));
    self
  }

  pub fn interactive(mut self, question: impl Into<String>) -> Self {
    self.sources.push(ValueSource::Interactive(question.into()));
    self
  }

  /// Walk the sources in order
  ///
  /// An interactive answer is returned even when empty; callers decide what
  /// an empty answer means.
  pub fn resolve(&self, prompt: &mut dyn Prompt) -> ReleaseResult<Option<String>> {
    for source in &self.sources {
      match source {
        ValueSource::Explicit(Some(value)) => {
          tracing::debug!("{} from command line", self.what);
          return Ok(Some(value.clone()));
        }
        ValueSource::Explicit(None) => {}
        ValueSource::Env(key) => {
          if let Ok(value) = std::env::var(key)
            && !value.is_empty()
          {
            println!("Using {} from environment variable {}.", self.what, key);
            return Ok(Some(value));
          }
        }
        ValueSource::Interactive(question) => {
          return prompt.ask(question).map(Some);
        }
      }
    }

    Ok(None)
  }

  /// Like [`Resolver::resolve`] but a missing or empty value is an error
  pub fn require(&self, prompt: &mut dyn Prompt) -> ReleaseResult<String> {
    match self.resolve(prompt)? {
      Some(value) if !value.is_empty() => Ok(value),
      _ => Err(
        SelectionError::MissingValue {
          what: self.what.clone(),
        }
        .into(),
      ),
    }
  }
}
