//! Progress for per-item network work (pull request lookups, asset uploads)
//!
//! Bars are drawn with `linya` on stderr, and only when stderr is a terminal.
//! Every step is also logged at debug level so `-v` runs in CI show progress.

use linya::{Bar, Progress};
use std::fmt;
use std::io::IsTerminal;

/// Counts steps over a known total, drawing a bar when interactive
pub struct StepProgress {
  bar: Option<(Progress, Bar)>,
  label: String,
  total: usize,
  done: usize,
}

impl StepProgress {
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let label = label.into();
    let bar = (total > 0 && std::io::stderr().is_terminal()).then(|| {
      let mut progress = Progress::new();
      let bar = progress.bar(total, label.clone());
      (progress, bar)
    });

    Self {
      bar,
      label,
      total,
      done: 0,
    }
  }

  /// Mark `item` as finished
  pub fn step(&mut self, item: impl fmt::Display) {
    self.done += 1;
    tracing::debug!("{} {}/{}: {}", self.label, self.done, self.total, item);

    if let Some((progress, bar)) = &mut self.bar {
      progress.inc_and_draw(bar, 1);
    }
  }

  pub fn done(&self) -> usize {
    self.done
  }
}
