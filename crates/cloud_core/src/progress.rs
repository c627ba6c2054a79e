//! Cooperative progress reporting and cancellation.
//!
//! Long operations (octree construction, cell fusion, mesh smoothing) call
//! [`ProgressSink::advance`] after each bounded unit of work. Returning
//! `false` requests cancellation; the operation stops at that checkpoint and
//! keeps whatever it has already committed.
//!
//! # Usage
//!
//! ```ignore
//! use cloud_core::progress::{CancelToken, ProgressSink};
//!
//! let token = CancelToken::new();
//! let remote = token.clone();
//! // another thread: remote.cancel();
//! let result = fuse_cells(&octree, &cloud, &params, Some(&mut token.clone()));
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Receiver of progress notifications.
pub trait ProgressSink {
  /// Called once before the first step.
  fn start(&mut self) {}

  /// Human readable description of the running operation.
  fn set_info(&mut self, _info: &str) {}

  /// One unit of work is done. Returns `false` to request cancellation.
  fn advance(&mut self) -> bool;
}

/// The unit sink never cancels.
impl ProgressSink for () {
  fn advance(&mut self) -> bool {
    true
  }
}

impl<S: ProgressSink + ?Sized> ProgressSink for &mut S {
  fn start(&mut self) {
    (**self).start()
  }

  fn set_info(&mut self, info: &str) {
    (**self).set_info(info)
  }

  fn advance(&mut self) -> bool {
    (**self).advance()
  }
}

/// Shareable cancellation flag.
///
/// Clones share the flag, so one clone can be handed to the running operation
/// while another stays with the caller (or another thread) to trip it.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
  cancelled: Arc<AtomicBool>,
  steps: u64,
}

impl CancelToken {
  pub fn new() -> Self {
    Self::default()
  }

  /// Request cancellation at the next checkpoint.
  pub fn cancel(&self) {
    self.cancelled.store(true, Ordering::Relaxed);
  }

  pub fn is_cancelled(&self) -> bool {
    self.cancelled.load(Ordering::Relaxed)
  }

  /// Steps observed by this clone.
  pub fn steps(&self) -> u64 {
    self.steps
  }
}

impl ProgressSink for CancelToken {
  fn advance(&mut self) -> bool {
    self.steps += 1;
    !self.is_cancelled()
  }
}

/// Sink that cancels once a fixed number of steps has been reached.
#[derive(Clone, Copy, Debug)]
pub struct StepLimit {
  remaining: u64,
}

impl StepLimit {
  pub fn new(steps: u64) -> Self {
    Self { remaining: steps }
  }
}

impl ProgressSink for StepLimit {
  fn advance(&mut self) -> bool {
    if self.remaining == 0 {
      return false;
    }
    self.remaining -= 1;
    true
  }
}

/// Maps a known number of steps onto percentage notifications.
///
/// The inner sink's `advance` is only forwarded when the integer percentage
/// changes, which keeps chatty loops cheap. Cancellation is still checked on
/// every forwarded step.
pub struct NormalizedProgress<'a> {
  sink: &'a mut dyn ProgressSink,
  total: u64,
  done: u64,
  percent: u64,
}

impl<'a> NormalizedProgress<'a> {
  pub fn new(sink: &'a mut dyn ProgressSink, total: u64) -> Self {
    Self {
      sink,
      total: total.max(1),
      done: 0,
      percent: 0,
    }
  }

  /// Current completion in percent (0..=100).
  pub fn percent(&self) -> u64 {
    self.percent
  }

  /// Record one step. Returns `false` when cancellation was requested.
  pub fn one_step(&mut self) -> bool {
    self.steps(1)
  }

  /// Record `count` steps at once.
  pub fn steps(&mut self, count: u64) -> bool {
    self.done = (self.done + count).min(self.total);
    let percent = self.done * 100 / self.total;
    if percent == self.percent {
      return true;
    }
    self.percent = percent;
    self.sink.advance()
  }
}

/// Optional-sink helper: advance when a sink is present.
#[inline]
pub(crate) fn advance(progress: &mut Option<&mut dyn ProgressSink>) -> bool {
  match progress {
    Some(sink) => sink.advance(),
    None => true,
  }
}

#[cfg(test)]
#[path = "progress_test.rs"]
mod progress_test;
