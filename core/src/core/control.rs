// core/src/core/control.rs

//! Signals for controlling pipeline flow and the outcome of a run.

/// Returned by each handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineControl {
  /// Carry on with the remaining handlers and steps.
  Continue,
  /// Halt the run now. Nothing after the current handler executes.
  Stop,
}

/// Outcome of a run that did not error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineResult {
  /// Every non-skipped step ran.
  Completed,
  /// A handler returned `PipelineControl::Stop`.
  Stopped,
}
