// core/src/error.rs
use anyhow::Error as AnyhowError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrkaError {
  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Error in user-provided handler or external operation. Source: {source}")]
  HandlerError {
    #[source]
    source: AnyhowError,
  },

  #[error("Configuration error for step '{step_name}': {message}")]
  ConfigurationError { step_name: String, message: String },

  #[error("Type mismatch during context downcast (expected {expected_type})")]
  TypeMismatch { expected_type: String },

  #[error("Pipeline for {context_type} did not finish within {limit:?}")]
  DeadlineExceeded { context_type: String, limit: Duration },

  #[error("Internal Orka error: {0}")]
  Internal(String),
}

impl OrkaError {
  /// True when the run was abandoned because its deadline elapsed.
  pub fn is_deadline_exceeded(&self) -> bool {
    matches!(self, OrkaError::DeadlineExceeded { .. })
  }
}

// Any handler failure surfaced through anyhow lands in HandlerError,
// including an OrkaError that was wrapped by a nested pipeline.
impl From<AnyhowError> for OrkaError {
  fn from(err: AnyhowError) -> Self {
    OrkaError::HandlerError { source: err }
  }
}
