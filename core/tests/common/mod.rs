// core/tests/common/mod.rs
#![allow(dead_code)]

use orka::{ContextData, OrkaError, PipelineControl};
use tracing::Level;

/// Context used by the engine tests: a toy checkout that records which
/// handlers ran and accumulates a running total.
#[derive(Clone, Debug, Default)]
pub struct TraceContext {
  pub total_cents: i64,
  pub trail: Vec<String>,
  pub stop_at: Option<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  // OrkaError is not PartialEq, so keep its Debug rendering for assertions.
  #[error("Orka framework error: {0}")]
  Orka(String),

  #[error("Test handler failed: {0}")]
  Handler(String),
}

impl From<OrkaError> for TestError {
  fn from(oe: OrkaError) -> Self {
    TestError::Orka(format!("{:?}", oe))
  }
}

/// Handler that appends `label` to the trail and adds `cents` to the total.
/// Returns `Stop` when `label` matches the context's `stop_at`.
pub fn recording_handler(label: &'static str, cents: i64) -> orka::Handler<TraceContext, TestError> {
  Box::new(move |ctx: ContextData<TraceContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.total_cents += cents;
      guard.trail.push(label.to_string());
      tracing::debug!(target: "test_handlers", step = label, total = guard.total_cents, "handler executed");
      if guard.stop_at.as_deref() == Some(label) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  })
}

pub fn failing_handler(label: &'static str, message: &'static str) -> orka::Handler<TraceContext, TestError> {
  Box::new(move |ctx: ContextData<TraceContext>| {
    Box::pin(async move {
      ctx.write().trail.push(label.to_string());
      tracing::warn!(target: "test_handlers", step = label, "failing with: '{}'", message);
      Err(TestError::Handler(message.to_string()))
    })
  })
}

use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
