// core/src/core/handler.rs

//! The boxed handler type stored for every `before`/`on`/`after` hook.

use crate::core::context_data::ContextData;
use crate::core::control::PipelineControl;
use std::future::Future;
use std::pin::Pin;

/// A pipeline step handler.
///
/// It receives a clone of the run's `ContextData<TData>` (a cheap `Arc` clone)
/// and resolves to the control signal for the pipeline, or the pipeline's
/// error type `Err`.
///
/// Handlers must drop any lock guard taken on the context before awaiting.
pub type Handler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send>>
    + Send
    + Sync,
>;
