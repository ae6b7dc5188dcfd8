// core/src/lib.rs

//! Orka: an async, type-safe step pipeline engine.
//!
//! A pipeline is an ordered list of named steps over a shared context
//! (`ContextData<TData>`). Each step can carry `before`, `on` and `after`
//! handlers; any handler may stop the run early or fail it with the
//! pipeline's error type. The `Orka` registry keys pipelines by their context
//! type so callers only need to build a context and call `run`/`run_within`.
//!
//! The marketplace checkout, shipping-quote and order-read workflows are all
//! expressed as Orka pipelines.

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::handler::Handler;
pub use crate::core::step::{SkipCondition, StepDef};

pub use crate::pipeline::definition::Pipeline;

pub use crate::error::OrkaError;

pub use crate::registry::Orka;

/*
    Core workflow:
    1. Define a context struct `MyCtx` for the process.
    2. Create a `Pipeline<MyCtx, MyError>` with its step list.
    3. Attach async handlers with `.before_root()`, `.on_root()`, `.after_root()`.
    4. Register the pipeline with an `Orka<MyError>` registry.
    5. Wrap a `MyCtx` in `ContextData::new` and call `orka.run(ctx.clone()).await`
       (or `run_within` to bound the run by a deadline), then read results
       back out of the same `ContextData`.
*/
