// core/src/registry.rs

//! `Orka<E>`: a registry of pipelines keyed by their context data type.
//! Pipelines are `Pipeline<TData, HandlerErr>`; the registry reports results
//! with the application-level error type `E`.

use crate::core::context_data::ContextData;
use crate::core::control::PipelineResult;
use crate::error::OrkaError;
use crate::pipeline::definition::Pipeline;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::{event, instrument, Level};

/// Type-erased runner so pipelines over different `TData` share one map.
#[async_trait]
trait AnyPipelineRunner<AppErr>: Send + Sync
where
  AppErr: std::error::Error + Send + Sync + 'static,
{
  /// `ctx_obj` must hold a `ContextData<TData>` for the wrapped pipeline.
  async fn run_erased(&self, ctx_obj: Box<dyn Any + Send>) -> Result<PipelineResult, AppErr>;
}

struct PipelineRunner<TData, HandlerErr, AppErr>
where
  TData: 'static + Send + Sync,
  HandlerErr: std::error::Error + From<OrkaError> + Send + Sync + 'static,
  AppErr: std::error::Error + From<HandlerErr> + From<OrkaError> + Send + Sync + 'static,
{
  pipeline: Arc<Pipeline<TData, HandlerErr>>,
  _phantom: PhantomData<fn() -> AppErr>,
}

#[async_trait]
impl<TData, HandlerErr, AppErr> AnyPipelineRunner<AppErr> for PipelineRunner<TData, HandlerErr, AppErr>
where
  TData: 'static + Send + Sync,
  HandlerErr: std::error::Error + From<OrkaError> + Send + Sync + 'static,
  AppErr: std::error::Error + From<HandlerErr> + From<OrkaError> + Send + Sync + 'static,
{
  async fn run_erased(&self, ctx_obj: Box<dyn Any + Send>) -> Result<PipelineResult, AppErr> {
    let typed_ctx = match ctx_obj.downcast::<ContextData<TData>>() {
      Ok(boxed) => *boxed,
      Err(_) => {
        let expected_type = std::any::type_name::<ContextData<TData>>().to_string();
        event!(Level::ERROR, %expected_type, "Context object type mismatch.");
        return Err(AppErr::from(OrkaError::TypeMismatch { expected_type }));
      }
    };
    self.pipeline.run(typed_ctx).await.map_err(AppErr::from)
  }
}

/// The Orka registry.
///
/// One pipeline per context data type. Registration happens at startup;
/// runs only take a read lock on the map to clone the runner out.
pub struct Orka<AppErr = OrkaError>
where
  AppErr: std::error::Error + From<OrkaError> + Send + Sync + 'static,
{
  registry: RwLock<HashMap<TypeId, Arc<dyn AnyPipelineRunner<AppErr>>>>,
}

impl<AppErr> Default for Orka<AppErr>
where
  AppErr: std::error::Error + From<OrkaError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<AppErr> Orka<AppErr>
where
  AppErr: std::error::Error + From<OrkaError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      registry: RwLock::new(HashMap::new()),
    }
  }

  /// Registers `pipeline` for its context type `TData`, replacing any
  /// pipeline previously registered for that type.
  pub fn register_pipeline<TData, HandlerErr>(&self, pipeline: Pipeline<TData, HandlerErr>)
  where
    TData: 'static + Send + Sync,
    HandlerErr: std::error::Error + From<OrkaError> + Send + Sync + 'static,
    AppErr: From<HandlerErr>,
  {
    event!(
      Level::DEBUG,
      tdata_type = %std::any::type_name::<TData>(),
      steps = ?pipeline.step_names(),
      "Registering pipeline."
    );
    let runner = PipelineRunner::<TData, HandlerErr, AppErr> {
      pipeline: Arc::new(pipeline),
      _phantom: PhantomData,
    };
    self.registry.write().insert(TypeId::of::<TData>(), Arc::new(runner));
  }

  pub fn is_registered<TData: 'static>(&self) -> bool {
    self.registry.read().contains_key(&TypeId::of::<TData>())
  }

  /// Runs the pipeline registered for `TData`.
  pub async fn run<TData>(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, AppErr>
  where
    TData: 'static + Send + Sync,
  {
    let runner = self.runner_for::<TData>()?;
    runner.run_erased(Box::new(ctx_data)).await
  }

  /// Like `run`, but abandons the run once `limit` elapses.
  ///
  /// The in-flight handler future is dropped at the deadline, so resources it
  /// owns (an open database transaction, for instance) are released by their
  /// `Drop` impls instead of being committed.
  #[instrument(
    name = "Orka::run_within",
    skip(self, ctx_data),
    fields(tdata_type = %std::any::type_name::<TData>())
  )]
  pub async fn run_within<TData>(&self, ctx_data: ContextData<TData>, limit: Duration) -> Result<PipelineResult, AppErr>
  where
    TData: 'static + Send + Sync,
  {
    match tokio::time::timeout(limit, self.run(ctx_data)).await {
      Ok(result) => result,
      Err(_elapsed) => {
        event!(Level::WARN, ?limit, "Pipeline run exceeded its deadline.");
        Err(AppErr::from(OrkaError::DeadlineExceeded {
          context_type: std::any::type_name::<TData>().to_string(),
          limit,
        }))
      }
    }
  }

  fn runner_for<TData: 'static>(&self) -> Result<Arc<dyn AnyPipelineRunner<AppErr>>, AppErr> {
    self.registry.read().get(&TypeId::of::<TData>()).cloned().ok_or_else(|| {
      let type_name = std::any::type_name::<TData>();
      event!(Level::ERROR, "No pipeline registered for TData type {}.", type_name);
      AppErr::from(OrkaError::ConfigurationError {
        step_name: "Orka::run".to_string(),
        message: format!("No pipeline registered for TData type {}", type_name),
      })
    })
  }
}
