// marketplace/src/web/handlers/mod.rs

pub mod order_handlers;
pub mod policy_handlers;
pub mod shipping_handlers;

use orka::{ContextData, PipelineResult};

use crate::errors::AppError;
use crate::state::AppState;

/// Runs the pipeline registered for `T`, bounded by the request timeout.
/// A run halted by a handler is treated as a server error.
pub(crate) async fn run_workflow<T>(app_state: &AppState, ctx_data: ContextData<T>) -> Result<(), AppError>
where
  T: Send + Sync + 'static,
{
  match app_state
    .orka_instance
    .run_within(ctx_data, app_state.config.request_timeout)
    .await?
  {
    PipelineResult::Completed => Ok(()),
    PipelineResult::Stopped => Err(AppError::Internal(format!(
      "Workflow for {} was halted before completing.",
      std::any::type_name::<T>()
    ))),
  }
}
