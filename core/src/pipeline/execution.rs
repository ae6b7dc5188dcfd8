// core/src/pipeline/execution.rs

//! `Pipeline::run`: walks the steps in order and drives their handlers.

use crate::core::context_data::ContextData;
use crate::core::control::{PipelineControl, PipelineResult};
use crate::core::handler::Handler;
use crate::error::OrkaError;
use crate::pipeline::definition::Pipeline;
use tracing::{event, instrument, span, Instrument, Level};

/// Whether a phase let the step carry on.
enum PhaseOutcome {
  Continue,
  Stopped,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<OrkaError> + Send + Sync + 'static,
{
  /// Executes the pipeline against `ctx_data`.
  ///
  /// Steps run in declaration order. Within a step the `before`, `on` and
  /// `after` handlers run sequentially. The first handler to return `Stop`
  /// ends the run with `PipelineResult::Stopped`; the first error ends it
  /// with that error.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(
      pipeline_context_data_type = %std::any::type_name::<TData>(),
      num_steps = self.steps.len(),
    ),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    event!(Level::DEBUG, "Pipeline execution starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();

      if let Some(skip_if) = &step_def.skip_if {
        if skip_if(ctx_data.clone()) {
          event!(Level::INFO, step_name, "Step skipped due to 'skip_if' condition.");
          continue;
        }
      }

      let has_handlers = [&self.before, &self.on, &self.after]
        .iter()
        .any(|phase| phase.get(step_name).map_or(false, |v| !v.is_empty()));

      if !has_handlers {
        if step_def.optional {
          event!(Level::DEBUG, step_name, "Optional step has no handlers, skipping.");
          continue;
        }
        event!(Level::ERROR, step_name, "Non-optional step has no handlers.");
        return Err(Err::from(OrkaError::HandlerMissing {
          step_name: step_def.name.clone(),
        }));
      }

      let step_span = span!(
        Level::INFO,
        "pipeline_step",
        step_name,
        step_index = step_idx,
        optional = step_def.optional
      );

      let outcome = async {
        for (phase_name, phase) in [("before", &self.before), ("on", &self.on), ("after", &self.after)] {
          if let Some(handlers) = phase.get(step_name) {
            if let PhaseOutcome::Stopped = run_phase(phase_name, handlers, &ctx_data).await? {
              return Ok::<_, Err>(PhaseOutcome::Stopped);
            }
          }
        }
        Ok(PhaseOutcome::Continue)
      }
      .instrument(step_span)
      .await?;

      if let PhaseOutcome::Stopped = outcome {
        return Ok(PipelineResult::Stopped);
      }
    }

    event!(Level::DEBUG, "Pipeline execution completed successfully.");
    Ok(PipelineResult::Completed)
  }
}

async fn run_phase<TData, Err>(
  phase_name: &'static str,
  handlers: &[Handler<TData, Err>],
  ctx_data: &ContextData<TData>,
) -> Result<PhaseOutcome, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + Send + Sync + 'static,
{
  for (handler_idx, handler_fn) in handlers.iter().enumerate() {
    let handler_span = span!(Level::DEBUG, "step_handler", phase = phase_name, handler_index = handler_idx);
    match handler_fn(ctx_data.clone()).instrument(handler_span).await {
      Ok(PipelineControl::Continue) => {}
      Ok(PipelineControl::Stop) => {
        event!(Level::INFO, phase = phase_name, "Pipeline stopped by a handler.");
        return Ok(PhaseOutcome::Stopped);
      }
      Err(e) => {
        event!(Level::ERROR, phase = phase_name, error = %e, "Handler failed.");
        return Err(e);
      }
    }
  }
  Ok(PhaseOutcome::Continue)
}
