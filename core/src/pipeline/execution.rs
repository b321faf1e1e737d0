// pasar-flow/src/pipeline/execution.rs

//! `Pipeline::run()`.

use crate::core::context::Handler;
use crate::core::context_data::ContextData;
use crate::core::control::{PipelineControl, PipelineResult};
use crate::error::FlowError;
use crate::pipeline::definition::Pipeline;
use tracing::{event, instrument, Instrument, Level};

/// How one step ended.
enum StepOutcome {
  Finished,
  Stopped,
  /// A best-effort step failed; the error was logged and dropped.
  Swallowed,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Runs every step in order against `ctx_data`.
  ///
  /// Errors from `Required` and `Optional` steps abort the run and are returned.
  /// Errors from `BestEffort` steps are logged at WARN and the run moves on to
  /// the next step.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(
      context_type = %std::any::type_name::<TData>(),
      num_steps = self.steps.len(),
    ),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    event!(Level::DEBUG, "Pipeline execution starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();
      let step_span = tracing::info_span!(
        "pipeline_step_execution",
        step_name = step_name,
        step_index = step_idx,
        kind = ?step_def.kind
      );

      if let Some(skip_cond) = &step_def.skip_if {
        if skip_cond(ctx_data.clone()) {
          step_span.in_scope(|| event!(Level::DEBUG, "Step skipped by its skip condition."));
          continue;
        }
      }

      let phases = [
        ("before", self.before.get(step_name)),
        ("on", self.on.get(step_name)),
        ("after", self.after.get(step_name)),
      ];
      let has_handlers = phases.iter().any(|(_, h)| h.is_some_and(|v| !v.is_empty()));
      if !has_handlers {
        if step_def.kind.allows_missing_handlers() {
          step_span.in_scope(|| event!(Level::DEBUG, "Step has no handlers, skipping."));
          continue;
        }
        step_span.in_scope(|| event!(Level::ERROR, "Required step has no handlers."));
        return Err(Err::from(FlowError::HandlerMissing {
          step_name: step_def.name.clone(),
        }));
      }

      let outcome = async {
        for (phase_name, handlers) in phases {
          let Some(handlers) = handlers else { continue };
          match run_phase(phase_name, handlers, &ctx_data).await {
            Ok(PipelineControl::Continue) => {}
            Ok(PipelineControl::Stop) => {
              event!(Level::INFO, phase = phase_name, "Pipeline stopped by a handler.");
              return Ok(StepOutcome::Stopped);
            }
            Err(e) if step_def.kind.swallows_errors() => {
              event!(Level::WARN, phase = phase_name, error = %e, "Best-effort step failed; continuing.");
              return Ok(StepOutcome::Swallowed);
            }
            Err(e) => {
              event!(Level::ERROR, phase = phase_name, error = %e, "Step handler failed.");
              return Err(e);
            }
          }
        }
        Ok(StepOutcome::Finished)
      }
      .instrument(step_span)
      .await?;

      match outcome {
        StepOutcome::Stopped => return Ok(PipelineResult::Stopped),
        StepOutcome::Finished | StepOutcome::Swallowed => {}
      }
    }

    event!(Level::DEBUG, "Pipeline execution completed.");
    Ok(PipelineResult::Completed)
  }
}

async fn run_phase<TData, Err>(
  phase_name: &'static str,
  handlers: &[Handler<TData, Err>],
  ctx_data: &ContextData<TData>,
) -> Result<PipelineControl, Err>
where
  TData: 'static + Send + Sync,
{
  for (handler_idx, handler_fn) in handlers.iter().enumerate() {
    let handler_span = tracing::debug_span!("step_handler", phase = phase_name, handler_index = handler_idx);
    let control = handler_fn(ctx_data.clone()).instrument(handler_span).await?;
    if control == PipelineControl::Stop {
      return Ok(PipelineControl::Stop);
    }
  }
  Ok(PipelineControl::Continue)
}
