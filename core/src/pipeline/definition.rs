// pasar-flow/src/pipeline/definition.rs

use crate::core::context::Handler;
use crate::core::step::{SkipCondition, StepDef, StepKind};
use crate::error::{FlowError, FlowResult};
use std::collections::HashMap;

/// An ordered set of named steps over a root data type `TData`, whose handlers
/// fail with `Err`.
///
/// `Err` must be constructible from [`FlowError`] so that engine-level failures
/// (a required step without handlers, for example) surface through the same
/// error type the handlers use.
pub struct Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) steps: Vec<StepDef<TData>>,
  pub(crate) before: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) on: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) after: HashMap<String, Vec<Handler<TData, Err>>>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Creates a pipeline from `(name, kind, skip_if)` tuples.
  ///
  /// Duplicate names keep the first definition only; hooks registered for that
  /// name attach to it.
  pub fn new(step_defs: &[(&str, StepKind, Option<SkipCondition<TData>>)]) -> Self {
    let mut steps: Vec<StepDef<TData>> = Vec::with_capacity(step_defs.len());
    for (name, kind, skip_if) in step_defs {
      if steps.iter().any(|s| s.name == *name) {
        tracing::warn!(step_name = %name, "Duplicate step definition ignored.");
        continue;
      }
      steps.push(StepDef {
        name: (*name).to_string(),
        kind: *kind,
        skip_if: skip_if.clone(),
      });
    }

    Self {
      steps,
      before: HashMap::new(),
      on: HashMap::new(),
      after: HashMap::new(),
    }
  }

  /// Appends a step at the end of the pipeline.
  pub fn push_step(&mut self, name: &str, kind: StepKind, skip_if: Option<SkipCondition<TData>>) -> FlowResult<()> {
    if self.steps.iter().any(|s| s.name == name) {
      return Err(FlowError::DuplicateStep {
        step_name: name.to_string(),
      });
    }
    self.steps.push(StepDef {
      name: name.to_string(),
      kind,
      skip_if,
    });
    Ok(())
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  pub fn step_kind(&self, step_name: &str) -> Option<StepKind> {
    self.steps.iter().find(|s| s.name == step_name).map(|s| s.kind)
  }

  pub(crate) fn ensure_step_exists(&self, step_name: &str) -> FlowResult<()> {
    if self.steps.iter().any(|s| s.name == step_name) {
      Ok(())
    } else {
      Err(FlowError::StepNotFound {
        step_name: step_name.to_string(),
      })
    }
  }
}
