// pasar-flow/src/core/step.rs

//! Step definitions.

use super::ContextData;
use std::sync::Arc;

/// Evaluated before a step runs; `true` skips the step.
pub type SkipCondition<TData> = Arc<dyn Fn(ContextData<TData>) -> bool + Send + Sync + 'static>;

/// How a step treats missing handlers and handler failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
  /// Must have at least one handler. Errors abort the run.
  Required,
  /// May have no handlers. Errors abort the run.
  Optional,
  /// May have no handlers. Errors are logged and the run continues.
  BestEffort,
}

impl StepKind {
  pub fn allows_missing_handlers(self) -> bool {
    !matches!(self, StepKind::Required)
  }

  pub fn swallows_errors(self) -> bool {
    matches!(self, StepKind::BestEffort)
  }
}

#[derive(Clone)]
pub struct StepDef<T: 'static + Send + Sync> {
  pub name: String,
  pub kind: StepKind,
  pub skip_if: Option<SkipCondition<T>>,
}

impl<T: 'static + Send + Sync> std::fmt::Debug for StepDef<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef")
      .field("name", &self.name)
      .field("kind", &self.kind)
      .field("skip_if_present", &self.skip_if.is_some())
      .finish()
  }
}
