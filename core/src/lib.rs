// pasar-flow/src/lib.rs

//! pasar-flow: asynchronous step pipelines for business workflows.
//!
//! A pipeline is an ordered list of named steps. Each step may carry
//! `before`, `on` and `after` handlers that receive a shared [`ContextData`]
//! and return a [`PipelineControl`] signal. Steps come in three kinds:
//!
//!  - [`StepKind::Required`]: must have handlers; a handler error aborts the run.
//!  - [`StepKind::Optional`]: may have no handlers; a handler error still aborts.
//!  - [`StepKind::BestEffort`]: handler errors are logged and swallowed, the run
//!    carries on. Used for compensating actions that run after a primary state
//!    change has already been committed.
//!
//! The [`Flows`] registry stores one pipeline per context data type and
//! dispatches runs by type.

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context::Handler;
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::step::{SkipCondition, StepDef, StepKind};

pub use crate::pipeline::definition::Pipeline;

pub use crate::error::{FlowError, FlowResult};

pub use crate::registry::Flows;
