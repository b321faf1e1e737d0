// tests/registry_tests.rs
mod common;

use common::*;
use pasar_flow::{ContextData, FlowError, Flows, Pipeline, PipelineControl, PipelineResult, StepKind};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct ReserveContext {
  val: String,
}
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct RefundContext {
  num: i32,
}

#[tokio::test]
async fn test_registry_runs_pipeline_for_context_type() {
  setup_tracing();
  let flows = Flows::<TestError>::new();

  let mut reserve = Pipeline::<ReserveContext, TestError>::new(&[("reserve", StepKind::Required, None)]);
  reserve
    .on_root("reserve", |ctx: ContextData<ReserveContext>| {
      Box::pin(async move {
        ctx.write().val = "reserved".to_string();
        Ok::<PipelineControl, FlowError>(PipelineControl::Continue)
      })
    })
    .unwrap();
  flows.register_pipeline(reserve);

  let mut refund = Pipeline::<RefundContext, TestError>::new(&[("refund", StepKind::Required, None)]);
  refund
    .on_root("refund", |ctx: ContextData<RefundContext>| {
      Box::pin(async move {
        ctx.write().num = 100;
        Ok::<PipelineControl, FlowError>(PipelineControl::Continue)
      })
    })
    .unwrap();
  flows.register_pipeline(refund);

  assert!(flows.is_registered::<ReserveContext>());
  assert_eq!(flows.step_count::<RefundContext>(), Some(1));

  let reserve_ctx = ContextData::new(ReserveContext::default());
  assert_eq!(flows.run(reserve_ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(reserve_ctx.read().val, "reserved");

  let refund_ctx = ContextData::new(RefundContext::default());
  assert_eq!(flows.run(refund_ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(refund_ctx.read().num, 100);
}

#[tokio::test]
async fn test_registry_pipeline_not_registered() {
  setup_tracing();
  let flows = Flows::<TestError>::new();

  #[derive(Clone, Debug, Default)]
  struct UnregisteredContext;

  let result = flows.run(ContextData::new(UnregisteredContext)).await;
  match result {
    Err(TestError::Flow(s)) => {
      assert!(s.contains("PipelineNotRegistered"));
      assert!(s.contains("UnregisteredContext"));
    }
    other => panic!("Expected PipelineNotRegistered, got {:?}", other),
  }
}

#[tokio::test]
async fn test_registry_surfaces_pipeline_errors() {
  setup_tracing();
  let flows = Flows::<TestError>::new();

  let mut failing = Pipeline::<ReserveContext, TestError>::new(&[("reserve", StepKind::Required, None)]);
  failing
    .on_root("reserve", |_ctx: ContextData<ReserveContext>| {
      Box::pin(async move { Err(TestError::Handler("out of stock".to_string())) })
    })
    .unwrap();
  flows.register_pipeline(failing);

  let result = flows.run(ContextData::new(ReserveContext::default())).await;
  assert_eq!(result.unwrap_err(), TestError::Handler("out of stock".to_string()));
}

#[tokio::test]
async fn test_registering_twice_replaces_pipeline() {
  setup_tracing();
  let flows = Flows::<FlowError>::default();

  let first = Pipeline::<RefundContext, FlowError>::new(&[("a", StepKind::Optional, None)]);
  flows.register_pipeline(first);
  let mut second =
    Pipeline::<RefundContext, FlowError>::new(&[("a", StepKind::Required, None), ("b", StepKind::Optional, None)]);
  second
    .on_root("a", |ctx: ContextData<RefundContext>| {
      Box::pin(async move {
        ctx.write().num += 1;
        Ok::<_, FlowError>(PipelineControl::Continue)
      })
    })
    .unwrap();
  flows.register_pipeline(second);

  assert_eq!(flows.step_count::<RefundContext>(), Some(2));
  let ctx = ContextData::new(RefundContext::default());
  flows.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().num, 1);
}
