// tests/context_management_tests.rs
mod common;

use common::*;
use pasar_flow::{ContextData, FlowError, Pipeline, PipelineControl, StepKind};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn test_context_data_is_shared_between_steps() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[
    ("step1_modify", StepKind::Required, None),
    ("step2_read_modify", StepKind::Required, None),
  ]);

  pipeline
    .on_root("step1_modify", |ctx: ContextData<TestContext>| {
      Box::pin(async move {
        let mut guard = ctx.write();
        guard.counter = 10;
        guard.message = "SetByStep1".to_string();
        Ok::<PipelineControl, FlowError>(PipelineControl::Continue)
      })
    })
    .unwrap();

  pipeline
    .on_root("step2_read_modify", |ctx: ContextData<TestContext>| {
      Box::pin(async move {
        let (counter, message) = {
          let guard = ctx.read();
          (guard.counter, guard.message.clone())
        };
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        let mut guard = ctx.write();
        guard.counter = counter + 5;
        guard.message = format!("{}_ThenStep2", message);
        Ok::<PipelineControl, FlowError>(PipelineControl::Continue)
      })
    })
    .unwrap();

  let ctx = ContextData::new(TestContext::default());
  pipeline.run(ctx.clone()).await.unwrap();

  let guard = ctx.read();
  assert_eq!(guard.counter, 15);
  assert_eq!(guard.message, "SetByStep1_ThenStep2");
}

#[tokio::test]
#[serial]
async fn test_context_data_clone_shares_data() {
  setup_tracing();
  let original_ctx = ContextData::new(TestContext {
    counter: 1,
    ..Default::default()
  });
  let cloned_ctx = original_ctx.clone();

  original_ctx.write().counter = 5;
  assert_eq!(cloned_ctx.read().counter, 5);

  cloned_ctx.write().counter = 10;
  assert_eq!(original_ctx.snapshot().counter, 10);
}
