use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pasar_flow::{ContextData, FlowError, Flows, Pipeline, PipelineControl, SkipCondition, StepKind};
use std::sync::Arc;
use tokio::runtime::Runtime;

#[derive(Clone, Debug, Default)]
struct BenchContext {
  counter: u64,
  compensations: u64,
}

type BenchError = FlowError;
type StepDefs = Vec<(&'static str, StepKind, Option<SkipCondition<BenchContext>>)>;

fn create_increment_handler(iterations: u64) -> pasar_flow::Handler<BenchContext, BenchError> {
  Box::new(move |ctx: ContextData<BenchContext>| {
    Box::pin(async move {
      let mut data = ctx.write();
      for _ in 0..iterations {
        data.counter = data.counter.wrapping_add(1);
      }
      Ok(PipelineControl::Continue)
    })
  })
}

fn create_failing_compensation() -> pasar_flow::Handler<BenchContext, BenchError> {
  Box::new(move |ctx: ContextData<BenchContext>| {
    Box::pin(async move {
      ctx.write().compensations += 1;
      Err(FlowError::Internal("compensation failed".to_string()))
    })
  })
}

fn step_names(count: usize) -> Vec<&'static str> {
  (0..count)
    .map(|i| Box::leak(format!("step_{}", i).into_boxed_str()) as &'static str)
    .collect()
}

fn bench_required_steps(c: &mut Criterion) {
  let mut group = c.benchmark_group("RequiredSteps");
  let rt = Runtime::new().unwrap();

  for num_steps in [1usize, 5, 10] {
    for handler_iterations in [1u64, 100] {
      let names = step_names(num_steps);
      let defs: StepDefs = names.iter().map(|n| (*n, StepKind::Required, None)).collect();
      let mut pipeline = Pipeline::<BenchContext, BenchError>::new(&defs);
      for name in &names {
        pipeline.on_root(name, create_increment_handler(handler_iterations)).unwrap();
      }
      let pipeline = Arc::new(pipeline);

      group.throughput(Throughput::Elements(num_steps as u64 * handler_iterations));
      group.bench_with_input(
        BenchmarkId::new(format!("{}steps", num_steps), handler_iterations),
        &handler_iterations,
        |b, _| {
          b.to_async(&rt).iter_batched(
            || ContextData::new(BenchContext::default()),
            |ctx| {
              let pipeline = pipeline.clone();
              async move { pipeline.run(ctx).await.unwrap() }
            },
            criterion::BatchSize::SmallInput,
          );
        },
      );
    }
  }
  group.finish();
}

fn bench_best_effort_failures(c: &mut Criterion) {
  let mut group = c.benchmark_group("BestEffortFailures");
  let rt = Runtime::new().unwrap();

  for failing_steps in [1usize, 5] {
    let names = step_names(failing_steps);
    let defs: StepDefs = names.iter().map(|n| (*n, StepKind::BestEffort, None)).collect();
    let mut pipeline = Pipeline::<BenchContext, BenchError>::new(&defs);
    for name in &names {
      pipeline.on_root(name, create_failing_compensation()).unwrap();
    }
    let pipeline = Arc::new(pipeline);

    group.bench_with_input(BenchmarkId::from_parameter(failing_steps), &failing_steps, |b, _| {
      b.to_async(&rt).iter_batched(
        || ContextData::new(BenchContext::default()),
        |ctx| {
          let pipeline = pipeline.clone();
          async move { pipeline.run(ctx).await.unwrap() }
        },
        criterion::BatchSize::SmallInput,
      );
    });
  }
  group.finish();
}

fn bench_registry_dispatch(c: &mut Criterion) {
  let rt = Runtime::new().unwrap();
  let flows = Arc::new(Flows::<BenchError>::new());
  let mut pipeline = Pipeline::<BenchContext, BenchError>::new(&[("only", StepKind::Required, None)]);
  pipeline.on_root("only", create_increment_handler(1)).unwrap();
  flows.register_pipeline(pipeline);

  c.bench_function("RegistryDispatch", |b| {
    b.to_async(&rt).iter_batched(
      || ContextData::new(BenchContext::default()),
      |ctx| {
        let flows = flows.clone();
        async move { flows.run(ctx).await.unwrap() }
      },
      criterion::BatchSize::SmallInput,
    );
  });
}

criterion_group!(benches, bench_required_steps, bench_best_effort_failures, bench_registry_dispatch);
criterion_main!(benches);
