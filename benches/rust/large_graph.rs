//! Large Graph Benchmark
//!
//! Generation passes over graphs with many mixed operations (N >= 300):
//! recording, scheduling with and without chain flattening, rendering and
//! numeric replay.

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use symb_codegen::{
    CLanguage, CodeHandler, DefaultNameGenerator, DefaultPolicy, SlotEvaluator, Symbolic,
};

// =============================================================================
// Graph Generator
// =============================================================================

/// Records a mixed model with `n` terms over `k` independents.
///
/// Terms share sub-expressions so that every pass has temporaries to place.
fn record_mixed(handler: &CodeHandler<f64>, n: usize, k: usize) -> Vec<Symbolic<f64>> {
    let x = handler.make_variables(k);
    let mut acc = Symbolic::Parameter(0.0);
    let mut outputs = Vec::new();
    for i in 1..=n {
        let a = &x[i % k];
        let b = &x[(i * 7 + 3) % k];
        let term = match i % 5 {
            // polynomial
            0 => a * b * (i as f64) - b,
            // trig
            1 => (a * (i as f64)).sin() * b.cos(),
            // exponential and log
            2 => (a / (i as f64)).exp() + (b + (i as f64)).log(),
            // rational
            3 => (a * a + (i as f64)) / (b + (i as f64)),
            // nested, shared
            _ => {
                let s = (a.exp() + (i as f64)).sin();
                &s * &s - s
            }
        };
        acc = if i % 3 == 1 { acc - term } else { acc + term };
        if i % 50 == 0 {
            outputs.push(acc.clone());
        }
    }
    outputs.push(acc);
    outputs
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_large_graphs(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_graph_300");
    group.sample_size(20);

    let n = 300;
    let k = 8;

    group.bench_function("record", |b| {
        b.iter(|| {
            let handler = CodeHandler::<f64>::with_capacity(n * 8);
            black_box(record_mixed(&handler, n, k))
        })
    });

    let names = DefaultNameGenerator::default();
    for (label, optimize) in [("plain", false), ("optimized", true)] {
        let handler = CodeHandler::<f64>::with_capacity(n * 8).with_optimize(optimize);
        let outputs = record_mixed(&handler, n, k);

        group.bench_function(format!("generate/{label}"), |b| {
            b.iter(|| {
                let data = handler
                    .generate(black_box(&outputs), &DefaultPolicy, &names)
                    .unwrap();
                black_box(data.variable_order().len())
            })
        });

        group.bench_function(format!("render_c/{label}"), |b| {
            b.iter(|| {
                handler
                    .generate_code(black_box(&outputs), &CLanguage::default(), &names, "bench")
                    .unwrap()
            })
        });
    }

    let handler = CodeHandler::<f64>::with_capacity(n * 8);
    let outputs = record_mixed(&handler, n, k);
    let data = handler.generate(&outputs, &DefaultPolicy, &names).unwrap();
    let eval = SlotEvaluator::compile(&data).unwrap();
    drop(data);

    let inputs: Vec<f64> = (0..k).map(|i| 0.1 + i as f64 * 0.05).collect();
    group.bench_function("evaluate", |b| {
        b.iter(|| eval.evaluate(black_box(&inputs)).unwrap())
    });

    let columns: Vec<Vec<f64>> = (0..k)
        .map(|i| (0..1000).map(|p| 0.1 + (i * p) as f64 * 1e-4).collect())
        .collect();
    let column_refs: Vec<&[f64]> = columns.iter().map(Vec::as_slice).collect();
    group.bench_function("eval_batch_1000", |b| {
        b.iter_batched(
            || column_refs.clone(),
            |cols| eval.eval_batch(&cols).unwrap(),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_large_graphs);

criterion_main!(benches);
