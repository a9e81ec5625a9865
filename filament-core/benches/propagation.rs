//! Propagation benchmarks for the reactive runtime
//!
//! Measures signal fan-out, batched writes and keyed list reconciliation
//! against the headless document.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use filament_core::{
    batch, for_each, h, props, render, Computed, Document, Effect, ElementType, Result, Signal,
    Value,
};

fn fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("fan_out");
    for observers in [1usize, 16, 256] {
        group.throughput(Throughput::Elements(observers as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(observers),
            &observers,
            |b, &observers| {
                let source = Signal::new(0i64);
                let effects: Vec<Effect> = (0..observers)
                    .map(|_| {
                        let reader = source.clone();
                        Effect::new(move || {
                            black_box(reader.get());
                        })
                        .unwrap()
                    })
                    .collect();

                let mut next = 0;
                b.iter(|| {
                    next += 1;
                    source.set(next).unwrap();
                });
                drop(effects);
            },
        );
    }
    group.finish();
}

fn batched_writes(c: &mut Criterion) {
    c.bench_function("batch_of_32_writes", |b| {
        let signals: Vec<Signal<i64>> = (0..32).map(Signal::new).collect();
        let readers = signals.clone();
        let total = Computed::new(move || readers.iter().map(Signal::get).sum::<i64>());
        let watched = total.clone();
        let _effect = Effect::new(move || {
            black_box(watched.get().unwrap_or_default());
        })
        .unwrap();

        b.iter(|| {
            batch(|| {
                for signal in &signals {
                    signal.update(|value| value + 1)?;
                }
                Ok(())
            })
            .unwrap();
        });
    });
}

fn keyed_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("keyed_list_rotate");
    for len in [10usize, 100, 1000] {
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            let document = Document::install().unwrap();
            let mut keys: Vec<Value> = (0..len).map(|i| Value::from(i as f64)).collect();
            let items = Signal::new(Value::list(keys.clone()));

            let view = h(
                "ul",
                props! {},
                vec![h(
                    ElementType::component(for_each),
                    props! { "each" => &items },
                    vec![Value::callback(|args: &[Value]| -> Result<Value> {
                        Ok(h("li", props! { "key" => args[0].clone() }, vec![args[0].clone()]))
                    })],
                )],
            );
            render(&view, Some(&document.body())).unwrap();

            b.iter(|| {
                keys.rotate_left(1);
                items.set(Value::list(keys.clone())).unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, fan_out, batched_writes, keyed_list);
criterion_main!(benches);
