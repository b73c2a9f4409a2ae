#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};

use bb_deciders::deciders::{backward_reasoning, bouncer, cycler, far, halting_segment, translated_cycler, Verdict};
use bb_deciders::tm::simulator::Simulator;
use bb_deciders::tm::transition::TransitionTable;

const WARM_UP_TIME_MS: u64 = 500;
const SAMPLE_SIZE: usize = 20;

criterion_group!(
    benches,
    benchmark_cycler,
    benchmark_translated_cycler,
    benchmark_backward_reasoning,
    benchmark_halting_segment,
    benchmark_bouncer,
    benchmark_far,
);
criterion_main!(benches);

fn machine(text: &str) -> TransitionTable {
    TransitionTable::from_standard_tm_text(text).unwrap()
}

fn benchmark_cycler(c: &mut Criterion) {
    let mut group = c.benchmark_group("Bench Cycler");
    group.warm_up_time(Duration::from_millis(WARM_UP_TIME_MS));
    group.sample_size(SAMPLE_SIZE);

    let spec = machine("0RB0RB_0LA0LA");
    group.bench_function("blinker, 1000-step budget", |b| {
        b.iter(|| {
            let mut sim = Simulator::new(Arc::new(spec.clone()), 64);
            sim.initialise(0);
            let verdict = cycler::decide(&mut sim, 1000);
            assert!(matches!(verdict, Verdict::NonHalting { .. }));
        })
    });

    group.finish();
}

fn benchmark_translated_cycler(c: &mut Criterion) {
    let mut group = c.benchmark_group("Bench TranslatedCycler");
    group.warm_up_time(Duration::from_millis(WARM_UP_TIME_MS));
    group.sample_size(SAMPLE_SIZE);

    let spec = machine("0RB0RB_0RA0RA");
    group.bench_function("right sweep, 2000-step budget", |b| {
        b.iter(|| {
            let mut sim = Simulator::new(Arc::new(spec.clone()), 4096);
            sim.initialise(0);
            let verdict = translated_cycler::decide(&mut sim, 2000, 5000);
            assert!(matches!(verdict, Verdict::NonHalting { .. }));
        })
    });

    group.finish();
}

fn benchmark_backward_reasoning(c: &mut Criterion) {
    let mut group = c.benchmark_group("Bench BackwardReasoning");
    group.warm_up_time(Duration::from_millis(WARM_UP_TIME_MS));
    group.sample_size(SAMPLE_SIZE);

    let spec = machine("1RB1RZ_1LA1LA");
    group.bench_function("unreachable halt, depth 20", |b| {
        b.iter(|| {
            let verdict = backward_reasoning::decide(&spec, 20);
            assert!(matches!(verdict, Verdict::NonHalting { .. }));
        })
    });

    group.finish();
}

fn benchmark_halting_segment(c: &mut Criterion) {
    let mut group = c.benchmark_group("Bench HaltingSegment");
    group.warm_up_time(Duration::from_millis(WARM_UP_TIME_MS));
    group.sample_size(SAMPLE_SIZE);

    let spec = machine("1RB1RZ_1LA1LA");
    group.bench_function("unreachable halt, width 4", |b| {
        b.iter(|| {
            let verdict = halting_segment::decide(&spec, 4, 20);
            assert!(matches!(verdict, Verdict::NonHalting { .. }));
        })
    });

    group.finish();
}

fn benchmark_bouncer(c: &mut Criterion) {
    let mut group = c.benchmark_group("Bench Bouncer");
    group.warm_up_time(Duration::from_millis(WARM_UP_TIME_MS));
    group.sample_size(SAMPLE_SIZE);

    let spec = machine("0RB0RB_0RA0RA");
    group.bench_function("unilateral, 4000-step budget", |b| {
        b.iter(|| {
            let mut sim = Simulator::new(Arc::new(spec.clone()), 8192);
            sim.initialise(0);
            let verdict = bouncer::detect::decide(&mut sim, 4000, 5000);
            assert!(matches!(verdict, Verdict::NonHalting { .. }));
        })
    });

    group.finish();
}

fn benchmark_far(c: &mut Criterion) {
    let mut group = c.benchmark_group("Bench FAR");
    group.warm_up_time(Duration::from_millis(WARM_UP_TIME_MS));
    group.sample_size(SAMPLE_SIZE);

    let spec = machine("0RA1RZ");
    group.bench_function("2-state DFA bound", |b| {
        b.iter(|| {
            let verdict = far::detect::decide(&spec, 2);
            assert!(matches!(verdict, Verdict::NonHalting { .. }));
        })
    });

    group.finish();
}
