// ─────────────────────────────────────────────────────────────────────
// SSD Kernel — Step Benchmarks
// ─────────────────────────────────────────────────────────────────────
//! Criterion benchmarks comparing the reference and accelerated
//! backends across layer counts.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use ssd_core::{log_alignment, BackendKind, GlobalParams, LayerRates, SsdConfig, SsdEngine};

#[path = "../tests/common/mod.rs"]
mod common;

use common::CaseRng;

const LAYER_COUNTS: [usize; 4] = [4, 256, 4096, 65_536];

fn engine(n: usize, kind: BackendKind) -> SsdEngine {
    let cfg = SsdConfig::uniform(n, GlobalParams::default(), LayerRates::default());
    SsdEngine::with_backend(cfg, kind).expect("bench config is valid")
}

// ── Scalar transform ────────────────────────────────────────────────

fn bench_log_alignment(c: &mut Criterion) {
    c.bench_function("log_alignment", |b| {
        b.iter(|| log_alignment(black_box(5.0), black_box(0.1), black_box(2.0)))
    });
}

// ── SsdEngine.step() ────────────────────────────────────────────────

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("step");
    for &n in &LAYER_COUNTS {
        let mut rng = CaseRng::new(n as u64);
        let p = rng.fill(n, -30.0, 30.0);
        let e = rng.fill(n, 0.0, 5.0);
        let k = rng.fill(n, 0.1, 3.0);

        for kind in [BackendKind::Reference, BackendKind::Accelerated] {
            let eng = engine(n, kind);
            group.bench_with_input(BenchmarkId::new(kind.to_string(), n), &n, |b, _| {
                b.iter(|| eng.step(black_box(&p), black_box(&e), black_box(&k)))
            });
        }
    }
    group.finish();
}

// ── SsdEngine.tick() ────────────────────────────────────────────────

fn bench_tick_1000(c: &mut Criterion) {
    let n = 4096;
    let p = CaseRng::new(7).fill(n, -30.0, 30.0);
    for kind in [BackendKind::Reference, BackendKind::Accelerated] {
        let mut eng = engine(n, kind);
        c.bench_function(&format!("tick_1000_{kind}"), |b| {
            b.iter(|| {
                eng.reset();
                eng.run(black_box(&p), 1000)
            })
        });
    }
}

criterion_group!(benches, bench_log_alignment, bench_step, bench_tick_1000);
criterion_main!(benches);
