//! Criterion benchmarks for canvas adaptation.
//! Compares the stateless path against snapshot projection for 16..256 pieces.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use puzzlecut::adapt::adapt;
use puzzlecut::cut::{CutType, CuttingEngine};
use puzzlecut::geom2::CanvasSize;
use puzzlecut::piece::PuzzlePiece;
use puzzlecut::preserve::StatePreservationEngine;
use puzzlecut::shape::{ShapeGenerator, ShapeType};
use rand::{rngs::StdRng, SeedableRng};

fn pieces(n: usize) -> Vec<PuzzlePiece> {
    let mut rng = StdRng::seed_from_u64(n as u64);
    let shape = ShapeGenerator::default().generate(ShapeType::Cloud, &mut rng);
    let report = CuttingEngine::default().cut(&shape, CutType::Curve, n, &mut rng);
    report.pieces
}

fn bench_adapt(c: &mut Criterion) {
    let from = CanvasSize::new(1280.0, 720.0);
    let to = CanvasSize::new(390.0, 844.0);
    let mut group = c.benchmark_group("adapt");
    for &n in &[16usize, 64, 256] {
        let ps = pieces(n);
        group.bench_with_input(BenchmarkId::new("stateless", n), &ps, |b, ps| {
            b.iter(|| adapt(ps, from, to))
        });
        let mut engine = StatePreservationEngine::new();
        if engine.save_absolute_states(&ps, from, &[]).is_ok() {
            group.bench_with_input(BenchmarkId::new("snapshot", n), &ps, |b, ps| {
                b.iter(|| engine.adapt_to_new_canvas_size(ps, to))
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_adapt);
criterion_main!(benches);
