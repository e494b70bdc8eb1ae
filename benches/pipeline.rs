//! Benchmarks for the full decompilation pipeline.
//!
//! Measures extraction (cold and cached), graph construction, liveness and
//! reconstruction on synthetic scripts of increasing size.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use scriptscope::analysis::{cfg::ControlFlowGraph, liveness};
use scriptscope::diagnostics::Diagnostics;
use scriptscope::prelude::*;

fn synthetic_script(statements: usize) -> String {
    let mut text = String::from("local acc = 0\n");
    for i in 0..statements {
        text.push_str(&format!("local v{i} = {i}\n"));
        text.push_str(&format!("acc = acc + v{i}\n"));
        if i % 10 == 0 {
            text.push_str("if acc then\nacc = acc - 1\nend\n");
        }
    }
    text.push_str("return\n");
    text
}

fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("extraction");
    for size in [10usize, 100, 1000] {
        let text = synthetic_script(size);

        group.bench_with_input(BenchmarkId::new("cold", size), &text, |b, text| {
            b.iter(|| {
                let decompiler = Decompiler::new();
                let script = InMemoryScript::new("bench", text.clone());
                decompiler.decompile(&script)
            });
        });

        group.bench_with_input(BenchmarkId::new("cached", size), &text, |b, text| {
            let decompiler = Decompiler::new();
            let script = InMemoryScript::new("bench", text.clone());
            decompiler.decompile(&script);
            b.iter(|| decompiler.decompile(&script));
        });
    }
    group.finish();
}

fn bench_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("analysis");
    for size in [100usize, 1000] {
        let decompiler = Decompiler::new();
        let script = InMemoryScript::new("bench", synthetic_script(size));
        let analysis = decompiler.analyze(&script);
        let instructions = analysis.instructions;

        group.bench_with_input(
            BenchmarkId::new("cfg_build", size),
            &instructions,
            |b, instructions| {
                let diagnostics = Diagnostics::new();
                b.iter(|| ControlFlowGraph::build(instructions, &diagnostics));
            },
        );

        group.bench_with_input(
            BenchmarkId::new("liveness", size),
            &instructions,
            |b, instructions| {
                let diagnostics = Diagnostics::new();
                let cfg = ControlFlowGraph::build(instructions, &diagnostics);
                b.iter(|| liveness::analyze(&cfg, 100, &diagnostics));
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_extraction, bench_analysis);
criterion_main!(benches);
