// benches/benchmarks.rs — Performance benchmarks (criterion)
//
// The offline hot paths every run goes through:
//   1. Static analysis of an input prompt
//   2. Layer gates: skip conditions and validators over before/after pairs
//   3. Response cache key derivation and lookup

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use promptsmith::analyzer::static_analysis::analyze;
use promptsmith::core::layers::{describe_improvements, overall_improvement, LAYERS};
use promptsmith::core::response_cache::ResponseCache;

// ─── Helpers ────────────────────────────────────────────────────────────────

fn short_prompt() -> String {
    "Write a function that sorts a list of numbers".to_string()
}

/// A structured prompt of roughly `sections` × 200 characters.
fn long_prompt(sections: usize) -> String {
    (0..sections)
        .map(|i| {
            format!(
                "# Section {i}\n\nYou are reviewing module {i}. The audience is new engineers.\n\
                 - It must handle empty input\n- It should avoid allocation\n\
                 Example: input [3, 1] gives [1, 3].\n\n"
            )
        })
        .collect()
}

// ─── Benchmarks ─────────────────────────────────────────────────────────────

fn bench_static_analysis(c: &mut Criterion) {
    let short = short_prompt();
    let long = long_prompt(10);

    c.bench_function("static_analysis_short", |b| {
        b.iter(|| analyze(black_box(&short)))
    });
    c.bench_function("static_analysis_2k", |b| b.iter(|| analyze(black_box(&long))));
}

fn bench_layer_gates(c: &mut Criterion) {
    let before = long_prompt(4);
    let after = format!("{before}\nSuccess criteria: every case is verified.");

    c.bench_function("layer_skip_conditions", |b| {
        b.iter(|| {
            LAYERS
                .iter()
                .map(|l| l.skip_condition(black_box(&before)))
                .count()
        })
    });

    c.bench_function("layer_validators", |b| {
        b.iter(|| {
            LAYERS
                .iter()
                .filter(|l| l.validate(black_box(&before), black_box(&after)))
                .count()
        })
    });

    c.bench_function("describe_improvements", |b| {
        b.iter(|| {
            (
                describe_improvements(black_box(&before), black_box(&after)),
                overall_improvement(black_box(&before), black_box(&after)),
            )
        })
    });
}

fn bench_response_cache(c: &mut Criterion) {
    let content = long_prompt(20);

    c.bench_function("cache_make_key_4k", |b| {
        b.iter(|| ResponseCache::make_key("critique", black_box(&content), &["3"]))
    });

    let mut cache = ResponseCache::for_self_refine();
    let keys: Vec<String> = (0..1000)
        .map(|i| ResponseCache::make_key("layer", &format!("prompt {i}"), &["expert"]))
        .collect();
    for key in &keys {
        cache.set(key.clone(), "cached response");
    }

    c.bench_function("cache_get_hit_1k", |b| {
        b.iter(|| cache.get(black_box(&keys[500])))
    });
}

criterion_group!(
    benches,
    bench_static_analysis,
    bench_layer_gates,
    bench_response_cache
);
criterion_main!(benches);
