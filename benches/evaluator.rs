use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hog_engine::{Evaluator, Ruleset, Strategy};

fn constant_strategy(rolls: u32) -> Strategy {
    let mut s = Strategy::new("const", "const");
    s.set_const(rolls).unwrap();
    s
}

fn win_rate(c: &mut Criterion) {
    let mut group = c.benchmark_group("win_rate");

    const RULESETS: [(&str, Ruleset); 3] = [
        ("none", Ruleset { enable_time_trot: false, enable_feral_hogs: false, enable_swine_swap: false }),
        ("swap_only", Ruleset { enable_time_trot: false, enable_feral_hogs: false, enable_swine_swap: true }),
        ("all", Ruleset { enable_time_trot: true, enable_feral_hogs: true, enable_swine_swap: true }),
    ];

    let a = constant_strategy(4);
    let b = constant_strategy(5);

    for (label, ruleset) in RULESETS {
        group.bench_with_input(BenchmarkId::new("win_rate", label), &ruleset, |bench, &ruleset| {
            bench.iter(|| {
                let mut eval = Evaluator::new(ruleset);
                eval.win_rate(black_box(&a), black_box(&b))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, win_rate);
criterion_main!(benches);
