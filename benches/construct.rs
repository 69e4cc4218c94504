use criterion::{black_box, criterion_group, criterion_main, Criterion};
use peak_alloc::PeakAlloc;
use rand::{thread_rng, Rng};
use stree::driver::{run, Algorithm, Benchmark, Options, StoreKind, Variation};
use stree::Text;

#[global_allocator]
static PEAK: PeakAlloc = PeakAlloc;

fn random_text(length: usize, alphabet: u32) -> Text {
    let mut rng = thread_rng();
    let units: Vec<u8> = (0..length)
        .map(|_| b'a' + rng.gen_range(0..alphabet) as u8)
        .collect();
    Text::from_ascii(&units).unwrap()
}

fn combos() -> Vec<(&'static str, Options)> {
    let mut out = Vec::new();
    for (name, store, algorithm) in [
        ("ll/mccreight-simple", StoreKind::List, Algorithm::SimpleMcCreight),
        ("ll/mccreight", StoreKind::List, Algorithm::McCreight),
        ("ll/ukkonen", StoreKind::List, Algorithm::Ukkonen),
        ("ht/mccreight", StoreKind::Hash, Algorithm::McCreight),
        ("ht/ukkonen", StoreKind::Hash, Algorithm::Ukkonen),
        ("la/pwotd", StoreKind::Array, Algorithm::Pwotd),
    ] {
        out.push((name, Options::new(store, algorithm)));
    }
    let mut bp = Options::new(StoreKind::List, Algorithm::McCreight);
    bp.variation = Variation::BackwardPointers;
    out.push(("ll-bp/mccreight", bp));
    out
}

fn construction_benchmark(c: &mut Criterion) {
    let _ = env_logger::try_init();
    let text_10k = random_text(10_000, 4);
    let text_100k = random_text(100_000, 4);

    for (name, options) in combos() {
        c.bench_function(&format!("{name} 10k"), |b| {
            b.iter(|| run(black_box(&text_10k), &options, None).unwrap())
        });
        c.bench_function(&format!("{name} 100k"), |b| {
            b.iter(|| run(black_box(&text_100k), &options, None).unwrap())
        });
    }

    let mut traverse = Options::new(StoreKind::List, Algorithm::McCreight);
    traverse.benchmark = Benchmark::ConstructTraverseDelete;
    c.bench_function("ll/mccreight 100k traverse", |b| {
        b.iter(|| run(black_box(&text_100k), &traverse, None).unwrap())
    });

    PEAK.reset_peak_usage();
    let report = run(&text_100k, &Options::new(StoreKind::Array, Algorithm::Pwotd), None).unwrap();
    println!(
        "pwotd 100k: {} branching nodes, {} tracked bytes peak, {:.1} MB process peak",
        report.branches,
        report.memory.peak,
        PEAK.peak_usage_as_mb()
    );
}

criterion_group!(benches, construction_benchmark);
criterion_main!(benches);
