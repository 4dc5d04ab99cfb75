use criterion::{black_box, criterion_group, criterion_main, Criterion};
use panesync_core::{
    CompareView, Config, DiffEngine, Document, Hunk, HunkSequence, Layout, PaneView, RelationId,
    ViewMetrics, WordDiffCache,
};

fn sample_source(lines: usize) -> String {
    let mut s = String::from("fn main() {\n");
    for i in 0..lines {
        s.push_str(&format!("    let value_{i} = compute({i}, \"item {i}\");\n"));
    }
    s.push_str("}\n");
    s
}

/// Every seventh line edited, every thirteenth dropped
fn sample_target(lines: usize) -> String {
    let mut s = String::from("fn main() {\n");
    for i in 0..lines {
        if i % 13 == 0 {
            continue;
        }
        if i % 7 == 0 {
            s.push_str(&format!("    let value_{i} = compute_fast({i}, \"item {i}\")?;\n"));
        } else {
            s.push_str(&format!("    let value_{i} = compute({i}, \"item {i}\");\n"));
        }
    }
    s.push_str("}\n");
    s
}

fn bench_line_diff(c: &mut Criterion) {
    let source = sample_source(5_000);
    let target = sample_target(5_000);
    let engine = DiffEngine::new();

    c.bench_function("line_diff_5k", |b| {
        b.iter(|| engine.diff_strings(black_box(&source), black_box(&target)))
    });
}

fn bench_word_paths(c: &mut Criterion) {
    let source = Document::new(sample_source(500));
    let target = Document::new(sample_target(500));
    let engine = DiffEngine::new();
    let hunks: Vec<Hunk> = engine.diff_strings(&source.text(), &target.text());
    let metrics = ViewMetrics::default();

    c.bench_function("word_paths_cold", |b| {
        b.iter(|| {
            let sequence = HunkSequence::new(hunks.clone());
            let mut cache = WordDiffCache::new(engine);
            for &hunk in &hunks {
                black_box(cache.get_paths(
                    &sequence,
                    hunk,
                    PaneView::new(&source, &metrics),
                    PaneView::new(&target, &metrics),
                ));
            }
        })
    });
}

fn bench_revert_rediff(c: &mut Criterion) {
    let source = sample_source(1_000);
    let target = sample_target(1_000);

    c.bench_function("revert_first_hunk_1k", |b| {
        b.iter_with_setup(
            || {
                CompareView::new(
                    Layout::TwoPane,
                    vec![Document::new(source.clone()), Document::new(target.clone())],
                    &Config::default(),
                )
                .unwrap()
            },
            |mut view| {
                let first = view.store(RelationId(0)).and_then(|s| s.get(0));
                if let Some(hunk) = first {
                    black_box(view.revert_hunk(RelationId(0), hunk).unwrap());
                }
            },
        )
    });
}

criterion_group!(benches, bench_line_diff, bench_word_paths, bench_revert_rediff);
criterion_main!(benches);
