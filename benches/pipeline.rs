//! Benchmarks for the outline and pruning pipeline.
//!
//! Run with: cargo bench

use criterion::{Criterion, criterion_group, criterion_main};

use semtree::dom::{clean, parse_html};
use semtree::{FallbackStrategy, LexicalSimilarity, PruneConfig, Pruner, SemanticTree};

const PAGE: &str = include_str!("../tests/fixtures/garden-birds.html");

/// A long page: the fixture's article repeated under numbered chapters.
fn long_page() -> String {
    let article = PAGE
        .split_once("<article>")
        .and_then(|(_, rest)| rest.split_once("</article>"))
        .map(|(article, _)| article)
        .unwrap_or(PAGE);

    let mut html = String::from("<html><head><title>Collected guides</title></head><body>");
    for chapter in 1..=50 {
        html.push_str(&format!("<section><h1>Chapter {chapter}</h1>{article}</section>"));
    }
    html.push_str("</body></html>");
    html
}

// ============================================================================
// Build Benchmarks
// ============================================================================

fn bench_parse_and_clean(c: &mut Criterion) {
    let html = long_page();

    c.bench_function("parse_and_clean", |b| {
        b.iter(|| {
            let mut dom = parse_html(&html);
            clean::clean(&mut dom)
        });
    });
}

fn bench_build_tree(c: &mut Criterion) {
    let html = long_page();

    c.bench_function("build_tree", |b| {
        b.iter(|| SemanticTree::from_html(&html).unwrap());
    });
}

/// Each level holds one paragraph and the next level.
fn nested_page(depth: usize) -> String {
    let mut html = String::from("<html><body>");
    for level in 0..depth {
        html.push_str(&format!("<div><p>Some paragraph text {level}</p>"));
    }
    html.push_str(&"</div>".repeat(depth));
    html.push_str("</body></html>");
    html
}

fn bench_build_nested(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_nested");
    group.sample_size(10);
    for depth in [2_000, 8_000] {
        let html = nested_page(depth);
        group.bench_function(depth.to_string(), |b| {
            b.iter(|| SemanticTree::from_html(&html).unwrap());
        });
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let tree = SemanticTree::from_html(&long_page()).unwrap();

    c.bench_function("render", |b| {
        b.iter(|| tree.render());
    });
}

// ============================================================================
// Prune Benchmarks
// ============================================================================

fn bench_prune_budget(c: &mut Criterion) {
    let tree = SemanticTree::from_html(&long_page()).unwrap();
    let config = PruneConfig::new().with_budget(500);

    c.bench_function("prune_budget", |b| {
        b.iter(|| {
            Pruner::new(&tree, &LexicalSimilarity, config.clone())
                .prune("feeding finches in winter")
                .unwrap()
        });
    });
}

fn bench_prune_hybrid(c: &mut Criterion) {
    let tree = SemanticTree::from_html(&long_page()).unwrap();
    let config = PruneConfig::new()
        .with_strategy(FallbackStrategy::Hybrid)
        .with_budget(500)
        .with_fallback_budget(200);

    c.bench_function("prune_hybrid", |b| {
        b.iter(|| {
            Pruner::new(&tree, &LexicalSimilarity, config.clone())
                .prune("robin song")
                .unwrap()
        });
    });
}

criterion_group!(
    benches,
    // Build
    bench_parse_and_clean,
    bench_build_tree,
    bench_build_nested,
    bench_render,
    // Prune
    bench_prune_budget,
    bench_prune_hybrid,
);
criterion_main!(benches);
