//! Pruning tests: scoring, budget pruning and fallback trees end to end.

use std::cell::Cell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use proptest::prelude::*;
use semtree::prune::{
    Embedder, EmbeddingSimilarity, RelevanceScorer, estimate_tokens, generate, tree_tokens,
};
use semtree::{
    FallbackStrategy, LexicalSimilarity, NodeId, PruneConfig, Pruner, RetryPolicy, ScoredLeaf,
    SemanticTree, Similarity, SimilarityError,
};

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

const GUIDE: &str = "<h1>Title</h1>\
    <h2>Section A</h2><p>Alpha paragraph</p><p>Beta paragraph</p><p>Gamma paragraph</p>\
    <h2>Section B</h2><p>Delta paragraph</p>";

fn garden_birds() -> SemanticTree {
    SemanticTree::open(format!("{FIXTURES_DIR}/garden-birds.html")).unwrap()
}

fn leaf_texts(tree: &SemanticTree) -> Vec<String> {
    tree.leaves()
        .into_iter()
        .filter_map(|id| tree.get(id))
        .map(|n| n.text.clone())
        .collect()
}

struct Constant(f32);

impl Similarity for Constant {
    fn similarity(&self, _query: &str, _text: &str) -> Result<f32, SimilarityError> {
        Ok(self.0)
    }
}

// ============================================================================
// Scenario Tests
// ============================================================================

#[test]
fn test_floor_above_all_scores_removes_every_leaf() {
    let tree = SemanticTree::from_html(GUIDE).unwrap();
    let config = PruneConfig::new().with_min_score(0.9);
    let result = Pruner::new(&tree, &Constant(0.5), config).prune("paragraph").unwrap();

    let removed: Vec<&str> = result.removed.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(removed.len(), 4);
    for text in ["Alpha paragraph", "Beta paragraph", "Gamma paragraph", "Delta paragraph"] {
        assert!(removed.contains(&text));
    }
    assert_eq!(leaf_texts(&result.tree), ["Section A", "Section B"]);
}

#[test]
fn test_similarity_fails_twice_then_succeeds() {
    struct FailsTwice {
        calls: Cell<u32>,
    }

    impl Similarity for FailsTwice {
        fn similarity(&self, _query: &str, _text: &str) -> Result<f32, SimilarityError> {
            self.calls.set(self.calls.get() + 1);
            if self.calls.get() <= 2 {
                Err(SimilarityError::Transient("service unavailable".into()))
            } else {
                Ok(0.8)
            }
        }
    }

    let tree = SemanticTree::from_html("<title>Page</title><p>The only paragraph</p>").unwrap();
    let similarity = FailsTwice { calls: Cell::new(0) };
    let leaves = RelevanceScorer::new(&similarity, RetryPolicy::immediate(3)).score(&tree, "q");

    assert_eq!(leaves.len(), 1);
    assert_eq!(leaves[0].base, 0.8);
    // Leaf text: two failures and a success; parent text: one call
    assert_eq!(similarity.calls.get(), 4);
}

#[test]
fn test_exhausted_retries_score_zero() {
    struct AlwaysDown;

    impl Similarity for AlwaysDown {
        fn similarity(&self, _query: &str, _text: &str) -> Result<f32, SimilarityError> {
            Err(SimilarityError::Transient("timeout".into()))
        }
    }

    let tree = SemanticTree::from_html(GUIDE).unwrap();
    let config = PruneConfig::new().with_retry(RetryPolicy::immediate(1));
    let result = Pruner::new(&tree, &AlwaysDown, config).prune("alpha").unwrap();

    assert!(result.removed.iter().all(|l| l.score == 0.0));
    assert_eq!(result.removed.len(), 4);
}

#[test]
fn test_permanent_errors_are_not_retried() {
    struct Rejecting {
        calls: Cell<u32>,
    }

    impl Similarity for Rejecting {
        fn similarity(&self, _query: &str, _text: &str) -> Result<f32, SimilarityError> {
            self.calls.set(self.calls.get() + 1);
            Err(SimilarityError::Permanent("input too long".into()))
        }
    }

    let tree = SemanticTree::from_html(GUIDE).unwrap();
    let similarity = Rejecting { calls: Cell::new(0) };
    RelevanceScorer::new(&similarity, RetryPolicy::immediate(5)).score(&tree, "q");

    // One call per distinct text: four paragraphs and two headings
    assert_eq!(similarity.calls.get(), 6);
}

#[test]
fn test_budget_on_real_page() {
    let tree = garden_birds();
    let total = tree_tokens(&tree);
    let budget = total / 2;
    let config = PruneConfig::new().with_budget(budget).with_min_score(0.0);
    let result = Pruner::new(&tree, &LexicalSimilarity, config)
        .prune("sunflower hearts for finches")
        .unwrap();

    assert_eq!(result.total_tokens, total);
    assert!(result.kept_tokens <= budget);
    assert!(result.fits_budget());
    assert!(leaf_texts(&result.tree).contains(&"Sunflower hearts attract finches".to_string()));
    assert!(result.tree.validate().is_empty());
    assert_eq!(tree_tokens(&result.tree), result.kept_tokens);
}

#[test]
fn test_fallback_trees_hold_every_removed_leaf() {
    let tree = garden_birds();
    for strategy in [FallbackStrategy::Iterative, FallbackStrategy::Hybrid] {
        let config = PruneConfig::new().with_strategy(strategy).with_remove_proportion(0.5);
        let result = Pruner::new(&tree, &LexicalSimilarity, config).prune("robin").unwrap();

        let mut in_fallback: Vec<NodeId> = result.fallback.iter().flat_map(|f| f.ids()).collect();
        let mut removed: Vec<NodeId> = result.removed.iter().map(|l| l.id).collect();
        in_fallback.sort();
        removed.sort();
        assert_eq!(in_fallback, removed, "strategy {strategy}");

        for (fallback, rendered) in result.fallback.iter().zip(&result.fallback_trees) {
            assert!(rendered.validate().is_empty());
            assert_eq!(rendered.leaves().len(), fallback.leaves.len());
        }
    }
}

#[test]
fn test_embedding_similarity() {
    /// Letter-frequency vectors: crude, but deterministic.
    struct Letters {
        calls: AtomicUsize,
    }

    impl Embedder for Letters {
        fn embed(&self, text: &str) -> Result<Vec<f32>, SimilarityError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            let mut counts = vec![0.0; 26];
            for b in text.bytes().filter(u8::is_ascii_alphabetic) {
                counts[(b.to_ascii_lowercase() - b'a') as usize] += 1.0;
            }
            Ok(counts)
        }
    }

    let tree = SemanticTree::from_html(GUIDE).unwrap();
    let similarity = EmbeddingSimilarity::new(Letters {
        calls: AtomicUsize::new(0),
    });
    let config = PruneConfig::new().with_min_score(0.0).with_remove_proportion(0.25);
    let result = Pruner::new(&tree, &similarity, config).prune("zzz").unwrap();

    // No letter in common with the query: everything scores 0, one leaf goes
    assert_eq!(result.removed.len(), 1);
    assert_eq!(result.removed[0].text, "Delta paragraph");
    // Query embedded once, plus each distinct text
    assert_eq!(similarity.embedder().calls.load(Ordering::Relaxed), 1 + 6);
}

// ============================================================================
// Concurrency Tests
// ============================================================================

#[test]
fn test_concurrent_prunes_share_one_tree() {
    let tree = garden_birds();
    let queries = ["robin song", "feeding finches", "peanuts", "newsletter"];
    let config = PruneConfig::new().with_budget(40);

    let sequential: Vec<String> = queries
        .iter()
        .map(|q| {
            Pruner::new(&tree, &LexicalSimilarity, config.clone())
                .prune(q)
                .unwrap()
                .summary()
        })
        .collect();

    let concurrent: Vec<String> = thread::scope(|scope| {
        let handles: Vec<_> = queries
            .iter()
            .map(|q| {
                let tree = &tree;
                let config = config.clone();
                scope.spawn(move || {
                    Pruner::new(tree, &LexicalSimilarity, config)
                        .prune(q)
                        .unwrap()
                        .summary()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(sequential, concurrent);
    assert_eq!(tree.render(), garden_birds().render());
}

// ============================================================================
// Property Tests
// ============================================================================

/// Deterministic pseudo-random score per text.
struct Hashed {
    salt: u64,
}

impl Similarity for Hashed {
    fn similarity(&self, _query: &str, text: &str) -> Result<f32, SimilarityError> {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325 ^ self.salt;
        for b in text.bytes() {
            h = (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3);
        }
        Ok((h % 1000) as f32 / 1000.0)
    }
}

fn page(paragraphs: &[(u8, String)]) -> String {
    let mut html = String::from("<title>Generated</title>");
    for (i, (kind, text)) in paragraphs.iter().enumerate() {
        match kind % 3 {
            0 => html.push_str(&format!("<h2>Heading {i} {text}</h2>")),
            1 => html.push_str(&format!("<h3>Sub {i} {text}</h3>")),
            _ => html.push_str(&format!("<p>Paragraph {i} {text}</p>")),
        }
    }
    html
}

fn paragraphs() -> impl Strategy<Value = Vec<(u8, String)>> {
    prop::collection::vec((0u8..3, "[a-z]{1,12}( [a-z]{1,12}){0,6}"), 1..25)
}

fn scored_leaves() -> impl Strategy<Value = Vec<ScoredLeaf>> {
    prop::collection::vec((-0.5f32..2.0, 1usize..40), 0..30).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, (score, tokens))| ScoredLeaf {
                id: NodeId(i as u32 + 2),
                parent: Some(NodeId(1)),
                text: format!("leaf {i}"),
                base: score,
                score,
                tokens,
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_token_estimate_is_monotonic(a in ".{0,80}", b in ".{0,80}") {
        let joined = format!("{a}{b}");
        prop_assert!(estimate_tokens(&a) <= estimate_tokens(&joined));
        prop_assert!(estimate_tokens(&a) >= 1);
    }

    #[test]
    fn prop_floor_and_budget_are_honoured(
        paragraphs in paragraphs(),
        salt in any::<u64>(),
        min_score in 0.0f32..1.0,
        budget in prop::option::of(1usize..120),
    ) {
        let tree = SemanticTree::from_html(&page(&paragraphs)).unwrap();
        let similarity = Hashed { salt };
        let mut config = PruneConfig::new()
            .with_min_score(min_score)
            .with_remove_proportion(0.0);
        if let Some(budget) = budget {
            config = config.with_budget(budget);
        }
        let result = Pruner::new(&tree, &similarity, config).prune("query").unwrap();

        let scores: HashMap<NodeId, f32> = RelevanceScorer::new(&similarity, RetryPolicy::default())
            .score(&tree, "query")
            .into_iter()
            .map(|l| (l.id, l.score))
            .collect();
        let removed: Vec<NodeId> = result.removed.iter().map(|l| l.id).collect();

        // Everything below the floor goes
        for (id, score) in &scores {
            if *score < min_score {
                prop_assert!(removed.contains(id));
            }
        }

        match budget {
            // Without a budget nothing at or above the floor goes
            None => prop_assert!(result.removed.iter().all(|l| l.score < min_score)),
            Some(budget) => {
                if result.removed.len() < scores.len() {
                    prop_assert!(result.kept_tokens <= budget);
                }
                // A leaf at or above the floor only goes while over budget
                if let Some(last) = result.removed.last().filter(|l| l.score >= min_score) {
                    prop_assert!(result.kept_tokens + last.tokens > budget);
                }
            }
        }
        prop_assert_eq!(tree_tokens(&result.tree), result.kept_tokens);
        prop_assert!(result.tree.validate().is_empty());
    }

    #[test]
    fn prop_uncapped_iterative_partitions_removed_leaves(leaves in scored_leaves()) {
        let trees = generate(&leaves, FallbackStrategy::Iterative, None);
        prop_assert!(trees.len() <= 3);

        let mut ids: Vec<NodeId> = trees.iter().flat_map(|t| t.ids()).collect();
        ids.sort();
        let mut expected: Vec<NodeId> = leaves.iter().map(|l| l.id).collect();
        expected.sort();
        prop_assert_eq!(ids, expected);
    }

    #[test]
    fn prop_capped_trees_respect_cap(leaves in scored_leaves(), cap in 1usize..100) {
        for strategy in [FallbackStrategy::Iterative, FallbackStrategy::Backup] {
            for tree in generate(&leaves, strategy, Some(cap)) {
                // Only a single oversized leaf may exceed the cap
                prop_assert!(tree.tokens <= cap || tree.leaves.len() == 1);
            }
        }
    }
}
