//! Query-driven pruning of a [`SemanticTree`].
//!
//! A prune scores every leaf against the query, removes the least relevant
//! leaves until the tree fits the token budget, and regroups what was
//! removed into fallback trees:
//!
//! ```no_run
//! use semtree::{LexicalSimilarity, PruneConfig, Pruner, SemanticTree};
//!
//! let tree = SemanticTree::open("page.html")?;
//! let config = PruneConfig::new().with_budget(200);
//! let result = Pruner::new(&tree, &LexicalSimilarity, config).prune("opening hours")?;
//! println!("{}", result.summary());
//! # Ok::<(), semtree::Error>(())
//! ```

mod budget;
mod config;
mod fallback;
mod score;
mod similarity;

pub use budget::{BudgetPlan, estimate_tokens, plan, tree_tokens};
pub use config::{FallbackStrategy, PruneConfig, RetryPolicy};
pub use fallback::{FallbackTree, ScoreBand, generate, strategy_hints};
pub use score::{RelevanceScorer, ScoredLeaf};
pub use similarity::{
    Embedder, EmbeddingSimilarity, LexicalSimilarity, Similarity, SimilarityError, cosine,
};

use std::fmt::Write;

use crate::error::Result;
use crate::tree::SemanticTree;

/// Prunes one source tree; the source is never modified.
pub struct Pruner<'a, S: ?Sized> {
    tree: &'a SemanticTree,
    similarity: &'a S,
    config: PruneConfig,
}

impl<'a, S: Similarity + ?Sized> Pruner<'a, S> {
    pub fn new(tree: &'a SemanticTree, similarity: &'a S, config: PruneConfig) -> Self {
        Self {
            tree,
            similarity,
            config,
        }
    }

    pub fn config(&self) -> &PruneConfig {
        &self.config
    }

    /// Prune a copy of the source tree for `query`.
    ///
    /// Only an invalid configuration is an error. An unreachable budget is
    /// reported through [`PruneResult::shortfall`].
    pub fn prune(&self, query: &str) -> Result<PruneResult> {
        self.config.validate()?;

        let leaves = RelevanceScorer::new(self.similarity, self.config.retry).score(self.tree, query);
        let plan = plan(self.tree, &leaves, &self.config);

        let mut primary = self.tree.clone();
        for leaf in &plan.removed {
            primary.remove_leaf(leaf.id)?;
        }

        let fallback = generate(
            &plan.removed,
            self.config.strategy,
            self.config.effective_fallback_budget(),
        );
        let fallback_trees = fallback.iter().map(|f| f.to_tree(self.tree)).collect();
        let hints = strategy_hints(primary.len(), plan.kept_tokens, &fallback, plan.shortfall);

        log::info!(
            "pruned {} of {} leaves for {query:?}: ~{} of {} tokens kept, {} fallback trees",
            plan.removed.len(),
            leaves.len(),
            plan.kept_tokens,
            plan.total_tokens,
            fallback.len()
        );
        if let Some(shortfall) = plan.shortfall {
            log::info!("budget missed by ~{shortfall} tokens");
        }

        Ok(PruneResult {
            query: query.to_string(),
            tree: primary,
            removed: plan.removed,
            fallback,
            fallback_trees,
            hints,
            total_tokens: plan.total_tokens,
            kept_tokens: plan.kept_tokens,
            budget: self.config.budget,
            shortfall: plan.shortfall,
        })
    }
}

/// Outcome of a prune.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct PruneResult {
    pub query: String,
    /// The primary tree.
    pub tree: SemanticTree,
    /// Removed leaves, lowest score first.
    pub removed: Vec<ScoredLeaf>,
    pub fallback: Vec<FallbackTree>,
    /// `fallback` rendered against the source tree, in the same order.
    #[cfg_attr(feature = "cli", serde(skip))]
    pub fallback_trees: Vec<SemanticTree>,
    pub hints: Vec<String>,
    pub total_tokens: usize,
    pub kept_tokens: usize,
    pub budget: Option<usize>,
    pub shortfall: Option<usize>,
}

impl PruneResult {
    pub fn fits_budget(&self) -> bool {
        self.shortfall.is_none()
    }

    /// Human-readable report: primary tree, fallback trees, hints.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let budget = match self.budget {
            Some(budget) => format!("budget {budget}"),
            None => "no budget".to_string(),
        };
        let _ = writeln!(out, "Query: {}", self.query);
        let _ = writeln!(
            out,
            "Primary tree: {} nodes, ~{} of {} tokens ({budget})",
            self.tree.len(),
            self.kept_tokens,
            self.total_tokens
        );
        out.push_str(&self.tree.render());

        for (fallback, tree) in self.fallback.iter().zip(&self.fallback_trees) {
            let _ = writeln!(
                out,
                "\nFallback {}: {} leaves, ~{} tokens",
                fallback.label,
                fallback.leaves.len(),
                fallback.tokens
            );
            out.push_str(&tree.render());
        }

        out.push_str("\nHints:\n");
        for hint in &self.hints {
            let _ = writeln!(out, "- {hint}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::error::Error;

    const GUIDE: &str = "<h1>Title</h1>\
        <h2>Section A</h2><p>Apples are red</p><p>Bananas are yellow</p><p>Cherries are dark</p>\
        <h2>Section B</h2><p>Dates are sweet</p>";

    struct Constant(f32);

    impl Similarity for Constant {
        fn similarity(&self, _query: &str, _text: &str) -> std::result::Result<f32, SimilarityError> {
            Ok(self.0)
        }
    }

    /// Fails the first `failures` calls, then scores by lexical overlap.
    struct Flaky {
        failures: u32,
        calls: Cell<u32>,
    }

    impl Similarity for Flaky {
        fn similarity(&self, query: &str, text: &str) -> std::result::Result<f32, SimilarityError> {
            let call = self.calls.get() + 1;
            self.calls.set(call);
            if call <= self.failures {
                return Err(SimilarityError::Transient("rate limited".into()));
            }
            LexicalSimilarity.similarity(query, text)
        }
    }

    fn leaf_texts(tree: &SemanticTree) -> Vec<String> {
        tree.leaves()
            .into_iter()
            .filter_map(|id| tree.get(id))
            .map(|n| n.text.clone())
            .collect()
    }

    #[test]
    fn test_floor_above_every_score_removes_all_leaves() {
        let tree = SemanticTree::from_html(GUIDE).unwrap();
        let config = PruneConfig::new().with_min_score(0.9);
        let result = Pruner::new(&tree, &Constant(0.5), config).prune("anything").unwrap();

        assert_eq!(result.removed.len(), tree.leaves().len());
        // Sections lose their paragraphs and become leaves themselves
        assert_eq!(leaf_texts(&result.tree), ["Section A", "Section B"]);
        assert!(result.tree.validate().is_empty());
    }

    #[test]
    fn test_budget_keeps_relevant_leaves() {
        let tree = SemanticTree::from_html(GUIDE).unwrap();
        let config = PruneConfig::new().with_budget(12).with_min_score(0.0);
        let result = Pruner::new(&tree, &LexicalSimilarity, config).prune("bananas").unwrap();

        assert!(leaf_texts(&result.tree).contains(&"Bananas are yellow".to_string()));
        assert!(result.kept_tokens <= 12);
        assert!(result.fits_budget());
        assert_eq!(result.fallback.len(), result.fallback_trees.len());
    }

    #[test]
    fn test_source_tree_is_untouched() {
        let tree = SemanticTree::from_html(GUIDE).unwrap();
        let before = tree.render();
        let result = Pruner::new(&tree, &Constant(0.0), PruneConfig::new()).prune("q").unwrap();

        assert!(!result.removed.is_empty());
        assert_eq!(tree.render(), before);
    }

    #[test]
    fn test_transient_failures_are_retried() {
        let tree = SemanticTree::from_html(GUIDE).unwrap();
        let flaky = Flaky {
            failures: 2,
            calls: Cell::new(0),
        };
        let config = PruneConfig::new()
            .with_retry(RetryPolicy::immediate(3))
            .with_min_score(0.5)
            .with_remove_proportion(0.0);
        let result = Pruner::new(&tree, &flaky, config).prune("apples").unwrap();

        // The first leaf scored is the one whose calls failed
        assert_eq!(leaf_texts(&result.tree), ["Apples are red", "Section B"]);
        assert!(flaky.calls.get() > 2);
    }

    #[test]
    fn test_unreachable_budget_reports_shortfall() {
        let tree = SemanticTree::from_html(GUIDE).unwrap();
        let config = PruneConfig::new().with_budget(1);
        let result = Pruner::new(&tree, &Constant(0.5), config).prune("q").unwrap();

        assert!(!result.fits_budget());
        assert_eq!(result.shortfall, Some(result.kept_tokens - 1));
        assert!(result.summary().contains("over budget"));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let tree = SemanticTree::from_html(GUIDE).unwrap();
        let config = PruneConfig::new().with_remove_proportion(1.5);
        let err = Pruner::new(&tree, &Constant(0.5), config).prune("q").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_summary_lists_trees_and_hints() {
        let tree = SemanticTree::from_html(GUIDE).unwrap();
        let config = PruneConfig::new().with_strategy(FallbackStrategy::Backup);
        let summary = Pruner::new(&tree, &LexicalSimilarity, config)
            .prune("dates")
            .unwrap()
            .summary();

        assert!(summary.starts_with("Query: dates\nPrimary tree: "));
        assert!(summary.contains("\nFallback backup: "));
        assert!(summary.contains("\nHints:\n- Query the primary tree first"));
    }
}
