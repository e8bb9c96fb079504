//! Budget pruning.

use std::cmp::Ordering;
use std::collections::HashSet;

use super::config::PruneConfig;
use super::score::ScoredLeaf;
use crate::tree::SemanticTree;

/// Rough token count of a text: one token per four characters, at least one.
pub fn estimate_tokens(text: &str) -> usize {
    (text.chars().count() / 4).max(1)
}

/// Token cost of every node of `tree`.
pub fn tree_tokens(tree: &SemanticTree) -> usize {
    tree.iter().map(|n| estimate_tokens(&n.text)).sum()
}

/// Which leaves to remove, and what is left.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetPlan {
    /// Removed leaves in removal order (lowest score first).
    pub removed: Vec<ScoredLeaf>,
    pub total_tokens: usize,
    pub kept_tokens: usize,
    /// Tokens still over budget once every leaf is gone.
    pub shortfall: Option<usize>,
}

/// Ascending score; among equal scores, later leaves go first.
fn removal_order(leaves: &[ScoredLeaf]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..leaves.len()).collect();
    order.sort_by(|&a, &b| {
        leaves[a]
            .score
            .partial_cmp(&leaves[b].score)
            .unwrap_or(Ordering::Equal)
            .then(b.cmp(&a))
    });
    order
}

/// Decide which of the scored `leaves` (in document order) leave the tree.
///
/// Leaves under `min_score` always go. With a budget, further leaves go
/// lowest score first until the tree fits; without one, the lowest
/// `remove_proportion` share of leaves goes.
pub fn plan(tree: &SemanticTree, leaves: &[ScoredLeaf], config: &PruneConfig) -> BudgetPlan {
    let total_tokens = tree_tokens(tree);
    let order = removal_order(leaves);
    let below_floor = leaves.iter().filter(|l| l.score < config.min_score).count();

    let mut removed: HashSet<usize> = order
        .iter()
        .copied()
        .filter(|&i| leaves[i].score < config.min_score)
        .collect();
    let mut remaining =
        total_tokens.saturating_sub(removed.iter().map(|&i| leaves[i].tokens).sum());

    match config.budget {
        Some(budget) => {
            for &i in &order {
                if remaining <= budget {
                    break;
                }
                if removed.insert(i) {
                    remaining = remaining.saturating_sub(leaves[i].tokens);
                }
            }
        }
        None => {
            let share = leaves.len() as f64 * config.remove_proportion;
            let by_share = share.floor() as usize;
            for &i in order.iter().take(by_share.max(below_floor)) {
                if removed.insert(i) {
                    remaining = remaining.saturating_sub(leaves[i].tokens);
                }
            }
        }
    }

    let shortfall = config
        .budget
        .filter(|&budget| remaining > budget)
        .map(|budget| remaining - budget);

    BudgetPlan {
        removed: order
            .into_iter()
            .filter(|i| removed.contains(i))
            .map(|i| leaves[i].clone())
            .collect(),
        total_tokens,
        kept_tokens: remaining,
        shortfall,
    }
}
