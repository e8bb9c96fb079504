//! Fallback trees.
//!
//! Pruned leaves are not thrown away: they are regrouped into secondary
//! trees that a caller can query, in order, when the primary tree does not
//! hold the answer.

use std::cmp::Ordering;
use std::fmt;

use super::config::FallbackStrategy;
use super::score::ScoredLeaf;
use crate::tree::{NodeId, SemanticTree};

/// Relevance band of a removed leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
#[cfg_attr(feature = "cli", serde(rename_all = "lowercase"))]
pub enum ScoreBand {
    High,
    Medium,
    Low,
}

impl ScoreBand {
    pub const ALL: [ScoreBand; 3] = [ScoreBand::High, ScoreBand::Medium, ScoreBand::Low];

    /// `high` from 0.4, `medium` from 0.2, `low` below that (negatives included).
    pub fn of(score: f32) -> ScoreBand {
        if score >= 0.4 {
            ScoreBand::High
        } else if score >= 0.2 {
            ScoreBand::Medium
        } else {
            ScoreBand::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScoreBand::High => "high",
            ScoreBand::Medium => "medium",
            ScoreBand::Low => "low",
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bundle of removed leaves kept for follow-up queries.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct FallbackTree {
    /// `backup`, or `iterative-<band>-<n>`.
    pub label: String,
    /// Band of an iterative tree.
    #[cfg_attr(feature = "cli", serde(skip_serializing_if = "Option::is_none"))]
    pub band: Option<ScoreBand>,
    /// Highest score first.
    pub leaves: Vec<ScoredLeaf>,
    pub tokens: usize,
}

impl FallbackTree {
    fn new(label: String, band: Option<ScoreBand>, leaves: Vec<ScoredLeaf>) -> Self {
        let tokens = leaves.iter().map(|l| l.tokens).sum();
        Self {
            label,
            band,
            leaves,
            tokens,
        }
    }

    pub fn ids(&self) -> Vec<NodeId> {
        self.leaves.iter().map(|l| l.id).collect()
    }

    /// The leaves re-attached to their ancestors in `source`.
    pub fn to_tree(&self, source: &SemanticTree) -> SemanticTree {
        source.retain_leaves(&self.ids())
    }
}

fn by_score_desc(a: &ScoredLeaf, b: &ScoredLeaf) -> Ordering {
    b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal)
}

/// Repartition `removed` leaves according to `strategy`.
///
/// `budget` caps each tree's token total; `None` means uncapped trees for
/// `iterative` and the top half by count for `backup`.
pub fn generate(
    removed: &[ScoredLeaf],
    strategy: FallbackStrategy,
    budget: Option<usize>,
) -> Vec<FallbackTree> {
    if removed.is_empty() {
        return Vec::new();
    }
    match strategy {
        FallbackStrategy::Iterative => iterative(removed, budget),
        FallbackStrategy::Backup => {
            let (backup, _) = backup(removed, budget);
            vec![backup]
        }
        FallbackStrategy::Hybrid => {
            let (backup, rest) = backup(removed, budget.map(|b| (b / 2).max(1)));
            let mut trees = vec![backup];
            trees.extend(iterative(&rest, budget.map(|b| (b / 4).max(1))));
            trees
        }
    }
}

/// One or more trees per band, packed greedily, highest score first.
fn iterative(leaves: &[ScoredLeaf], cap: Option<usize>) -> Vec<FallbackTree> {
    let mut trees = Vec::new();
    for band in ScoreBand::ALL {
        let mut in_band: Vec<ScoredLeaf> = leaves
            .iter()
            .filter(|l| ScoreBand::of(l.score) == band)
            .cloned()
            .collect();
        in_band.sort_by(by_score_desc);

        let mut packs: Vec<Vec<ScoredLeaf>> = Vec::new();
        let mut current: Vec<ScoredLeaf> = Vec::new();
        let mut current_tokens = 0;
        for leaf in in_band {
            if let Some(cap) = cap
                && !current.is_empty()
                && current_tokens + leaf.tokens > cap
            {
                packs.push(std::mem::take(&mut current));
                current_tokens = 0;
            }
            current_tokens += leaf.tokens;
            current.push(leaf);
        }
        if !current.is_empty() {
            packs.push(current);
        }

        trees.extend(packs.into_iter().enumerate().map(|(i, pack)| {
            FallbackTree::new(format!("iterative-{band}-{}", i + 1), Some(band), pack)
        }));
    }
    trees
}

/// The best leaves that fit `budget` (or the top half without one), and the rest.
fn backup(leaves: &[ScoredLeaf], budget: Option<usize>) -> (FallbackTree, Vec<ScoredLeaf>) {
    let mut sorted = leaves.to_vec();
    sorted.sort_by(by_score_desc);

    let mut taken = Vec::new();
    let mut rest = Vec::new();
    match budget {
        Some(budget) => {
            let mut used = 0;
            for leaf in sorted {
                if used + leaf.tokens <= budget {
                    used += leaf.tokens;
                    taken.push(leaf);
                } else {
                    rest.push(leaf);
                }
            }
        }
        None => {
            let half = sorted.len().div_ceil(2);
            rest = sorted.split_off(half);
            taken = sorted;
        }
    }
    (FallbackTree::new("backup".into(), None, taken), rest)
}

/// Human-readable advice on the order in which to query the trees.
pub fn strategy_hints(
    primary_nodes: usize,
    primary_tokens: usize,
    trees: &[FallbackTree],
    shortfall: Option<usize>,
) -> Vec<String> {
    let mut hints = vec![format!(
        "Query the primary tree first ({primary_nodes} nodes, ~{primary_tokens} tokens)."
    )];

    if let Some(backup) = trees.iter().find(|t| t.band.is_none()) {
        hints.push(format!(
            "If the answer is missing, query the backup tree ({} leaves, ~{} tokens).",
            backup.leaves.len(),
            backup.tokens
        ));
    }
    for band in ScoreBand::ALL {
        let labels: Vec<&str> = trees
            .iter()
            .filter(|t| t.band == Some(band))
            .map(|t| t.label.as_str())
            .collect();
        if !labels.is_empty() {
            hints.push(format!(
                "Then query the {band}-relevance trees in order: {}.",
                labels.join(", ")
            ));
        }
    }
    if !trees.is_empty() {
        hints.push(
            "Stop as soon as an answer is satisfactory; later trees hold less relevant content."
                .to_string(),
        );
    }
    if let Some(shortfall) = shortfall {
        hints.push(format!(
            "The primary tree is ~{shortfall} tokens over budget: its headings alone do not fit."
        ));
    }
    hints
}
