//! Relevance scoring.
//!
//! Every leaf gets `base = similarity(query, leaf)` plus half of its
//! parent's base score, so leaves under a relevant heading rank higher than
//! equally worded leaves elsewhere.

use std::collections::HashMap;
use std::thread;

use super::budget::estimate_tokens;
use super::config::RetryPolicy;
use super::similarity::{Similarity, SimilarityError};
use crate::tree::{NodeId, SemanticTree};

/// A scored leaf of the tree.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct ScoredLeaf {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub text: String,
    /// Similarity of the leaf itself.
    pub base: f32,
    /// `base` plus half the parent's similarity.
    pub score: f32,
    pub tokens: usize,
}

/// Scores tree leaves against a query.
///
/// Each distinct text is sent to the similarity backend once per pass.
/// Failures never abort the pass: transient errors are retried per the
/// [`RetryPolicy`], and a text that still fails scores 0.
pub struct RelevanceScorer<'a, S: ?Sized> {
    similarity: &'a S,
    retry: RetryPolicy,
    memo: HashMap<String, f32>,
}

impl<'a, S: Similarity + ?Sized> RelevanceScorer<'a, S> {
    pub fn new(similarity: &'a S, retry: RetryPolicy) -> Self {
        Self {
            similarity,
            retry,
            memo: HashMap::new(),
        }
    }

    /// Score every leaf of `tree`, in document order. The tree is not modified.
    pub fn score(&mut self, tree: &SemanticTree, query: &str) -> Vec<ScoredLeaf> {
        self.memo.clear();
        let leaves = tree.leaves();
        let mut scored = Vec::with_capacity(leaves.len());
        for id in leaves {
            let Some(node) = tree.get(id) else {
                continue;
            };
            let base = self.similarity_of(query, node.scoring_text());
            let parent_base = node
                .parent
                .and_then(|p| tree.get(p))
                .map(|parent| self.similarity_of(query, parent.scoring_text()))
                .unwrap_or(0.0);
            scored.push(ScoredLeaf {
                id,
                parent: node.parent,
                text: node.text.clone(),
                base,
                score: base + parent_base / 2.0,
                tokens: estimate_tokens(&node.text),
            });
        }
        scored
    }

    fn similarity_of(&mut self, query: &str, text: &str) -> f32 {
        if let Some(&cached) = self.memo.get(text) {
            return cached;
        }
        let score = self.call_with_retry(query, text);
        self.memo.insert(text.to_string(), score);
        score
    }

    fn call_with_retry(&self, query: &str, text: &str) -> f32 {
        let mut attempt = 0;
        loop {
            match self.similarity.similarity(query, text) {
                Ok(score) if score.is_finite() => return score,
                Ok(score) => {
                    log::warn!("similarity returned {score} for {text:?}; using 0");
                    return 0.0;
                }
                Err(SimilarityError::Transient(reason)) if attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = self.retry.delay_for_attempt(attempt);
                    log::trace!("retry {attempt} in {delay:?} after transient failure: {reason}");
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                }
                Err(err) => {
                    log::warn!("scoring {text:?} as 0: {err}");
                    return 0.0;
                }
            }
        }
    }
}
