//! Pruning configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

/// How removed leaves are repartitioned into fallback trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum, serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "cli", serde(rename_all = "lowercase"))]
pub enum FallbackStrategy {
    /// One or more trees per relevance band.
    #[default]
    Iterative,
    /// A single tree of the best removed leaves.
    Backup,
    /// A backup tree at half budget, then iterative trees at quarter budget.
    Hybrid,
}

impl FallbackStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            FallbackStrategy::Iterative => "iterative",
            FallbackStrategy::Backup => "backup",
            FallbackStrategy::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for FallbackStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FallbackStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "iterative" => Ok(FallbackStrategy::Iterative),
            "backup" => Ok(FallbackStrategy::Backup),
            "hybrid" => Ok(FallbackStrategy::Hybrid),
            other => Err(Error::InvalidConfig(format!(
                "unknown fallback strategy '{other}' (expected iterative, backup or hybrid)"
            ))),
        }
    }
}

/// Retry schedule for transient similarity failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "cli", serde(default))]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 200,
            max_delay_ms: 5000,
        }
    }
}

impl RetryPolicy {
    /// Retry immediately, without sleeping.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    /// Delay before retry number `attempt` (1-based): the base delay doubled
    /// per earlier retry, capped at the maximum.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let backoff = self.base_delay_ms.saturating_mul(1u64 << exponent);
        Duration::from_millis(backoff.min(self.max_delay_ms))
    }
}

/// Options for [`Pruner`](super::Pruner).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "cli", serde(default))]
pub struct PruneConfig {
    /// Token budget for the primary tree.
    pub budget: Option<usize>,
    /// Leaves scoring below this are always removed.
    pub min_score: f32,
    pub strategy: FallbackStrategy,
    /// Share of leaves removed when no budget is given.
    pub remove_proportion: f64,
    /// Token cap for fallback trees; defaults to `budget`.
    pub fallback_budget: Option<usize>,
    pub retry: RetryPolicy,
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            budget: None,
            min_score: 0.1,
            strategy: FallbackStrategy::Iterative,
            remove_proportion: 0.3,
            fallback_budget: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl PruneConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_budget(mut self, budget: usize) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn with_strategy(mut self, strategy: FallbackStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_remove_proportion(mut self, proportion: f64) -> Self {
        self.remove_proportion = proportion;
        self
    }

    pub fn with_fallback_budget(mut self, budget: usize) -> Self {
        self.fallback_budget = Some(budget);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Token cap used for fallback trees.
    pub fn effective_fallback_budget(&self) -> Option<usize> {
        self.fallback_budget.or(self.budget)
    }

    pub fn validate(&self) -> Result<()> {
        if self.budget == Some(0) {
            return Err(Error::InvalidConfig("budget must be positive".into()));
        }
        if self.fallback_budget == Some(0) {
            return Err(Error::InvalidConfig("fallback budget must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.remove_proportion) {
            return Err(Error::InvalidConfig(format!(
                "remove proportion {} is outside [0, 1]",
                self.remove_proportion
            )));
        }
        if !self.min_score.is_finite() || self.min_score < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "minimum score {} must be a non-negative number",
                self.min_score
            )));
        }
        Ok(())
    }
}
