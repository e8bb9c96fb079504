//! # semtree
//!
//! Turn an HTML page into a compact semantic outline, then prune that outline
//! down to what matters for a query.
//!
//! ## Features
//!
//! - Parse and clean real-world HTML (html5ever + boilerplate removal)
//! - Rank headings and text blocks into a hierarchy
//! - Build an id-addressable [`SemanticTree`] with structural-path lookup
//! - Score leaves against a query and prune to a token budget
//! - Keep pruned content reachable through fallback trees
//!
//! ## Quick Start
//!
//! ```
//! use semtree::SemanticTree;
//!
//! let tree = SemanticTree::from_html(
//!     "<h1>Title</h1><h2>Section A</h2><p>First paragraph</p>",
//! )
//! .unwrap();
//! assert_eq!(
//!     tree.render(),
//!     "└── 1:Title\n    └── 2:Section A\n        └── 3:First paragraph\n"
//! );
//! ```
//!
//! ## Pruning
//!
//! ```
//! use semtree::{LexicalSimilarity, PruneConfig, Pruner, SemanticTree};
//!
//! let tree = SemanticTree::from_html(
//!     "<h1>Shop</h1><h2>Hours</h2><p>Open daily until nine</p>\
//!      <h2>Parking</h2><p>Free parking behind the store</p>",
//! )
//! .unwrap();
//!
//! let config = PruneConfig::new().with_min_score(0.2);
//! let result = Pruner::new(&tree, &LexicalSimilarity, config)
//!     .prune("parking")
//!     .unwrap();
//! assert!(result.tree.render().contains("Free parking behind the store"));
//! assert!(!result.tree.render().contains("Open daily"));
//! ```

pub mod classify;
pub mod dom;
pub mod error;
pub mod prune;
pub mod rank;
pub mod tree;
pub(crate) mod util;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::{Error, Result};
pub use prune::{
    FallbackStrategy, FallbackTree, LexicalSimilarity, PruneConfig, PruneResult, Pruner,
    RetryPolicy, ScoreBand, ScoredLeaf, Similarity, SimilarityError,
};
pub use tree::{NodeId, SemanticNode, SemanticTree};
