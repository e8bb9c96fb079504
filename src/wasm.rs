//! WASM bindings for in-browser outlining.
//!
//! Exposes outline rendering and query pruning to JavaScript via wasm-bindgen.

use wasm_bindgen::prelude::*;

use crate::prune::{LexicalSimilarity, PruneConfig, Pruner};
use crate::tree::SemanticTree;

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn to_js(e: crate::Error) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Render the outline of an HTML document.
#[wasm_bindgen]
pub fn outline(html: &str) -> Result<String, JsValue> {
    let tree = SemanticTree::from_html(html).map_err(to_js)?;
    Ok(tree.render())
}

/// Prune the outline of an HTML document for `query`.
///
/// Returns the prune summary: primary tree, fallback trees and hints.
/// A `budget` of 0 means no budget.
#[wasm_bindgen]
pub fn prune_outline(html: &str, query: &str, budget: u32) -> Result<String, JsValue> {
    let tree = SemanticTree::from_html(html).map_err(to_js)?;
    let mut config = PruneConfig::new();
    if budget > 0 {
        config = config.with_budget(budget as usize);
    }
    let result = Pruner::new(&tree, &LexicalSimilarity, config)
        .prune(query)
        .map_err(to_js)?;
    Ok(result.summary())
}
