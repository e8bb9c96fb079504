//! ASCII outline rendering.
//!
//! ```text
//! └── 1:Guide
//!     ├── 2:Setup
//!     │   └── 3:Install it
//!     └── 4:Usage
//! ```

use super::{NodeId, SemanticTree};

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const INDENT: &str = "    ";
const PIPE_INDENT: &str = "│   ";

pub(super) fn render(tree: &SemanticTree) -> String {
    let mut out = String::new();
    // (node, prefix of its line, is last sibling)
    let mut stack: Vec<(NodeId, String, bool)> = vec![(tree.root(), String::new(), true)];

    while let Some((id, prefix, last)) = stack.pop() {
        let Some(node) = tree.get(id) else {
            continue;
        };
        out.push_str(&prefix);
        out.push_str(if last { LAST_BRANCH } else { BRANCH });
        out.push_str(&format!("{}:{}\n", node.id, node.text));

        let child_prefix = format!("{prefix}{}", if last { INDENT } else { PIPE_INDENT });
        let count = node.children.len();
        for (i, &child) in node.children.iter().enumerate().rev() {
            stack.push((child, child_prefix.clone(), i + 1 == count));
        }
    }
    out
}
