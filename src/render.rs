//! Pure projection of a [TocState] into a flat list of renderable rows.
//!
//! The projection carries no styling and performs no side effects: a UI layer
//! walks the rows in order, indents by `depth`, and wires its click handler to
//! node rows and its retry handler to error rows. Loading and error rows
//! appear directly below the node whose load they describe.

use serde::{Deserialize, Serialize};

use crate::toc::{ChildEntry, TocState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowKind {
    /// A taxonomy node row with an expand affordance when `has_children`.
    Node,
    /// A load is in flight for the parent node; render a spinner.
    Loading,
    /// The parent node's load failed; render the message and a retry control
    /// wired to the parent's id.
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeRow {
    /// For node rows, the node's id; for loading/error rows, the id of the
    /// node whose load they describe (the retry target).
    pub id: String,
    pub title: String,
    pub depth: usize,
    pub kind: RowKind,
    pub has_children: bool,
    pub expanded: bool,
    pub selected: bool,
    pub url: Option<String>,
}

/// Flatten the current tree state into rows, depth first.
pub fn project(state: &TocState) -> Vec<TreeRow> {
    let mut rows = Vec::new();
    push_level(state, state.root_nodes(), 0, &mut rows);
    rows
}

fn push_level(
    state: &TocState,
    nodes: &[crate::taxonomy::TaxonomyNode],
    depth: usize,
    rows: &mut Vec<TreeRow>,
) {
    for node in nodes {
        rows.push(TreeRow {
            id: node.id.clone(),
            title: node.title.clone(),
            depth,
            kind: RowKind::Node,
            has_children: node.has_children,
            expanded: state.is_expanded(&node.id),
            selected: state.selected() == Some(node.id.as_str()),
            url: node.url.clone(),
        });
        match state.children_of(&node.id) {
            Some(ChildEntry::Loaded(kids)) if state.is_expanded(&node.id) => {
                push_level(state, kids, depth + 1, rows);
            }
            Some(ChildEntry::Loading { .. }) => {
                rows.push(TreeRow {
                    id: node.id.clone(),
                    title: String::new(),
                    depth: depth + 1,
                    kind: RowKind::Loading,
                    has_children: false,
                    expanded: false,
                    selected: false,
                    url: None,
                });
            }
            Some(ChildEntry::Failed(message)) => {
                rows.push(TreeRow {
                    id: node.id.clone(),
                    title: String::new(),
                    depth: depth + 1,
                    kind: RowKind::Error(message.clone()),
                    has_children: false,
                    expanded: false,
                    selected: false,
                    url: None,
                });
            }
            _ => {}
        }
    }
}
