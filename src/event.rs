use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::taxonomy::TaxonomyNode;

/// Updates emitted by the tree controller for downstream consumers (the
/// rendering layer, the router, analytics). One `SelectionChanged` is emitted
/// per committed selection, no matter how many intermediate expansions or
/// child loads the commit required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TocUpdate {
    /// The selected node and the root-to-node id path it was committed with.
    SelectionChanged {
        node: TaxonomyNode,
        path: Vec<String>,
    },
    /// A child load was issued for the node; render a loading indicator.
    NodeLoading { id: String },
    /// A child load completed; `count` children are now cached.
    NodeLoaded { id: String, count: usize },
    /// A child load failed; render the message inline with a retry control.
    NodeFailed { id: String, message: String },
    /// Any other state transition (expand/collapse) that warrants a re-render.
    TreeChanged,
}

impl Display for TocUpdate {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            TocUpdate::SelectionChanged { .. } => write!(f, "SelectionChanged"),
            TocUpdate::NodeLoading { .. } => write!(f, "NodeLoading"),
            TocUpdate::NodeLoaded { .. } => write!(f, "NodeLoaded"),
            TocUpdate::NodeFailed { .. } => write!(f, "NodeFailed"),
            TocUpdate::TreeChanged => write!(f, "TreeChanged"),
        }
    }
}
