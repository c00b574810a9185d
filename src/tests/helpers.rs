//! Shared test utilities for state machine testing

use std::collections::BTreeMap;

use crate::{
    taxonomy::TaxonomyNode,
    toc::{TocCommand, TocInput, TocState},
};

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

pub fn branch(id: &str, title: &str) -> TaxonomyNode {
    TaxonomyNode::new(id, title).with_children(true)
}

pub fn leaf(id: &str, title: &str) -> TaxonomyNode {
    TaxonomyNode::new(id, title)
}

/// Drives a [TocState] synchronously: `Load` commands pile up in `pending`
/// until the test fulfills them from the scripted outcomes, and `Notify`
/// commands are recorded for assertion. Keeping fulfillment explicit lets
/// tests interleave inputs with load completions to exercise stale-load and
/// mid-walk-change behavior.
pub struct Harness {
    pub state: TocState,
    pub outcomes: BTreeMap<String, Result<Vec<TaxonomyNode>, String>>,
    pub pending: Vec<(String, u64)>,
    pub loads_issued: Vec<String>,
    pub notifications: Vec<(TaxonomyNode, Vec<String>)>,
}

impl Harness {
    pub fn new(root_nodes: Vec<TaxonomyNode>) -> Self {
        init_logging();
        Harness {
            state: TocState::new(root_nodes),
            outcomes: BTreeMap::new(),
            pending: Vec::new(),
            loads_issued: Vec::new(),
            notifications: Vec::new(),
        }
    }

    pub fn script(&mut self, parent_id: &str, outcome: Result<Vec<TaxonomyNode>, &str>) {
        self.outcomes
            .insert(parent_id.to_string(), outcome.map_err(str::to_string));
    }

    pub fn apply(&mut self, input: TocInput) {
        for cmd in self.state.apply(input) {
            match cmd {
                TocCommand::Load { parent_id, token } => {
                    self.loads_issued.push(parent_id.clone());
                    self.pending.push((parent_id, token));
                }
                TocCommand::Notify { node, path } => {
                    self.notifications.push((node, path));
                }
            }
        }
    }

    /// Complete the oldest pending load from the script.
    pub fn fulfill_next(&mut self) {
        let (parent_id, token) = self.pending.remove(0);
        let result = self
            .outcomes
            .get(&parent_id)
            .cloned()
            .unwrap_or_else(|| Err(format!("No taxonomy item '{parent_id}'")));
        self.apply(TocInput::ChildrenLoaded {
            parent_id,
            token,
            result,
        });
    }

    /// Run all pending loads (and those they trigger) to completion.
    pub fn settle(&mut self) {
        while !self.pending.is_empty() {
            self.fulfill_next();
        }
    }
}

/// The root set most state machine tests use: one expandable root and one
/// root whose children always fail to load.
pub fn two_roots() -> Vec<TaxonomyNode> {
    vec![branch("root", "Root1"), branch("root-error", "Root2")]
}

/// Script the child lists from the portal's reference scenario: `root` has
/// two expandable children, the first of which has two leaf children.
pub fn script_reference_tree(h: &mut Harness) {
    h.script(
        "root",
        Ok(vec![branch("12345", "Child1"), branch("123456", "Child2")]),
    );
    h.script(
        "12345",
        Ok(vec![
            leaf("12345-nested", "NestedChild1"),
            leaf("12345-nested2", "NestedChild2"),
        ]),
    );
    h.script("root-error", Err("Failed to load child nodes"));
}

pub fn ids(path: &[&str]) -> Vec<String> {
    path.iter().map(|s| s.to_string()).collect()
}
