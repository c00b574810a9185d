//! # Expansion/Selection State Machine
//!
//! [TocState] is the heart of the table-of-contents controller: a pure state
//! machine deciding what is expanded and selected given user clicks, an
//! externally imposed active path (deep-link navigation), and asynchronous
//! child-load completions. It is independent of any UI framework and of the
//! async runtime: every transition is `(state, input) -> commands`, applied
//! synchronously, and the returned [TocCommand]s tell the caller which side
//! effects to perform (issue a load, emit a selection notification).
//!
//! ## Path walks
//!
//! Imposing an active path starts a *walk* from the root: each id along the
//! path is expanded in turn, suspending whenever a node's children are not
//! cached yet and resuming when the matching [TocInput::ChildrenLoaded]
//! arrives. Reaching the final id commits the selection and emits exactly one
//! [TocCommand::Notify], no matter how many intermediate loads were needed.
//!
//! ## Stale loads
//!
//! Every issued load carries an incrementing token. A completion only applies
//! when it matches the token currently recorded for its node, so a load
//! superseded by a newer request for the same node is ignored wholesale, and
//! a load left over from a replaced walk can still fill the cache without
//! advancing anything.
//!
//! ## Session cache
//!
//! `children` is an append-only session cache: `Loaded` entries are never
//! evicted, collapsing a node keeps every descendant list already fetched,
//! and only `Loading`/`Failed` markers get replaced.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::taxonomy::TaxonomyNode;

/// Why a load was issued; decides what happens when it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadReason {
    /// Issued by a path walk; completion resumes the walk.
    PathWalk,
    /// Issued by a user click (or retry); completion expands and selects the
    /// clicked node.
    Click,
}

/// Per-node child cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChildEntry {
    Loading { token: u64, reason: LoadReason },
    Loaded(Vec<TaxonomyNode>),
    Failed(String),
}

/// Inputs to the state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TocInput {
    /// The externally supplied active path changed (deep-link navigation).
    /// `None` selects the first root node.
    ActivePathChanged(Option<Vec<String>>),
    /// The user clicked a node's row or expand affordance.
    NodeClicked(String),
    /// The user clicked the retry control of a failed node.
    RetryClicked(String),
    /// A child load finished. `token` must match the pending load's token or
    /// the completion is ignored as stale.
    ChildrenLoaded {
        parent_id: String,
        token: u64,
        result: Result<Vec<TaxonomyNode>, String>,
    },
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TocCommand {
    /// Call the child loader for `parent_id` and feed the outcome back as
    /// [TocInput::ChildrenLoaded] with the same token.
    Load { parent_id: String, token: u64 },
    /// A selection was committed; emitted exactly once per commit.
    Notify {
        node: TaxonomyNode,
        path: Vec<String>,
    },
}

/// An in-progress reconciliation of an imposed active path. `cursor` indexes
/// the id currently being expanded (or awaited).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PathWalk {
    path: Vec<String>,
    cursor: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TocState {
    root_nodes: Vec<TaxonomyNode>,
    children: BTreeMap<String, ChildEntry>,
    expanded: BTreeSet<String>,
    active_path: Option<Vec<String>>,
    selected: Option<String>,
    walk: Option<PathWalk>,
    next_token: u64,
}

impl TocState {
    pub fn new(root_nodes: Vec<TaxonomyNode>) -> Self {
        TocState {
            root_nodes,
            ..Default::default()
        }
    }

    pub fn root_nodes(&self) -> &[TaxonomyNode] {
        &self.root_nodes
    }

    pub fn children_of(&self, id: &str) -> Option<&ChildEntry> {
        self.children.get(id)
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn active_path(&self) -> Option<&[String]> {
        self.active_path.as_deref()
    }

    /// The error message recorded at `id`, if its last load failed.
    pub fn error_at(&self, id: &str) -> Option<&str> {
        match self.children.get(id) {
            Some(ChildEntry::Failed(message)) => Some(message.as_str()),
            _ => None,
        }
    }

    /// Resolve a node by id among the roots and all cached child lists.
    pub fn node(&self, id: &str) -> Option<&TaxonomyNode> {
        self.root_nodes
            .iter()
            .find(|n| n.id == id)
            .or_else(|| {
                self.children.values().find_map(|entry| match entry {
                    ChildEntry::Loaded(kids) => kids.iter().find(|n| n.id == id),
                    _ => None,
                })
            })
    }

    /// Apply one input, returning the side effects the caller must perform.
    pub fn apply(&mut self, input: TocInput) -> Vec<TocCommand> {
        let mut cmds = Vec::new();
        match input {
            TocInput::ActivePathChanged(path) => self.on_active_path(path, &mut cmds),
            TocInput::NodeClicked(id) => self.on_click(id, &mut cmds),
            TocInput::RetryClicked(id) => self.on_retry(id, &mut cmds),
            TocInput::ChildrenLoaded {
                parent_id,
                token,
                result,
            } => self.on_children_loaded(parent_id, token, result, &mut cmds),
        }
        cmds
    }

    fn on_active_path(&mut self, path: Option<Vec<String>>, cmds: &mut Vec<TocCommand>) {
        let path = path.filter(|p| !p.is_empty());
        let Some(path) = path else {
            self.select_first_root(cmds);
            return;
        };
        if self.active_path.as_ref() == Some(&path) {
            // Idempotent re-supply: no loads, no re-notification. An active
            // walk for this same path keeps running.
            tracing::debug!("Active path unchanged, ignoring: {path:?}");
            return;
        }
        tracing::debug!("Active path imposed: {path:?}");
        self.active_path = Some(path.clone());
        self.walk = Some(PathWalk { path, cursor: 0 });
        self.advance_walk(cmds);
    }

    /// An undefined active path means "select the first root node".
    fn select_first_root(&mut self, cmds: &mut Vec<TocCommand>) {
        let Some(first) = self.root_nodes.first().cloned() else {
            tracing::warn!("Active path cleared but there are no root nodes");
            return;
        };
        let path = vec![first.id.clone()];
        self.walk = None;
        if self.active_path.as_ref() == Some(&path) && self.selected.as_deref() == Some(&first.id) {
            return;
        }
        self.active_path = Some(path.clone());
        self.selected = Some(first.id.clone());
        cmds.push(TocCommand::Notify { node: first, path });
    }

    /// Walk the imposed path from `cursor`, expanding cached nodes and
    /// suspending at the first node whose children must be fetched.
    fn advance_walk(&mut self, cmds: &mut Vec<TocCommand>) {
        loop {
            let Some(walk) = &self.walk else { return };
            let cursor = walk.cursor;
            let id = walk.path[cursor].clone();
            let is_last = cursor + 1 == walk.path.len();

            let Some(node) = self.node(&id).cloned() else {
                tracing::warn!("Path id '{id}' is not a child of its predecessor, aborting walk");
                self.walk = None;
                return;
            };

            if is_last {
                let path = walk.path.clone();
                self.walk = None;
                self.selected = Some(id);
                tracing::debug!("Path walk committed selection '{node}'");
                cmds.push(TocCommand::Notify { node, path });
                return;
            }

            match self.children.get(&id) {
                Some(ChildEntry::Loaded(_)) => {
                    self.expanded.insert(id);
                    if let Some(walk) = &mut self.walk {
                        walk.cursor = cursor + 1;
                    }
                }
                Some(ChildEntry::Loading { .. }) => {
                    // Suspended; the matching completion resumes the walk.
                    return;
                }
                Some(ChildEntry::Failed(_)) | None => {
                    if !node.has_children {
                        tracing::warn!("Path descends through leaf '{id}', aborting walk");
                        self.walk = None;
                        return;
                    }
                    self.issue_load(&id, LoadReason::PathWalk, cmds);
                    return;
                }
            }
        }
    }

    fn on_click(&mut self, id: String, cmds: &mut Vec<TocCommand>) {
        let Some(node) = self.node(&id).cloned() else {
            tracing::warn!("Click on unknown node '{id}'");
            return;
        };
        match self.children.get(&id) {
            Some(ChildEntry::Loading { .. }) => {
                // A load is already in flight for this node.
                tracing::debug!("Click on '{id}' while loading, ignored");
            }
            Some(ChildEntry::Loaded(_)) => {
                if self.expanded.remove(&id) {
                    tracing::debug!("Collapsed '{id}'");
                } else {
                    self.expanded.insert(id.clone());
                    tracing::debug!("Expanded '{id}' from cache");
                }
            }
            Some(ChildEntry::Failed(_)) => {
                // Clicking a failed node re-issues exactly one new load.
                self.issue_load(&id, LoadReason::Click, cmds);
            }
            None if node.has_children => {
                self.issue_load(&id, LoadReason::Click, cmds);
            }
            None => {
                // Leaf: select and notify on every click, so re-navigating to
                // the same page still fires the callback.
                let path = self.path_to(&id);
                self.selected = Some(id);
                self.active_path = Some(path.clone());
                tracing::debug!("Leaf selected: '{node}'");
                cmds.push(TocCommand::Notify { node, path });
            }
        }
    }

    fn on_retry(&mut self, id: String, cmds: &mut Vec<TocCommand>) {
        match self.children.get(&id) {
            Some(ChildEntry::Failed(_)) => {
                tracing::debug!("Retrying load for '{id}'");
                self.issue_load(&id, LoadReason::Click, cmds);
            }
            Some(ChildEntry::Loading { .. }) => {
                tracing::debug!("Retry for '{id}' already in flight, ignored");
            }
            _ => {
                tracing::debug!("Retry for '{id}' with no recorded failure, ignored");
            }
        }
    }

    fn on_children_loaded(
        &mut self,
        parent_id: String,
        token: u64,
        result: Result<Vec<TaxonomyNode>, String>,
        cmds: &mut Vec<TocCommand>,
    ) {
        let reason = match self.children.get(&parent_id) {
            Some(ChildEntry::Loading {
                token: expected,
                reason,
            }) if *expected == token => *reason,
            Some(ChildEntry::Loading { token: expected, .. }) => {
                tracing::debug!(
                    "Stale completion for '{parent_id}' (token {token}, expected {expected}), ignored"
                );
                return;
            }
            _ => {
                tracing::debug!("Completion for '{parent_id}' with no pending load, ignored");
                return;
            }
        };

        match result {
            Ok(kids) => {
                tracing::debug!("Loaded {} children for '{parent_id}'", kids.len());
                self.children
                    .insert(parent_id.clone(), ChildEntry::Loaded(kids));
                self.expanded.insert(parent_id.clone());
                // A walk suspended on this node resumes regardless of who
                // issued the load: an imposed path is the newer navigation
                // intent, so it wins over a click's select-on-load. A walk
                // replaced mid-flight keeps the cache but advances nothing.
                let resumes = self
                    .walk
                    .as_ref()
                    .is_some_and(|w| w.path.get(w.cursor) == Some(&parent_id));
                if resumes {
                    if let Some(walk) = &mut self.walk {
                        walk.cursor += 1;
                    }
                    self.advance_walk(cmds);
                } else if reason == LoadReason::Click {
                    let Some(node) = self.node(&parent_id).cloned() else {
                        tracing::warn!("Loaded node '{parent_id}' no longer resolvable");
                        return;
                    };
                    let path = self.path_to(&parent_id);
                    self.selected = Some(parent_id);
                    self.active_path = Some(path.clone());
                    cmds.push(TocCommand::Notify { node, path });
                }
            }
            Err(message) => {
                tracing::debug!("Child load failed for '{parent_id}': {message}");
                self.children
                    .insert(parent_id.clone(), ChildEntry::Failed(message));
                // A failure is local to its node. It aborts a walk waiting on
                // the node but leaves every prior expansion and the current
                // selection intact.
                let aborts = self
                    .walk
                    .as_ref()
                    .is_some_and(|w| w.path.get(w.cursor) == Some(&parent_id));
                if aborts {
                    tracing::warn!("Path walk aborted at '{parent_id}'");
                    self.walk = None;
                }
            }
        }
    }

    fn issue_load(&mut self, id: &str, reason: LoadReason, cmds: &mut Vec<TocCommand>) {
        let token = self.next_token;
        self.next_token += 1;
        self.children
            .insert(id.to_string(), ChildEntry::Loading { token, reason });
        tracing::debug!("Issuing child load for '{id}' (token {token}, {reason:?})");
        cmds.push(TocCommand::Load {
            parent_id: id.to_string(),
            token,
        });
    }

    /// Root-to-node id path for `id`, resolved through the cached child
    /// lists. Falls back to `[id]` when the node's ancestry is unknown.
    fn path_to(&self, id: &str) -> Vec<String> {
        fn dfs(state: &TocState, nodes: &[TaxonomyNode], target: &str, trail: &mut Vec<String>) -> bool {
            for node in nodes {
                trail.push(node.id.clone());
                if node.id == target {
                    return true;
                }
                if let Some(ChildEntry::Loaded(kids)) = state.children.get(&node.id) {
                    if dfs(state, kids, target, trail) {
                        return true;
                    }
                }
                trail.pop();
            }
            false
        }

        let mut trail = Vec::new();
        if dfs(self, &self.root_nodes, id, &mut trail) {
            trail
        } else {
            tracing::warn!("No cached ancestry for '{id}'");
            vec![id.to_string()]
        }
    }
}
