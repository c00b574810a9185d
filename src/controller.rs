//! # Tree Controller Service
//!
//! [TocService] wraps the pure state machine in a long-running event loop:
//! a single task owns every state mutation, loader calls run as independent
//! tasks feeding their outcomes back into the loop, and committed transitions
//! are published as [TocUpdate]s on a channel the embedding application
//! consumes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use toc_core::{
//!     controller::TocService,
//!     event::TocUpdate,
//!     loader::StaticChildLoader,
//!     taxonomy::TaxonomyNode,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let roots = vec![TaxonomyNode::new("root", "User Guide").with_children(true)];
//! let loader = Arc::new(
//!     StaticChildLoader::new()
//!         .with_children("root", vec![TaxonomyNode::new("t1-k2", "Installing")]),
//! );
//!
//! let (updates_tx, mut updates) = mpsc::unbounded_channel();
//! let toc = TocService::spawn(roots, None, loader, updates_tx);
//!
//! // Mounting with no active path selects the first root node.
//! if let Some(TocUpdate::SelectionChanged { node, path }) = updates.recv().await {
//!     println!("selected {} via {:?}", node.title, path);
//! }
//!
//! // Expand the root; rows() projects the current tree for rendering.
//! toc.click("root").unwrap();
//! # }
//! ```
//!
//! ## Threading Model
//!
//! All state mutation happens on the controller loop task, one input per
//! loop turn, so no transition ever observes a half-applied sibling. Loader
//! calls are spawned as separate tasks; their completions re-enter through
//! the same input channel and are token-checked against the pending load, so
//! a stale response can never clobber a newer one. Dropping the handle (or
//! calling [TocHandle::shutdown]) aborts the loop; completions arriving
//! afterwards fail to send and are discarded, which is the "still mounted"
//! teardown check.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::{
    error::TocError,
    event::TocUpdate,
    loader::ChildLoader,
    render::{self, TreeRow},
    taxonomy::TaxonomyNode,
    toc::{ChildEntry, TocCommand, TocInput, TocState},
};

pub struct TocService;

impl TocService {
    /// Start a controller for `root_nodes`, reconciling `initial_path` as the
    /// mount transition (a `None` path selects the first root node).
    ///
    /// Updates are published on `updates`; the returned [TocHandle] is the
    /// input surface. The loop stops when the handle is dropped.
    pub fn spawn(
        root_nodes: Vec<TaxonomyNode>,
        initial_path: Option<Vec<String>>,
        loader: Arc<dyn ChildLoader>,
        updates: UnboundedSender<TocUpdate>,
    ) -> TocHandle {
        let state = Arc::new(RwLock::new(TocState::new(root_nodes)));
        let (inputs, rx) = mpsc::unbounded_channel();
        // The mount transition goes through the same channel as everything
        // else so it is processed strictly first.
        inputs.send(TocInput::ActivePathChanged(initial_path)).ok();
        let task = tokio::spawn(run_loop(
            state.clone(),
            rx,
            inputs.clone(),
            loader,
            updates,
        ));
        TocHandle {
            inputs,
            state,
            task,
        }
    }
}

/// Input surface and render access for a running controller.
pub struct TocHandle {
    inputs: UnboundedSender<TocInput>,
    state: Arc<RwLock<TocState>>,
    task: JoinHandle<()>,
}

impl TocHandle {
    /// Impose a new active path (deep-link navigation); `None` selects the
    /// first root node.
    pub fn set_active_path(&self, path: Option<Vec<String>>) -> Result<(), TocError> {
        self.send(TocInput::ActivePathChanged(path))
    }

    /// A user click on a node row or its expand affordance.
    pub fn click(&self, id: impl Into<String>) -> Result<(), TocError> {
        self.send(TocInput::NodeClicked(id.into()))
    }

    /// A user click on the retry control of a failed node.
    pub fn retry(&self, id: impl Into<String>) -> Result<(), TocError> {
        self.send(TocInput::RetryClicked(id.into()))
    }

    /// Project the current tree state into renderable rows.
    pub fn rows(&self) -> Vec<TreeRow> {
        render::project(&self.state.read())
    }

    /// Run `f` against a consistent snapshot of the tree state.
    pub fn with_state<R>(&self, f: impl FnOnce(&TocState) -> R) -> R {
        f(&self.state.read())
    }

    pub fn selected(&self) -> Option<String> {
        self.state.read().selected().map(str::to_string)
    }

    /// Stop the controller loop. Pending loader completions are discarded.
    pub fn shutdown(&self) {
        self.task.abort();
    }

    fn send(&self, input: TocInput) -> Result<(), TocError> {
        self.inputs.send(input).map_err(|_| TocError::Shutdown)
    }
}

impl Drop for TocHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_loop(
    state: Arc<RwLock<TocState>>,
    mut rx: UnboundedReceiver<TocInput>,
    inputs: UnboundedSender<TocInput>,
    loader: Arc<dyn ChildLoader>,
    updates: UnboundedSender<TocUpdate>,
) {
    while let Some(input) = rx.recv().await {
        let completion = completion_update(&state, &input);
        let was_click = matches!(input, TocInput::NodeClicked(_));
        let cmds = state.write().apply(input);

        if let Some(update) = completion {
            updates.send(update).ok();
        }

        let mut rendered = false;
        for cmd in cmds {
            match cmd {
                TocCommand::Load { parent_id, token } => {
                    updates
                        .send(TocUpdate::NodeLoading {
                            id: parent_id.clone(),
                        })
                        .ok();
                    rendered = true;
                    let loader = loader.clone();
                    let inputs = inputs.clone();
                    tokio::spawn(async move {
                        let result = loader
                            .load_children(&parent_id)
                            .await
                            .map_err(|e| e.display_message());
                        // A failed send means the controller was torn down
                        // while the load was in flight; drop the result.
                        inputs
                            .send(TocInput::ChildrenLoaded {
                                parent_id,
                                token,
                                result,
                            })
                            .ok();
                    });
                }
                TocCommand::Notify { node, path } => {
                    tracing::debug!("Selection changed: '{node}' at {path:?}");
                    updates
                        .send(TocUpdate::SelectionChanged { node, path })
                        .ok();
                    rendered = true;
                }
            }
        }

        // Pure expansion toggles produce no commands but still change what a
        // renderer should show.
        if was_click && !rendered {
            updates.send(TocUpdate::TreeChanged).ok();
        }
    }
}

/// Derive the NodeLoaded/NodeFailed update for a completion input, or `None`
/// when the completion is stale and will be ignored by the state machine.
fn completion_update(state: &Arc<RwLock<TocState>>, input: &TocInput) -> Option<TocUpdate> {
    let TocInput::ChildrenLoaded {
        parent_id,
        token,
        result,
    } = input
    else {
        return None;
    };
    let pending = matches!(
        state.read().children_of(parent_id),
        Some(ChildEntry::Loading { token: expected, .. }) if expected == token
    );
    if !pending {
        return None;
    }
    Some(match result {
        Ok(kids) => TocUpdate::NodeLoaded {
            id: parent_id.clone(),
            count: kids.len(),
        },
        Err(message) => TocUpdate::NodeFailed {
            id: parent_id.clone(),
            message: message.clone(),
        },
    })
}
