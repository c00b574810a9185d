//! The child-loading seam between the tree controller and the content
//! service.
//!
//! The controller never talks to a backend directly: it asks a [ChildLoader]
//! for the children of a node id and feeds the outcome back into its state
//! machine. Production deployments implement the trait over their navigation
//! endpoint; [StaticChildLoader] serves demos and tests from memory.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::{error::TocError, taxonomy::TaxonomyNode};

/// Asynchronous supplier of a node's children.
///
/// The controller guarantees at most one outstanding `load_children` call per
/// node id (a node already marked loading is never re-issued), so
/// implementations do not need their own de-duplication. Failures must carry
/// a user-displayable message; they are rendered inline at the failing node.
#[async_trait]
pub trait ChildLoader: Send + Sync {
    async fn load_children(&self, parent_id: &str) -> Result<Vec<TaxonomyNode>, TocError>;
}

/// Scripted outcome for one node id in a [StaticChildLoader].
#[derive(Debug, Clone)]
pub enum ChildOutcome {
    Children(Vec<TaxonomyNode>),
    Failure(String),
}

/// In-memory [ChildLoader] with optional artificial latency.
///
/// Mirrors the mock data store the portal uses for server-side rendering:
/// every node id maps to either a child list or a canned failure message.
/// Unknown ids fail with an item-not-found message. The loader records every
/// request it receives so tests can assert call counts.
#[derive(Default)]
pub struct StaticChildLoader {
    outcomes: Mutex<BTreeMap<String, ChildOutcome>>,
    delay: Option<Duration>,
    requests: Mutex<Vec<String>>,
}

impl StaticChildLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the children returned for `parent_id`.
    pub fn with_children(self, parent_id: impl Into<String>, children: Vec<TaxonomyNode>) -> Self {
        self.outcomes
            .lock()
            .insert(parent_id.into(), ChildOutcome::Children(children));
        self
    }

    /// Register a canned failure for `parent_id`.
    pub fn with_failure(self, parent_id: impl Into<String>, message: impl Into<String>) -> Self {
        self.outcomes
            .lock()
            .insert(parent_id.into(), ChildOutcome::Failure(message.into()));
        self
    }

    /// Delay every response, simulating backend latency.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Replace the scripted outcome for a node, e.g. to let a retry succeed
    /// after an initial failure. Usable through a shared reference so tests
    /// can reconfigure a loader already handed to a controller.
    pub fn set_outcome(&self, parent_id: impl Into<String>, outcome: ChildOutcome) {
        self.outcomes.lock().insert(parent_id.into(), outcome);
    }

    /// Every parent id requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    /// Number of requests issued for one parent id.
    pub fn request_count(&self, parent_id: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|id| id.as_str() == parent_id)
            .count()
    }
}

#[async_trait]
impl ChildLoader for StaticChildLoader {
    async fn load_children(&self, parent_id: &str) -> Result<Vec<TaxonomyNode>, TocError> {
        self.requests.lock().push(parent_id.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let outcome = self.outcomes.lock().get(parent_id).cloned();
        match outcome {
            Some(ChildOutcome::Children(children)) => {
                tracing::debug!("Serving {} children for '{parent_id}'", children.len());
                Ok(children)
            }
            Some(ChildOutcome::Failure(message)) => Err(TocError::ChildLoad {
                parent_id: parent_id.to_string(),
                message,
            }),
            None => Err(TocError::ChildLoad {
                parent_id: parent_id.to_string(),
                message: format!("No taxonomy item '{parent_id}'"),
            }),
        }
    }
}
