//! # toc-core
//!
//! A Rust library implementing the lazy-loading table-of-contents controller
//! of a documentation-delivery portal: path-driven expansion, selection, and
//! per-node error recovery over an asynchronous child-loading backend.
//!
//! ## Overview
//!
//! Documentation portals render a taxonomy tree whose content lives in a
//! headless CMS. The tree is far too large to fetch eagerly, so children are
//! loaded on demand: expanding a node asks the content service for its
//! children, and deep links impose a root-to-page *active path* that must be
//! expanded hop by hop as responses arrive. toc-core keeps all of that state
//! in a pure, framework-independent state machine and wraps it in a small
//! event-loop service.
//!
//! ### Key Features
//!
//! - **Pure state machine**: every transition is `(state, input) -> commands`,
//!   unit-testable without a UI framework or runtime ([`toc`])
//! - **Path reconciliation**: an imposed active path expands lazily, suspends
//!   on uncached nodes, and commits exactly one selection notification
//! - **Stale-load protection**: per-issue tokens make superseded responses
//!   harmless, even across replaced paths
//! - **Local error recovery**: a failed node renders its message inline with
//!   a retry control; the rest of the tree stays interactive
//! - **Session cache**: child lists are cached append-only for the lifetime
//!   of the controller, so collapsing and re-expanding is instant
//! - **Sitemap assembly**: the same loader seam drives whole-taxonomy sitemap
//!   generation ([`sitemap`])
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
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let roots = vec![
//!         TaxonomyNode::new("t1", "User Guide").with_children(true),
//!         TaxonomyNode::new("t2", "Release Notes").with_children(true),
//!     ];
//!     let loader = Arc::new(StaticChildLoader::new().with_children(
//!         "t1",
//!         vec![TaxonomyNode::new("t1-k2", "Installing").with_url("/guide/installing")],
//!     ));
//!
//!     let (tx, mut updates) = mpsc::unbounded_channel();
//!     // Deep link straight to the "Installing" page.
//!     let toc = TocService::spawn(
//!         roots,
//!         Some(vec!["t1".to_string(), "t1-k2".to_string()]),
//!         loader,
//!         tx,
//!     );
//!
//!     while let Some(update) = updates.recv().await {
//!         if let TocUpdate::SelectionChanged { node, path } = update {
//!             assert_eq!(path, vec!["t1".to_string(), "t1-k2".to_string()]);
//!             println!("navigated to {}", node.title);
//!             break;
//!         }
//!     }
//!
//!     // Render whatever is currently known.
//!     for row in toc.rows() {
//!         println!("{}{}", "  ".repeat(row.depth), row.title);
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! - **[`taxonomy`]**: the [`taxonomy::TaxonomyNode`] entry model and the
//!   CMS id conventions around it (content ids, taxonomy item ids, sitemap
//!   ordering)
//! - **[`loader`]**: the [`loader::ChildLoader`] seam to the content service
//! - **[`toc`]**: the expansion/selection state machine
//! - **[`controller`]**: the event-loop service and its handle
//! - **[`render`]**: pure projection of tree state into renderable rows
//! - **[`event`]**: updates published to the embedding application
//! - **[`sitemap`]**: whole-taxonomy sitemap assembly
//! - **[`config`]**: portal configuration record and providers
//!
//! The CMS backend itself, page rendering, routing, search, and styling are
//! external collaborators: toc-core only ever sees them through the
//! [`loader::ChildLoader`] contract.
//!
//! ## Module Guide
//!
//! Start with [`controller::TocService`] for embedding the tree, or with
//! [`toc::TocState`] directly if you drive the state machine from your own
//! event loop.

pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod loader;
pub mod render;
pub mod sitemap;
pub mod taxonomy;
pub mod toc;
#[cfg(test)]
mod tests;

pub use error::*;
