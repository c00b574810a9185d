//! End-to-end walkthrough: spawn a tree controller, deep-link into a page,
//! expand by clicking, and recover a failed node with retry.
//!
//! Run with: cargo run --example basic_usage

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use toc_core::{
    controller::TocService,
    event::TocUpdate,
    loader::{ChildOutcome, StaticChildLoader},
    render::RowKind,
    taxonomy::TaxonomyNode,
};

fn print_rows(rows: &[toc_core::render::TreeRow]) {
    for row in rows {
        let indent = "  ".repeat(row.depth);
        match &row.kind {
            RowKind::Node => {
                let marker = if row.selected { ">" } else { " " };
                let expand = if row.has_children {
                    if row.expanded {
                        "[-] "
                    } else {
                        "[+] "
                    }
                } else {
                    ""
                };
                println!("{marker} {indent}{expand}{}", row.title);
            }
            RowKind::Loading => println!("  {indent}...loading"),
            RowKind::Error(message) => println!("  {indent}!! {message} (retry: {})", row.id),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let roots = vec![
        TaxonomyNode::new("t1", "User Guide").with_children(true),
        TaxonomyNode::new("t2", "Troubleshooting").with_children(true),
    ];
    let loader = Arc::new(
        StaticChildLoader::new()
            .with_delay(Duration::from_millis(100))
            .with_children(
                "t1",
                vec![
                    TaxonomyNode::new("t1-k2", "Installing").with_url("/guide/installing"),
                    TaxonomyNode::new("t1-k10", "Upgrading").with_url("/guide/upgrading"),
                ],
            )
            .with_failure("t2", "Content service unavailable"),
    );

    let (tx, mut updates) = mpsc::unbounded_channel();
    // Deep link straight to the "Upgrading" page.
    let toc = TocService::spawn(
        roots,
        Some(vec!["t1".to_string(), "t1-k10".to_string()]),
        loader.clone(),
        tx,
    );

    while let Some(update) = updates.recv().await {
        println!("-- {update}");
        if let TocUpdate::SelectionChanged { node, path } = update {
            println!("navigated to '{}' via {path:?}", node.title);
            break;
        }
    }
    print_rows(&toc.rows());

    // Expanding the second root fails; the error stays local to that node.
    toc.click("t2").unwrap();
    while let Some(update) = updates.recv().await {
        println!("-- {update}");
        if matches!(update, TocUpdate::NodeFailed { .. }) {
            break;
        }
    }
    print_rows(&toc.rows());

    // The backend recovers; retry re-issues the load for "t2" only.
    loader.set_outcome(
        "t2",
        ChildOutcome::Children(vec![
            TaxonomyNode::new("t2-k1", "Known Issues").with_url("/trouble/known-issues"),
        ]),
    );
    toc.retry("t2").unwrap();
    while let Some(update) = updates.recv().await {
        println!("-- {update}");
        if matches!(update, TocUpdate::SelectionChanged { .. }) {
            break;
        }
    }
    print_rows(&toc.rows());
}
