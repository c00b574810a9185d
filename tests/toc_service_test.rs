//! Controller service integration tests
//!
//! These run the full stack: controller loop, spawned loader calls with real
//! latency, update channel, and row projection.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::timeout;

use toc_core::{
    controller::{TocHandle, TocService},
    event::TocUpdate,
    loader::{ChildOutcome, StaticChildLoader},
    render::RowKind,
    taxonomy::TaxonomyNode,
};

const DELAY: Duration = Duration::from_millis(50);
const DEADLINE: Duration = Duration::from_secs(2);

fn branch(id: &str, title: &str) -> TaxonomyNode {
    TaxonomyNode::new(id, title).with_children(true)
}

fn leaf(id: &str, title: &str) -> TaxonomyNode {
    TaxonomyNode::new(id, title)
}

fn reference_roots() -> Vec<TaxonomyNode> {
    vec![branch("root", "Root1"), branch("root-error", "Root2")]
}

/// The reference taxonomy backend: `root` expands twice, `root-error` fails.
fn reference_loader() -> Arc<StaticChildLoader> {
    Arc::new(
        StaticChildLoader::new()
            .with_delay(DELAY)
            .with_children(
                "root",
                vec![branch("12345", "Child1"), branch("123456", "Child2")],
            )
            .with_children(
                "12345",
                vec![
                    leaf("12345-nested", "NestedChild1"),
                    leaf("12345-nested2", "NestedChild2"),
                ],
            )
            .with_failure("root-error", "Failed to load child nodes"),
    )
}

fn spawn_reference(
    initial_path: Option<Vec<String>>,
) -> (TocHandle, Arc<StaticChildLoader>, UnboundedReceiver<TocUpdate>) {
    let loader = reference_loader();
    let (tx, rx): (UnboundedSender<TocUpdate>, _) = mpsc::unbounded_channel();
    let handle = TocService::spawn(reference_roots(), initial_path, loader.clone(), tx);
    (handle, loader, rx)
}

async fn next_update(rx: &mut UnboundedReceiver<TocUpdate>) -> TocUpdate {
    timeout(DEADLINE, rx.recv())
        .await
        .expect("update within deadline")
        .expect("update channel open")
}

async fn next_selection(rx: &mut UnboundedReceiver<TocUpdate>) -> (TaxonomyNode, Vec<String>) {
    loop {
        if let TocUpdate::SelectionChanged { node, path } = next_update(rx).await {
            return (node, path);
        }
    }
}

fn path(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

#[test_log::test(tokio::test)]
async fn mount_without_path_selects_first_root() {
    let (toc, loader, mut rx) = spawn_reference(None);

    let (node, selected_path) = next_selection(&mut rx).await;
    assert_eq!(node.id, "root");
    assert_eq!(selected_path, path(&["root"]));
    assert_eq!(toc.selected().as_deref(), Some("root"));
    assert!(
        loader.requests().is_empty(),
        "Selecting the first root needs no loader calls"
    );
}

#[test_log::test(tokio::test)]
async fn deep_link_notifies_exactly_once() {
    let active = path(&["root", "12345", "12345-nested"]);
    let (toc, loader, mut rx) = spawn_reference(Some(active.clone()));

    let (node, selected_path) = next_selection(&mut rx).await;
    assert_eq!(node.id, "12345-nested");
    assert_eq!(selected_path, active);
    assert_eq!(loader.requests(), path(&["root", "12345"]));

    // Nothing further is in flight once the walk committed.
    tokio::time::sleep(DELAY * 3).await;
    while let Ok(update) = rx.try_recv() {
        assert!(
            !matches!(update, TocUpdate::SelectionChanged { .. }),
            "The walk must commit exactly one selection"
        );
    }
    assert!(toc.with_state(|s| s.is_expanded("root") && s.is_expanded("12345")));
}

#[test_log::test(tokio::test)]
async fn expand_shows_loading_indicator_then_children() {
    let (toc, _loader, mut rx) = spawn_reference(None);
    next_selection(&mut rx).await;

    toc.click("root").unwrap();
    loop {
        if let TocUpdate::NodeLoading { id } = next_update(&mut rx).await {
            assert_eq!(id, "root");
            break;
        }
    }
    assert!(
        toc.rows()
            .iter()
            .any(|r| r.kind == RowKind::Loading && r.id == "root"),
        "A loading indicator shows while the load is in flight"
    );

    loop {
        if let TocUpdate::NodeLoaded { id, count } = next_update(&mut rx).await {
            assert_eq!(id, "root");
            assert_eq!(count, 2);
            break;
        }
    }
    let rows = toc.rows();
    let titles: Vec<_> = rows.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Root1", "Child1", "Child2", "Root2"]);
    assert!(
        !rows
            .iter()
            .any(|r| matches!(r.kind, RowKind::Loading | RowKind::Error(_))),
        "No loading or error element after the children arrive"
    );
}

#[test_log::test(tokio::test)]
async fn failed_node_shows_error_and_retry_reloads() {
    let (toc, loader, mut rx) = spawn_reference(None);
    next_selection(&mut rx).await;

    toc.click("root-error").unwrap();
    loop {
        if let TocUpdate::NodeFailed { id, message } = next_update(&mut rx).await {
            assert_eq!(id, "root-error");
            assert_eq!(message, "Failed to load child nodes");
            break;
        }
    }
    let rows = toc.rows();
    let error_row = rows
        .iter()
        .find(|r| matches!(r.kind, RowKind::Error(_)))
        .expect("error row rendered at the failed node");
    assert_eq!(error_row.id, "root-error");
    assert_eq!(
        error_row.kind,
        RowKind::Error("Failed to load child nodes".to_string())
    );
    assert_eq!(loader.request_count("root-error"), 1);

    // The rest of the tree stays interactive: expanding the sibling works.
    toc.click("root").unwrap();
    loop {
        if let TocUpdate::NodeLoaded { id, .. } = next_update(&mut rx).await {
            assert_eq!(id, "root");
            break;
        }
    }

    // Retry re-invokes the loader for the failed node only; a recovered
    // backend replaces the error with children.
    loader.set_outcome(
        "root-error",
        ChildOutcome::Children(vec![leaf("e1", "Recovered")]),
    );
    toc.retry("root-error").unwrap();
    loop {
        if let TocUpdate::NodeLoaded { id, .. } = next_update(&mut rx).await {
            assert_eq!(id, "root-error");
            break;
        }
    }
    assert_eq!(loader.request_count("root-error"), 2);
    assert!(toc.rows().iter().any(|r| r.title == "Recovered"));
    assert!(
        !toc.rows().iter().any(|r| matches!(r.kind, RowKind::Error(_))),
        "Retry success clears the error element"
    );
}

#[test_log::test(tokio::test)]
async fn leaf_navigation_notifies_per_click() {
    let active = path(&["root", "12345", "12345-nested"]);
    let (toc, _loader, mut rx) = spawn_reference(Some(active.clone()));
    let (_, first) = next_selection(&mut rx).await;
    assert_eq!(first, active);

    toc.click("12345-nested2").unwrap();
    let (node, p) = next_selection(&mut rx).await;
    assert_eq!(node.id, "12345-nested2");
    assert_eq!(p, path(&["root", "12345", "12345-nested2"]));

    toc.click("12345-nested").unwrap();
    let (node, p) = next_selection(&mut rx).await;
    assert_eq!(node.id, "12345-nested");
    assert_eq!(p, active);
}

#[test_log::test(tokio::test)]
async fn path_change_mid_walk_commits_only_the_new_path() {
    let (toc, loader, mut rx) = spawn_reference(Some(path(&["root", "12345", "12345-nested"])));

    // Redirect before the first load can complete.
    toc.set_active_path(Some(path(&["root", "123456"]))).unwrap();

    let (node, p) = next_selection(&mut rx).await;
    assert_eq!(node.id, "123456");
    assert_eq!(p, path(&["root", "123456"]));

    // The superseded walk must not have loaded its remaining hop.
    tokio::time::sleep(DELAY * 3).await;
    assert_eq!(loader.request_count("12345"), 0);
    while let Ok(update) = rx.try_recv() {
        assert!(!matches!(update, TocUpdate::SelectionChanged { .. }));
    }
}

#[test_log::test(tokio::test)]
async fn shutdown_discards_inflight_loads() {
    let (toc, _loader, mut rx) = spawn_reference(None);
    next_selection(&mut rx).await;

    toc.click("root").unwrap();
    loop {
        if matches!(next_update(&mut rx).await, TocUpdate::NodeLoading { .. }) {
            break;
        }
    }
    toc.shutdown();

    tokio::time::sleep(DELAY * 3).await;
    while let Ok(update) = rx.try_recv() {
        assert!(
            !matches!(update, TocUpdate::NodeLoaded { .. }),
            "A completion arriving after teardown must be discarded"
        );
    }
    assert!(
        toc.click("root").is_err(),
        "Inputs after shutdown report the controller as gone"
    );
}
