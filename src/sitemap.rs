//! Sitemap assembly over a [ChildLoader].
//!
//! The content service has no whole-taxonomy endpoint, so the sitemap is
//! produced by walking the tree the same way the controller would: load each
//! node's children on demand, order siblings numerically, and collect the
//! absolute URL of every entry that has one. Container nodes without URLs
//! contribute nothing but are still descended into.

use url::Url;

use crate::{
    error::TocError,
    loader::ChildLoader,
    taxonomy::{order_sitemap_items, TaxonomyNode},
};

/// Recursion cutoff for the sitemap walk. Taxonomies deeper than this are
/// almost certainly cyclic data; stop descending rather than hang.
pub const MAX_SITEMAP_DEPTH: u8 = 10;

/// Walk the taxonomy depth first and collect the absolute URL of every node
/// that carries one, in reading order. Relative node URLs are joined onto
/// `base`. Any child-load failure aborts the whole walk; a sitemap with holes
/// is worse than no sitemap.
pub async fn collect_site_urls(
    loader: &dyn ChildLoader,
    root_nodes: &[TaxonomyNode],
    base: &Url,
) -> Result<Vec<Url>, TocError> {
    let mut urls = Vec::new();
    let mut roots = root_nodes.to_vec();
    order_sitemap_items(&mut roots);

    // Explicit stack instead of async recursion; reversed pushes keep
    // document order on pop.
    let mut stack: Vec<(TaxonomyNode, u8)> = roots.into_iter().rev().map(|n| (n, 0)).collect();
    while let Some((node, depth)) = stack.pop() {
        if let Some(url) = &node.url {
            urls.push(base.join(url)?);
        }
        if !node.has_children {
            continue;
        }
        if depth >= MAX_SITEMAP_DEPTH {
            tracing::warn!(
                "Sitemap walk cut off below '{}' at depth {depth}",
                node.id
            );
            continue;
        }
        tracing::debug!("Sitemap walk descending into '{}'", node.id);
        let mut children = loader.load_children(&node.id).await?;
        order_sitemap_items(&mut children);
        for child in children.into_iter().rev() {
            stack.push((child, depth + 1));
        }
    }
    Ok(urls)
}

/// Serialize collected URLs as a sitemap.org `<urlset>` document.
pub fn write_sitemap_xml(urls: &[Url]) -> String {
    let mut out = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for url in urls {
        out.push_str("  <url><loc>");
        out.push_str(&xml_escape(url.as_str()));
        out.push_str("</loc></url>\n");
    }
    out.push_str("</urlset>\n");
    out
}

fn xml_escape(raw: &str) -> String {
    raw.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
