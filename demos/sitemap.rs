//! Generate a sitemap.org XML document for a small taxonomy.
//!
//! Run with: cargo run --example sitemap

use std::sync::Arc;

use url::Url;

use toc_core::{
    loader::StaticChildLoader,
    sitemap::{collect_site_urls, write_sitemap_xml},
    taxonomy::TaxonomyNode,
};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let loader = Arc::new(
        StaticChildLoader::new()
            .with_children(
                "t1",
                vec![
                    TaxonomyNode::new("t1-k10", "Upgrading").with_url("/guide/upgrading"),
                    TaxonomyNode::new("t1-k2", "Installing").with_url("/guide/installing"),
                ],
            )
            .with_children("t2", vec![]),
    );
    let roots = vec![
        TaxonomyNode::new("t1", "User Guide")
            .with_children(true)
            .with_url("/guide"),
        TaxonomyNode::new("t2", "Release Notes")
            .with_children(true)
            .with_url("/notes"),
    ];

    let base = Url::parse("https://docs.example.com/").expect("valid base url");
    let urls = collect_site_urls(loader.as_ref(), &roots, &base)
        .await
        .expect("sitemap walk succeeds");
    print!("{}", write_sitemap_xml(&urls));
}
