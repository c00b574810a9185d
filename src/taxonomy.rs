//! [crate::taxonomy] contains the basic building blocks of the table of
//! contents: the [TaxonomyNode] entry model plus the content-management id
//! conventions that surround it (content ids, taxonomy item ids, sitemap
//! ordering).
//!
//! A taxonomy node is one entry in the hierarchical table of contents served
//! by the content service. Nodes are immutable once received; identity is the
//! `id` field, an opaque CMS string such as `"t1-k54"`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use crate::error::TocError;

/// One entry in a hierarchical table of contents.
///
/// Field names follow the content-service wire format (`hasChildNodes`), so a
/// node deserializes directly from the navigation endpoint's JSON.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaxonomyNode {
    pub id: String,
    pub title: String,
    #[serde(rename = "hasChildNodes", default)]
    pub has_children: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl TaxonomyNode {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        TaxonomyNode {
            id: id.into(),
            title: title.into(),
            has_children: false,
            url: None,
        }
    }

    pub fn with_children(mut self, has_children: bool) -> Self {
        self.has_children = has_children;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

impl Display for TaxonomyNode {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} ({})", self.title, self.id)
    }
}

/// Content item types as published by the delivery namespace of the CMS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum CdItemType {
    Publication = 1,
    Folder = 2,
    StructureGroup = 4,
    Component = 16,
    Page = 64,
    Category = 512,
    Keyword = 1024,
}

impl CdItemType {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(CdItemType::Publication),
            2 => Some(CdItemType::Folder),
            4 => Some(CdItemType::StructureGroup),
            16 => Some(CdItemType::Component),
            64 => Some(CdItemType::Page),
            512 => Some(CdItemType::Category),
            1024 => Some(CdItemType::Keyword),
            _ => None,
        }
    }
}

/// A parsed content id of the form `namespace:publicationId-itemId[-itemType]`,
/// e.g. `ish:123-54-16`. The item type defaults to [CdItemType::Component]
/// when the suffix is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentId {
    pub namespace: String,
    pub publication_id: String,
    pub item_id: String,
    pub item_type: CdItemType,
}

static CONTENT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+):(\d+)-(\d+)(?:-(\d+))?$").expect("valid content id regex"));

static TAXONOMY_ITEM_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^t\d+-k(\d+)$").expect("valid taxonomy item id regex"));

/// Regex from the sitemap service: an optional type letter, a leading number,
/// and an optional `-<letter><number>` tail, e.g. `t1-k54` or `164`.
static SITEMAP_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\w?(\d+)(?:-\w(\d+))?").expect("valid sitemap id regex"));

impl ContentId {
    /// Parse a content id, returning `None` for anything that does not match
    /// the `namespace:pub-item[-type]` shape or carries an unknown type code.
    pub fn parse(raw: &str) -> Option<ContentId> {
        let caps = CONTENT_ID_RE.captures(raw)?;
        let item_type = match caps.get(4) {
            Some(code) => CdItemType::from_code(code.as_str().parse().ok()?)?,
            None => CdItemType::Component,
        };
        Some(ContentId {
            namespace: caps[1].to_string(),
            publication_id: caps[2].to_string(),
            item_id: caps[3].to_string(),
            item_type,
        })
    }

    /// Fallible variant for callers that need an error to propagate.
    pub fn try_parse(raw: &str) -> Result<ContentId, TocError> {
        ContentId::parse(raw).ok_or_else(|| TocError::InvalidId(raw.to_string()))
    }
}

impl Display for ContentId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}:{}-{}-{}",
            self.namespace, self.publication_id, self.item_id, self.item_type as u32
        )
    }
}

/// A page id is the bare numeric item id, nothing else.
pub fn is_valid_page_id(id: Option<&str>) -> bool {
    match id {
        Some(id) => !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// Build a taxonomy item id (`t{taxonomy}-k{item}`) from a sitemap id.
///
/// The sitemap id may be a bare item id (`"54"`), a full content id whose
/// keyword item is extracted (`"ish:123-54-1024"` becomes `k54`), or absent,
/// in which case the id refers to the taxonomy root itself. A content id that
/// denotes the taxonomy category also resolves to the root. Anything else is
/// not addressable within the taxonomy and yields `None`.
pub fn taxonomy_item_id(taxonomy_id: u32, sitemap_id: Option<&str>) -> Option<String> {
    let Some(sitemap_id) = sitemap_id else {
        return Some(format!("t{taxonomy_id}"));
    };
    if is_valid_page_id(Some(sitemap_id)) {
        return Some(format!("t{taxonomy_id}-k{sitemap_id}"));
    }
    match ContentId::parse(sitemap_id) {
        Some(cid) if cid.item_type == CdItemType::Category => Some(format!("t{taxonomy_id}")),
        Some(cid) if cid.item_type == CdItemType::Keyword => {
            Some(format!("t{taxonomy_id}-k{}", cid.item_id))
        }
        _ => None,
    }
}

/// Extract the bare item id from a taxonomy item id (`"t1-k54"` gives `"54"`).
pub fn item_id_from_taxonomy_item_id(taxonomy_item_id: Option<&str>) -> Option<String> {
    let caps = TAXONOMY_ITEM_ID_RE.captures(taxonomy_item_id?)?;
    Some(caps[1].to_string())
}

/// Numeric sort key for a sitemap/taxonomy id: the primary number and the
/// optional keyword number, so `t1-k2` sorts before `t1-k10` and `t2`.
fn sitemap_sort_key(id: &str) -> Option<(u64, u64)> {
    let caps = SITEMAP_ID_RE.captures(id)?;
    let primary = caps.get(1)?.as_str().parse().ok()?;
    let secondary = caps
        .get(2)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);
    Some((primary, secondary))
}

/// Order sibling sitemap items numerically by their ids. The content service
/// returns siblings in lexical id order, which puts `t1-k10` before `t1-k2`.
/// Items whose ids carry no number keep their relative order at the end.
pub fn order_sitemap_items(items: &mut [TaxonomyNode]) {
    items.sort_by(|a, b| {
        match (sitemap_sort_key(&a.id), sitemap_sort_key(&b.id)) {
            (Some(ka), Some(kb)) => ka.cmp(&kb),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
}
