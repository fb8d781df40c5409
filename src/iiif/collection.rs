//! Paginated IIIF collections over persisted manifests

use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use super::types::{context, kind};
use crate::db::{ChildCount, ManifestRow, Store};
use crate::error::Result;

/// Id of the collection containing every manifest
pub const INDEX_COLLECTION: &str = "index";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CollectionError {
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),
    #[error("Invalid page: {0}")]
    InvalidPage(String),
    #[error("Page {page} is out of range, collection has {pages} pages")]
    PageOutOfRange { page: u32, pages: u32 },
}

/// Which page of a collection to build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageToken {
    /// Metadata only: totals, first/last links, sub-collections
    Top,
    /// 1-based content page
    Page(u32),
}

impl FromStr for PageToken {
    type Err = CollectionError;

    /// Accepts `top`, `p{n}` and `{n}`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s == "top" {
            return Ok(PageToken::Top);
        }
        let number = s.strip_prefix('p').unwrap_or(s);
        match number.parse::<u32>() {
            Ok(n) if n >= 1 => Ok(PageToken::Page(n)),
            _ => Err(CollectionError::InvalidPage(s.to_string())),
        }
    }
}

/// Page arithmetic for a known total
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}

impl Pagination {
    /// `per_page` below one is raised to one
    pub fn new(page: u32, per_page: u32, total: u64) -> Self {
        Self {
            page,
            per_page: per_page.max(1),
            total,
        }
    }

    /// Number of pages, at least one
    pub fn pages(&self) -> u32 {
        let pages = self.total.div_ceil(u64::from(self.per_page)).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.pages()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }
}

/// Manifest entry of a content page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestSummary {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: String,
    pub label: String,
    pub attribution: serde_json::Value,
    pub logo: serde_json::Value,
    pub thumbnail: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionPage {
    #[serde(rename = "@context")]
    pub context: String,
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: String,
    pub label: String,
    pub total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub within: Option<String>,
    #[serde(rename = "startIndex", skip_serializing_if = "Option::is_none")]
    pub start_index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifests: Option<Vec<ManifestSummary>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub collections: Vec<CollectionPage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
}

pub fn collection_url(base_url: &str, collection_id: &str) -> String {
    format!("{}/iiif/collection/{}", base_url.trim_end_matches('/'), collection_id)
}

/// Label of the index collection
pub fn index_label(server_name: &str) -> String {
    format!("Manifests available at {}", server_name)
}

/// Top page of a collection
///
/// Only children with at least one manifest are listed.
pub fn top_page(
    base_url: &str,
    collection_id: &str,
    label: &str,
    total: u64,
    per_page: u32,
    children: &[ChildCount],
) -> CollectionPage {
    let url = collection_url(base_url, collection_id);
    let pages = Pagination::new(1, per_page, total).pages();

    CollectionPage {
        context: context::PRESENTATION.to_string(),
        id: format!("{}/top", url),
        kind: kind::COLLECTION.to_string(),
        label: label.to_string(),
        total,
        first: Some(format!("{}/p1", url)),
        last: Some(format!("{}/p{}", url, pages)),
        within: None,
        start_index: None,
        manifests: None,
        collections: children
            .iter()
            .filter(|child| child.manifest_count > 0)
            .map(|child| {
                top_page(
                    base_url,
                    &child.id,
                    &child.label,
                    u64::try_from(child.manifest_count).unwrap_or_default(),
                    per_page,
                    &[],
                )
            })
            .collect(),
        next: None,
        prev: None,
    }
}

/// Summary of a stored manifest for collection listings
pub fn summarize(base_url: &str, row: &ManifestRow) -> Result<ManifestSummary> {
    let doc = row.document()?;
    let thumbnail = doc
        .get("thumbnail")
        .or_else(|| doc.pointer("/sequences/0/canvases/0/thumbnail"))
        .cloned()
        .unwrap_or(serde_json::Value::Null);

    Ok(ManifestSummary {
        id: format!("{}/iiif/{}/manifest", base_url.trim_end_matches('/'), row.id),
        kind: kind::MANIFEST.to_string(),
        label: row.label.clone(),
        attribution: doc.get("attribution").cloned().unwrap_or_default(),
        logo: doc.get("logo").cloned().unwrap_or_default(),
        thumbnail,
    })
}

/// Content page of a collection
pub fn content_page(
    base_url: &str,
    collection_id: &str,
    label: &str,
    pagination: Pagination,
    manifests: Vec<ManifestSummary>,
) -> CollectionPage {
    let url = collection_url(base_url, collection_id);

    CollectionPage {
        context: context::PRESENTATION.to_string(),
        id: format!("{}/p{}", url, pagination.page),
        kind: kind::COLLECTION.to_string(),
        label: label.to_string(),
        total: pagination.total,
        first: None,
        last: None,
        within: (collection_id != INDEX_COLLECTION).then(|| format!("{}/top", url)),
        start_index: Some(pagination.offset()),
        manifests: Some(manifests),
        collections: Vec::new(),
        next: pagination
            .has_next()
            .then(|| format!("{}/p{}", url, pagination.page + 1)),
        prev: pagination
            .has_prev()
            .then(|| format!("{}/p{}", url, pagination.page - 1)),
    }
}

/// Build one page of a collection from the store
///
/// Sub-collections are listed one level deep; each of them links to its
/// own top page for further nesting.
pub async fn build_collection(
    store: &dyn Store,
    collection_id: &str,
    token: PageToken,
    per_page: u32,
    base_url: &str,
    server_name: &str,
) -> Result<CollectionPage> {
    let (filter, label) = if collection_id == INDEX_COLLECTION {
        (None, index_label(server_name))
    } else {
        let collection = store
            .get_collection(collection_id)
            .await?
            .ok_or_else(|| CollectionError::UnknownCollection(collection_id.to_string()))?;
        (Some(collection_id), collection.label)
    };
    let total = u64::try_from(store.count_manifests(filter).await?).unwrap_or_default();

    match token {
        PageToken::Top => {
            let children = store.child_collection_counts(filter).await?;
            Ok(top_page(base_url, collection_id, &label, total, per_page, &children))
        }
        PageToken::Page(page) => {
            let pagination = Pagination::new(page, per_page, total);
            if page > pagination.pages() {
                return Err(CollectionError::PageOutOfRange {
                    page,
                    pages: pagination.pages(),
                }
                .into());
            }
            let rows = store
                .list_manifests(
                    filter,
                    i64::try_from(pagination.offset()).unwrap_or(i64::MAX),
                    i64::from(pagination.per_page),
                )
                .await?;
            let manifests = rows
                .iter()
                .map(|row| summarize(base_url, row))
                .collect::<Result<Vec<_>>>()?;
            Ok(content_page(base_url, collection_id, &label, pagination, manifests))
        }
    }
}
