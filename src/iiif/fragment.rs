//! Lookup of resources embedded in a stored manifest

use std::str::FromStr;

use serde_json::Value;

use super::collection::{collection_url, index_label, INDEX_COLLECTION};
use super::types::{kind, CollectionRef};
use crate::db::CollectionRow;

/// Resource types addressable below a manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    Sequence,
    Canvas,
    Annotation,
    Range,
}

impl FragmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentKind::Sequence => "sequence",
            FragmentKind::Canvas => "canvas",
            FragmentKind::Annotation => "annotation",
            FragmentKind::Range => "range",
        }
    }
}

impl FromStr for FragmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sequence" => Ok(FragmentKind::Sequence),
            "canvas" => Ok(FragmentKind::Canvas),
            "annotation" => Ok(FragmentKind::Annotation),
            "range" => Ok(FragmentKind::Range),
            other => Err(other.to_string()),
        }
    }
}

fn has_id(value: &Value, suffix: &str) -> bool {
    value
        .get("@id")
        .and_then(Value::as_str)
        .is_some_and(|id| id.ends_with(suffix))
}

fn array<'a>(value: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> + 'a {
    value
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

/// Find a sequence, canvas, annotation or range by name
///
/// `name` may carry a `.json` extension.
pub fn find_fragment(manifest: &Value, kind: FragmentKind, name: &str) -> Option<Value> {
    let name = name.strip_suffix(".json").unwrap_or(name);
    let suffix = format!("/{}/{}.json", kind.as_str(), name);

    let sequences = || array(manifest, "sequences");
    let canvases = move || sequences().flat_map(|s| array(s, "canvases"));

    let found = match kind {
        FragmentKind::Sequence => sequences().find(|s| has_id(s, &suffix)),
        FragmentKind::Canvas => canvases().find(|c| has_id(c, &suffix)),
        FragmentKind::Annotation => canvases()
            .flat_map(|c| array(c, "images"))
            .find(|a| has_id(a, &suffix)),
        FragmentKind::Range => array(manifest, "structures").find(|r| has_id(r, &suffix)),
    };
    found.cloned()
}

/// Collections a served manifest is `within`: the index, then every
/// collection it belongs to
pub fn within_refs(base_url: &str, server_name: &str, collections: &[CollectionRow]) -> Vec<CollectionRef> {
    let index = CollectionRef {
        id: format!("{}/top", collection_url(base_url, INDEX_COLLECTION)),
        kind: kind::COLLECTION.to_string(),
        label: index_label(server_name),
    };

    std::iter::once(index)
        .chain(collections.iter().map(|c| CollectionRef {
            id: format!("{}/top", collection_url(base_url, &c.id)),
            kind: kind::COLLECTION.to_string(),
            label: c.label.clone(),
        }))
        .collect()
}
