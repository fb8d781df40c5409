//! METS document model
//!
//! Normalized, read-only view of a parsed METS/MODS document.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// MIME type used for JPEG images after normalization
pub const JPEG_MIME: &str = "image/jpeg";

/// An image file referenced from the METS file section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFile {
    /// `ID` of the `mets:file` element, unique within one document
    pub id: String,
    /// Absolute URL of the image, unique across documents
    pub url: String,
    pub mimetype: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ImageFile {
    pub fn new(id: impl Into<String>, url: impl Into<String>, mimetype: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            mimetype: normalize_mimetype(&mimetype.into()),
            width: None,
            height: None,
        }
    }

    /// Both dimensions are known
    pub fn has_dimensions(&self) -> bool {
        self.width.is_some() && self.height.is_some()
    }

    /// `(width, height)` if both are known
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        Some((self.width?, self.height?))
    }

    pub fn set_dimensions(&mut self, width: u32, height: u32) {
        self.width = Some(width);
        self.height = Some(height);
    }
}

/// Normalize a MIME type: drop parameters, lowercase, `jpg` -> `jpeg`
pub fn normalize_mimetype(mimetype: &str) -> String {
    let essence = mimetype
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if essence == "image/jpg" || essence == "image/pjpeg" {
        JPEG_MIME.to_string()
    } else {
        essence
    }
}

/// Whether a (possibly unnormalized) MIME type denotes a JPEG image
pub fn is_jpeg(mimetype: &str) -> bool {
    normalize_mimetype(mimetype) == JPEG_MIME
}

/// A physical item (usually one page) with its image variants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalItem {
    pub id: String,
    pub label: String,
    /// File ids in declaration order, resolved against [`Document::files`]
    pub file_ids: Vec<String>,
    /// IIIF Image API identifier assigned to this item
    pub image_id: String,
}

/// A logical table-of-contents entry
///
/// Children are stored as indices into the owning [`TocTree`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub logical_id: String,
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub physical_ids: Vec<String>,
    pub children: Vec<usize>,
}

impl TocEntry {
    /// Label, if present and not blank
    pub fn display_label(&self) -> Option<&str> {
        self.label.as_deref().map(str::trim).filter(|l| !l.is_empty())
    }
}

/// Immutable arena holding the logical structure forest
///
/// Nodes are stored in post-order: every child index is smaller than the
/// index of its parent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TocTree {
    nodes: Vec<TocEntry>,
    roots: Vec<usize>,
    by_logical_id: HashMap<String, usize>,
}

impl TocTree {
    /// Assemble a tree from post-ordered nodes and root indices
    pub(crate) fn from_parts(nodes: Vec<TocEntry>, roots: Vec<usize>) -> Self {
        let by_logical_id = nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (node.logical_id.clone(), idx))
            .collect();
        Self {
            nodes,
            roots,
            by_logical_id,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, idx: usize) -> &TocEntry {
        &self.nodes[idx]
    }

    /// Root entries in document order
    pub fn roots(&self) -> impl Iterator<Item = &TocEntry> + '_ {
        self.roots.iter().map(|&idx| &self.nodes[idx])
    }

    pub fn root_indices(&self) -> &[usize] {
        &self.roots
    }

    /// Direct children of an entry in document order
    pub fn children<'a>(&'a self, entry: &'a TocEntry) -> impl Iterator<Item = &'a TocEntry> + 'a {
        entry.children.iter().map(|&idx| &self.nodes[idx])
    }

    /// Look up an entry by its logical id
    pub fn get(&self, logical_id: &str) -> Option<&TocEntry> {
        self.by_logical_id.get(logical_id).map(|&idx| &self.nodes[idx])
    }

    /// All entries, children before parents
    pub fn iter(&self) -> impl Iterator<Item = (usize, &TocEntry)> {
        self.nodes.iter().enumerate()
    }
}

/// A `seeAlso` reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeeAlso {
    #[serde(rename = "@id")]
    pub id: String,
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

/// Descriptive metadata extracted from the MODS record and rights sections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Vec<String>,
    pub creator: Vec<String>,
    pub other_persons: Vec<String>,
    pub publisher: Option<String>,
    pub pub_place: Option<String>,
    pub pub_date: Option<String>,
    pub attribution: String,
    pub logo: Option<String>,
    pub see_also: Vec<SeeAlso>,
    pub related: Option<String>,
    /// License shorthand as declared (e.g. `cc-by`), `reserved` if absent
    pub license: String,
    pub language: Option<String>,
    pub genre: Option<String>,
    pub description: String,
}

/// A parsed METS document
#[derive(Debug, Clone)]
pub struct Document {
    /// URL the document was fetched from, if known
    pub url: Option<String>,
    pub primary_id: String,
    /// Identifier type -> value
    pub identifiers: BTreeMap<String, String>,
    pub metadata: Metadata,
    /// Image file registry keyed by file id
    pub files: BTreeMap<String, ImageFile>,
    /// Physical items in canonical page order
    pub physical_items: Vec<PhysicalItem>,
    pub toc: TocTree,
    /// Physical id -> position in `physical_items`
    pub(crate) by_physical_id: HashMap<String, usize>,
}

impl Document {
    /// Look up a physical item by its id
    pub fn physical_item(&self, id: &str) -> Option<&PhysicalItem> {
        self.by_physical_id
            .get(id)
            .and_then(|&idx| self.physical_items.get(idx))
    }

    /// Files of a physical item that are still present in the registry
    pub fn files_of<'a>(&'a self, item: &'a PhysicalItem) -> impl Iterator<Item = &'a ImageFile> + 'a {
        item.file_ids.iter().filter_map(|id| self.files.get(id))
    }
}
