//! IIIF Presentation 2.x and Image 2.x JSON shapes

use serde::{Deserialize, Serialize};

use crate::mets::SeeAlso;

/// JSON-LD contexts
pub mod context {
    pub const PRESENTATION: &str = "http://iiif.io/api/presentation/2/context.json";
    pub const IMAGE: &str = "http://iiif.io/api/image/2/context.json";
}

/// Image API protocol and compliance profile
pub mod profile {
    pub const IMAGE_PROTOCOL: &str = "http://iiif.io/api/image";
    pub const LEVEL0: &str = "http://iiif.io/api/image/2/level0.json";
}

/// `@type` values
pub mod kind {
    pub const MANIFEST: &str = "sc:Manifest";
    pub const SEQUENCE: &str = "sc:Sequence";
    pub const CANVAS: &str = "sc:Canvas";
    pub const RANGE: &str = "sc:Range";
    pub const COLLECTION: &str = "sc:Collection";
    pub const ANNOTATION: &str = "oa:Annotation";
    pub const IMAGE: &str = "dctypes:Image";
    pub const PAINTING: &str = "sc:painting";
}

/// A value in one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageValue {
    #[serde(rename = "@value")]
    pub value: String,
    #[serde(rename = "@language")]
    pub language: String,
}

/// Metadata label, either plain or localized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataLabel {
    Plain(String),
    Localized(Vec<LanguageValue>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Text(String),
    List(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub label: MetadataLabel,
    pub value: MetadataValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageService {
    #[serde(rename = "@context")]
    pub context: String,
    #[serde(rename = "@id")]
    pub id: String,
    pub profile: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResource {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: String,
    pub format: String,
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<ImageService>,
}

/// Image annotation painting a resource onto a canvas
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: String,
    pub motivation: String,
    pub resource: ImageResource,
    pub on: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: String,
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub images: Vec<Annotation>,
    pub thumbnail: ImageResource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: String,
    pub canvases: Vec<Canvas>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: String,
    pub label: String,
    pub canvases: Vec<String>,
    /// Ids of directly nested ranges
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ranges: Vec<String>,
}

/// Reference to a collection a manifest belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionRef {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(rename = "@context")]
    pub context: String,
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<MetadataEntry>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(rename = "seeAlso", default, skip_serializing_if = "Vec::is_empty")]
    pub see_also: Vec<SeeAlso>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related: Option<String>,
    pub attribution: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub license: String,
    pub sequences: Vec<Sequence>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub structures: Vec<Range>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub within: Vec<CollectionRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

/// Image API `info.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    #[serde(rename = "@context")]
    pub context: String,
    #[serde(rename = "@id")]
    pub id: String,
    pub protocol: String,
    pub profile: Vec<String>,
    pub width: u32,
    pub height: u32,
    pub sizes: Vec<Size>,
}

/// A concrete image file backing a IIIF image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageVariant {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub format: String,
}

/// IIIF image with its variants, as persisted after an import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IiifImage {
    pub id: String,
    pub info: ImageInfo,
    pub variants: Vec<ImageVariant>,
}
