//! Manifest building
//!
//! Pure mapping from a parsed [`Document`] with resolved image dimensions
//! to a IIIF Presentation 2.x manifest and the Image API descriptors of its
//! pages.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use super::metadata::{license_uri, make_label, make_metadata};
use super::types::{
    context, kind, profile, Annotation, Canvas, IiifImage, ImageInfo, ImageResource, ImageService,
    ImageVariant, Manifest, Range, Sequence, Size,
};
use crate::mets::{Document, ImageFile, PhysicalItem, TocTree, JPEG_MIME};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Physical item {0} has no image with known dimensions")]
    MissingDimensions(String),
}

/// URL scheme for everything served below `{base_url}/iiif`
#[derive(Debug, Clone)]
pub struct IiifUrls {
    base_url: String,
    prefix: String,
}

impl IiifUrls {
    pub fn new(base_url: &str, manifest_id: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let prefix = format!("{}/iiif/{}", base_url, manifest_id);
        Self { base_url, prefix }
    }

    pub fn manifest(&self) -> String {
        format!("{}/manifest", self.prefix)
    }

    pub fn sequence(&self, name: &str) -> String {
        format!("{}/sequence/{}.json", self.prefix, name)
    }

    pub fn canvas(&self, physical_id: &str) -> String {
        format!("{}/canvas/{}.json", self.prefix, physical_id)
    }

    pub fn annotation(&self, physical_id: &str) -> String {
        format!("{}/annotation/{}.json", self.prefix, physical_id)
    }

    pub fn range(&self, logical_id: &str) -> String {
        format!("{}/range/{}.json", self.prefix, logical_id)
    }

    /// Image API base URI of an image
    pub fn image_service(&self, image_id: &str) -> String {
        image_service_url(&self.base_url, image_id)
    }

    /// Image API request for the full image, or a `w,h` size
    pub fn image(&self, image_id: &str, size: Option<(u32, u32)>) -> String {
        let size = match size {
            Some((w, h)) => format!("{},{}", w, h),
            None => "full".to_string(),
        };
        format!("{}/full/{}/0/default.jpg", self.image_service(image_id), size)
    }
}

pub fn image_service_url(base_url: &str, image_id: &str) -> String {
    format!("{}/iiif/image/{}", base_url.trim_end_matches('/'), image_id)
}

/// Dimensioned files of an item with the largest and smallest one by height
///
/// Ties keep the file declared first.
fn extremes<'a>(doc: &'a Document, item: &'a PhysicalItem) -> Option<(&'a ImageFile, &'a ImageFile)> {
    let mut largest: Option<&ImageFile> = None;
    let mut smallest: Option<&ImageFile> = None;
    for file in doc.files_of(item).filter(|f| f.has_dimensions()) {
        if largest.map_or(true, |l| file.height > l.height) {
            largest = Some(file);
        }
        if smallest.map_or(true, |s| file.height < s.height) {
            smallest = Some(file);
        }
    }
    Some((largest?, smallest?))
}

/// Physical items that keep at least one file after filtering
fn usable_items(doc: &Document) -> impl Iterator<Item = &PhysicalItem> {
    doc.physical_items
        .iter()
        .filter(move |item| doc.files_of(item).next().is_some())
}

fn build_canvas(urls: &IiifUrls, doc: &Document, item: &PhysicalItem) -> Result<Canvas, BuildError> {
    let (largest, smallest) =
        extremes(doc, item).ok_or_else(|| BuildError::MissingDimensions(item.id.clone()))?;
    let (width, height) = largest.dimensions().unwrap_or_default();
    let (thumb_width, thumb_height) = smallest.dimensions().unwrap_or_default();

    let canvas_id = urls.canvas(&item.id);
    let service = ImageService {
        context: context::IMAGE.to_string(),
        id: urls.image_service(&item.image_id),
        profile: profile::LEVEL0.to_string(),
    };

    Ok(Canvas {
        id: canvas_id.clone(),
        kind: kind::CANVAS.to_string(),
        label: item.label.clone(),
        width,
        height,
        images: vec![Annotation {
            id: urls.annotation(&item.id),
            kind: kind::ANNOTATION.to_string(),
            motivation: kind::PAINTING.to_string(),
            resource: ImageResource {
                id: urls.image(&item.image_id, None),
                kind: kind::IMAGE.to_string(),
                format: JPEG_MIME.to_string(),
                width,
                height,
                service: Some(service.clone()),
            },
            on: canvas_id,
        }],
        thumbnail: ImageResource {
            id: urls.image(&item.image_id, Some((thumb_width, thumb_height))),
            kind: kind::IMAGE.to_string(),
            format: JPEG_MIME.to_string(),
            width: thumb_width,
            height: thumb_height,
            service: Some(service),
        },
    })
}

/// Translate the TOC forest into ranges
///
/// Every labeled entry becomes a range covering the canvases of its own
/// links and of all its descendants. Unlabeled entries produce no range;
/// their labeled descendants attach to the nearest labeled ancestor.
fn build_ranges(urls: &IiifUrls, toc: &TocTree, canvas_ids: &HashMap<&str, String>) -> Vec<Range> {
    // Children precede parents in the arena, so one pass fills the memo
    let mut covered: Vec<Vec<String>> = Vec::with_capacity(toc.len());
    for (_, entry) in toc.iter() {
        let mut seen = HashSet::new();
        let mut canvases = Vec::new();
        for physical_id in &entry.physical_ids {
            match canvas_ids.get(physical_id.as_str()) {
                Some(canvas) => {
                    if seen.insert(canvas.clone()) {
                        canvases.push(canvas.clone());
                    }
                }
                None => tracing::warn!(
                    "Could not find a matching canvas for {} in {}",
                    physical_id,
                    entry.logical_id
                ),
            }
        }
        for &child in &entry.children {
            for canvas in &covered[child] {
                if seen.insert(canvas.clone()) {
                    canvases.push(canvas.clone());
                }
            }
        }
        covered.push(canvases);
    }

    let mut ranges = Vec::new();
    for &root in toc.root_indices() {
        emit_range(urls, toc, &covered, root, &mut ranges);
    }
    ranges
}

/// Append the ranges of a subtree in pre-order, returning the ids of the
/// topmost ranges emitted for it
fn emit_range(
    urls: &IiifUrls,
    toc: &TocTree,
    covered: &[Vec<String>],
    idx: usize,
    out: &mut Vec<Range>,
) -> Vec<String> {
    let entry = toc.node(idx);
    let Some(label) = entry.display_label() else {
        return entry
            .children
            .iter()
            .flat_map(|&child| emit_range(urls, toc, covered, child, out))
            .collect();
    };

    let position = out.len();
    let id = urls.range(&entry.logical_id);
    out.push(Range {
        id: id.clone(),
        kind: kind::RANGE.to_string(),
        label: label.to_string(),
        canvases: covered[idx].clone(),
        ranges: Vec::new(),
    });
    let nested: Vec<String> = entry
        .children
        .iter()
        .flat_map(|&child| emit_range(urls, toc, covered, child, out))
        .collect();
    out[position].ranges = nested;
    vec![id]
}

/// Build the manifest for a document whose dimensions have been resolved
pub fn build_manifest(manifest_id: &str, doc: &Document, base_url: &str) -> Result<Manifest, BuildError> {
    let urls = IiifUrls::new(base_url, manifest_id);
    let meta = &doc.metadata;

    let canvases = usable_items(doc)
        .map(|item| build_canvas(&urls, doc, item))
        .collect::<Result<Vec<_>, _>>()?;
    let canvas_ids: HashMap<&str, String> = usable_items(doc)
        .zip(&canvases)
        .map(|(item, canvas)| (item.id.as_str(), canvas.id.clone()))
        .collect();
    let structures = build_ranges(&urls, &doc.toc, &canvas_ids);

    tracing::debug!(
        manifest_id,
        canvases = canvases.len(),
        ranges = structures.len(),
        "Built manifest"
    );

    Ok(Manifest {
        context: context::PRESENTATION.to_string(),
        id: urls.manifest(),
        kind: kind::MANIFEST.to_string(),
        label: make_label(meta),
        metadata: make_metadata(meta, &doc.identifiers),
        description: meta.description.clone(),
        see_also: meta.see_also.clone(),
        related: meta.related.clone(),
        attribution: meta.attribution.clone(),
        logo: meta.logo.clone(),
        license: license_uri(&meta.license),
        sequences: vec![Sequence {
            id: urls.sequence("default"),
            kind: kind::SEQUENCE.to_string(),
            canvases,
        }],
        structures,
        within: Vec::new(),
    })
}

/// Image API descriptors for every usable physical item
pub fn build_image_infos(doc: &Document, base_url: &str) -> Vec<IiifImage> {
    usable_items(doc)
        .filter_map(|item| {
            let (largest, _) = extremes(doc, item)?;
            let (width, height) = largest.dimensions()?;
            let variants: Vec<ImageVariant> = doc
                .files_of(item)
                .filter_map(|file| {
                    let (width, height) = file.dimensions()?;
                    Some(ImageVariant {
                        url: file.url.clone(),
                        width,
                        height,
                        format: file.mimetype.clone(),
                    })
                })
                .collect();
            let sizes = variants
                .iter()
                .map(|v| Size {
                    width: v.width,
                    height: v.height,
                })
                .collect();

            Some(IiifImage {
                id: item.image_id.clone(),
                info: ImageInfo {
                    context: context::IMAGE.to_string(),
                    id: image_service_url(base_url, &item.image_id),
                    protocol: profile::IMAGE_PROTOCOL.to_string(),
                    profile: vec![profile::LEVEL0.to_string()],
                    width,
                    height,
                    sizes,
                },
                variants,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mets::fixtures::{generate_mets, SAMPLE_METS};
    use crate::mets::{parse, TocEntry};

    const BASE: &str = "https://iiif.example.org";

    /// Give every file of an item a size, growing with declaration order
    fn with_sizes(mut doc: Document) -> Document {
        for item in &doc.physical_items {
            for (n, file_id) in item.file_ids.iter().enumerate() {
                let n = n as u32 + 1;
                if let Some(file) = doc.files.get_mut(file_id) {
                    file.set_dimensions(100 * n, 150 * n);
                }
            }
        }
        doc
    }

    fn sample() -> Document {
        with_sizes(parse(SAMPLE_METS, Some("http://example.org/mets.xml")).unwrap())
    }

    #[test]
    fn test_manifest_top_level() {
        let doc = sample();
        let manifest = build_manifest("abc", &doc, BASE).unwrap();

        assert_eq!(manifest.id, "https://iiif.example.org/iiif/abc/manifest");
        assert_eq!(manifest.label, "Dilherr, Johann Michael: Die Beispielschrift. Ein Test (Nürnberg, 1663)");
        assert_eq!(manifest.license, "http://creativecommons.org/licenses/by/4.0");
        assert_eq!(manifest.attribution, doc.metadata.attribution);
        assert_eq!(manifest.see_also.len(), 2);
        assert_eq!(manifest.sequences.len(), 1);
        assert_eq!(
            manifest.sequences[0].id,
            "https://iiif.example.org/iiif/abc/sequence/default.json"
        );

        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(json["@context"], context::PRESENTATION);
        assert_eq!(json["@type"], "sc:Manifest");
        assert_eq!(json["seeAlso"][0]["@id"], "http://example.org/mets.xml");
        assert!(json.get("within").is_none());
    }

    #[test]
    fn test_canvases_follow_physical_order() {
        let doc = sample();
        let manifest = build_manifest("abc", &doc, BASE).unwrap();
        let canvases = &manifest.sequences[0].canvases;

        let ids: Vec<&str> = canvases.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "https://iiif.example.org/iiif/abc/canvas/PHYS_0001.json",
                "https://iiif.example.org/iiif/abc/canvas/PHYS_0002.json",
                "https://iiif.example.org/iiif/abc/canvas/PHYS_0003.json",
            ]
        );
        assert_eq!(canvases[0].label, "Titel");
    }

    #[test]
    fn test_canvas_uses_largest_and_thumbnail_smallest() {
        let mut doc = sample();
        // Thumbnail variant declared second but smaller
        doc.files.get_mut("IMG_DEFAULT_1").unwrap().set_dimensions(1200, 1800);
        doc.files.get_mut("IMG_THUMB_1").unwrap().set_dimensions(80, 120);
        let image_id = doc.physical_items[0].image_id.clone();

        let manifest = build_manifest("abc", &doc, BASE).unwrap();
        let canvas = &manifest.sequences[0].canvases[0];

        assert_eq!((canvas.width, canvas.height), (1200, 1800));
        assert_eq!((canvas.thumbnail.width, canvas.thumbnail.height), (80, 120));
        assert_eq!(
            canvas.thumbnail.id,
            format!("https://iiif.example.org/iiif/image/{}/full/80,120/0/default.jpg", image_id)
        );

        let anno = &canvas.images[0];
        assert_eq!(anno.on, canvas.id);
        assert_eq!(anno.id, "https://iiif.example.org/iiif/abc/annotation/PHYS_0001.json");
        assert_eq!(
            anno.resource.id,
            format!("https://iiif.example.org/iiif/image/{}/full/full/0/default.jpg", image_id)
        );
        assert_eq!(
            anno.resource.service.as_ref().unwrap().id,
            format!("https://iiif.example.org/iiif/image/{}", image_id)
        );
    }

    #[test]
    fn test_items_without_files_are_excluded() {
        let mut doc = sample();
        doc.files.remove("IMG_DEFAULT_2");
        doc.files.remove("IMG_THUMB_2");

        let manifest = build_manifest("abc", &doc, BASE).unwrap();
        let canvases = &manifest.sequences[0].canvases;
        assert_eq!(canvases.len(), 2);
        assert!(canvases.iter().all(|c| !c.id.ends_with("PHYS_0002.json")));
        assert_eq!(build_image_infos(&doc, BASE).len(), 2);
    }

    #[test]
    fn test_missing_dimensions_is_an_error() {
        let mut doc = sample();
        doc.files.get_mut("IMG_DEFAULT_3").unwrap().width = None;
        doc.files.get_mut("IMG_THUMB_3").unwrap().height = None;

        match build_manifest("abc", &doc, BASE) {
            Err(BuildError::MissingDimensions(id)) => assert_eq!(id, "PHYS_0003"),
            other => panic!("unexpected result: {:?}", other.map(|m| m.id)),
        }
    }

    #[test]
    fn test_ranges_mirror_toc() {
        let doc = sample();
        let manifest = build_manifest("abc", &doc, BASE).unwrap();
        let ranges = &manifest.structures;

        let ids: Vec<&str> = ranges
            .iter()
            .map(|r| r.id.rsplit('/').next().unwrap())
            .collect();
        // LOG_2 has no label and gets no range of its own
        assert_eq!(ids, vec!["LOG_0.json", "LOG_1.json", "LOG_3.json", "LOG_4.json"]);

        let canvas = |phys: &str| format!("https://iiif.example.org/iiif/abc/canvas/{}.json", phys);
        let root = &ranges[0];
        assert_eq!(root.label, "Beispielschrift");
        assert_eq!(root.canvases, vec![canvas("PHYS_0001"), canvas("PHYS_0002"), canvas("PHYS_0003")]);
        assert_eq!(
            root.ranges,
            vec![ranges[1].id.clone(), ranges[2].id.clone(), ranges[3].id.clone()]
        );

        // Unresolvable PHYS_9999 is skipped
        assert_eq!(ranges[3].canvases, vec![canvas("PHYS_0003")]);
        assert_eq!(ranges[2].canvases, vec![canvas("PHYS_0002")]);
    }

    #[test]
    fn test_range_ids_are_stable() {
        let first = build_manifest("abc", &sample(), BASE).unwrap();
        let second = build_manifest("abc", &sample(), BASE).unwrap();
        let ids = |m: &Manifest| m.structures.iter().map(|r| r.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
    }

    #[test]
    fn test_unlabeled_root_children_are_visited() {
        let entry = |id: &str, label: Option<&str>, phys: &[&str], children: Vec<usize>| TocEntry {
            logical_id: id.to_string(),
            label: label.map(str::to_string),
            kind: None,
            physical_ids: phys.iter().map(|p| p.to_string()).collect(),
            children,
        };
        let mut doc = sample();
        doc.toc = TocTree::from_parts(
            vec![
                entry("A", Some("Part A"), &["PHYS_0001"], vec![]),
                entry("B", Some(""), &["PHYS_0002"], vec![]),
                entry("ROOT", None, &[], vec![0, 1]),
            ],
            vec![2],
        );

        let manifest = build_manifest("abc", &doc, BASE).unwrap();
        assert_eq!(manifest.structures.len(), 1);
        assert_eq!(manifest.structures[0].label, "Part A");
    }

    #[test]
    fn test_image_infos() {
        let doc = sample();
        let infos = build_image_infos(&doc, BASE);
        assert_eq!(infos.len(), 3);

        let first = &infos[0];
        assert_eq!(first.id, doc.physical_items[0].image_id);
        assert_eq!(first.info.id, format!("https://iiif.example.org/iiif/image/{}", first.id));
        assert_eq!((first.info.width, first.info.height), (200, 300));
        assert_eq!(first.info.sizes.len(), 2);
        assert_eq!(first.variants[0].url, "http://example.org/default/1.jpg");
        assert_eq!(first.variants[0].format, "image/jpeg");

        let json = serde_json::to_value(&first.info).unwrap();
        assert_eq!(json["profile"][0], profile::LEVEL0);
        assert_eq!(json["protocol"], "http://iiif.io/api/image");
    }

    #[test]
    fn test_large_document_canvas_count() {
        let doc = with_sizes(parse(&generate_mets(904, 4), None).unwrap());
        let manifest = build_manifest("big", &doc, BASE).unwrap();

        assert_eq!(manifest.sequences[0].canvases.len(), 904);
        let canvas = &manifest.sequences[0].canvases[10];
        assert_eq!((canvas.width, canvas.height), (400, 600));
        assert_eq!((canvas.thumbnail.width, canvas.thumbnail.height), (100, 150));
        assert_eq!(manifest.structures.len(), 905);
    }
}
