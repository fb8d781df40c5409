//! METS/MODS parser using roxmltree
//!
//! Coupled to the METS/MODS profile used by the DFG-Viewer: descriptive
//! metadata comes from the first MODS record, rights from the `dv:` rights
//! metadata, pages from the PHYSICAL structure map and the table of contents
//! from the LOGICAL structure map plus the `structLink` section.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use roxmltree::{Node, ParsingOptions};
use thiserror::Error;
use uuid::Uuid;

use super::types::{
    normalize_mimetype, Document, ImageFile, Metadata, PhysicalItem, SeeAlso, TocEntry, TocTree,
};

pub const METS_NS: &str = "http://www.loc.gov/METS/";
pub const MODS_NS: &str = "http://www.loc.gov/mods/v3";
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
pub const DV_NS: &str = "http://dfg-viewer.de/";

/// License value used when a document does not declare one
pub const RESERVED_LICENSE: &str = "reserved";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("Missing required element: {0}")]
    MissingElement(&'static str),
    #[error("METS at {0} does not reference any images")]
    NoImages(String),
    #[error("Cannot decode document: {0}")]
    Encoding(String),
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode a fetched document according to its XML declaration
///
/// UTF-8 is assumed when no encoding is declared. ISO-8859-1 is mapped
/// byte for byte; any other declared encoding is rejected.
pub fn decode(bytes: &[u8]) -> Result<Cow<'_, str>, ParseError> {
    match declared_encoding(bytes).as_deref() {
        None | Some("utf-8" | "utf8") => {
            let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
            std::str::from_utf8(bytes)
                .map(Cow::Borrowed)
                .map_err(|e| ParseError::Encoding(format!("invalid UTF-8: {}", e)))
        }
        Some("iso-8859-1" | "latin1" | "latin-1" | "us-ascii") => {
            Ok(Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()))
        }
        Some(other) => Err(ParseError::Encoding(format!("unsupported encoding {}", other))),
    }
}

/// Lowercased `encoding` pseudo-attribute of the XML declaration
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let prolog = bytes.strip_prefix(b"<?xml")?;
    let end = prolog.windows(2).position(|w| w == b"?>")?;
    let declaration = std::str::from_utf8(&prolog[..end]).ok()?;

    let (_, rest) = declaration.split_once("encoding")?;
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = rest[1..].split(quote).next()?;
    Some(value.trim().to_ascii_lowercase())
}

/// Parse a METS document
///
/// `url` is the location the document was retrieved from. It is linked
/// from the `seeAlso` metadata and used in error messages.
pub fn parse(xml: &str, url: Option<&str>) -> Result<Document, ParseError> {
    let mut options = ParsingOptions::default();
    options.allow_dtd = true;
    let doc = roxmltree::Document::parse_with_options(xml, options)?;
    MetsParser::new(&doc, url)?.parse()
}

struct MetsParser<'a, 'input> {
    root: Node<'a, 'input>,
    mods: Node<'a, 'input>,
    url: Option<&'a str>,
}

impl<'a, 'input> MetsParser<'a, 'input> {
    fn new(doc: &'a roxmltree::Document<'input>, url: Option<&'a str>) -> Result<Self, ParseError> {
        let root = doc.root();
        let mods = root
            .descendants()
            .find(|n| is_element(*n, MODS_NS, "mods"))
            .ok_or(ParseError::MissingElement("mods:mods"))?;
        Ok(Self { root, mods, url })
    }

    fn parse(&self) -> Result<Document, ParseError> {
        let identifiers = self.read_identifiers();
        let primary_id = self.primary_identifier();
        let metadata = self.read_metadata()?;

        let files = self.read_files();
        if files.is_empty() {
            return Err(ParseError::NoImages(
                self.url.unwrap_or("<unknown>").to_string(),
            ));
        }

        let physical_items = self.read_physical_items(&files)?;
        let toc = self.read_toc();

        tracing::debug!(
            primary_id = %primary_id,
            files = files.len(),
            physical_items = physical_items.len(),
            toc_entries = toc.len(),
            "Parsed METS document"
        );

        let by_physical_id = physical_items
            .iter()
            .enumerate()
            .map(|(idx, item)| (item.id.clone(), idx))
            .collect();

        Ok(Document {
            url: self.url.map(str::to_string),
            primary_id,
            identifiers,
            metadata,
            files,
            physical_items,
            toc,
            by_physical_id,
        })
    }

    fn read_identifiers(&self) -> BTreeMap<String, String> {
        let mut identifiers: BTreeMap<String, String> = children(self.mods, MODS_NS, "identifier")
            .filter_map(|e| Some((e.attribute("type")?.to_string(), text_of(e)?)))
            .collect();

        if let Some(record_id) = child(self.mods, MODS_NS, "recordInfo")
            .and_then(|info| child(info, MODS_NS, "recordIdentifier"))
        {
            if let Some(value) = text_of(record_id) {
                let source = record_id.attribute("source").unwrap_or("recordIdentifier");
                identifiers.insert(source.to_string(), value);
            }
        }

        identifiers
    }

    /// First non-empty of: `oai` identifier, `urn` identifier, record
    /// identifier, random id
    fn primary_identifier(&self) -> String {
        ["oai", "urn"]
            .iter()
            .find_map(|kind| {
                children(self.mods, MODS_NS, "identifier")
                    .find(|e| e.attribute("type") == Some(*kind))
                    .and_then(text_of)
            })
            .or_else(|| {
                child(self.mods, MODS_NS, "recordInfo")
                    .and_then(|info| child(info, MODS_NS, "recordIdentifier"))
                    .and_then(text_of)
            })
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string())
    }

    fn read_metadata(&self) -> Result<Metadata, ParseError> {
        let mut metadata = Metadata {
            title: self.read_titles()?,
            ..Metadata::default()
        };

        for name in children(self.mods, MODS_NS, "name") {
            let Some(display) = parse_name(name) else {
                continue;
            };
            let role = child(name, MODS_NS, "role")
                .and_then(|r| child(r, MODS_NS, "roleTerm"))
                .and_then(text_of);
            if role.as_deref() == Some("aut") {
                metadata.creator.push(display);
            } else {
                metadata.other_persons.push(display);
            }
        }

        if let Some(origin) = child(self.mods, MODS_NS, "originInfo") {
            metadata.publisher = child(origin, MODS_NS, "publisher").and_then(text_of);
            metadata.pub_place = child(origin, MODS_NS, "place")
                .and_then(|p| child(p, MODS_NS, "placeTerm"))
                .and_then(text_of);
            metadata.pub_date = child(origin, MODS_NS, "dateIssued").and_then(text_of);
        }

        let owner_url = self.find_nested((METS_NS, "rightsMD"), (DV_NS, "ownerSiteURL"));
        let owner = self.find_nested((METS_NS, "rightsMD"), (DV_NS, "owner"));
        metadata.attribution = match (owner_url, owner) {
            (Some(url), owner) => {
                let name = owner.unwrap_or_else(|| url.clone());
                format!("<a href='{}'>{}</a>", url, name)
            }
            (None, Some(owner)) => owner,
            (None, None) => "Unknown".to_string(),
        };
        metadata.logo = self.find_nested((METS_NS, "rightsMD"), (DV_NS, "ownerLogo"));

        if let Some(url) = self.url {
            metadata.see_also.push(SeeAlso {
                id: url.to_string(),
                format: "text/xml".to_string(),
                profile: Some(METS_NS.to_string()),
            });
        }
        let pdf_urls = self.download_pdf_urls();
        if let [pdf_url] = pdf_urls.as_slice() {
            metadata.see_also.push(SeeAlso {
                id: pdf_url.clone(),
                format: "application/pdf".to_string(),
                profile: None,
            });
        }

        metadata.related = self.find_nested((METS_NS, "digiprovMD"), (DV_NS, "presentation"));
        metadata.license = self
            .find_nested((DV_NS, "rights"), (DV_NS, "license"))
            .or_else(|| self.find_text(MODS_NS, "accessCondition"))
            .unwrap_or_else(|| RESERVED_LICENSE.to_string());

        metadata.language = self
            .root
            .descendants()
            .filter(|n| is_element(*n, MODS_NS, "languageTerm"))
            .filter(|n| n.attribute("type") == Some("text"))
            .find_map(text_of);
        metadata.genre = self.find_text(MODS_NS, "genre");
        metadata.description = self.find_text(MODS_NS, "abstract").unwrap_or_default();

        Ok(metadata)
    }

    fn read_titles(&self) -> Result<Vec<String>, ParseError> {
        let mut title_elems: Vec<Node> = children(self.mods, MODS_NS, "titleInfo").collect();
        if title_elems.is_empty() {
            // Volumes of multi-volume works only carry the title of their host
            title_elems.extend(
                self.root
                    .descendants()
                    .filter(|n| is_element(*n, MODS_NS, "relatedItem"))
                    .filter(|n| n.attribute("type") == Some("host"))
                    .find_map(|host| child(host, MODS_NS, "titleInfo")),
            );
        }

        let mut titles: Vec<String> = title_elems.into_iter().filter_map(parse_title).collect();
        if titles.is_empty() {
            return Err(ParseError::MissingElement("mods:titleInfo"));
        }

        let part_number = self
            .root
            .descendants()
            .filter(|n| is_element(*n, MODS_NS, "part"))
            .flat_map(|part| children(part, MODS_NS, "detail"))
            .find_map(|detail| child(detail, MODS_NS, "number").and_then(text_of));
        if let Some(number) = part_number {
            titles = titles
                .into_iter()
                .map(|title| format!("{} ({})", title, number))
                .collect();
        }

        Ok(titles)
    }

    fn download_pdf_urls(&self) -> Vec<String> {
        self.root
            .descendants()
            .filter(|n| is_element(*n, METS_NS, "fileGrp") && n.attribute("USE") == Some("DOWNLOAD"))
            .flat_map(|grp| children(grp, METS_NS, "file"))
            .filter(|f| f.attribute("MIMETYPE") == Some("application/pdf"))
            .flat_map(|f| children(f, METS_NS, "FLocat"))
            .filter_map(|loc| loc.attribute((XLINK_NS, "href")).map(str::to_string))
            .collect()
    }

    /// Image file registry: every `mets:file` with an image MIME type and an
    /// absolute URL locator
    fn read_files(&self) -> BTreeMap<String, ImageFile> {
        let mut files = BTreeMap::new();
        for elem in self
            .root
            .descendants()
            .filter(|n| is_element(*n, METS_NS, "file"))
        {
            let Some(id) = elem.attribute("ID") else {
                continue;
            };
            let mimetype = normalize_mimetype(elem.attribute("MIMETYPE").unwrap_or_default());
            if !mimetype.starts_with("image/") {
                continue;
            }
            let url = children(elem, METS_NS, "FLocat")
                .filter(|loc| loc.attribute("LOCTYPE") == Some("URL"))
                .find_map(|loc| loc.attribute((XLINK_NS, "href")));
            match url {
                Some(url) if is_absolute_url(url) => {
                    files.insert(id.to_string(), ImageFile::new(id, url, mimetype));
                }
                _ => continue,
            }
        }
        files
    }

    fn read_physical_items(
        &self,
        files: &BTreeMap<String, ImageFile>,
    ) -> Result<Vec<PhysicalItem>, ParseError> {
        let struct_map = self
            .root
            .descendants()
            .find(|n| is_element(*n, METS_NS, "structMap") && n.attribute("TYPE") == Some("PHYSICAL"))
            .ok_or(ParseError::MissingElement("mets:structMap[@TYPE='PHYSICAL']"))?;

        let mut pages: Vec<(Option<u64>, Node)> = children(struct_map, METS_NS, "div")
            .filter(|seq| seq.attribute("TYPE") == Some("physSequence"))
            .flat_map(|seq| children(seq, METS_NS, "div"))
            .filter(|div| div.attribute("TYPE") == Some("page"))
            .map(|div| {
                let order = div.attribute("ORDER").and_then(|o| o.trim().parse().ok());
                (order, div)
            })
            .collect();
        // Stable sort keeps document order for equal or missing ORDER values
        pages.sort_by_key(|(order, _)| order.unwrap_or(u64::MAX));

        let mut items = Vec::with_capacity(pages.len());
        for (_, div) in pages {
            let Some(id) = div.attribute("ID") else {
                tracing::warn!("Skipping physical division without ID");
                continue;
            };
            let label = ["LABEL", "ORDERLABEL", "ORDER"]
                .iter()
                .filter_map(|attr| div.attribute(*attr))
                .map(str::trim)
                .find(|value| !value.is_empty())
                .unwrap_or("?")
                .to_string();
            let file_ids = children(div, METS_NS, "fptr")
                .filter_map(|ptr| ptr.attribute("FILEID"))
                .filter(|file_id| {
                    let known = files.contains_key(*file_id);
                    if !known {
                        tracing::debug!("Dropping unresolvable file pointer {} on {}", file_id, id);
                    }
                    known
                })
                .map(str::to_string)
                .collect();

            items.push(PhysicalItem {
                id: id.to_string(),
                label,
                file_ids,
                image_id: Uuid::new_v4().simple().to_string(),
            });
        }

        Ok(items)
    }

    fn read_toc(&self) -> TocTree {
        let mut links: HashMap<&str, Vec<String>> = HashMap::new();
        for link in self
            .root
            .descendants()
            .filter(|n| is_element(*n, METS_NS, "smLink"))
        {
            if let (Some(from), Some(to)) = (
                link.attribute((XLINK_NS, "from")),
                link.attribute((XLINK_NS, "to")),
            ) {
                links.entry(from).or_default().push(to.to_string());
            }
        }

        let mut nodes = Vec::new();
        let roots = self
            .root
            .descendants()
            .filter(|n| is_element(*n, METS_NS, "structMap") && n.attribute("TYPE") == Some("LOGICAL"))
            .flat_map(|map| children(map, METS_NS, "div"))
            .map(|div| push_toc_entry(div, &links, &mut nodes))
            .collect();

        TocTree::from_parts(nodes, roots)
    }

    /// Text of the first `target` element nested anywhere below an
    /// `ancestor` element
    fn find_nested(&self, ancestor: (&str, &str), target: (&str, &str)) -> Option<String> {
        self.root
            .descendants()
            .filter(|n| is_element(*n, ancestor.0, ancestor.1))
            .find_map(|a| {
                a.descendants()
                    .find(|n| is_element(*n, target.0, target.1))
                    .and_then(text_of)
            })
    }

    fn find_text(&self, ns: &str, name: &str) -> Option<String> {
        self.root
            .descendants()
            .find(|n| is_element(*n, ns, name))
            .and_then(text_of)
    }
}

/// Add a logical division and its descendants to the arena, children first
fn push_toc_entry(div: Node, links: &HashMap<&str, Vec<String>>, nodes: &mut Vec<TocEntry>) -> usize {
    let children = children(div, METS_NS, "div")
        .map(|c| push_toc_entry(c, links, nodes))
        .collect();
    let logical_id = div.attribute("ID").unwrap_or_default();
    nodes.push(TocEntry {
        logical_id: logical_id.to_string(),
        label: div.attribute("LABEL").map(str::to_string),
        kind: div.attribute("TYPE").map(str::to_string),
        physical_ids: links.get(logical_id).cloned().unwrap_or_default(),
        children,
    });
    nodes.len() - 1
}

fn parse_title(title_info: Node) -> Option<String> {
    let title = descendant(title_info, MODS_NS, "title").and_then(text_of);
    // nonSort usually carries its own trailing whitespace
    let non_sort = descendant(title_info, MODS_NS, "nonSort").and_then(|n| n.text());
    let mut full = format!("{}{}", non_sort.unwrap_or_default(), title.unwrap_or_default());
    if full.trim().is_empty() {
        return None;
    }
    if let Some(subtitle) = descendant(title_info, MODS_NS, "subTitle").and_then(text_of) {
        full = format!("{}. {}", full, subtitle);
    }
    Some(full)
}

fn parse_name(name: Node) -> Option<String> {
    child(name, MODS_NS, "displayForm").and_then(text_of).or_else(|| {
        let parts: Vec<String> = children(name, MODS_NS, "namePart").filter_map(text_of).collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    })
}

fn is_absolute_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn is_element(node: Node, ns: &str, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name && node.tag_name().namespace() == Some(ns)
}

fn child<'a, 'input>(node: Node<'a, 'input>, ns: &str, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|c| is_element(*c, ns, name))
}

fn children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    ns: &'static str,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |c| is_element(*c, ns, name))
}

fn descendant<'a, 'input>(node: Node<'a, 'input>, ns: &str, name: &str) -> Option<Node<'a, 'input>> {
    node.descendants().find(|c| is_element(*c, ns, name))
}

fn text_of(node: Node) -> Option<String> {
    node.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mets::fixtures::{generate_mets, SAMPLE_METS};

    const SAMPLE_URL: &str = "http://example.org/mets/sample.xml";

    #[test]
    fn test_parse_sample_files() {
        let doc = parse(SAMPLE_METS, Some(SAMPLE_URL)).unwrap();

        // Local file locator and PDF are not part of the image registry
        assert_eq!(doc.files.len(), 6);
        assert!(doc.files.values().all(|f| f.mimetype == "image/jpeg"));
        assert!(!doc.files.contains_key("IMG_LOCAL_1"));
        assert!(!doc.files.contains_key("PDF_1"));
        assert_eq!(doc.files["IMG_DEFAULT_2"].url, "http://example.org/default/2.jpg");
    }

    #[test]
    fn test_parse_sample_identifiers() {
        let doc = parse(SAMPLE_METS, Some(SAMPLE_URL)).unwrap();

        assert_eq!(doc.primary_id, "urn:nbn:de:test-1");
        assert_eq!(doc.identifiers.get("urn").map(String::as_str), Some("urn:nbn:de:test-1"));
        assert_eq!(doc.identifiers.get("purl").map(String::as_str), Some("http://purl.example.org/1"));
        assert_eq!(doc.identifiers.get("test-db").map(String::as_str), Some("rec-1"));
    }

    #[test]
    fn test_primary_id_priority() {
        let with_oai = SAMPLE_METS.replace(
            r#"<mods:identifier type="purl">"#,
            r#"<mods:identifier type="oai">oai:example.org:1</mods:identifier><mods:identifier type="purl">"#,
        );
        assert_eq!(parse(&with_oai, None).unwrap().primary_id, "oai:example.org:1");

        let record_only = SAMPLE_METS
            .replace(r#"<mods:identifier type="urn">urn:nbn:de:test-1</mods:identifier>"#, "");
        assert_eq!(parse(&record_only, None).unwrap().primary_id, "rec-1");

        let nothing = record_only.replace(
            r#"<mods:recordInfo><mods:recordIdentifier source="test-db">rec-1</mods:recordIdentifier></mods:recordInfo>"#,
            "",
        );
        let first = parse(&nothing, None).unwrap().primary_id;
        let second = parse(&nothing, None).unwrap().primary_id;
        assert!(!first.is_empty());
        assert_ne!(first, second);
    }

    fn latin1(text: &str) -> Vec<u8> {
        text.chars().map(|c| u8::try_from(u32::from(c)).unwrap()).collect()
    }

    #[test]
    fn test_decode_honors_declared_encoding() {
        let utf8 = decode(SAMPLE_METS.as_bytes()).unwrap();
        assert!(matches!(utf8, Cow::Borrowed(_)));

        let declared = SAMPLE_METS.replacen("encoding=\"UTF-8\"", "encoding=\"ISO-8859-1\"", 1);
        let bytes = latin1(&declared);
        assert!(std::str::from_utf8(&bytes).is_err());

        let doc = parse(&decode(&bytes).unwrap(), Some(SAMPLE_URL)).unwrap();
        assert_eq!(doc.metadata.pub_place.as_deref(), Some("Nürnberg"));
    }

    #[test]
    fn test_decode_rejects_undecodable_documents() {
        // undeclared encoding must be UTF-8
        let undeclared = latin1("<mets>Nürnberg</mets>");
        assert!(matches!(decode(&undeclared), Err(ParseError::Encoding(_))));

        let mut with_bom = UTF8_BOM.to_vec();
        with_bom.extend_from_slice(b"<?xml version='1.0' encoding='utf-8'?><mets/>");
        assert_eq!(decode(&with_bom).unwrap(), "<?xml version='1.0' encoding='utf-8'?><mets/>");

        let other = b"<?xml version='1.0' encoding='EUC-JP'?><mets/>";
        match decode(other) {
            Err(ParseError::Encoding(message)) => assert!(message.contains("euc-jp")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_sample_metadata() {
        let doc = parse(SAMPLE_METS, Some(SAMPLE_URL)).unwrap();
        let meta = &doc.metadata;

        assert_eq!(meta.title, vec!["Die Beispielschrift. Ein Test".to_string()]);
        assert_eq!(meta.creator, vec!["Dilherr, Johann Michael".to_string()]);
        assert_eq!(meta.other_persons, vec!["Endter Wolfgang".to_string()]);
        assert_eq!(meta.publisher.as_deref(), Some("Endter"));
        assert_eq!(meta.pub_place.as_deref(), Some("Nürnberg"));
        assert_eq!(meta.pub_date.as_deref(), Some("1663"));
        assert_eq!(meta.attribution, "<a href='http://example.org'>Test Library</a>");
        assert_eq!(meta.logo.as_deref(), Some("http://example.org/logo.png"));
        assert_eq!(meta.related.as_deref(), Some("http://example.org/view/1"));
        assert_eq!(meta.license, "cc-by");
        assert_eq!(meta.language.as_deref(), Some("German"));
        assert_eq!(meta.genre.as_deref(), Some("Predigt"));
        assert_eq!(meta.description, "A sample.");

        assert_eq!(meta.see_also.len(), 2);
        assert_eq!(meta.see_also[0].id, SAMPLE_URL);
        assert_eq!(meta.see_also[0].profile.as_deref(), Some(METS_NS));
        assert_eq!(meta.see_also[1].id, "http://example.org/download/full.pdf");
        assert_eq!(meta.see_also[1].format, "application/pdf");
    }

    #[test]
    fn test_attribution_and_license_fallbacks() {
        let no_site = SAMPLE_METS.replace("<dv:ownerSiteURL>http://example.org</dv:ownerSiteURL>", "");
        assert_eq!(parse(&no_site, None).unwrap().metadata.attribution, "Test Library");

        let no_owner = no_site.replace("<dv:owner>Test Library</dv:owner>", "");
        assert_eq!(parse(&no_owner, None).unwrap().metadata.attribution, "Unknown");

        let site_only = SAMPLE_METS.replace("<dv:owner>Test Library</dv:owner>", "");
        assert_eq!(
            parse(&site_only, None).unwrap().metadata.attribution,
            "<a href='http://example.org'>http://example.org</a>"
        );

        let no_license = SAMPLE_METS.replace("<dv:license>cc-by</dv:license>", "");
        assert_eq!(parse(&no_license, None).unwrap().metadata.license, RESERVED_LICENSE);

        let access_condition = no_license.replace(
            "<mods:genre>",
            "<mods:accessCondition>pdm</mods:accessCondition><mods:genre>",
        );
        assert_eq!(parse(&access_condition, None).unwrap().metadata.license, "pdm");
    }

    #[test]
    fn test_see_also_without_url_and_multiple_pdfs() {
        let doc = parse(SAMPLE_METS, None).unwrap();
        assert_eq!(doc.metadata.see_also.len(), 1);
        assert_eq!(doc.metadata.see_also[0].format, "application/pdf");

        let two_pdfs = SAMPLE_METS.replace(
            r#"<mets:fileGrp USE="DOWNLOAD">"#,
            r#"<mets:fileGrp USE="DOWNLOAD"><mets:file ID="PDF_2" MIMETYPE="application/pdf"><mets:FLocat LOCTYPE="URL" xlink:href="http://example.org/download/part.pdf"/></mets:file>"#,
        );
        assert!(parse(&two_pdfs, None).unwrap().metadata.see_also.is_empty());
    }

    #[test]
    fn test_host_title_and_part_number() {
        let volume = SAMPLE_METS
            .replace(
                "<mods:titleInfo><mods:nonSort>Die </mods:nonSort><mods:title>Beispielschrift</mods:title><mods:subTitle>Ein Test</mods:subTitle></mods:titleInfo>",
                r#"<mods:relatedItem type="host"><mods:titleInfo><mods:title>Gesammelte Werke</mods:title></mods:titleInfo></mods:relatedItem><mods:part><mods:detail><mods:number>3</mods:number></mods:detail></mods:part>"#,
            );
        let doc = parse(&volume, None).unwrap();
        assert_eq!(doc.metadata.title, vec!["Gesammelte Werke (3)".to_string()]);
    }

    #[test]
    fn test_parse_sample_physical_items() {
        let doc = parse(SAMPLE_METS, Some(SAMPLE_URL)).unwrap();

        let ids: Vec<&str> = doc.physical_items.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["PHYS_0001", "PHYS_0002", "PHYS_0003"]);

        let labels: Vec<&str> = doc.physical_items.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["Titel", "[II]", "3"]);

        // Pointers to the local file and to an unknown id are dropped
        assert_eq!(doc.physical_items[0].file_ids, vec!["IMG_DEFAULT_1", "IMG_THUMB_1"]);
        assert_eq!(doc.physical_items[1].file_ids, vec!["IMG_DEFAULT_2", "IMG_THUMB_2"]);

        let item = doc.physical_item("PHYS_0002").unwrap();
        assert_eq!(item.id, "PHYS_0002");
        assert!(doc.files_of(item).all(|f| doc.files[&f.id] == *f));
        assert_eq!(doc.physical_item("PHYS_0003").unwrap().id, "PHYS_0003");
        assert!(doc.physical_item("PHYS_9999").is_none());

        let image_ids: std::collections::HashSet<_> =
            doc.physical_items.iter().map(|p| p.image_id.as_str()).collect();
        assert_eq!(image_ids.len(), 3);
    }

    #[test]
    fn test_physical_label_defaults_to_question_mark() {
        let unlabeled = SAMPLE_METS.replace(
            r#"<mets:div ID="PHYS_0003" TYPE="page" ORDER="3">"#,
            r#"<mets:div ID="PHYS_0003" TYPE="page">"#,
        );
        let doc = parse(&unlabeled, None).unwrap();
        // Missing ORDER sorts last
        let last = doc.physical_items.last().unwrap();
        assert_eq!(last.id, "PHYS_0003");
        assert_eq!(last.label, "?");
    }

    #[test]
    fn test_parse_sample_toc() {
        let doc = parse(SAMPLE_METS, Some(SAMPLE_URL)).unwrap();
        let toc = &doc.toc;

        assert_eq!(toc.len(), 5);
        let roots: Vec<_> = toc.roots().collect();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].logical_id, "LOG_0");
        assert_eq!(roots[0].physical_ids, vec!["PHYS_0001"]);

        let children: Vec<&str> = toc
            .children(roots[0])
            .map(|c| c.logical_id.as_str())
            .collect();
        assert_eq!(children, vec!["LOG_1", "LOG_2", "LOG_4"]);

        let section = toc.get("LOG_2").unwrap();
        assert_eq!(section.label, None);
        assert_eq!(section.kind.as_deref(), Some("section"));
        assert_eq!(toc.children(section).next().unwrap().logical_id, "LOG_3");

        // Dangling links are kept here and skipped when building ranges
        assert_eq!(toc.get("LOG_4").unwrap().physical_ids, vec!["PHYS_0003", "PHYS_9999"]);
    }

    #[test]
    fn test_missing_structures() {
        let no_mods = SAMPLE_METS.replace("mods:mods>", "mods:other>");
        assert!(matches!(
            parse(&no_mods, None),
            Err(ParseError::MissingElement("mods:mods"))
        ));

        let no_physical = SAMPLE_METS.replace(r#"TYPE="PHYSICAL""#, r#"TYPE="OTHER""#);
        assert!(matches!(
            parse(&no_physical, None),
            Err(ParseError::MissingElement(_))
        ));

        let no_images = SAMPLE_METS.replace("image/jp", "text/x");
        assert!(matches!(parse(&no_images, None), Err(ParseError::NoImages(_))));

        assert!(matches!(parse("<mets:mets", None), Err(ParseError::Xml(_))));
    }

    #[test]
    fn test_parse_large_document() {
        let xml = generate_mets(904, 4);
        let doc = parse(&xml, None).unwrap();

        assert_eq!(doc.files.len(), 3616);
        assert_eq!(doc.physical_items.len(), 904);
        assert!(doc.physical_items.iter().all(|p| p.file_ids.len() == 4));
        assert_eq!(doc.toc.roots().next().unwrap().children.len(), 904);
    }
}
