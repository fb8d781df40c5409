//! Labels, metadata blocks and licenses

use std::collections::BTreeMap;

use super::types::{LanguageValue, MetadataEntry, MetadataLabel, MetadataValue};
use crate::mets::{Metadata, RESERVED_LICENSE};

/// Shorthand -> license URI
pub const LICENSES: &[(&str, &str)] = &[
    ("pdm", "http://creativecommons.org/licenses/publicdomain/"),
    ("cc0", "https://creativecommons.org/publicdomain/zero/1.0/"),
    ("cc-by", "http://creativecommons.org/licenses/by/4.0"),
    ("cc-by-sa", "http://creativecommons.org/licenses/by-sa/4.0"),
    ("cc-by-nd", "http://creativecommons.org/licenses/by-nd/4.0"),
    ("cc-by-nc", "http://creativecommons.org/licenses/by-nc/4.0"),
    ("cc-by-nc-sa", "http://creativecommons.org/licenses/by-nc-sa/4.0"),
    ("cc-by-nc-nd", "http://creativecommons.org/licenses/by-nc-nd/4.0"),
];

/// Resolve a license shorthand
///
/// Values that already are URLs are passed through, anything else that is
/// not in [`LICENSES`] becomes `reserved`.
pub fn license_uri(shorthand: &str) -> String {
    let shorthand = shorthand.trim();
    if shorthand.starts_with("http://") || shorthand.starts_with("https://") {
        return shorthand.to_string();
    }
    let key = shorthand.to_ascii_lowercase();
    LICENSES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, uri)| uri.to_string())
        .unwrap_or_else(|| RESERVED_LICENSE.to_string())
}

/// `{creator}: {title} ({place}, {date})`, omitting missing parts
pub fn make_label(meta: &Metadata) -> String {
    let title = meta.title.first().map(String::as_str).unwrap_or_default();
    let mut label = if meta.creator.is_empty() {
        title.to_string()
    } else {
        format!("{}: {}", meta.creator.join("/"), title)
    };

    let place = meta.pub_place.as_deref().filter(|p| !p.is_empty());
    let date = meta.pub_date.as_deref().filter(|d| !d.is_empty());
    match (place, date) {
        (Some(place), Some(date)) => label = format!("{} ({}, {})", label, place, date),
        (None, Some(date)) => label = format!("{} ({})", label, date),
        (Some(place), None) => label = format!("{} ({})", label, place),
        (None, None) => {}
    }
    label
}

fn localized(en: &str, de: &str) -> MetadataLabel {
    MetadataLabel::Localized(vec![
        LanguageValue {
            value: en.to_string(),
            language: "en".to_string(),
        },
        LanguageValue {
            value: de.to_string(),
            language: "de".to_string(),
        },
    ])
}

fn list_entry(en: &str, de: &str, values: &[String]) -> Option<MetadataEntry> {
    let values: Vec<String> = values.iter().filter(|v| !v.is_empty()).cloned().collect();
    if values.is_empty() {
        return None;
    }
    Some(MetadataEntry {
        label: localized(en, de),
        value: MetadataValue::List(values),
    })
}

fn text_entry(en: &str, de: &str, value: Option<&str>) -> Option<MetadataEntry> {
    let value = value.filter(|v| !v.is_empty())?;
    Some(MetadataEntry {
        label: localized(en, de),
        value: MetadataValue::Text(value.to_string()),
    })
}

/// IIIF metadata block: descriptive fields with English and German labels,
/// followed by one `Identifier ({type})` entry per identifier
pub fn make_metadata(meta: &Metadata, identifiers: &BTreeMap<String, String>) -> Vec<MetadataEntry> {
    let descriptive = [
        list_entry("Title", "Titel", &meta.title),
        list_entry("Creator", "Urheber", &meta.creator),
        list_entry("Other Persons", "Andere Personen", &meta.other_persons),
        text_entry("Publisher", "Veröffentlicht von", meta.publisher.as_deref()),
        text_entry("Publication Place", "Publikationsort", meta.pub_place.as_deref()),
        text_entry("Publication Date", "Erscheinungsdatum", meta.pub_date.as_deref()),
        text_entry("Language", "Sprache", meta.language.as_deref()),
        text_entry("Genre", "Genre", meta.genre.as_deref()),
    ];

    descriptive
        .into_iter()
        .flatten()
        .chain(
            identifiers
                .iter()
                .filter(|(_, value)| !value.is_empty())
                .map(|(kind, value)| MetadataEntry {
                    label: MetadataLabel::Plain(format!("Identifier ({})", kind)),
                    value: MetadataValue::Text(value.clone()),
                }),
        )
        .collect()
}
