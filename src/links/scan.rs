//! Scanning instruction blobs for `<asset>` tags and `<a href>` targets.
//!
//! Instructions are HTML-flavored markup, so end-tag names are not checked,
//! lone `&` is accepted and attributes that fail to parse are skipped. A
//! syntax error ends the scan; tags found before it are kept.

use std::collections::HashSet;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use tracing::warn;

/// An `<asset id=".." name=".." extension=".."/>` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AssetTag {
    pub id: String,
    pub name: Option<String>,
    pub extension: Option<String>,
}

/// References found in one instructions blob, in document order.
#[derive(Debug, Default)]
pub(crate) struct Instructions {
    pub asset_tags: Vec<AssetTag>,
    pub anchors: Vec<String>,
}

/// Collect asset tags (first occurrence per id) and anchor hrefs
/// (first occurrence per href).
pub(crate) fn scan_instructions(text: &str) -> Instructions {
    let mut reader = Reader::from_str(text);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.allow_dangling_amp = true;

    let mut found = Instructions::default();
    let mut seen_ids = HashSet::new();
    let mut seen_hrefs = HashSet::new();

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                warn!(
                    position = reader.error_position(),
                    "instructions stopped parsing early: {e}"
                );
                break;
            }
        };
        match event {
            Event::Start(e) | Event::Empty(e) => {
                let name = e.name();
                if name.as_ref().eq_ignore_ascii_case(b"asset") {
                    if let Some(id) = attribute(&e, b"id")
                        && seen_ids.insert(id.clone())
                    {
                        found.asset_tags.push(AssetTag {
                            id,
                            name: attribute(&e, b"name"),
                            extension: attribute(&e, b"extension"),
                        });
                    }
                } else if name.as_ref().eq_ignore_ascii_case(b"a")
                    && let Some(href) = attribute(&e, b"href")
                    && seen_hrefs.insert(href.clone())
                {
                    found.anchors.push(href);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    found
}

/// Trimmed, unescaped value of attribute `key` (case-insensitive), if present
/// and non-empty.
fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    let attr = e
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref().eq_ignore_ascii_case(key))?;
    let raw = String::from_utf8_lossy(&attr.value);
    let value = match quick_xml::escape::unescape(&raw) {
        Ok(value) => value.trim().to_string(),
        Err(_) => raw.trim().to_string(),
    };
    (!value.is_empty()).then_some(value)
}
