//! Small helpers shared by the retriever, the extractors and the CLI.

use std::borrow::Cow;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use quick_xml::Reader;
use quick_xml::events::Event;

// ============================================================================
// Text Decoding
// ============================================================================

/// Decode an input document.
///
/// Valid UTF-8 is borrowed as is. Otherwise the `declared` encoding is used
/// when encoding_rs knows its label, and Windows-1252 (which accepts every
/// byte) when it does not.
pub fn decode_text<'a>(bytes: &'a [u8], declared: Option<&str>) -> Cow<'a, str> {
    let (text, malformed) = encoding_rs::UTF_8.decode_with_bom_removal(bytes);
    if !malformed {
        return text;
    }

    let encoding = declared
        .and_then(|label| encoding_rs::Encoding::for_label(label.trim().as_bytes()))
        .unwrap_or(encoding_rs::WINDOWS_1252);
    encoding.decode_without_bom_handling(bytes).0
}

/// Encoding named by a leading `<?xml ... encoding=".."?>` declaration.
pub fn extract_xml_encoding(bytes: &[u8]) -> Option<String> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    loop {
        let blank = match reader.read_event_into(&mut buf).ok()? {
            Event::Decl(decl) => {
                let label = decl.encoding()?.ok()?;
                return Some(String::from_utf8_lossy(&label).into_owned());
            }
            Event::Text(text) => text.iter().all(u8::is_ascii_whitespace),
            _ => false,
        };
        if !blank {
            return None;
        }
        buf.clear();
    }
}

// ============================================================================
// URLs
// ============================================================================

/// Characters escaped in query values. Commas stay literal so that batched
/// id lists read as `ids=a,b,c`.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b',');

/// Append query parameters to `base`, percent-encoding the values.
pub fn with_query(base: &str, params: &[(&str, &str)]) -> String {
    let mut url = String::from(base);
    let mut sep = if base.contains('?') { '&' } else { '?' };
    for (key, value) in params {
        url.push(sep);
        url.push_str(key);
        url.push('=');
        url.extend(utf8_percent_encode(value, QUERY_VALUE));
        sep = '&';
    }
    url
}

/// Strip query string and fragment from a URL.
pub fn strip_query(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

// ============================================================================
// File Names
// ============================================================================

/// Split `name` into its last path segment's stem and lowercase extension.
///
/// ```ignore
/// assert_eq!(split_extension("docs/Week 1.PDF"), ("Week 1", Some("pdf".to_string())));
/// assert_eq!(split_extension("http://example.com/"), ("", None));
/// ```
pub fn split_extension(name: &str) -> (&str, Option<String>) {
    let base = name.rsplit('/').next().unwrap_or(name);
    match base.rfind('.') {
        Some(dot) if dot > 0 && dot + 1 < base.len() => {
            (&base[..dot], Some(base[dot + 1..].trim().to_ascii_lowercase()))
        }
        _ => (base, None),
    }
}

/// Display title for a file name: its stem, or the name itself when it has
/// no extension.
pub fn file_title(name: &str) -> String {
    let name = name.trim();
    match split_extension(name) {
        (stem, Some(_)) if !stem.is_empty() => stem.to_string(),
        _ => name.to_string(),
    }
}

// ============================================================================
// Data URIs
// ============================================================================

/// Build a `data:` URI for inlining binary content.
pub fn data_uri(content_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", content_type, STANDARD.encode(data))
}

/// Guess a MIME type from a file name, falling back to magic bytes.
///
/// Used when the server did not declare a content type.
pub fn guess_mime_type(name: &str, data: &[u8]) -> &'static str {
    let by_extension = match split_extension(name).1.as_deref() {
        Some("jpg") | Some("jpeg") => Some("image/jpeg"),
        Some("png") => Some("image/png"),
        Some("gif") => Some("image/gif"),
        Some("svg") => Some("image/svg+xml"),
        Some("webp") => Some("image/webp"),
        Some("mp3") => Some("audio/mpeg"),
        Some("wav") => Some("audio/wav"),
        Some("ogg") => Some("audio/ogg"),
        Some("mp4") => Some("video/mp4"),
        Some("pdf") => Some("application/pdf"),
        _ => None,
    };
    if let Some(mime) = by_extension {
        return mime;
    }

    match data {
        [0xFF, 0xD8, ..] => "image/jpeg",
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [b'G', b'I', b'F', ..] => "image/gif",
        [b'%', b'P', b'D', b'F', ..] => "application/pdf",
        [b'I', b'D', b'3', ..] => "audio/mpeg",
        _ => "application/octet-stream",
    }
}

// ============================================================================
// Tests
// ============================================================================
