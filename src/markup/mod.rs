//! Course markup: quiz JSON → markup, markup → self-contained HTML.
//!
//! The markup dialect is a small XML vocabulary (`co-content`, `text`,
//! `heading`, `code`, `list`, `img`, `asset`, ...). Both converters stream it
//! with quick-xml and copy everything they do not rewrite byte for byte, so
//! unknown tags survive untouched.
//!
//! - [`QuizMarkupConverter`]: question blocks → markup text
//! - [`MarkupToHtmlConverter`]: markup → HTML with images and audio inlined as
//!   data URIs, followed by [`INSTRUCTIONS_HTML_INJECTION`]

mod html;
mod quiz;
mod rules;

use quick_xml::events::{BytesStart, Event};

pub use html::{INSTRUCTIONS_HTML_INJECTION, MarkupToHtmlConverter};
pub use quiz::{QUESTION_SEPARATOR, QuizMarkupConverter};

fn push_bytes(out: &mut String, bytes: &[u8]) {
    out.push_str(&String::from_utf8_lossy(bytes));
}

/// Write a non-element event exactly as it appeared in the source.
fn push_raw_event(out: &mut String, event: &Event<'_>) {
    match event {
        Event::Start(e) => {
            out.push('<');
            push_bytes(out, e);
            out.push('>');
        }
        Event::Empty(e) => {
            out.push('<');
            push_bytes(out, e);
            out.push_str("/>");
        }
        Event::End(e) => {
            out.push_str("</");
            push_bytes(out, e.name().as_ref());
            out.push('>');
        }
        Event::Text(e) => push_bytes(out, e),
        Event::GeneralRef(e) => {
            out.push('&');
            push_bytes(out, e);
            out.push(';');
        }
        Event::CData(e) => {
            out.push_str("<![CDATA[");
            push_bytes(out, e);
            out.push_str("]]>");
        }
        Event::Comment(e) => {
            out.push_str("<!--");
            push_bytes(out, e);
            out.push_str("-->");
        }
        Event::Decl(e) => {
            out.push_str("<?");
            push_bytes(out, e);
            out.push_str("?>");
        }
        Event::PI(e) => {
            out.push_str("<?");
            push_bytes(out, e);
            out.push_str("?>");
        }
        Event::DocType(e) => {
            out.push_str("<!DOCTYPE ");
            push_bytes(out, e.trim_ascii_start());
            out.push('>');
        }
        _ => {}
    }
}

/// Unescaped value of attribute `key`, matched case-insensitively.
fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    let attr = e
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref().eq_ignore_ascii_case(key))?;
    let raw = String::from_utf8_lossy(&attr.value);
    match quick_xml::escape::unescape(&raw) {
        Ok(value) => Some(value.into_owned()),
        Err(_) => Some(raw.to_string()),
    }
}

fn is_named(e: &BytesStart<'_>, name: &str) -> bool {
    e.name().as_ref().eq_ignore_ascii_case(name.as_bytes())
}
