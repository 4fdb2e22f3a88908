//! Markup → HTML.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, warn};

use super::rules::{Children, rule_for};
use super::{attribute, is_named, push_bytes, push_raw_event};
use crate::asset::{Asset, AssetLookup};
use crate::error::{Error, Result};

/// Appended to every converted document.
pub const INSTRUCTIONS_HTML_INJECTION: &str = r#"<style>
body {
    padding: 50px 85px 50px 85px;
}
table th, table td {
    border: 1px solid #e0e0e0;
    padding: 5px 20px;
    text-align: left;
}
input {
    margin: 10px;
}
th {
    font-weight: bold;
}
td, th {
    display: table-cell;
    vertical-align: inherit;
}
img {
    height: auto;
    max-width: 100%;
}
pre {
    display: block;
    margin: 0 0 10px;
    padding: 9.5px;
    background: #424242;
    color: #fff;
    font-size: 13px;
    white-space: pre-wrap;
    border: 1px solid #ccc;
}
</style>
<script type="text/javascript" async
  src="https://cdnjs.cloudflare.com/ajax/libs/mathjax/2.7.1/MathJax.js?config=TeX-AMS-MML_HTMLorMML">
</script>
<script type="text/x-mathjax-config">
  MathJax.Hub.Config({
    tex2jax: {
      inlineMath: [ ['$$','$$'], ['$','$'] ],
      displayMath: [ ["\\[","\\]"] ],
      processEscapes: true
    }
  });
</script>
"#;

const AUDIO_FALLBACK: &str = "Your browser does not support the audio element.";

/// An element still open in the output.
struct Frame {
    /// Replacement end tag; `None` closes with the source tag.
    rename: Option<&'static str>,
    verbatim: bool,
    /// Written after the element closes.
    trailer: Option<String>,
}

/// Renders course markup as standalone HTML.
///
/// Images (`<img assetId>`) and audio assets (`<asset assetType="audio">`)
/// are resolved in one batch through the [`AssetLookup`] before rendering
/// and inlined as data URIs. Pass an [`AssetRetriever`](crate::AssetRetriever)
/// to fetch on demand, or an [`AssetCache`](crate::AssetCache) filled up
/// front.
pub struct MarkupToHtmlConverter<L> {
    lookup: L,
    injection: Cow<'static, str>,
}

impl<L: AssetLookup> MarkupToHtmlConverter<L> {
    pub fn new(lookup: L) -> Self {
        Self {
            lookup,
            injection: Cow::Borrowed(INSTRUCTIONS_HTML_INJECTION),
        }
    }

    /// Replace the fragment appended after the body.
    pub fn with_injection(mut self, injection: impl Into<Cow<'static, str>>) -> Self {
        self.injection = injection.into();
        self
    }

    pub fn injection(&self) -> &str {
        &self.injection
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    pub fn lookup_mut(&mut self) -> &mut L {
        &mut self.lookup
    }

    pub fn into_lookup(self) -> L {
        self.lookup
    }

    pub fn convert(&mut self, markup: &str) -> Result<String> {
        let ids = referenced_assets(markup)?;
        let assets: HashMap<String, Asset> = if ids.is_empty() {
            HashMap::new()
        } else {
            debug!(count = ids.len(), "resolving assets referenced by markup");
            self.lookup
                .resolve(&ids)?
                .into_iter()
                .map(|asset| (asset.id.clone(), asset))
                .collect()
        };

        let mut out = render(markup, &assets)?;
        out.push_str(&self.injection);
        Ok(out)
    }
}

fn strict_reader(markup: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(markup);
    reader.config_mut().check_end_names = true;
    reader
}

/// Ids of images and audio assets, first occurrence order.
fn referenced_assets(markup: &str) -> Result<Vec<String>> {
    let mut reader = strict_reader(markup);
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                if let Some(id) = media_id(&e)
                    && seen.insert(id.clone())
                {
                    ids.push(id);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(ids)
}

fn media_id(e: &BytesStart<'_>) -> Option<String> {
    let id = if is_named(e, "img") {
        attribute(e, b"assetid")
    } else if is_audio_asset(e) {
        attribute(e, b"id")
    } else {
        None
    }?;
    let id = id.trim();
    (!id.is_empty()).then(|| id.to_string())
}

fn is_audio_asset(e: &BytesStart<'_>) -> bool {
    is_named(e, "asset")
        && attribute(e, b"assettype").is_some_and(|kind| kind.trim().eq_ignore_ascii_case("audio"))
}

fn render(markup: &str, assets: &HashMap<String, Asset>) -> Result<String> {
    let mut reader = strict_reader(markup);
    let mut out = String::with_capacity(markup.len() + INSTRUCTIONS_HTML_INJECTION.len());
    let mut stack: Vec<Frame> = Vec::new();

    loop {
        let event = reader.read_event()?;
        let in_verbatim = stack.last().is_some_and(|frame| frame.verbatim);
        match &event {
            Event::Eof => break,
            Event::Start(_) | Event::Empty(_) | Event::End(_) if in_verbatim => {
                push_raw_event(&mut out, &event);
                match &event {
                    Event::Start(_) => stack.push(Frame {
                        rename: None,
                        verbatim: true,
                        trailer: None,
                    }),
                    Event::End(_) => close(&mut out, &mut stack, &event)?,
                    _ => {}
                }
            }
            Event::Start(e) => {
                let frame = open(&mut out, e, false, assets);
                stack.push(frame);
            }
            Event::Empty(e) => {
                let frame = open(&mut out, e, true, assets);
                if let Some(name) = frame.rename {
                    out.push_str("</");
                    out.push_str(name);
                    out.push('>');
                }
                if let Some(trailer) = frame.trailer {
                    out.push_str(&trailer);
                }
            }
            Event::End(_) => close(&mut out, &mut stack, &event)?,
            _ => push_raw_event(&mut out, &event),
        }
    }

    if !stack.is_empty() {
        return Err(Error::MalformedMarkup(format!(
            "{} element(s) left unclosed",
            stack.len()
        )));
    }
    Ok(out)
}

/// Write the opening tag for `e` and describe how it will be closed.
///
/// Renamed empty elements are written as a start tag; the caller closes
/// them immediately.
fn open(out: &mut String, e: &BytesStart<'_>, empty: bool, assets: &HashMap<String, Asset>) -> Frame {
    let mut frame = Frame {
        rename: None,
        verbatim: false,
        trailer: None,
    };

    if let Some(rule) = rule_for(e.name().as_ref()) {
        let name = rule.to.tag_name(e);
        out.push('<');
        out.push_str(name);
        if rule.copy_attributes {
            push_bytes(out, e.attributes_raw());
        }
        out.push('>');
        frame.rename = Some(name);
        frame.verbatim = rule.children == Children::Verbatim;
        return frame;
    }

    if is_named(e, "img") {
        push_image(out, e, empty, assets);
        return frame;
    }

    if is_audio_asset(e) {
        frame.trailer = media_id(e).and_then(|id| audio_element(&id, assets));
    }

    if empty {
        push_raw_event(out, &Event::Empty(e.borrow()));
    } else {
        push_raw_event(out, &Event::Start(e.borrow()));
    }
    frame
}

fn close(out: &mut String, stack: &mut Vec<Frame>, event: &Event<'_>) -> Result<()> {
    let frame = stack
        .pop()
        .ok_or_else(|| Error::MalformedMarkup("end tag without a matching start tag".into()))?;
    match frame.rename {
        Some(name) => {
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        None => push_raw_event(out, event),
    }
    if let Some(trailer) = frame.trailer {
        out.push_str(&trailer);
    }
    Ok(())
}

/// `<img>` with its attributes and, when the asset has content, a data URI
/// `src` replacing any existing one.
fn push_image(out: &mut String, e: &BytesStart<'_>, empty: bool, assets: &HashMap<String, Asset>) {
    let src = media_id(e).and_then(|id| match assets.get(&id) {
        Some(asset) => asset.data_uri(),
        None => {
            warn!(asset_id = id.as_str(), "image asset could not be resolved");
            None
        }
    });

    out.push_str("<img");
    for attr in e.attributes().flatten() {
        if src.is_some() && attr.key.as_ref().eq_ignore_ascii_case(b"src") {
            continue;
        }
        out.push(' ');
        push_bytes(out, attr.key.as_ref());
        out.push_str("=\"");
        out.push_str(&String::from_utf8_lossy(&attr.value).replace('"', "&quot;"));
        out.push('"');
    }
    if let Some(src) = src {
        out.push_str(" src=\"");
        out.push_str(&src);
        out.push('"');
    }
    out.push_str(if empty { "/>" } else { ">" });
}

fn audio_element(id: &str, assets: &HashMap<String, Asset>) -> Option<String> {
    let Some(asset) = assets.get(id) else {
        warn!(asset_id = id, "audio asset could not be resolved");
        return None;
    };
    let src = asset.data_uri()?;
    let mime = src
        .strip_prefix("data:")
        .and_then(|rest| rest.split(';').next())
        .unwrap_or_default();
    Some(format!(
        "<audio controls=\"\"><source src=\"{src}\" type=\"{mime}\"/>{AUDIO_FALLBACK}</audio>"
    ))
}
