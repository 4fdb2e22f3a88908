//! Downloadable links grouped by semantic file type.
//!
//! [`LinkExtractor`] walks assignment instructions and lecture asset
//! descriptors and files every link it finds into a [`LinkMap`] bucket chosen
//! by [`classify`]. Whether a PDF came from an uploaded asset or an external
//! URL does not matter to the bucket it lands in.

mod extractor;
mod references;
mod scan;

use std::collections::BTreeMap;

use serde::Serialize;

pub use extractor::LinkExtractor;

/// Bucket holding raw instruction documents.
pub const HTML_KEY: &str = "html";

/// Title given to instruction documents in the [`HTML_KEY`] bucket.
pub const INSTRUCTIONS_TITLE: &str = "instructions";

/// Bucket for anything the table does not know.
pub const GENERIC_KEY: &str = "generic";

/// Platform type names and file extensions, mapped to link buckets.
static TYPE_BUCKETS: &[(&str, &str)] = &[
    ("pdf", "pdf"),
    ("video", "video"),
    ("mp4", "video"),
    ("webm", "video"),
    ("mov", "video"),
    ("audio", "audio"),
    ("mp3", "audio"),
    ("wav", "audio"),
    ("ogg", "audio"),
    ("image", "image"),
    ("png", "image"),
    ("jpg", "image"),
    ("jpeg", "image"),
    ("gif", "image"),
    ("svg", "image"),
    ("ppt", "slides"),
    ("pptx", "slides"),
    ("key", "slides"),
    ("slides", "slides"),
    ("txt", "txt"),
    ("md", "txt"),
    ("csv", "txt"),
    ("ipynb", "ipynb"),
    ("notebook", "ipynb"),
    ("generic", GENERIC_KEY),
    ("zip", GENERIC_KEY),
    ("tar", GENERIC_KEY),
    ("gz", GENERIC_KEY),
    ("tgz", GENERIC_KEY),
    ("rar", GENERIC_KEY),
    ("7z", GENERIC_KEY),
];

/// Map a platform type name or file extension to its link bucket.
///
/// Unknown and empty inputs land in [`GENERIC_KEY`]; [`HTML_KEY`] is never
/// returned.
pub fn classify(kind: &str) -> &'static str {
    let kind = kind.trim().trim_start_matches('.');
    TYPE_BUCKETS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(kind))
        .map_or(GENERIC_KEY, |(_, bucket)| *bucket)
}

/// Where a link points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum LinkTarget {
    /// A download URL.
    Remote(String),
    /// A document carried in memory (raw instructions).
    Inline(String),
}

/// One `(target, title)` entry of a [`LinkMap`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub target: LinkTarget,
    pub title: String,
}

impl Link {
    pub fn remote(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            target: LinkTarget::Remote(url.into()),
            title: title.into(),
        }
    }

    pub fn inline(content: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            target: LinkTarget::Inline(content.into()),
            title: title.into(),
        }
    }

    /// The download URL, for remote links.
    pub fn url(&self) -> Option<&str> {
        match &self.target {
            LinkTarget::Remote(url) => Some(url),
            LinkTarget::Inline(_) => None,
        }
    }
}

/// Links grouped by bucket, each bucket in extraction order.
///
/// A bucket only exists once it holds a link, and a bucket never holds the
/// same link twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LinkMap {
    buckets: BTreeMap<String, Vec<Link>>,
}

impl LinkMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `link` to `bucket` unless an identical link is already there.
    ///
    /// Returns whether the link was inserted.
    pub fn insert(&mut self, bucket: &str, link: Link) -> bool {
        let links = self.buckets.entry(bucket.to_string()).or_default();
        if links.contains(&link) {
            return false;
        }
        links.push(link);
        true
    }

    /// Store a raw instructions document under [`HTML_KEY`].
    pub fn push_html(&mut self, html: impl Into<String>) {
        self.insert(HTML_KEY, Link::inline(html, INSTRUCTIONS_TITLE));
    }

    pub fn get(&self, bucket: &str) -> Option<&[Link]> {
        self.buckets.get(bucket).map(Vec::as_slice)
    }

    pub fn remove(&mut self, bucket: &str) -> Option<Vec<Link>> {
        self.buckets.remove(bucket)
    }

    pub fn contains_key(&self, bucket: &str) -> bool {
        self.buckets.contains_key(bucket)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Link])> {
        self.buckets
            .iter()
            .map(|(bucket, links)| (bucket.as_str(), links.as_slice()))
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Merge `other` into `self`, keeping order and dropping duplicates.
    pub fn merge(&mut self, other: LinkMap) {
        for (bucket, links) in other.buckets {
            for link in links {
                self.insert(&bucket, link);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_table() {
        assert_eq!(classify("pdf"), "pdf");
        assert_eq!(classify("PDF"), "pdf");
        assert_eq!(classify(".zip"), "generic");
        assert_eq!(classify("video"), "video");
        assert_eq!(classify("mp3"), "audio");
        assert_eq!(classify("pptx"), "slides");
        assert_eq!(classify(""), "generic");
        assert_eq!(classify("exotic"), "generic");
        assert_eq!(classify("html"), "generic");
    }

    #[test]
    fn test_insert_drops_duplicates_within_bucket() {
        let mut links = LinkMap::new();
        assert!(links.insert("pdf", Link::remote("u1", "a")));
        assert!(!links.insert("pdf", Link::remote("u1", "a")));
        assert!(links.insert("pdf", Link::remote("u1", "b")));
        assert!(links.insert("generic", Link::remote("u1", "a")));

        assert_eq!(links.get("pdf").unwrap().len(), 2);
        assert_eq!(links.get("generic").unwrap().len(), 1);
    }

    #[test]
    fn test_merge_keeps_extraction_order() {
        let mut first = LinkMap::new();
        first.insert("pdf", Link::remote("u1", "one"));
        let mut second = LinkMap::new();
        second.insert("pdf", Link::remote("u2", "two"));
        second.insert("pdf", Link::remote("u1", "one"));

        first.merge(second);
        let titles: Vec<_> = first.get("pdf").unwrap().iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, ["one", "two"]);
    }

    #[test]
    fn test_html_bucket() {
        let mut links = LinkMap::new();
        links.push_html("<co-content/>");
        let html = links.get(HTML_KEY).unwrap();
        assert_eq!(html[0].target, LinkTarget::Inline("<co-content/>".into()));
        assert_eq!(html[0].title, INSTRUCTIONS_TITLE);
        assert_eq!(html[0].url(), None);
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let mut links = LinkMap::new();
        links.insert("pdf", Link::remote("https://x/a.pdf", "a"));
        let json = serde_json::to_value(&links).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"pdf": [{"target": {"kind": "remote", "value": "https://x/a.pdf"}, "title": "a"}]})
        );
    }
}
