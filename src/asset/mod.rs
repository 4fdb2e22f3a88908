//! Asset records, the per-run cache and batched asset resolution.
//!
//! - [`Asset`]: immutable record for one platform asset
//! - [`AssetCache`]: id-keyed cache owned by one retriever (or preloaded by a
//!   caller and used directly as a lookup)
//! - [`AssetLookup`]: the seam the markup converter resolves images through
//! - [`AssetRetriever`]: batching, two-phase URL resolution, bounded downloads

mod pool;
mod retriever;

use std::collections::HashMap;

use crate::error::Result;
use crate::fetch::RawPage;
use crate::util;

pub use retriever::AssetRetriever;

/// A resolved platform asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub id: String,
    /// Display file name, e.g. `M111.mp3`.
    pub name: String,
    /// Platform type: `pdf`, `video`, `audio`, `image`, `generic`, ...
    pub type_name: String,
    /// Resolved download location.
    pub url: String,
    pub content_type: Option<String>,
    /// Raw content, absent when not downloaded or when the download failed.
    pub data: Option<Vec<u8>>,
}

impl Asset {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        type_name: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            type_name: type_name.into(),
            url: url.into(),
            content_type: None,
            data: None,
        }
    }

    pub fn with_content(mut self, data: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self.content_type = Some(content_type.into());
        self
    }

    /// Content as a `data:` URI, or `None` when there is no content.
    pub fn data_uri(&self) -> Option<String> {
        let data = self.data.as_deref()?;
        let content_type = match self.content_type.as_deref() {
            Some(ct) if !ct.trim().is_empty() => ct.trim(),
            _ => util::guess_mime_type(&self.name, data),
        };
        Some(util::data_uri(content_type, data))
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    asset: Asset,
    content_fetched: bool,
}

/// Id-keyed asset cache, valid for one extraction run.
///
/// Not synchronized: share it between threads only behind a lock, or give
/// each concurrent caller its own retriever.
#[derive(Debug, Clone, Default)]
pub struct AssetCache {
    entries: HashMap<String, CacheEntry>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a finished asset. It is never re-downloaded.
    pub fn insert(&mut self, asset: Asset) {
        self.entries.insert(
            asset.id.clone(),
            CacheEntry {
                asset,
                content_fetched: true,
            },
        );
    }

    pub fn get(&self, id: &str) -> Option<&Asset> {
        self.entries.get(id).map(|entry| &entry.asset)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clone the cached assets for `ids`, in order, skipping unknown ids.
    pub fn collect(&self, ids: &[String]) -> Vec<Asset> {
        ids.iter().filter_map(|id| self.get(id).cloned()).collect()
    }

    pub(crate) fn insert_metadata(&mut self, asset: Asset) {
        self.entries.insert(
            asset.id.clone(),
            CacheEntry {
                asset,
                content_fetched: false,
            },
        );
    }

    pub(crate) fn needs_content(&self, id: &str) -> bool {
        self.entries.get(id).is_some_and(|entry| !entry.content_fetched)
    }

    pub(crate) fn url_of(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(|entry| entry.asset.url.as_str())
    }

    pub(crate) fn set_content(&mut self, id: &str, page: Option<RawPage>) {
        if let Some(entry) = self.entries.get_mut(id) {
            if let Some(page) = page {
                entry.asset.data = Some(page.data);
                entry.asset.content_type = page.content_type;
            }
            entry.content_fetched = true;
        }
    }
}

impl FromIterator<Asset> for AssetCache {
    fn from_iter<I: IntoIterator<Item = Asset>>(iter: I) -> Self {
        let mut cache = AssetCache::new();
        for asset in iter {
            cache.insert(asset);
        }
        cache
    }
}

/// Resolves asset ids to assets with content.
///
/// The markup converter batch-resolves every id of a document through
/// [`resolve`](AssetLookup::resolve) once, then reads individual assets back
/// with [`get`](AssetLookup::get).
pub trait AssetLookup {
    /// Resolve `ids`, returning one asset per resolvable id in input order.
    /// Unresolvable ids are omitted.
    fn resolve(&mut self, ids: &[String]) -> Result<Vec<Asset>>;

    /// A previously resolved asset.
    fn get(&self, id: &str) -> Option<&Asset>;
}

/// A preloaded cache resolves only what it already holds.
impl AssetLookup for AssetCache {
    fn resolve(&mut self, ids: &[String]) -> Result<Vec<Asset>> {
        Ok(self.collect(ids))
    }

    fn get(&self, id: &str) -> Option<&Asset> {
        AssetCache::get(self, id)
    }
}

impl<L: AssetLookup + ?Sized> AssetLookup for &mut L {
    fn resolve(&mut self, ids: &[String]) -> Result<Vec<Asset>> {
        (**self).resolve(ids)
    }

    fn get(&self, id: &str) -> Option<&Asset> {
        (**self).get(id)
    }
}
