//! Batched asset resolution.
//!
//! Resolution runs in up to three phases for the ids missing from the cache:
//!
//! 1. one batched metadata call for all new ids (name, type, download reference)
//! 2. one follow-up call per route (file or media) turning opaque download
//!    references into signed URLs; metadata that already carries a live URL
//!    skips this phase
//! 3. byte downloads on a bounded worker pool
//!
//! Ids missing from a batched reply are dropped from the output rather than
//! failing the batch, and are not asked for again by the same retriever.
//! Only transport failures of the batched JSON calls abort.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::pool::map_bounded;
use super::{Asset, AssetCache, AssetLookup};
use crate::config::{Endpoints, RetrieverOptions};
use crate::error::Result;
use crate::fetch::{AssetWriter, PageFetcher};
use crate::util::with_query;

const METADATA_FIELDS: &str = "name,typeName,url,downloadRef";

/// Resolves asset ids against the platform, caching results by id.
///
/// The cache lives as long as the retriever; repeated ids, within one call
/// or across calls, are never fetched twice. Neither are ids the platform
/// could not resolve.
pub struct AssetRetriever<F> {
    fetcher: F,
    options: RetrieverOptions,
    cache: AssetCache,
    gaps: HashSet<String>,
}

/// Which follow-up endpoint turns a download reference into a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Route {
    File,
    Media,
}

impl Route {
    const ALL: [Route; 2] = [Route::File, Route::Media];

    fn for_type(type_name: &str) -> Route {
        if type_name.eq_ignore_ascii_case("video") || type_name.eq_ignore_ascii_case("audio") {
            Route::Media
        } else {
            Route::File
        }
    }

    fn endpoint(self, endpoints: &Endpoints) -> &str {
        match self {
            Route::File => &endpoints.file_urls,
            Route::Media => &endpoints.media_urls,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LiveUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetadataElement {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    type_name: String,
    #[serde(default)]
    url: Option<LiveUrl>,
    #[serde(default)]
    download_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UrlElement {
    id: String,
    url: String,
}

/// Where an asset's bytes live, as reported by the metadata call.
enum Download {
    Live(String),
    Deferred { route: Route, reference: String },
}

impl MetadataElement {
    fn download(&self) -> Option<Download> {
        if let Some(live) = &self.url
            && !live.url.trim().is_empty()
        {
            return Some(Download::Live(live.url.trim().to_string()));
        }
        let reference = self.download_ref.as_deref()?.trim();
        if reference.is_empty() {
            return None;
        }
        Some(Download::Deferred {
            route: Route::for_type(&self.type_name),
            reference: reference.to_string(),
        })
    }
}

/// Decode the `elements` array of a reply, skipping elements of an
/// unexpected shape.
fn reply_elements<T: for<'de> Deserialize<'de>>(reply: Value, what: &str) -> Vec<T> {
    let elements = match reply {
        Value::Object(mut map) => map.remove("elements"),
        _ => None,
    };
    let Some(Value::Array(elements)) = elements else {
        warn!("{what} reply has no elements array");
        return Vec::new();
    };

    elements
        .into_iter()
        .filter_map(|element| match serde_json::from_value(element) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("skipping {what} element of unexpected shape: {e}");
                None
            }
        })
        .collect()
}

/// First occurrence of each id, in input order.
fn unique_ids(ids: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    ids.iter()
        .map(String::as_str)
        .filter(|id| seen.insert(*id))
        .collect()
}

impl<F: PageFetcher> AssetRetriever<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_options(fetcher, RetrieverOptions::default())
    }

    pub fn with_options(fetcher: F, options: RetrieverOptions) -> Self {
        Self {
            fetcher,
            options,
            cache: AssetCache::new(),
            gaps: HashSet::new(),
        }
    }

    /// Seed the retriever with already resolved assets.
    pub fn with_cache(mut self, cache: AssetCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn options(&self) -> &RetrieverOptions {
        &self.options
    }

    pub fn cache(&self) -> &AssetCache {
        &self.cache
    }

    pub fn into_cache(self) -> AssetCache {
        self.cache
    }

    /// Whether `id` was looked up and could not be resolved.
    pub fn is_gap(&self, id: &str) -> bool {
        self.gaps.contains(id)
    }

    /// Resolve `ids` to assets in input order, downloading content unless
    /// disabled in the options.
    ///
    /// Repeated ids yield identical assets. Ids the platform does not know
    /// are omitted, so the output may be shorter than the input.
    pub fn resolve(&mut self, ids: &[String]) -> Result<Vec<Asset>> {
        let download = self.options.download_content;
        self.resolve_with(ids, download)
    }

    /// Resolve names, types and URLs only.
    pub fn resolve_metadata(&mut self, ids: &[String]) -> Result<Vec<Asset>> {
        self.resolve_with(ids, false)
    }

    /// Resolve `ids` with content and hand every asset to `writer`.
    ///
    /// Returns the number of assets saved.
    pub fn save_all<W: AssetWriter + ?Sized>(&mut self, ids: &[String], writer: &mut W) -> Result<usize> {
        let assets = self.resolve_with(ids, true)?;
        let mut saved = HashSet::new();
        for asset in &assets {
            if saved.insert(asset.id.as_str()) {
                writer.save(asset)?;
            }
        }
        Ok(saved.len())
    }

    fn resolve_with(&mut self, ids: &[String], download: bool) -> Result<Vec<Asset>> {
        let unique = unique_ids(ids);

        let missing: Vec<&str> = unique
            .iter()
            .copied()
            .filter(|id| !self.cache.contains(id) && !self.gaps.contains(*id))
            .collect();
        debug!(
            requested = ids.len(),
            unique = unique.len(),
            known = unique.len() - missing.len(),
            "resolving assets"
        );
        if !missing.is_empty() {
            self.lookup(&missing)?;
        }

        if download {
            let pending: Vec<&str> = unique
                .iter()
                .copied()
                .filter(|id| self.cache.needs_content(id))
                .collect();
            self.download(&pending);
        }

        Ok(self.cache.collect(ids))
    }

    /// Phases 1 and 2: metadata and URLs for ids not yet cached.
    fn lookup(&mut self, ids: &[&str]) -> Result<()> {
        let joined = ids.join(",");
        let url = with_query(
            &self.options.endpoints.asset_metadata,
            &[("ids", joined.as_str()), ("fields", METADATA_FIELDS)],
        );
        let reply = self.fetcher.fetch_json(&url, None)?;

        let wanted: HashSet<&str> = ids.iter().copied().collect();
        let mut metadata: HashMap<String, MetadataElement> = HashMap::new();
        for element in reply_elements::<MetadataElement>(reply, "asset metadata") {
            let id = element.id.trim().to_string();
            if wanted.contains(id.as_str()) {
                metadata.insert(id, element);
            }
        }

        let mut deferred: Vec<(Route, String, String)> = Vec::new();
        for &id in ids {
            let Some(element) = metadata.get(id) else {
                warn!(asset_id = id, "asset missing from metadata reply, skipping");
                self.gaps.insert(id.to_string());
                continue;
            };
            match element.download() {
                Some(Download::Live(url)) => self.cache.insert_metadata(build_asset(id, element, url)),
                Some(Download::Deferred { route, reference }) => {
                    deferred.push((route, id.to_string(), reference));
                }
                None => {
                    warn!(asset_id = id, "asset has no download location, skipping");
                    self.gaps.insert(id.to_string());
                }
            }
        }

        for route in Route::ALL {
            let batch: Vec<&(Route, String, String)> =
                deferred.iter().filter(|(r, _, _)| *r == route).collect();
            if batch.is_empty() {
                continue;
            }

            let urls = self.resolve_references(route, batch.iter().map(|(_, _, reference)| reference.as_str()))?;
            for (_, id, reference) in batch {
                match (urls.get(reference.as_str()), metadata.get(id.as_str())) {
                    (Some(url), Some(element)) => {
                        self.cache.insert_metadata(build_asset(id, element, url.clone()))
                    }
                    _ => {
                        warn!(asset_id = id.as_str(), "download reference did not resolve, skipping");
                        self.gaps.insert(id.clone());
                    }
                }
            }
        }

        Ok(())
    }

    fn resolve_references<'a>(
        &self,
        route: Route,
        references: impl Iterator<Item = &'a str>,
    ) -> Result<HashMap<String, String>> {
        let mut seen = HashSet::new();
        let references: Vec<&str> = references.filter(|r| seen.insert(*r)).collect();
        let joined = references.join(",");
        let url = with_query(route.endpoint(&self.options.endpoints), &[("ids", joined.as_str())]);
        debug!(?route, count = references.len(), "resolving download references");
        let reply = self.fetcher.fetch_json(&url, None)?;

        Ok(reply_elements::<UrlElement>(reply, "download URL")
            .into_iter()
            .map(|element| (element.id.trim().to_string(), element.url.trim().to_string()))
            .collect())
    }

    /// Phase 3: bytes. A failed download leaves the asset without content.
    fn download(&mut self, ids: &[&str]) {
        if ids.is_empty() {
            return;
        }

        let jobs: Vec<(&str, String)> = ids
            .iter()
            .filter_map(|id| Some((*id, self.cache.url_of(id)?.to_string())))
            .collect();
        let fetcher = &self.fetcher;
        let pages = map_bounded(&jobs, self.options.max_workers, |(_, url)| fetcher.fetch_raw(url));

        for ((id, _), page) in jobs.iter().zip(pages) {
            match page {
                Ok(page) => self.cache.set_content(id, Some(page)),
                Err(e) => {
                    warn!(asset_id = *id, "asset download failed: {e}");
                    self.cache.set_content(id, None);
                }
            }
        }
    }
}

fn build_asset(id: &str, element: &MetadataElement, url: String) -> Asset {
    Asset::new(id, element.name.trim(), element.type_name.trim(), url)
}

impl<F: PageFetcher> AssetLookup for AssetRetriever<F> {
    fn resolve(&mut self, ids: &[String]) -> Result<Vec<Asset>> {
        self.resolve_with(ids, true)
    }

    fn get(&self, id: &str) -> Option<&Asset> {
        self.cache.get(id)
    }
}
