//! Endpoint and retrieval configuration.
//!
//! Everything here has a working default; orchestrating layers may load
//! overrides from JSON since all fields are optional on deserialization.

use serde::Deserialize;

const API_BASE: &str = "https://api.coursera.org/api";

/// Platform endpoints consulted by the retriever and the link extractor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Endpoints {
    /// Batched asset description lookup, queried with `ids=a,b,c`.
    pub asset_metadata: String,
    /// Follow-up URL resolution for file download references.
    pub file_urls: String,
    /// Follow-up URL resolution for video and audio download references.
    pub media_urls: String,
    /// Lecture asset descriptors, queried one id at a time.
    pub lecture_assets: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            asset_metadata: format!("{API_BASE}/assets.v1"),
            file_urls: format!("{API_BASE}/assetUrls.v1"),
            media_urls: format!("{API_BASE}/mediaAssetUrls.v1"),
            lecture_assets: format!("{API_BASE}/openCourseAssets.v1"),
        }
    }
}

impl Endpoints {
    /// Point every endpoint at `base` (useful for staging hosts and tests).
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            asset_metadata: format!("{base}/assets.v1"),
            file_urls: format!("{base}/assetUrls.v1"),
            media_urls: format!("{base}/mediaAssetUrls.v1"),
            lecture_assets: format!("{base}/openCourseAssets.v1"),
        }
    }
}

/// Options for an [`AssetRetriever`](crate::AssetRetriever).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetrieverOptions {
    pub endpoints: Endpoints,
    /// Upper bound on concurrent byte downloads; 0 or 1 downloads sequentially.
    pub max_workers: usize,
    /// Whether [`AssetRetriever::resolve`](crate::AssetRetriever::resolve)
    /// downloads asset bytes.
    pub download_content: bool,
}

impl Default for RetrieverOptions {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            max_workers: 4,
            download_content: true,
        }
    }
}

impl RetrieverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn with_download_content(mut self, download_content: bool) -> Self {
        self.download_content = download_content;
        self
    }
}
