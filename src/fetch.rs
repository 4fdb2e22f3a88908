//! Collaborator boundaries: fetching pages from the platform and persisting
//! finished assets.
//!
//! Session handling, authentication, retries and timeouts all live behind
//! [`PageFetcher`]. The core only sees "data" or a [`FetchError`].

use serde_json::Value;
use thiserror::Error;

use crate::asset::Asset;

/// Form values for a POST request, as `(name, value)` pairs.
pub type FormValues = [(String, String)];

/// A fetch that did not produce data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{url}: {reason}")]
pub struct FetchError {
    pub url: String,
    pub reason: String,
}

impl FetchError {
    pub fn new(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// Raw bytes of a fetched resource together with its declared content type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPage {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

impl RawPage {
    pub fn new(data: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            content_type: Some(content_type.into()),
        }
    }
}

/// Transport used by the retriever and extractors.
///
/// Implementations must be shareable across threads: byte downloads of one
/// batch may run on a bounded pool of workers.
pub trait PageFetcher: Send + Sync {
    /// GET `url` (or POST `form` to it when given) and decode the JSON reply.
    ///
    /// Non-2xx replies and undecodable bodies are reported as errors.
    fn fetch_json(&self, url: &str, form: Option<&FormValues>) -> Result<Value, FetchError>;

    /// Fetch the raw bytes behind `url`.
    fn fetch_raw(&self, url: &str) -> Result<RawPage, FetchError>;
}

impl<F: PageFetcher + ?Sized> PageFetcher for &F {
    fn fetch_json(&self, url: &str, form: Option<&FormValues>) -> Result<Value, FetchError> {
        (**self).fetch_json(url, form)
    }

    fn fetch_raw(&self, url: &str) -> Result<RawPage, FetchError> {
        (**self).fetch_raw(url)
    }
}

/// Sink for finished assets (on-disk layout and naming are up to the caller).
pub trait AssetWriter {
    fn save(&mut self, asset: &Asset) -> crate::Result<()>;
}

/// Collects assets in memory.
impl AssetWriter for Vec<Asset> {
    fn save(&mut self, asset: &Asset) -> crate::Result<()> {
        self.push(asset.clone());
        Ok(())
    }
}
