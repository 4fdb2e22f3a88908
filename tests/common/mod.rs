//! Scripted platform shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::{Value, json};

use coursekit::{Endpoints, FetchError, FormValues, PageFetcher, RawPage, RetrieverOptions};

pub const BASE: &str = "https://api.test/api";

pub fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("{path}: {e}"))
}

pub fn fixture_json(name: &str) -> Value {
    serde_json::from_str(&fixture(name)).unwrap()
}

pub fn ids(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

pub fn options() -> RetrieverOptions {
    RetrieverOptions::default().with_endpoints(Endpoints::with_base(BASE))
}

/// Answers metadata, URL and descriptor calls from tables and records every
/// request URL.
#[derive(Default)]
pub struct FakeFetcher {
    metadata: HashMap<String, Value>,
    file_urls: HashMap<String, String>,
    media_urls: HashMap<String, String>,
    lectures: HashMap<String, Value>,
    content: HashMap<String, RawPage>,
    fail_metadata: bool,
    fail_media_urls: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asset whose metadata carries a live URL.
    pub fn live(mut self, id: &str, name: &str, type_name: &str, url: &str) -> Self {
        self.metadata.insert(
            id.to_string(),
            json!({"id": id, "name": name, "typeName": type_name, "url": {"url": url}}),
        );
        self
    }

    /// Asset whose metadata carries a download reference only.
    pub fn deferred(mut self, id: &str, name: &str, type_name: &str, reference: &str) -> Self {
        self.metadata.insert(
            id.to_string(),
            json!({"id": id, "name": name, "typeName": type_name, "downloadRef": reference}),
        );
        self
    }

    pub fn file_url(mut self, reference: &str, url: &str) -> Self {
        self.file_urls.insert(reference.to_string(), url.to_string());
        self
    }

    pub fn media_url(mut self, reference: &str, url: &str) -> Self {
        self.media_urls.insert(reference.to_string(), url.to_string());
        self
    }

    pub fn content(mut self, url: &str, data: &[u8], content_type: &str) -> Self {
        self.content.insert(url.to_string(), RawPage::new(data, content_type));
        self
    }

    pub fn lecture(mut self, id: &str, reply: Value) -> Self {
        self.lectures.insert(id.to_string(), reply);
        self
    }

    pub fn failing_metadata(mut self) -> Self {
        self.fail_metadata = true;
        self
    }

    pub fn failing_media_urls(mut self) -> Self {
        self.fail_media_urls = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, endpoint: &str) -> Vec<String> {
        let prefix = format!("{BASE}/{endpoint}?");
        self.calls()
            .into_iter()
            .filter(|url| url.starts_with(&prefix))
            .collect()
    }

    fn record(&self, url: &str) {
        self.calls.lock().unwrap().push(url.to_string());
    }
}

fn query_param(url: &str, key: &str) -> Vec<String> {
    let Some((_, query)) = url.split_once('?') else {
        return Vec::new();
    };
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.split(',').map(str::to_string).collect())
        .unwrap_or_default()
}

impl PageFetcher for FakeFetcher {
    fn fetch_json(&self, url: &str, _form: Option<&FormValues>) -> Result<Value, FetchError> {
        self.record(url);
        let endpoint = url
            .strip_prefix(BASE)
            .and_then(|rest| rest.split('?').next())
            .unwrap_or_default();
        let requested = query_param(url, "ids");

        let elements: Vec<Value> = match endpoint {
            "/assets.v1" if self.fail_metadata => return Err(FetchError::new(url, "503 Service Unavailable")),
            "/assets.v1" => requested.iter().filter_map(|id| self.metadata.get(id).cloned()).collect(),
            "/mediaAssetUrls.v1" if self.fail_media_urls => {
                return Err(FetchError::new(url, "502 Bad Gateway"));
            }
            "/assetUrls.v1" | "/mediaAssetUrls.v1" => {
                let table = if endpoint == "/assetUrls.v1" {
                    &self.file_urls
                } else {
                    &self.media_urls
                };
                requested
                    .iter()
                    .filter_map(|reference| {
                        table.get(reference).map(|target| json!({"id": reference, "url": target}))
                    })
                    .collect()
            }
            "/openCourseAssets.v1" => {
                let id = query_param(url, "id").pop().unwrap_or_default();
                return self
                    .lectures
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| FetchError::new(url, "404 Not Found"));
            }
            _ => return Err(FetchError::new(url, "unexpected endpoint")),
        };
        Ok(json!({ "elements": elements }))
    }

    fn fetch_raw(&self, url: &str) -> Result<RawPage, FetchError> {
        self.record(url);
        self.content
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::new(url, "404 Not Found"))
    }
}
