//! Link extraction from assignments and lecture assets.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use super::references::{Reference, collect_references};
use super::scan::scan_instructions;
use super::{GENERIC_KEY, Link, LinkMap, classify};
use crate::asset::{Asset, AssetRetriever};
use crate::error::Result;
use crate::fetch::PageFetcher;
use crate::util::{file_title, split_extension, strip_query, with_query};

const INSTRUCTIONS_POINTER: &str = "/submissionLearnerSchema/definition/assignmentInstructions/definition/value";

/// Anchor targets with these extensions are web pages, not downloads.
const WEB_PAGE_EXTENSIONS: &[&str] = &["html", "htm", "php", "asp", "aspx", "jsp"];

/// Builds [`LinkMap`]s, resolving embedded asset ids through a shared
/// retriever so that its cache serves later image inlining as well.
pub struct LinkExtractor<'r, F> {
    retriever: &'r mut AssetRetriever<F>,
}

impl<'r, F: PageFetcher> LinkExtractor<'r, F> {
    pub fn new(retriever: &'r mut AssetRetriever<F>) -> Self {
        Self { retriever }
    }

    /// Links from an assignment body.
    ///
    /// Every instructions blob found is also stored raw under
    /// [`HTML_KEY`](super::HTML_KEY). A body without instructions yields an
    /// empty map.
    pub fn extract_from_assignment(&mut self, body: &Value) -> Result<LinkMap> {
        let elements = match body.get("elements") {
            Some(Value::Array(elements)) => elements.as_slice(),
            _ => std::slice::from_ref(body),
        };

        let mut links = LinkMap::new();
        for element in elements {
            let Some(instructions) = element.pointer(INSTRUCTIONS_POINTER).and_then(Value::as_str) else {
                debug!("assignment element without instructions");
                continue;
            };
            links.merge(self.extract_from_text(instructions)?);
            links.push_html(instructions);
        }
        Ok(links)
    }

    /// Links from the anchors and asset tags of an instructions blob.
    pub fn extract_from_text(&mut self, text: &str) -> Result<LinkMap> {
        let found = scan_instructions(text);
        let mut links = LinkMap::new();

        for href in &found.anchors {
            let Some(path) = download_path(href) else {
                continue;
            };
            let (stem, extension) = split_extension(path);
            let Some(extension) = extension else {
                continue;
            };
            if WEB_PAGE_EXTENSIONS.contains(&extension.as_str()) {
                continue;
            }
            links.insert(classify(&extension), Link::remote(href.as_str(), stem));
        }

        if found.asset_tags.is_empty() {
            return Ok(links);
        }

        let ids: Vec<String> = found.asset_tags.iter().map(|tag| tag.id.clone()).collect();
        let assets = self.resolve(&ids)?;
        for tag in &found.asset_tags {
            let Some(asset) = assets.get(tag.id.as_str()) else {
                continue;
            };
            let kind = if asset.type_name.is_empty() {
                tag.extension.as_deref().unwrap_or(GENERIC_KEY)
            } else {
                asset.type_name.as_str()
            };
            let title = tag.name.clone().unwrap_or_else(|| file_title(&asset.name));
            links.insert(classify(kind), Link::remote(asset.url.as_str(), title));
        }

        Ok(links)
    }

    /// Links from lecture asset ids.
    ///
    /// Each id's descriptor may hold uploaded-asset references and external
    /// URL references at any depth; both end up in the same buckets.
    pub fn extract_from_lecture_assets(&mut self, asset_ids: &[String]) -> Result<LinkMap> {
        let mut references = Vec::new();
        for id in asset_ids {
            let url = with_query(&self.retriever.options().endpoints.lecture_assets, &[("id", id.as_str())]);
            let reply = self.retriever.fetcher().fetch_json(&url, None)?;
            collect_references(&reply, &mut references);
        }

        let ids: Vec<String> = references
            .iter()
            .filter_map(|reference| match reference {
                Reference::Asset { asset_id } => Some(asset_id.clone()),
                Reference::Url { .. } => None,
            })
            .collect();
        let assets = if ids.is_empty() {
            HashMap::new()
        } else {
            self.resolve(&ids)?
        };

        let mut links = LinkMap::new();
        for reference in &references {
            match reference {
                Reference::Asset { asset_id } => {
                    let Some(asset) = assets.get(asset_id.as_str()) else {
                        continue;
                    };
                    let kind = if asset.type_name.is_empty() {
                        split_extension(&asset.name).1.unwrap_or_default()
                    } else {
                        asset.type_name.clone()
                    };
                    links.insert(classify(&kind), Link::remote(asset.url.as_str(), file_title(&asset.name)));
                }
                Reference::Url { name, url, type_name } => {
                    if url.is_empty() {
                        warn!(name = name.as_str(), "url reference without a target, skipping");
                        continue;
                    }
                    let kind = type_name.as_deref().unwrap_or(GENERIC_KEY);
                    links.insert(classify(kind), Link::remote(url.as_str(), name.as_str()));
                }
            }
        }

        Ok(links)
    }

    /// Metadata-only resolution keyed by id; unresolvable ids are absent.
    fn resolve(&mut self, ids: &[String]) -> Result<HashMap<String, Asset>> {
        Ok(self
            .retriever
            .resolve_metadata(ids)?
            .into_iter()
            .map(|asset| (asset.id.clone(), asset))
            .collect())
    }
}

/// Path of an http(s) link after its authority, or `None` for other schemes
/// and for links with no path.
fn download_path(href: &str) -> Option<&str> {
    let (scheme, rest) = href.trim().split_once("://")?;
    if !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https") {
        return None;
    }
    let rest = strip_query(rest);
    let path = &rest[rest.find('/')?..];
    (path.len() > 1).then_some(path)
}
