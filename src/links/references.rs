//! Typed asset references found in lecture asset descriptors.
//!
//! Reference objects look like `{"typeName": "asset", "definition": {...}}`
//! and may sit at any depth of a reply. The `typeName` discriminant is read
//! once and selects the decoder for `definition`; objects of any other kind
//! are searched recursively.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// A reference to something downloadable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Reference {
    /// An uploaded platform asset, resolved through the retriever.
    Asset { asset_id: String },
    /// A direct external link.
    Url {
        name: String,
        url: String,
        type_name: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReferenceKind {
    Asset,
    Url,
}

impl ReferenceKind {
    fn parse(type_name: &str) -> Option<Self> {
        match type_name {
            "asset" => Some(ReferenceKind::Asset),
            "url" => Some(ReferenceKind::Url),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetDefinition {
    asset_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UrlDefinition {
    #[serde(default)]
    name: String,
    url: String,
    #[serde(default, alias = "type")]
    type_name: Option<String>,
}

/// Collect every reference in `value`, in document order.
pub(crate) fn collect_references(value: &Value, out: &mut Vec<Reference>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_references(item, out);
            }
        }
        Value::Object(map) => match reference_kind(map) {
            Some((kind, definition)) => {
                if let Some(reference) = decode(kind, definition) {
                    out.push(reference);
                }
            }
            None => {
                for child in map.values() {
                    collect_references(child, out);
                }
            }
        },
        _ => {}
    }
}

fn reference_kind(map: &Map<String, Value>) -> Option<(ReferenceKind, &Value)> {
    let type_name = map.get("typeName")?.as_str()?;
    let definition = map.get("definition")?;
    match ReferenceKind::parse(type_name) {
        Some(kind) => Some((kind, definition)),
        None => {
            debug!(type_name, "not an asset reference, descending");
            None
        }
    }
}

fn decode(kind: ReferenceKind, definition: &Value) -> Option<Reference> {
    let decoded = match kind {
        ReferenceKind::Asset => AssetDefinition::deserialize(definition).map(|d| Reference::Asset {
            asset_id: d.asset_id.trim().to_string(),
        }),
        ReferenceKind::Url => UrlDefinition::deserialize(definition).map(|d| Reference::Url {
            name: d.name.trim().to_string(),
            url: d.url.trim().to_string(),
            type_name: d.type_name.filter(|t| !t.trim().is_empty()),
        }),
    };

    match decoded {
        Ok(reference) => Some(reference),
        Err(e) => {
            warn!(?kind, "skipping reference of unexpected shape: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn references(value: Value) -> Vec<Reference> {
        let mut out = Vec::new();
        collect_references(&value, &mut out);
        out
    }

    #[test]
    fn test_flat_elements() {
        let refs = references(json!({
            "elements": [
                {"typeName": "asset", "definition": {"assetId": " A1 ", "name": "slides"}},
                {"typeName": "url", "definition": {"name": "Docs", "url": "https://x/docs"}}
            ]
        }));
        assert_eq!(
            refs,
            vec![
                Reference::Asset { asset_id: "A1".into() },
                Reference::Url {
                    name: "Docs".into(),
                    url: "https://x/docs".into(),
                    type_name: None
                },
            ]
        );
    }

    #[test]
    fn test_nested_under_unknown_kinds() {
        let refs = references(json!({
            "elements": [{
                "typeName": "bundle",
                "definition": {
                    "items": [{"typeName": "asset", "definition": {"assetId": "deep"}}]
                }
            }]
        }));
        assert_eq!(refs, vec![Reference::Asset { asset_id: "deep".into() }]);
    }

    #[test]
    fn test_bad_definition_is_skipped() {
        let refs = references(json!([
            {"typeName": "asset", "definition": {"name": "no id"}},
            {"typeName": "url", "definition": {"name": "x", "url": "u", "type": "pdf"}}
        ]));
        assert_eq!(
            refs,
            vec![Reference::Url {
                name: "x".into(),
                url: "u".into(),
                type_name: Some("pdf".into())
            }]
        );
    }

    #[test]
    fn test_scalars_yield_nothing() {
        assert!(references(json!("asset")).is_empty());
        assert!(references(json!(null)).is_empty());
    }
}
