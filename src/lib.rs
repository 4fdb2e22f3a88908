//! # coursekit
//!
//! Resolve course assets, extract downloadable links and render quizzes and
//! instructional markup as self-contained HTML.
//!
//! ## Pieces
//!
//! - [`AssetRetriever`]: batched asset resolution with an id-keyed cache
//! - [`LinkExtractor`]: typed link maps from assignments and lecture assets
//! - [`QuizMarkupConverter`]: quiz JSON → course markup
//! - [`MarkupToHtmlConverter`]: course markup → HTML with inlined images
//!
//! All network access goes through a caller-supplied [`PageFetcher`], which
//! owns authentication, timeouts and retries.
//!
//! ## Quick Start
//!
//! ```
//! use coursekit::{AssetCache, MarkupToHtmlConverter, QuizMarkupConverter};
//!
//! let quiz = serde_json::json!({"questions": [{
//!     "question": {"type": "mcq"},
//!     "variant": {"definition": {
//!         "prompt": {"definition": {"value": "<text>2 + 2?</text>"}},
//!         "options": [
//!             {"id": "a", "display": {"definition": {"value": "4"}}, "isCorrect": true},
//!             {"id": "b", "display": {"definition": {"value": "5"}}, "isCorrect": false}
//!         ]
//!     }}
//! }]});
//!
//! let markup = QuizMarkupConverter::new().convert(&quiz).unwrap();
//! let mut html = MarkupToHtmlConverter::new(AssetCache::new());
//! let page = html.convert(&markup).unwrap();
//! assert!(page.contains("<h3 level=\"3\">Question 1</h3>"));
//! ```

pub mod asset;
pub mod config;
pub mod error;
pub mod fetch;
pub mod links;
pub mod markup;
pub(crate) mod util;

pub use asset::{Asset, AssetCache, AssetLookup, AssetRetriever};
pub use config::{Endpoints, RetrieverOptions};
pub use error::{Error, Result};
pub use fetch::{AssetWriter, FetchError, FormValues, PageFetcher, RawPage};
pub use links::{HTML_KEY, Link, LinkExtractor, LinkMap, LinkTarget, classify};
pub use markup::{INSTRUCTIONS_HTML_INJECTION, MarkupToHtmlConverter, QUESTION_SEPARATOR, QuizMarkupConverter};
pub use util::{decode_text, extract_xml_encoding};
