//! Markup → HTML rendering.

mod common;

use common::{FakeFetcher, fixture, options};
use coursekit::{Asset, AssetCache, AssetRetriever, INSTRUCTIONS_HTML_INJECTION, MarkupToHtmlConverter};
use proptest::prelude::*;

fn offline() -> MarkupToHtmlConverter<AssetCache> {
    MarkupToHtmlConverter::new(AssetCache::new())
}

fn body(html: &str) -> &str {
    html.strip_suffix(INSTRUCTIONS_HTML_INJECTION).expect("injection appended")
}

#[test]
fn test_empty_markup() {
    assert_eq!(offline().convert("").unwrap(), INSTRUCTIONS_HTML_INJECTION);
}

#[test]
fn test_injection_is_stable_across_calls() {
    let mut converter = offline();
    let first = converter.convert("<text>a</text>").unwrap();
    let second = converter.convert("<text>b</text>").unwrap();
    assert!(first.ends_with(INSTRUCTIONS_HTML_INJECTION));
    assert!(second.ends_with(INSTRUCTIONS_HTML_INJECTION));
}

#[test]
fn test_nested_text_stays_nested() {
    let html = offline()
        .convert("<co-content><text>Test<text>Nested</text></text><text>Test2</text></co-content>")
        .unwrap();
    assert_eq!(
        body(&html),
        "<co-content><p>Test<p>Nested</p></p><p>Test2</p></co-content>"
    );
}

#[test]
fn test_headings() {
    let html = offline()
        .convert(concat!(
            r#"<heading level="1">T</heading><heading level="2">T</heading>"#,
            r#"<heading level="3">T</heading><heading level="4">T</heading>"#,
            r#"<heading level="5">T</heading><heading>T</heading>"#
        ))
        .unwrap();
    assert_eq!(
        body(&html),
        concat!(
            r#"<h1 level="1">T</h1><h2 level="2">T</h2>"#,
            r#"<h3 level="3">T</h3><h4 level="4">T</h4>"#,
            r#"<h5 level="5">T</h5><h1>T</h1>"#
        )
    );
}

#[test]
fn test_code_and_lists() {
    let html = offline()
        .convert(r#"<code>Text</code><list bullettype="numbers">Text</list><list bullettype="bullets">Text</list><list>Text</list>"#)
        .unwrap();
    assert_eq!(
        body(&html),
        r#"<pre>Text</pre><ol bullettype="numbers">Text</ol><ul bullettype="bullets">Text</ul><ul>Text</ul>"#
    );
}

#[test]
fn test_unknown_tags_pass_through() {
    let html = offline()
        .convert(r#"<co-content><table><tr><td>1</td></tr></table><custom-tag x="y"/></co-content>"#)
        .unwrap();
    assert_eq!(
        body(&html),
        r#"<co-content><table><tr><td>1</td></tr></table><custom-tag x="y"/></co-content>"#
    );
}

#[test]
fn test_images_inlined_from_cache() {
    let cache: AssetCache = [
        Asset::new("nVhIAj61EeaGyBLfiQeo_w", "a.png", "image", "https://cdn.test/a.png")
            .with_content(b"a".to_vec(), "image/png"),
        Asset::new("vdqUTz61Eea_CQ5dfWSAjQ", "b.png", "image", "https://cdn.test/b.png")
            .with_content(b"b".to_vec(), "image/png"),
        Asset::new("nodata", "c.png", "image", "https://cdn.test/c.png"),
    ]
    .into_iter()
    .collect();
    let mut converter = MarkupToHtmlConverter::new(cache);

    let html = converter
        .convert(concat!(
            r#"<co-content><img assetId="nVhIAj61EeaGyBLfiQeo_w" alt=""/>"#,
            r#"<img assetId="vdqUTz61Eea_CQ5dfWSAjQ" alt=""/>"#,
            r#"<img assetId="nodata" alt="none"/></co-content>"#
        ))
        .unwrap();

    assert_eq!(
        body(&html),
        concat!(
            r#"<co-content><img assetId="nVhIAj61EeaGyBLfiQeo_w" alt="" src="data:image/png;base64,YQ=="/>"#,
            r#"<img assetId="vdqUTz61Eea_CQ5dfWSAjQ" alt="" src="data:image/png;base64,Yg=="/>"#,
            r#"<img assetId="nodata" alt="none"/></co-content>"#
        )
    );
    assert!(!html.contains("base64,None"));
}

#[test]
fn test_images_fetched_through_retriever_in_one_batch() {
    let fetcher = FakeFetcher::new()
        .live("diagram", "diagram.png", "image", "https://cdn.test/diagram.png")
        .content("https://cdn.test/diagram.png", b"png", "image/png");
    let retriever = AssetRetriever::with_options(&fetcher, options());
    let mut converter = MarkupToHtmlConverter::new(retriever);

    let html = converter.convert(&fixture("instructions.xml")).unwrap();

    assert!(html.contains(r#"<img assetId="diagram" alt="Pipeline diagram" src="data:image/png;base64,cG5n"/>"#));
    assert!(html.contains(r#"<h2 level="2">Getting started</h2>"#));
    assert!(html.contains("<ol bullettype=\"numbers\">"));
    assert!(html.contains("<pre>if a &lt; b {"));
    assert_eq!(fetcher.calls_to("assets.v1").len(), 1);
    assert_eq!(converter.lookup().cache().len(), 1);
}

#[test]
fn test_unresolvable_image_renders_without_src() {
    let fetcher = FakeFetcher::new();
    let mut converter = MarkupToHtmlConverter::new(AssetRetriever::with_options(&fetcher, options()));
    let html = converter.convert(r#"<img assetId="ghost" alt="g"/>"#).unwrap();
    assert_eq!(body(&html), r#"<img assetId="ghost" alt="g"/>"#);
}

#[test]
fn test_unbalanced_markup_is_rejected() {
    let mut converter = offline();
    assert!(converter.convert("<text>open").unwrap_err().is_malformed());
    assert!(converter.convert("<text>a</code>").unwrap_err().is_malformed());
    assert!(converter.convert("</text>").unwrap_err().is_malformed());
}

proptest! {
    #[test]
    fn prop_level_three_heading(content in "[a-zA-Z0-9 ,.!?]{0,40}") {
        let markup = format!(r#"<heading level="3">{content}</heading>"#);
        let html = offline().convert(&markup).unwrap();
        let expected = format!(r#"<h3 level="3">{content}</h3>"#);
        prop_assert_eq!(body(&html), expected.as_str());
    }
}
