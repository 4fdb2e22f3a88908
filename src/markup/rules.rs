//! Tag rewrite table for markup → HTML.
//!
//! Adding a structural rewrite is a new row here; the converter consults the
//! table once per element.

use quick_xml::events::BytesStart;

use super::attribute;

/// How the output tag name is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Target {
    Fixed(&'static str),
    /// `h1`..`h5` from the `level` attribute, `h1` when missing or invalid.
    HeadingLevel,
    /// `ol` for `bullettype="numbers"`, `ul` otherwise.
    ListKind,
}

/// What happens to an element's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Children {
    /// Nested markup is rewritten too.
    Rewrite,
    /// Nested markup is copied untouched.
    Verbatim,
}

#[derive(Debug)]
pub(crate) struct RewriteRule {
    pub from: &'static str,
    pub to: Target,
    pub copy_attributes: bool,
    pub children: Children,
}

pub(crate) static REWRITE_RULES: &[RewriteRule] = &[
    RewriteRule {
        from: "text",
        to: Target::Fixed("p"),
        copy_attributes: true,
        children: Children::Rewrite,
    },
    RewriteRule {
        from: "heading",
        to: Target::HeadingLevel,
        copy_attributes: true,
        children: Children::Rewrite,
    },
    RewriteRule {
        from: "code",
        to: Target::Fixed("pre"),
        copy_attributes: true,
        children: Children::Verbatim,
    },
    RewriteRule {
        from: "list",
        to: Target::ListKind,
        copy_attributes: true,
        children: Children::Rewrite,
    },
];

pub(crate) fn rule_for(name: &[u8]) -> Option<&'static RewriteRule> {
    REWRITE_RULES
        .iter()
        .find(|rule| rule.from.as_bytes().eq_ignore_ascii_case(name))
}

impl Target {
    pub fn tag_name(self, e: &BytesStart<'_>) -> &'static str {
        match self {
            Target::Fixed(name) => name,
            Target::HeadingLevel => {
                match attribute(e, b"level").as_deref().map(str::trim) {
                    Some("2") => "h2",
                    Some("3") => "h3",
                    Some("4") => "h4",
                    Some("5") => "h5",
                    _ => "h1",
                }
            }
            Target::ListKind => match attribute(e, b"bullettype").as_deref().map(str::trim) {
                Some(kind) if kind.eq_ignore_ascii_case("numbers") => "ol",
                _ => "ul",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    use super::*;

    fn start(source: &str) -> BytesStart<'static> {
        let mut reader = Reader::from_str(source);
        match reader.read_event().unwrap() {
            Event::Start(e) | Event::Empty(e) => e.into_owned(),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_rule_lookup_is_case_insensitive() {
        assert_eq!(rule_for(b"Text").unwrap().to, Target::Fixed("p"));
        assert_eq!(rule_for(b"code").unwrap().children, Children::Verbatim);
        assert!(rule_for(b"co-content").is_none());
        assert!(rule_for(b"img").is_none());
    }

    #[test]
    fn test_heading_levels() {
        let heading = Target::HeadingLevel;
        assert_eq!(heading.tag_name(&start(r#"<heading level="3">"#)), "h3");
        assert_eq!(heading.tag_name(&start(r#"<heading level="5"/>"#)), "h5");
        assert_eq!(heading.tag_name(&start(r#"<heading>"#)), "h1");
        assert_eq!(heading.tag_name(&start(r#"<heading level="7">"#)), "h1");
        assert_eq!(heading.tag_name(&start(r#"<heading level="x">"#)), "h1");
    }

    #[test]
    fn test_list_kinds() {
        let list = Target::ListKind;
        assert_eq!(list.tag_name(&start(r#"<list bullettype="numbers">"#)), "ol");
        assert_eq!(list.tag_name(&start(r#"<list bullettype="bullets">"#)), "ul");
        assert_eq!(list.tag_name(&start(r#"<list bulletType="roman">"#)), "ul");
        assert_eq!(list.tag_name(&start(r#"<list>"#)), "ul");
    }
}
