//! A small namespace-aware element tree built on `quick-xml`.
//!
//! Sitemaps are queried by (namespace, local name), so every element keeps
//! the namespace its prefix resolved to. The reader is configured to be
//! forgiving: end tag names are not checked, stray end tags are ignored,
//! a lone `&` is kept as text, undeclared prefixes resolve to no namespace,
//! text is decoded lossily and unknown entities are kept verbatim.
//!
//! Ill-formed fragments are skipped and reading continues. A syntax error
//! the reader cannot get past (an unterminated tag, comment or CDATA
//! section) ends the document there: whatever was built so far is kept and
//! elements still open are closed implicitly, as at end of input. Only a
//! document that never produced a root element is unusable.

use crate::error::ParseError;
use quick_xml::escape::unescape;
use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use tracing::warn;

/// One XML element with its resolved namespace, accumulated text and children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub namespace: Option<String>,
    pub name: String,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    fn new(namespace: Option<String>, name: &[u8]) -> Self {
        Self {
            namespace,
            name: String::from_utf8_lossy(name).into_owned(),
            ..Self::default()
        }
    }

    /// Whether this element has the given namespace URI and local name.
    pub fn is(&self, namespace: &str, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == Some(namespace)
    }

    /// First direct child accepted by `matches`.
    pub fn child(&self, matches: impl Fn(&Element) -> bool) -> Option<&Element> {
        self.children.iter().find(|c| matches(c))
    }

    /// Element text with surrounding whitespace removed.
    pub fn trimmed_text(&self) -> &str {
        self.text.trim()
    }

    /// All elements below this one, in document order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }
}

/// Pre-order iterator returned by [`Element::descendants`].
#[derive(Debug)]
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

fn namespace_of(resolved: ResolveResult<'_>) -> Option<String> {
    match resolved {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
        ResolveResult::Unbound | ResolveResult::Unknown(_) => None,
    }
}

/// Expand an entity or character reference, keeping it as written if unknown.
fn expand_reference(name: &[u8]) -> String {
    let raw = format!("&{};", String::from_utf8_lossy(name));
    match unescape(&raw) {
        Ok(text) => text.into_owned(),
        Err(_) => raw,
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

/// Parse `content` into an element tree rooted at the first top-level element.
///
/// Fails only when no root element could be recovered; the error is then the
/// first one the reader reported, or [`ParseError::NoRoot`].
pub fn parse(content: &[u8]) -> Result<Element, ParseError> {
    let mut reader = NsReader::from_reader(content);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.allow_dangling_amp = true;

    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut first_error: Option<ParseError> = None;

    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(source) => {
                let position = reader.error_position();
                // The reader stays usable after ill-formed markup only.
                let fatal = !matches!(source, quick_xml::Error::IllFormed(_));
                warn!(position, error = %source, fatal, "Skipping malformed XML");
                if first_error.is_none() {
                    first_error = Some(ParseError::Syntax { position, source });
                }
                if fatal {
                    break;
                }
                buf.clear();
                continue;
            }
        };

        match event {
            Event::Start(e) => {
                let (resolved, local) = reader.resolve_element(e.name());
                stack.push(Element::new(namespace_of(resolved), local.as_ref()));
            }
            Event::Empty(e) => {
                let (resolved, local) = reader.resolve_element(e.name());
                let element = Element::new(namespace_of(resolved), local.as_ref());
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element);
                }
            }
            Event::Text(t) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Event::CData(c) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::GeneralRef(r) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&expand_reference(&r));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    while let Some(element) = stack.pop() {
        attach(&mut stack, &mut root, element);
    }

    match (root, first_error) {
        (Some(root), _) => Ok(root),
        (None, Some(error)) => Err(error),
        (None, None) => Err(ParseError::NoRoot),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
    const IMAGE_NS: &str = "http://www.google.com/schemas/sitemap-image/1.1";

    #[test]
    fn test_parse_resolves_default_and_prefixed_namespaces() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
        xmlns:image="http://www.google.com/schemas/sitemap-image/1.1">
  <url>
    <loc>https://example.com/a.html</loc>
    <image:image><image:loc>https://example.com/a.jpg</image:loc></image:image>
  </url>
</urlset>"#;

        let root = parse(xml).unwrap();
        assert!(root.is(SITEMAP_NS, "urlset"));

        let url = root.child(|c| c.is(SITEMAP_NS, "url")).unwrap();
        let loc = url.child(|c| c.is(SITEMAP_NS, "loc")).unwrap();
        assert_eq!(loc.trimmed_text(), "https://example.com/a.html");

        let image = url.child(|c| c.is(IMAGE_NS, "image")).unwrap();
        assert_eq!(image.name, "image");
        assert!(image.child(|c| c.is(IMAGE_NS, "loc")).is_some());
    }

    #[test]
    fn test_descendants_are_in_document_order() {
        let root = parse(b"<a><b><c/></b><d>x</d></a>").unwrap();
        let names: Vec<&str> = root.descendants().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "d"]);
    }

    #[test]
    fn test_entities_are_expanded() {
        let root = parse(b"<loc>https://example.com/?a=1&amp;b=2&#38;c=3</loc>").unwrap();
        assert_eq!(root.text, "https://example.com/?a=1&b=2&c=3");
    }

    #[test]
    fn test_cdata_text_is_kept() {
        let root = parse(b"<loc><![CDATA[https://example.com/a.html]]></loc>").unwrap();
        assert_eq!(root.trimmed_text(), "https://example.com/a.html");
    }

    #[test]
    fn test_mismatched_end_tag_is_tolerated() {
        let root = parse(b"<urlset><url><loc>https://example.com/a.html</location></url></urlset>")
            .unwrap();
        assert_eq!(root.name, "urlset");
        assert_eq!(root.descendants().filter(|e| e.name == "loc").count(), 1);
    }

    #[test]
    fn test_unclosed_tag_keeps_tree_built_so_far() {
        let root = parse(b"<urlset><url><loc>https://example.com/a.html</loc></url><not-valid-xml")
            .unwrap();
        assert_eq!(root.name, "urlset");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].children[0].text, "https://example.com/a.html");
    }

    #[test]
    fn test_truncated_comment_closes_open_elements() {
        let root = parse(b"<urlset><url><loc>https://example.com/a.html</loc></url><url><!-- trunc")
            .unwrap();
        let names: Vec<&str> = root.descendants().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["url", "loc", "url"]);
    }

    #[test]
    fn test_dangling_ampersand_is_kept_as_text() {
        let root = parse(b"<loc>https://example.com/b.html?x=1&y=2&amp;z=3</loc>").unwrap();
        assert_eq!(root.text, "https://example.com/b.html?x=1&y=2&z=3");
    }

    #[test]
    fn test_error_before_any_element_is_a_syntax_error() {
        let err = parse(b"<!-- never closed <loc>https://example.com/a.html</loc>").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn test_empty_input_has_no_root() {
        assert!(matches!(parse(b"").unwrap_err(), ParseError::NoRoot));
        assert!(matches!(parse(b"   \n").unwrap_err(), ParseError::NoRoot));
    }
}
