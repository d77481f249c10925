//! Tree builder on top of the quick-xml event reader.
//!
//! Namespace prefixes are resolved while the tree is built so that undeclared
//! prefixes can be either rejected or tolerated, depending on the caller's
//! recovery policy.

use crate::xml::element::{XmlAttribute, XmlElement};
use crate::xml::{ParseOptions, XML_NAMESPACE, XmlError};
use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};

/// Parse a document into its root element.
///
/// With `options.recover` set, syntax errors, mismatched end tags and
/// unclosed elements end the parse early and the tree built so far is
/// returned, closing any open elements. A document without a root element
/// is an error in either mode.
///
/// Text is kept as written, whitespace included. Character references and
/// the predefined entities are resolved in text as well as in attributes.
pub fn parse(xml: &[u8], options: ParseOptions) -> Result<XmlElement, XmlError> {
    let mut reader = Reader::from_reader(xml);
    if options.recover {
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
    }

    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(e) if options.recover => {
                log::debug!(
                    "recovering from XML error at byte {}: {}",
                    reader.buffer_position(),
                    e
                );
                break;
            },
            Err(e) => {
                return Err(XmlError::Syntax {
                    position: reader.buffer_position() as u64,
                    message: e.to_string(),
                });
            },
        };

        match event {
            Event::Start(ref e) => {
                let element = open_element(e, &stack, options)?;
                stack.push(element);
            },
            Event::Empty(ref e) => {
                let element = open_element(e, &stack, options)?;
                attach(&mut stack, &mut root, element, options)?;
            },
            Event::End(ref e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match stack.iter().rposition(|open| open.name == name) {
                    Some(depth) => {
                        // Only reachable past the innermost element in recovery mode;
                        // quick-xml rejects mismatched end tags otherwise.
                        while stack.len() > depth {
                            if let Some(element) = stack.pop() {
                                attach(&mut stack, &mut root, element, options)?;
                            }
                        }
                    },
                    None if options.recover => {
                        log::debug!("ignoring unmatched end tag </{}>", name);
                    },
                    None => return Err(XmlError::UnmatchedEnd(name)),
                }
            },
            Event::Text(ref t) => {
                if let Some(current) = stack.last_mut() {
                    current.push_text(String::from_utf8_lossy(t).to_string());
                }
            },
            Event::CData(t) => {
                if let Some(current) = stack.last_mut() {
                    current.push_text(String::from_utf8_lossy(&t.into_inner()).to_string());
                }
            },
            Event::GeneralRef(ref r) => {
                if let Some(current) = stack.last_mut() {
                    match resolve_reference(r) {
                        Some(text) => current.push_text(text),
                        None if options.recover => {
                            log::debug!(
                                "dropping unknown entity &{};",
                                String::from_utf8_lossy(r)
                            );
                        },
                        None => {
                            return Err(XmlError::Syntax {
                                position: reader.buffer_position() as u64,
                                message: format!(
                                    "unknown entity reference &{};",
                                    String::from_utf8_lossy(r)
                                ),
                            });
                        },
                    }
                }
            },
            Event::Eof => break,
            _ => {},
        }
        buf.clear();
    }

    if let Some(open) = stack.last()
        && !options.recover
    {
        return Err(XmlError::Unclosed(open.name.clone()));
    }
    while let Some(element) = stack.pop() {
        attach(&mut stack, &mut root, element, options)?;
    }

    root.ok_or(XmlError::NoRoot)
}

/// Text for a `&...;` reference: a character reference or one of the
/// predefined entities. `None` for anything else, including invalid code
/// points.
fn resolve_reference(reference: &BytesRef<'_>) -> Option<String> {
    match reference.resolve_char_ref() {
        Ok(Some(ch)) => return Some(ch.to_string()),
        Ok(None) => {},
        Err(_) => return None,
    }
    let name = String::from_utf8_lossy(reference);
    resolve_predefined_entity(&name).map(str::to_string)
}

/// Append a completed element to its parent, or make it the document root.
fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
    options: ParseOptions,
) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.push_element(element);
    } else if root.is_none() {
        *root = Some(element);
    } else if options.recover {
        log::debug!("ignoring extra top-level element <{}>", element.name);
    } else {
        return Err(XmlError::MultipleRoots(element.name));
    }
    Ok(())
}

/// Build an element from a start tag, resolving its namespaces against the
/// declarations of the currently open ancestors.
fn open_element(
    e: &BytesStart<'_>,
    ancestors: &[XmlElement],
    options: ParseOptions,
) -> Result<XmlElement, XmlError> {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();

    let mut declarations = Vec::new();
    let mut raw_attributes = Vec::new();
    for attr in e.attributes() {
        let attr = match attr {
            Ok(attr) => attr,
            Err(err) if options.recover => {
                log::debug!("skipping malformed attribute on <{}>: {}", name, err);
                continue;
            },
            Err(err) => {
                return Err(XmlError::Attribute {
                    element: name,
                    message: err.to_string(),
                });
            },
        };
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = match attr.unescape_value() {
            Ok(value) => value.to_string(),
            Err(_) if options.recover => String::from_utf8_lossy(&attr.value).to_string(),
            Err(err) => {
                return Err(XmlError::Attribute {
                    element: name,
                    message: err.to_string(),
                });
            },
        };

        if key == "xmlns" {
            declarations.push((String::new(), value));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            declarations.push((prefix.to_string(), value));
        } else {
            raw_attributes.push((key, value));
        }
    }

    let scope = Scope {
        ancestors,
        own: &declarations,
    };

    let namespace = match split_prefix(&name) {
        Some(prefix) => scope.resolve_prefix(prefix, &name, options)?,
        None => scope.lookup(""),
    };

    let mut attributes = Vec::with_capacity(raw_attributes.len());
    for (key, value) in raw_attributes {
        let namespace = match split_prefix(&key) {
            Some(prefix) => scope.resolve_prefix(prefix, &name, options)?,
            None => None,
        };
        attributes.push(XmlAttribute {
            name: key,
            namespace,
            value,
        });
    }

    let default_namespace = scope.lookup("");

    Ok(XmlElement {
        name,
        namespace,
        default_namespace,
        declarations,
        attributes,
        children: Vec::new(),
    })
}

/// In-scope namespace declarations for an element being opened.
struct Scope<'a> {
    ancestors: &'a [XmlElement],
    own: &'a [(String, String)],
}

impl Scope<'_> {
    /// Innermost binding of `prefix`; an empty URI undeclares it.
    fn lookup(&self, prefix: &str) -> Option<String> {
        let own = self.own.iter().rev().find(|(p, _)| p == prefix);
        let binding = own.or_else(|| {
            self.ancestors
                .iter()
                .rev()
                .find_map(|a| a.declarations.iter().rev().find(|(p, _)| p == prefix))
        });
        binding
            .map(|(_, uri)| uri.clone())
            .filter(|uri| !uri.is_empty())
    }

    fn resolve_prefix(
        &self,
        prefix: &str,
        element: &str,
        options: ParseOptions,
    ) -> Result<Option<String>, XmlError> {
        if prefix == "xml" {
            return Ok(Some(XML_NAMESPACE.to_string()));
        }
        match self.lookup(prefix) {
            Some(uri) => Ok(Some(uri)),
            None if options.recover_undeclared_namespace || options.recover => {
                log::debug!("undeclared namespace prefix `{}` on <{}>", prefix, element);
                Ok(None)
            },
            None => Err(XmlError::UndeclaredPrefix {
                prefix: prefix.to_string(),
                element: element.to_string(),
            }),
        }
    }
}

#[inline]
fn split_prefix(name: &str) -> Option<&str> {
    memchr::memchr(b':', name.as_bytes()).map(|colon| &name[..colon])
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORE: &str = "http://schemas.microsoft.com/3dmanufacturing/core/2015/02";

    fn strict() -> ParseOptions {
        ParseOptions::default()
    }

    fn recovering() -> ParseOptions {
        ParseOptions {
            recover: true,
            recover_undeclared_namespace: false,
        }
    }

    #[test]
    fn test_default_namespace_is_inherited() {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<model xmlns="{CORE}" unit="millimeter">
    <resources><object id="1" type="model"/></resources>
</model>"#
        );
        let root = parse(xml.as_bytes(), strict()).unwrap();

        assert_eq!(root.default_namespace(), Some(CORE));
        let object = root.find_all(Some(CORE), "object").next().unwrap();
        assert_eq!(object.namespace(), Some(CORE));
        assert_eq!(object.attribute("id"), Some("1"));
    }

    #[test]
    fn test_prefixed_elements_resolve_to_their_namespace() {
        let xml = br#"<model xmlns="urn:core" xmlns:s="urn:slicer"><s:object id="9"/><object id="1"/></model>"#;
        let root = parse(xml, strict()).unwrap();

        let core: Vec<_> = root.find_all(Some("urn:core"), "object").collect();
        assert_eq!(core.len(), 1);
        assert_eq!(core[0].attribute("id"), Some("1"));

        let slicer: Vec<_> = root.find_all(Some("urn:slicer"), "object").collect();
        assert_eq!(slicer.len(), 1);
        assert_eq!(slicer[0].attribute("id"), Some("9"));
    }

    #[test]
    fn test_no_default_namespace() {
        let root = parse(b"<config><object id=\"1\"/></config>", strict()).unwrap();
        assert_eq!(root.default_namespace(), None);
        assert_eq!(root.find_all(None, "object").count(), 1);
    }

    #[test]
    fn test_attribute_values_are_unescaped() {
        let root = parse(br#"<m name="a &amp; b"/>"#, strict()).unwrap();
        assert_eq!(root.attribute("name"), Some("a & b"));
    }

    #[test]
    fn test_text_references_are_resolved() {
        let root = parse(
            b"<m><a>Nuts &amp; Bolts</a><b>Nuts &#38; Bolts</b><c>&lt;&#x41;&gt;</c></m>",
            strict(),
        )
        .unwrap();
        let texts: Vec<_> = root.elements().map(XmlElement::text).collect();
        assert_eq!(texts, vec!["Nuts & Bolts", "Nuts & Bolts", "<A>"]);
    }

    #[test]
    fn test_text_keeps_surrounding_whitespace() {
        let root = parse(b"<m>  padded  </m>", strict()).unwrap();
        assert_eq!(root.text(), "  padded  ");
    }

    #[test]
    fn test_unknown_entity_in_text() {
        let xml = b"<m>a &nbsp; b</m>";

        let err = parse(xml, strict()).unwrap_err();
        assert!(matches!(err, XmlError::Syntax { ref message, .. } if message.contains("nbsp")));

        let root = parse(xml, recovering()).unwrap();
        assert_eq!(root.text(), "a  b");
    }

    #[test]
    fn test_mismatched_end_tag_fails_strict() {
        let err = parse(b"<model><resources></model>", strict()).unwrap_err();
        assert!(matches!(err, XmlError::Syntax { .. }));
    }

    #[test]
    fn test_mismatched_end_tag_recovers() {
        let root = parse(b"<model><resources><object id=\"1\"/></model>", recovering()).unwrap();
        assert_eq!(root.name(), "model");
        assert_eq!(root.find_all(None, "object").count(), 1);
    }

    #[test]
    fn test_truncated_document() {
        let xml = b"<model><resources><object id=\"1\"/>";

        let err = parse(xml, strict()).unwrap_err();
        assert!(matches!(err, XmlError::Unclosed(ref name) if name == "resources"));

        let root = parse(xml, recovering()).unwrap();
        assert_eq!(root.find_all(None, "object").count(), 1);
    }

    #[test]
    fn test_empty_document_has_no_root() {
        assert!(matches!(parse(b"", strict()), Err(XmlError::NoRoot)));
        assert!(matches!(parse(b"   ", recovering()), Err(XmlError::NoRoot)));
    }

    #[test]
    fn test_multiple_roots() {
        let xml = b"<a/><b/>";
        assert!(matches!(parse(xml, strict()), Err(XmlError::MultipleRoots(ref n)) if n == "b"));
        assert_eq!(parse(xml, recovering()).unwrap().name(), "a");
    }

    #[test]
    fn test_undeclared_prefix() {
        let xml = br#"<model xmlns="urn:core"><object id="1" p:UUID="x"/></model>"#;

        let err = parse(xml, strict()).unwrap_err();
        assert!(matches!(err, XmlError::UndeclaredPrefix { ref prefix, .. } if prefix == "p"));

        let options = ParseOptions {
            recover: false,
            recover_undeclared_namespace: true,
        };
        let root = parse(xml, options).unwrap();
        let object = root.find_all(Some("urn:core"), "object").next().unwrap();
        assert_eq!(object.attribute("p:UUID"), Some("x"));
        assert_eq!(object.attributes()[1].namespace(), None);
    }

    #[test]
    fn test_xml_prefix_is_predeclared() {
        let root = parse(br#"<model xml:lang="en-US"/>"#, strict()).unwrap();
        assert_eq!(root.attributes()[0].namespace(), Some(XML_NAMESPACE));
    }
}
