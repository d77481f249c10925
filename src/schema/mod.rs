//! Typed views of 3MF documents.
//!
//! Maps parsed [`XmlElement`] trees onto the 3MF core model schema
//! ([`Model`]) and the slicer settings schema ([`Config`]). Attributes and
//! elements the mapping does not consume are collected and, depending on
//! [`XmlParserOptions`], logged or turned into a [`SchemaError::Unused`].

pub mod config;
pub mod model;

pub use config::{AssembleItem, Config, ConfigMetadata, ObjectConfig, PartConfig, PlateConfig};
pub use model::{BuildItem, Component, Mesh, Model, ModelMetadata, Object, Triangle};

use crate::options::XmlParserOptions;
use crate::project::constants::namespace::PRODUCTION;
use crate::xml::{XML_NAMESPACE, XmlElement};
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while mapping a document tree onto a schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("expected root element <{expected}>, found <{found}>")]
    UnexpectedRoot { expected: &'static str, found: String },

    #[error("<{element}> is missing required attribute `{attribute}`")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },

    #[error("invalid value {value:?} for `{attribute}` on <{element}>")]
    InvalidAttribute {
        element: String,
        attribute: &'static str,
        value: String,
    },

    #[error("unused XML content: {}", .0.join(", "))]
    Unused(Vec<String>),
}

/// Collects content the schema mapping did not consume.
#[derive(Debug, Default)]
pub(crate) struct UnusedTracker {
    elements: Vec<String>,
    attributes: Vec<String>,
}

impl UnusedTracker {
    /// Record every attribute of `element` whose name is not in `known`.
    /// `xml:*` attributes are never reported.
    pub(crate) fn attributes(&mut self, element: &XmlElement, known: &[&str]) {
        self.extended_attributes(element, known, &[]);
    }

    /// Like [`attributes`](Self::attributes), also accepting production
    /// extension attributes with the given local names under any prefix.
    pub(crate) fn extended_attributes(
        &mut self,
        element: &XmlElement,
        known: &[&str],
        production: &[&str],
    ) {
        for attr in element.attributes() {
            let consumed = match attr.namespace() {
                Some(XML_NAMESPACE) => true,
                Some(PRODUCTION) => production.contains(&attr.local_name()),
                Some(_) => false,
                None => known.contains(&attr.name()),
            };
            if consumed {
                continue;
            }
            self.attributes
                .push(format!("<{}> @{}", element.name(), attr.name()));
        }
    }

    pub(crate) fn element(&mut self, parent: &XmlElement, child: &XmlElement) {
        self.elements
            .push(format!("<{}> in <{}>", child.name(), parent.name()));
    }

    /// Report what was collected. Fails when asserting on a non-empty report.
    pub(crate) fn finish(self, options: &XmlParserOptions) -> Result<(), SchemaError> {
        if options.print_unused_elements {
            for element in &self.elements {
                log::warn!("unused XML element {}", element);
            }
        }
        if options.print_unused_attributes {
            for attribute in &self.attributes {
                log::warn!("unused XML attribute {}", attribute);
            }
        }

        let mut asserted = Vec::new();
        if options.assert_unused_elements {
            asserted.extend(self.elements);
        }
        if options.assert_unused_attributes {
            asserted.extend(self.attributes);
        }
        if asserted.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::Unused(asserted))
        }
    }
}

/// Whether `child` belongs to the same vocabulary as `parent` and has the
/// given local name.
#[inline]
pub(crate) fn is_schema_child(parent: &XmlElement, child: &XmlElement, local_name: &str) -> bool {
    child.local_name() == local_name && child.namespace() == parent.namespace()
}

pub(crate) fn required<'a>(
    element: &'a XmlElement,
    attribute: &'static str,
) -> Result<&'a str, SchemaError> {
    element
        .attribute(attribute)
        .ok_or_else(|| SchemaError::MissingAttribute {
            element: element.name().to_string(),
            attribute,
        })
}

#[inline]
pub(crate) fn optional(element: &XmlElement, attribute: &str) -> Option<String> {
    element.attribute(attribute).map(str::to_string)
}

/// A production extension attribute (`p:UUID`, `p:path`), matched by
/// namespace so any prefix bound to it works.
#[inline]
pub(crate) fn production(element: &XmlElement, local_name: &str) -> Option<String> {
    element.attribute_ns(PRODUCTION, local_name).map(str::to_string)
}

/// Parse an attribute value, reporting the raw text on failure.
pub(crate) fn parse_value<T: FromStr>(
    element: &XmlElement,
    attribute: &'static str,
    value: &str,
) -> Result<T, SchemaError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(element, attribute, value))
}

pub(crate) fn optional_value<T: FromStr>(
    element: &XmlElement,
    attribute: &'static str,
) -> Result<Option<T>, SchemaError> {
    element
        .attribute(attribute)
        .map(|value| parse_value(element, attribute, value))
        .transpose()
}

/// Mesh vertex coordinate.
pub(crate) fn parse_coordinate(
    element: &XmlElement,
    attribute: &'static str,
) -> Result<f64, SchemaError> {
    let value = required(element, attribute)?;
    fast_float2::parse(value.trim()).map_err(|_| invalid(element, attribute, value))
}

/// Mesh triangle vertex index.
pub(crate) fn parse_index(
    element: &XmlElement,
    attribute: &'static str,
) -> Result<u32, SchemaError> {
    let value = required(element, attribute)?;
    atoi_simd::parse(value.trim().as_bytes()).map_err(|_| invalid(element, attribute, value))
}

fn invalid(element: &XmlElement, attribute: &'static str, value: &str) -> SchemaError {
    SchemaError::InvalidAttribute {
        element: element.name().to_string(),
        attribute,
        value: value.to_string(),
    }
}

/// 3MF booleans are written as `0`/`1`, some producers use `true`/`false`.
pub(crate) fn optional_bool(
    element: &XmlElement,
    attribute: &'static str,
) -> Result<Option<bool>, SchemaError> {
    match element.attribute(attribute) {
        None => Ok(None),
        Some("1") | Some("true") => Ok(Some(true)),
        Some("0") | Some("false") => Ok(Some(false)),
        Some(other) => Err(invalid(element, attribute, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::{ParseOptions, parse};

    #[test]
    fn test_tracker_ignores_known_and_xml_attributes() {
        let root = parse(br#"<model unit="mm" xml:lang="en" extra="1"/>"#, ParseOptions::default())
            .unwrap();
        let mut tracker = UnusedTracker::default();
        tracker.attributes(&root, &["unit"]);

        let options = XmlParserOptions {
            assert_unused_attributes: true,
            ..XmlParserOptions::default()
        };
        let err = tracker.finish(&options).unwrap_err();
        assert_eq!(err, SchemaError::Unused(vec!["<model> @extra".to_string()]));
    }

    #[test]
    fn test_tracker_only_fails_when_asserting() {
        let root = parse(br#"<model><junk/></model>"#, ParseOptions::default()).unwrap();
        let junk = root.elements().next().unwrap();

        let mut tracker = UnusedTracker::default();
        tracker.element(&root, junk);
        let options = XmlParserOptions {
            print_unused_elements: true,
            assert_unused_attributes: true,
            ..XmlParserOptions::default()
        };
        assert!(tracker.finish(&options).is_ok());

        let mut tracker = UnusedTracker::default();
        tracker.element(&root, junk);
        let options = XmlParserOptions {
            assert_unused_elements: true,
            ..XmlParserOptions::default()
        };
        assert!(matches!(tracker.finish(&options), Err(SchemaError::Unused(v)) if v.len() == 1));
    }

    #[test]
    fn test_optional_bool() {
        let root = parse(br#"<item a="1" b="false" c="yes"/>"#, ParseOptions::default()).unwrap();
        assert_eq!(optional_bool(&root, "a").unwrap(), Some(true));
        assert_eq!(optional_bool(&root, "b").unwrap(), Some(false));
        assert_eq!(optional_bool(&root, "missing").unwrap(), None);
        assert!(optional_bool(&root, "c").is_err());
    }
}
