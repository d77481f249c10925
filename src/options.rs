//! Load options threaded through every document load and insertion.

use crate::project::error::{ProjectError, Result};
use crate::xml::ParseOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options for loading a slicer project.
///
/// Every flag defaults to `false`. The command-line editor applies its own
/// defaults on top of these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Log unknown attributes and elements.
    pub print_xml_unused: bool,
    /// Fail on unknown attributes and elements.
    pub assert_xml_unused: bool,
    /// Recover from malformed XML.
    pub recover_xml_errors: bool,
    /// Recover from undeclared XML namespace prefixes.
    pub recover_undeclared_namespace: bool,
}

/// Options handed to the schema engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XmlParserOptions {
    pub assert_unused_elements: bool,
    pub assert_unused_attributes: bool,
    pub print_unused_elements: bool,
    pub print_unused_attributes: bool,
    pub recover_undeclared_namespace: bool,
}

impl Options {
    /// Schema engine options derived from these flags.
    pub fn xml_parser_options(&self) -> XmlParserOptions {
        XmlParserOptions {
            assert_unused_elements: self.assert_xml_unused,
            assert_unused_attributes: self.assert_xml_unused,
            print_unused_elements: self.print_xml_unused,
            print_unused_attributes: self.print_xml_unused,
            recover_undeclared_namespace: self.recover_undeclared_namespace,
        }
    }

    /// Recovery policy for the XML engine.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            recover: self.recover_xml_errors,
            recover_undeclared_namespace: self.recover_undeclared_namespace,
        }
    }

    /// Read options from a YAML document. Missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_saphyr::from_str(yaml).map_err(|e| ProjectError::InvalidOptions(e.to_string()))
    }

    /// Read options from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Render options as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_saphyr::to_string(self).map_err(|e| ProjectError::InvalidOptions(e.to_string()))
    }
}
