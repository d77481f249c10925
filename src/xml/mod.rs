//! XML document engine.
//!
//! Parses `.model` and `.config` payloads into an owned [`XmlElement`] tree
//! with namespaces resolved. Recovery from malformed input is opt-in through
//! [`ParseOptions`].

pub mod element;
pub mod parser;

pub use element::{XmlAttribute, XmlElement, XmlNode};
pub use parser::parse;

use thiserror::Error;

/// Namespace permanently bound to the `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Recovery policy for a single parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Return a best-effort tree instead of failing on malformed XML.
    pub recover: bool,
    /// Treat undeclared namespace prefixes as unbound instead of failing.
    pub recover_undeclared_namespace: bool,
}

/// Errors produced while building a document tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XmlError {
    #[error("syntax error at byte {position}: {message}")]
    Syntax { position: u64, message: String },

    #[error("malformed attribute on <{element}>: {message}")]
    Attribute { element: String, message: String },

    #[error("undeclared namespace prefix `{prefix}` on <{element}>")]
    UndeclaredPrefix { prefix: String, element: String },

    #[error("end tag </{0}> does not match any open element")]
    UnmatchedEnd(String),

    #[error("element <{0}> is never closed")]
    Unclosed(String),

    #[error("more than one top-level element, found <{0}>")]
    MultipleRoots(String),

    #[error("document has no root element")]
    NoRoot,
}
