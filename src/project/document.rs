//! Model and config documents of a slicer project.
//!
//! Both wrappers parse and deserialize their content once, at construction,
//! and keep the raw bytes untouched so an unmodified project is written back
//! byte for byte.

use crate::options::Options;
use crate::project::error::{ProjectError, Result};
use crate::schema::{Config, Model, SchemaError};
use crate::xml::{self, XmlElement};
use smallvec::SmallVec;

/// Object ids declared by a single model document.
pub type ObjectIds = SmallVec<[String; 4]>;

/// A `.model` document: raw XML, its tree, its typed model and the object
/// ids it declares.
#[derive(Debug, Clone)]
pub struct ModelDocument {
    path: String,
    content: Vec<u8>,
    tree: XmlElement,
    model: Model,
    object_ids: ObjectIds,
}

impl ModelDocument {
    /// Parse and deserialize a model document.
    ///
    /// # Errors
    /// - `MalformedXml` if the content cannot be parsed under the options'
    ///   recovery policy
    /// - `Schema` if the tree does not deserialize into a [`Model`], or an
    ///   `object` element has no `id`
    /// - `Namespace` if the root element has no default namespace
    pub fn load(path: impl Into<String>, content: Vec<u8>, options: &Options) -> Result<Self> {
        let path = path.into();
        let tree = parse_tree(&path, &content, options)?;
        let model = Model::deserialize(&tree, &options.xml_parser_options()).map_err(|source| {
            ProjectError::Schema {
                path: path.clone(),
                source,
            }
        })?;
        let object_ids = declared_object_ids(&path, &tree)?;

        Ok(Self {
            path,
            content,
            tree,
            model,
            object_ids,
        })
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw document bytes as read from (or last replaced in) the archive.
    #[inline]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    #[inline]
    pub fn tree(&self) -> &XmlElement {
        &self.tree
    }

    #[inline]
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Ids of every `object` element in the document's default namespace,
    /// in document order.
    #[inline]
    pub fn object_ids(&self) -> &[String] {
        &self.object_ids
    }

    pub fn into_content(self) -> Vec<u8> {
        self.content
    }
}

/// The slicer settings document (`Metadata/*.config`).
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    path: String,
    content: Vec<u8>,
    tree: XmlElement,
    config: Config,
}

impl ConfigDocument {
    /// Parse and deserialize a config document. Fails like
    /// [`ModelDocument::load`], except that no default namespace is required.
    pub fn load(path: impl Into<String>, content: Vec<u8>, options: &Options) -> Result<Self> {
        let path = path.into();
        let tree = parse_tree(&path, &content, options)?;
        let config = Config::deserialize(&tree, &options.xml_parser_options()).map_err(|source| {
            ProjectError::Schema {
                path: path.clone(),
                source,
            }
        })?;

        Ok(Self {
            path,
            content,
            tree,
            config,
        })
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    #[inline]
    pub fn tree(&self) -> &XmlElement {
        &self.tree
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Ids of the objects this config carries settings for.
    pub fn object_ids(&self) -> impl Iterator<Item = &str> {
        self.config.objects.iter().map(|object| object.id.as_str())
    }

    pub fn into_content(self) -> Vec<u8> {
        self.content
    }
}

fn parse_tree(path: &str, content: &[u8], options: &Options) -> Result<XmlElement> {
    xml::parse(content, options.parse_options()).map_err(|source| ProjectError::MalformedXml {
        path: path.to_string(),
        source,
    })
}

fn declared_object_ids(path: &str, tree: &XmlElement) -> Result<ObjectIds> {
    let namespace = tree
        .default_namespace()
        .ok_or_else(|| ProjectError::Namespace {
            path: path.to_string(),
        })?;

    tree.find_all(Some(namespace), "object")
        .map(|object| {
            object
                .attribute("id")
                .map(str::to_string)
                .ok_or_else(|| ProjectError::Schema {
                    path: path.to_string(),
                    source: SchemaError::MissingAttribute {
                        element: object.name().to_string(),
                        attribute: "id",
                    },
                })
        })
        .collect()
}
