/// Error types for slicer project operations
use crate::schema::SchemaError;
use crate::xml::XmlError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("Malformed XML in {path}: {source}")]
    MalformedXml {
        path: String,
        #[source]
        source: XmlError,
    },

    #[error("Schema error in {path}: {source}")]
    Schema {
        path: String,
        #[source]
        source: SchemaError,
    },

    #[error("No default XML namespace in {path}")]
    Namespace { path: String },

    #[error("Duplicate archive path: {0}")]
    DuplicatePath(String),

    #[error("Object id {id:?} in {attempted} is already declared by {existing}")]
    DuplicateObjectId {
        id: String,
        existing: String,
        attempted: String,
    },

    #[error("Project already has a config document ({existing}), cannot add {attempted}")]
    DuplicateConfig { existing: String, attempted: String },

    #[error("Invalid template source: {0}")]
    InvalidSource(String),

    #[error("Invalid output destination: {0}")]
    InvalidDestination(String),

    #[error("No document at archive path: {0}")]
    UnknownPath(String),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("ZIP error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProjectError {
    /// Archive path the error is about, when there is one.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::MalformedXml { path, .. }
            | Self::Schema { path, .. }
            | Self::Namespace { path } => Some(path),
            Self::DuplicatePath(path) | Self::UnknownPath(path) => Some(path),
            Self::DuplicateObjectId { attempted, .. } | Self::DuplicateConfig { attempted, .. } => {
                Some(attempted)
            },
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProjectError>;
