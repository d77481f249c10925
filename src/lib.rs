//! threemf-editor - load, edit and write 3MF slicer projects
//!
//! A 3MF project is a zip archive holding one or more XML model documents,
//! an optional slicer settings document and arbitrary other files. This
//! library loads such an archive into a [`ProjectContainer`] that enforces
//! the project's integrity rules, lets callers edit it, and writes it back
//! with every untouched entry reproduced byte for byte.
//!
//! # Features
//!
//! - **Entry classification**: model documents, the config document and
//!   verbatim metafiles
//! - **Object index**: object ids are unique across all model documents, and
//!   each id maps to the document declaring it
//! - **Typed views**: the 3MF core model and Bambu/Orca/PrusaSlicer settings
//! - **Recovery**: opt-in recovery from malformed XML and undeclared
//!   namespace prefixes
//!
//! # Example
//!
//! ```no_run
//! use threemf_editor::{ArchiveLoader, ArchiveWriter, Options};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = Options {
//!     recover_xml_errors: true,
//!     ..Options::default()
//! };
//! let container = ArchiveLoader::load("project.3mf".into(), &options)?;
//!
//! for model in container.model_documents() {
//!     println!("{}: objects {:?}", model.path(), model.object_ids());
//! }
//! if let Some(config) = container.config() {
//!     println!("settings in {}", config.path());
//! }
//!
//! ArchiveWriter::write(&container, "copy.3mf")?;
//! # Ok(())
//! # }
//! ```

pub mod options;
pub mod project;
pub mod schema;
pub mod xml;

pub use options::{Options, XmlParserOptions};
pub use project::{
    ArchiveLoader, ArchiveSource, ArchiveWriter, ConfigDocument, EntryKind, ModelDocument,
    OutputTarget, ProjectContainer, ProjectEditor, ProjectError, Result, WrittenOutput, classify,
};
