//! 3MF slicer projects.
//!
//! A project is a zip archive whose entries are sorted into three kinds by
//! [`classify`]:
//!
//! - model documents (`*.model`), parsed and indexed by the object ids they
//!   declare
//! - the config document (`Metadata/model_settings.config` or
//!   `Metadata/Slic3r_PE_model.config`), at most one per project
//! - metafiles (thumbnails, relationships, slicer settings), kept verbatim
//!
//! [`ArchiveLoader`] builds a [`ProjectContainer`] from an archive,
//! [`ArchiveWriter`] writes it back, and [`ProjectEditor`] ties the two
//! together for template-to-output edits.

pub mod classify;
pub mod constants;
pub mod container;
pub mod document;
pub mod editor;
pub mod error;
pub mod reader;
pub mod writer;

#[cfg(test)]
pub(crate) mod fixtures;

pub use classify::{EntryKind, classify};
pub use container::{Metafile, ObjectIndex, ProjectContainer};
pub use document::{ConfigDocument, ModelDocument, ObjectIds};
pub use editor::{OutputTarget, ProjectEditor, WrittenOutput};
pub use error::{ProjectError, Result};
pub use reader::{ArchiveLoader, ArchiveSource, ReadSeek};
pub use writer::ArchiveWriter;
