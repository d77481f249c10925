//! Archive entry classification.

use crate::project::constants::{CONFIG_PATHS, MODEL_EXTENSION};

/// What an archive entry is treated as when loading a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// An XML model document (`*.model`).
    ModelDocument,
    /// The slicer settings document.
    ConfigDocument,
    /// Anything else, carried through verbatim.
    Metafile,
}

/// Classify an archive entry by name. Matching is exact and case-sensitive.
pub fn classify(path: &str) -> EntryKind {
    if extension(path) == Some(MODEL_EXTENSION) {
        EntryKind::ModelDocument
    } else if CONFIG_PATHS.contains(path) {
        EntryKind::ConfigDocument
    } else {
        EntryKind::Metafile
    }
}

/// Extension of the last path component, including the dot.
///
/// Leading dots of the file name do not start an extension, so `.model`
/// on its own has none.
pub fn extension(path: &str) -> Option<&str> {
    let bytes = path.as_bytes();
    let name_start = memchr::memrchr(b'/', bytes).map_or(0, |slash| slash + 1);
    let name = &bytes[name_start..];
    let stem_start = name.iter().position(|&b| b != b'.')?;
    let dot = memchr::memrchr(b'.', &name[stem_start..])?;
    Some(&path[name_start + stem_start + dot..])
}
