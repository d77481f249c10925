//! The in-memory slicer project.
//!
//! [`ProjectContainer`] holds every entry of a 3MF archive: metafiles verbatim,
//! model documents with their declared objects, and at most one config
//! document. Insertion enforces three invariants:
//!
//! - no two entries share an archive path
//! - no object id is declared twice across all model documents
//! - at most one config document exists
//!
//! Failed insertions leave the container exactly as it was.

use crate::options::Options;
use crate::project::document::{ConfigDocument, ModelDocument};
use crate::project::error::{ProjectError, Result};
use std::collections::{HashMap, HashSet};

/// An archive entry carried through without interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metafile {
    path: String,
    content: Vec<u8>,
}

impl Metafile {
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

/// Object id to owning model document path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectIndex {
    owners: HashMap<String, String>,
}

impl ObjectIndex {
    /// Path of the model document declaring `id`.
    #[inline]
    pub fn owner(&self, id: &str) -> Option<&str> {
        self.owners.get(id).map(String::as_str)
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.owners.contains_key(id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// `(id, owner path)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.owners
            .iter()
            .map(|(id, owner)| (id.as_str(), owner.as_str()))
    }

    /// Check that every id of `document` can be indexed. Ids currently owned
    /// by `replacing` are treated as free.
    fn check_admissible(&self, document: &ModelDocument, replacing: Option<&str>) -> Result<()> {
        let mut seen = HashSet::with_capacity(document.object_ids().len());
        for id in document.object_ids() {
            if !seen.insert(id.as_str()) {
                return Err(ProjectError::DuplicateObjectId {
                    id: id.clone(),
                    existing: document.path().to_string(),
                    attempted: document.path().to_string(),
                });
            }
            if let Some(existing) = self.owner(id)
                && Some(existing) != replacing
            {
                return Err(ProjectError::DuplicateObjectId {
                    id: id.clone(),
                    existing: existing.to_string(),
                    attempted: document.path().to_string(),
                });
            }
        }
        Ok(())
    }

    fn admit(&mut self, document: &ModelDocument) {
        for id in document.object_ids() {
            self.owners
                .insert(id.clone(), document.path().to_string());
        }
    }

    fn evict(&mut self, document: &ModelDocument) {
        for id in document.object_ids() {
            self.owners.remove(id);
        }
    }
}

/// All documents of a slicer project, with insertion order preserved.
#[derive(Debug, Clone, Default)]
pub struct ProjectContainer {
    metafiles: Vec<Metafile>,
    metafile_slots: HashMap<String, usize>,
    models: Vec<ModelDocument>,
    model_slots: HashMap<String, usize>,
    object_index: ObjectIndex,
    config: Option<ConfigDocument>,
}

impl ProjectContainer {
    /// Create an empty project.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and add a model document, indexing its objects.
    ///
    /// # Errors
    /// - `DuplicatePath` if any entry already uses `path`
    /// - the failures of [`ModelDocument::load`]
    /// - `DuplicateObjectId` if a declared id is already indexed or declared
    ///   twice in this document
    pub fn insert_model(
        &mut self,
        path: impl Into<String>,
        content: Vec<u8>,
        options: &Options,
    ) -> Result<()> {
        let path = path.into();
        self.check_path_free(&path)?;

        let document = ModelDocument::load(path, content, options)?;
        self.object_index.check_admissible(&document, None)?;

        self.object_index.admit(&document);
        self.model_slots
            .insert(document.path().to_string(), self.models.len());
        self.models.push(document);
        Ok(())
    }

    /// Parse and add the config document.
    ///
    /// # Errors
    /// - `DuplicateConfig` if the project already has one, whatever its path
    /// - `DuplicatePath` if any entry already uses `path`
    /// - the failures of [`ConfigDocument::load`]
    pub fn insert_config(
        &mut self,
        path: impl Into<String>,
        content: Vec<u8>,
        options: &Options,
    ) -> Result<()> {
        let path = path.into();
        if let Some(existing) = &self.config {
            return Err(ProjectError::DuplicateConfig {
                existing: existing.path().to_string(),
                attempted: path,
            });
        }
        self.check_path_free(&path)?;

        self.config = Some(ConfigDocument::load(path, content, options)?);
        Ok(())
    }

    /// Add an entry verbatim.
    pub fn insert_metafile(&mut self, path: impl Into<String>, content: Vec<u8>) -> Result<()> {
        let path = path.into();
        self.check_path_free(&path)?;

        self.metafile_slots.insert(path.clone(), self.metafiles.len());
        self.metafiles.push(Metafile { path, content });
        Ok(())
    }

    /// Replace the content of an existing model document, re-indexing its
    /// objects. Either the new document and all of its ids are admitted, or
    /// nothing changes.
    pub fn replace_model(&mut self, path: &str, content: Vec<u8>, options: &Options) -> Result<()> {
        let slot = *self
            .model_slots
            .get(path)
            .ok_or_else(|| ProjectError::UnknownPath(path.to_string()))?;

        let document = ModelDocument::load(path, content, options)?;
        self.object_index.check_admissible(&document, Some(path))?;

        let previous = std::mem::replace(&mut self.models[slot], document);
        self.object_index.evict(&previous);
        self.object_index.admit(&self.models[slot]);
        Ok(())
    }

    /// Replace the content of the config document.
    pub fn replace_config(&mut self, content: Vec<u8>, options: &Options) -> Result<()> {
        let path = match &self.config {
            Some(config) => config.path().to_string(),
            None => return Err(ProjectError::UnknownPath("<config>".to_string())),
        };
        self.config = Some(ConfigDocument::load(path, content, options)?);
        Ok(())
    }

    /// Replace the bytes of an existing metafile, keeping its position.
    pub fn replace_metafile(&mut self, path: &str, content: Vec<u8>) -> Result<()> {
        let slot = *self
            .metafile_slots
            .get(path)
            .ok_or_else(|| ProjectError::UnknownPath(path.to_string()))?;
        self.metafiles[slot].content = content;
        Ok(())
    }

    /// Remove a metafile, returning its bytes.
    pub fn remove_metafile(&mut self, path: &str) -> Option<Vec<u8>> {
        let slot = self.metafile_slots.remove(path)?;
        let removed = self.metafiles.remove(slot);
        for metafile in &self.metafiles[slot..] {
            if let Some(position) = self.metafile_slots.get_mut(&metafile.path) {
                *position -= 1;
            }
        }
        Some(removed.content)
    }

    /// Whether any entry (model, config or metafile) uses `path`.
    pub fn contains_path(&self, path: &str) -> bool {
        self.model_slots.contains_key(path)
            || self.metafile_slots.contains_key(path)
            || self.config.as_ref().is_some_and(|c| c.path() == path)
    }

    /// Metafiles in insertion order.
    #[inline]
    pub fn metafiles(&self) -> &[Metafile] {
        &self.metafiles
    }

    pub fn metafile(&self, path: &str) -> Option<&[u8]> {
        self.metafile_slots
            .get(path)
            .map(|&slot| self.metafiles[slot].content())
    }

    /// Model documents in insertion order.
    #[inline]
    pub fn model_documents(&self) -> &[ModelDocument] {
        &self.models
    }

    pub fn model(&self, path: &str) -> Option<&ModelDocument> {
        self.model_slots.get(path).map(|&slot| &self.models[slot])
    }

    #[inline]
    pub fn config(&self) -> Option<&ConfigDocument> {
        self.config.as_ref()
    }

    #[inline]
    pub fn object_index(&self) -> &ObjectIndex {
        &self.object_index
    }

    /// The model document declaring object `id`.
    pub fn owner_of(&self, id: &str) -> Option<&ModelDocument> {
        self.object_index
            .owner(id)
            .and_then(|path| self.model(path))
    }

    /// Config object ids that no model document declares.
    pub fn orphaned_config_objects(&self) -> Vec<&str> {
        self.config
            .iter()
            .flat_map(|config| config.object_ids())
            .filter(|id| !self.object_index.contains(id))
            .collect()
    }

    /// Total number of archive entries.
    pub fn entry_count(&self) -> usize {
        self.metafiles.len() + self.models.len() + usize::from(self.config.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }

    fn check_path_free(&self, path: &str) -> Result<()> {
        if self.contains_path(path) {
            return Err(ProjectError::DuplicatePath(path.to_string()));
        }
        Ok(())
    }
}
