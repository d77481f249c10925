//! Template-to-output editing of a slicer project.
//!
//! A [`ProjectEditor`] loads a template project, hands out its container for
//! edits, and writes the result to the configured output.
//!
//! ```no_run
//! use threemf_editor::{Options, ProjectEditor};
//!
//! let mut editor = ProjectEditor::new("template.3mf", "out/", Options::default())?;
//! editor
//!     .container_mut()
//!     .replace_metafile("Metadata/plate_1.png", std::fs::read("thumbnail.png")?)?;
//! editor.write()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::options::Options;
use crate::project::container::ProjectContainer;
use crate::project::error::{ProjectError, Result};
use crate::project::reader::{ArchiveLoader, ArchiveSource, check_source_path};
use crate::project::writer::ArchiveWriter;
use std::path::{Path, PathBuf};

/// Where an edited project is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Path(PathBuf),
    Memory,
}

impl From<PathBuf> for OutputTarget {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for OutputTarget {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<&str> for OutputTarget {
    fn from(path: &str) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

/// What a write produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WrittenOutput {
    File(PathBuf),
    Memory(Vec<u8>),
}

#[derive(Debug)]
pub struct ProjectEditor {
    container: ProjectContainer,
    output: OutputTarget,
    options: Options,
}

impl ProjectEditor {
    /// Load `template` and bind the editor to `output`.
    ///
    /// A directory output receives the template's file name, which requires a
    /// path template.
    ///
    /// # Errors
    /// - `InvalidSource` for an empty or directory template path
    /// - `InvalidDestination` for an empty output path, or a directory output
    ///   with no template file name to place in it
    /// - any failure of [`ArchiveLoader::load`]
    pub fn new(
        template: impl Into<ArchiveSource>,
        output: impl Into<OutputTarget>,
        options: Options,
    ) -> Result<Self> {
        let template = template.into();
        if let Some(path) = template.path() {
            check_source_path(path)?;
        }
        let output = resolve_output(output.into(), template.path())?;
        let container = ArchiveLoader::load(template, &options)?;

        Ok(Self {
            container,
            output,
            options,
        })
    }

    #[inline]
    pub fn container(&self) -> &ProjectContainer {
        &self.container
    }

    #[inline]
    pub fn container_mut(&mut self) -> &mut ProjectContainer {
        &mut self.container
    }

    #[inline]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The resolved output.
    #[inline]
    pub fn output(&self) -> &OutputTarget {
        &self.output
    }

    pub fn into_container(self) -> ProjectContainer {
        self.container
    }

    /// Write the project to the configured output.
    pub fn write(&self) -> Result<WrittenOutput> {
        self.write_to(&self.output)
    }

    /// Write the project to `target`. Directory targets are not resolved
    /// here; pass a file path.
    pub fn write_to(&self, target: &OutputTarget) -> Result<WrittenOutput> {
        match target {
            OutputTarget::Path(path) => {
                if path.as_os_str().is_empty() || path.is_dir() {
                    return Err(ProjectError::InvalidDestination(path.display().to_string()));
                }
                ArchiveWriter::write(&self.container, path)?;
                Ok(WrittenOutput::File(path.clone()))
            },
            OutputTarget::Memory => Ok(WrittenOutput::Memory(ArchiveWriter::to_bytes(
                &self.container,
            )?)),
        }
    }
}

fn resolve_output(output: OutputTarget, template: Option<&Path>) -> Result<OutputTarget> {
    let path = match output {
        OutputTarget::Path(path) => path,
        OutputTarget::Memory => return Ok(OutputTarget::Memory),
    };
    if path.as_os_str().is_empty() {
        return Err(ProjectError::InvalidDestination("empty path".to_string()));
    }
    if !path.is_dir() {
        return Ok(OutputTarget::Path(path));
    }

    let file_name = template
        .and_then(Path::file_name)
        .ok_or_else(|| {
            ProjectError::InvalidDestination(format!(
                "{} is a directory and the template has no file name",
                path.display()
            ))
        })?;
    let resolved = path.join(file_name);
    log::debug!("Resolved output directory to {}", resolved.display());
    Ok(OutputTarget::Path(resolved))
}
