//! Serializing a slicer project back into a zip archive.

use crate::project::container::ProjectContainer;
use crate::project::error::Result;
use std::io::{Cursor, Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Writes a [`ProjectContainer`] as a zip archive.
///
/// Entries are written in a fixed order: metafiles, then model documents,
/// then the config document. Model and config documents are written from
/// their current raw bytes, so an unmodified project round-trips entry for
/// entry.
pub struct ArchiveWriter;

impl ArchiveWriter {
    /// Write a project to a file.
    ///
    /// The archive is assembled in memory first; the file is only created
    /// once every entry has been written.
    pub fn write<P: AsRef<Path>>(container: &ProjectContainer, path: P) -> Result<()> {
        let bytes = Self::to_bytes(container)?;
        std::fs::write(path.as_ref(), bytes)?;
        log::info!("Wrote project to {}", path.as_ref().display());
        Ok(())
    }

    /// Write a project into a seekable stream.
    pub fn write_to_stream<W: Write + Seek>(container: &ProjectContainer, writer: W) -> Result<W> {
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for metafile in container.metafiles() {
            write_entry(&mut zip, metafile.path(), metafile.content(), options)?;
        }
        for model in container.model_documents() {
            write_entry(&mut zip, model.path(), model.content(), options)?;
        }
        if let Some(config) = container.config() {
            write_entry(&mut zip, config.path(), config.content(), options)?;
        }

        Ok(zip.finish()?)
    }

    /// Serialize a project to bytes.
    pub fn to_bytes(container: &ProjectContainer) -> Result<Vec<u8>> {
        let cursor = Self::write_to_stream(container, Cursor::new(Vec::new()))?;
        Ok(cursor.into_inner())
    }
}

fn write_entry<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    path: &str,
    content: &[u8],
    options: SimpleFileOptions,
) -> Result<()> {
    if path.ends_with('/') && content.is_empty() {
        log::trace!("{path}: directory");
        zip.add_directory(path, options)?;
    } else {
        log::trace!("{path}: {} bytes", content.len());
        zip.start_file(path, options)?;
        zip.write_all(content)?;
    }
    Ok(())
}
