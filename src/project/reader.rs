//! Loading a slicer project from a zip archive.

use crate::options::Options;
use crate::project::classify::{EntryKind, classify};
use crate::project::container::ProjectContainer;
use crate::project::error::{ProjectError, Result};
use memchr::memmem;
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Upper bound on the buffer reserved from an entry's declared size.
const MAX_PREALLOCATION: u64 = 16 * 1024 * 1024;

const EOCD_SIGNATURE: &[u8] = b"PK\x05\x06";
const EOCD_LEN: usize = 22;
const ZIP64_LOCATOR_SIGNATURE: &[u8] = b"PK\x06\x07";
const ZIP64_LOCATOR_LEN: usize = 20;
const ZIP64_EOCD_SIGNATURE: &[u8] = b"PK\x06\x06";
const ZIP64_EOCD_LEN: usize = 56;
const CENTRAL_HEADER_SIGNATURE: &[u8] = b"PK\x01\x02";
const CENTRAL_HEADER_LEN: usize = 46;

/// A seekable byte stream.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// Where a project archive is read from.
pub enum ArchiveSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
    Stream(Box<dyn ReadSeek>),
}

impl ArchiveSource {
    /// Wrap any seekable stream.
    pub fn stream<R: Read + Seek + 'static>(reader: R) -> Self {
        Self::Stream(Box::new(reader))
    }

    /// The file path, for path sources.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            _ => None,
        }
    }
}

impl fmt::Debug for ArchiveSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            Self::Stream(_) => f.write_str("Stream"),
        }
    }
}

impl From<PathBuf> for ArchiveSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for ArchiveSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<&str> for ArchiveSource {
    fn from(path: &str) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

impl From<Vec<u8>> for ArchiveSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

/// Reads zip archives into a [`ProjectContainer`].
pub struct ArchiveLoader;

impl ArchiveLoader {
    /// Load a project from any source.
    ///
    /// # Errors
    /// - `InvalidSource` for an empty path or a path naming a directory
    /// - `Io`/`Archive` if the archive cannot be opened or an entry cannot
    ///   be read
    /// - the first failure of the container's `insert_*` operations
    pub fn load(source: ArchiveSource, options: &Options) -> Result<ProjectContainer> {
        match source {
            ArchiveSource::Path(path) => {
                check_source_path(&path)?;
                log::debug!("Loading project from {}", path.display());
                let file = File::open(&path)?;
                Self::from_reader(BufReader::new(file), options)
            },
            ArchiveSource::Bytes(bytes) => Self::from_reader(Cursor::new(bytes), options),
            ArchiveSource::Stream(stream) => Self::from_reader(stream, options),
        }
    }

    /// Load a project from a seekable zip stream.
    ///
    /// Entries are processed in central directory order. The first entry that
    /// fails to load aborts the whole load. An entry name listed twice in the
    /// central directory is a `DuplicatePath` error.
    pub fn from_reader<R: Read + Seek>(
        mut reader: R,
        options: &Options,
    ) -> Result<ProjectContainer> {
        check_unique_names(&mut reader)?;
        let mut archive = ZipArchive::new(reader)?;
        let mut container = ProjectContainer::new();

        for index in 0..archive.len() {
            let mut file = archive.by_index(index)?;
            let path = file.name().to_string();
            let mut content = Vec::with_capacity(preallocation(file.size()));
            file.read_to_end(&mut content)?;

            let kind = classify(&path);
            log::debug!("{path}: {kind:?} ({} bytes)", content.len());

            match kind {
                EntryKind::ModelDocument => container.insert_model(path, content, options)?,
                EntryKind::ConfigDocument => container.insert_config(path, content, options)?,
                EntryKind::Metafile => container.insert_metafile(path, content)?,
            }
        }

        log::info!(
            "Loaded project: {} model document(s), {} object(s), {} metafile(s), {}",
            container.model_documents().len(),
            container.object_index().len(),
            container.metafiles().len(),
            container
                .config()
                .map_or_else(|| "no config".to_string(), |c| format!("config {}", c.path())),
        );
        Ok(container)
    }
}

/// Buffer capacity to reserve for an entry; the declared size is untrusted.
#[inline]
fn preallocation(declared: u64) -> usize {
    usize::try_from(declared.min(MAX_PREALLOCATION)).unwrap_or(0)
}

/// Fail with `DuplicatePath` if the central directory lists a name twice.
/// Leaves the reader at the start of the stream.
fn check_unique_names<R: Read + Seek>(reader: &mut R) -> Result<()> {
    let names = match central_directory_names(reader) {
        Ok(names) => names,
        Err(e) => {
            log::debug!("cannot scan central directory: {e}");
            Vec::new()
        },
    };
    reader.seek(SeekFrom::Start(0))?;

    let mut seen = HashSet::with_capacity(names.len());
    match names.iter().find(|name| !seen.insert(name.as_str())) {
        Some(name) => Err(ProjectError::DuplicatePath(name.clone())),
        None => Ok(()),
    }
}

/// Entry names in central directory order, repeats included.
///
/// A directory that cannot be located or is cut short yields the names read
/// so far; [`ZipArchive`] reports the structural error.
fn central_directory_names<R: Read + Seek>(reader: &mut R) -> io::Result<Vec<String>> {
    let len = reader.seek(SeekFrom::End(0))?;
    let tail_len = len.min((EOCD_LEN + usize::from(u16::MAX)) as u64);
    let tail_start = len - tail_len;
    let mut tail = vec![0; tail_len as usize];
    reader.seek(SeekFrom::Start(tail_start))?;
    reader.read_exact(&mut tail)?;

    let Some(eocd) = memmem::rfind(&tail, EOCD_SIGNATURE) else {
        return Ok(Vec::new());
    };
    let Some(record) = tail.get(eocd..eocd + EOCD_LEN) else {
        return Ok(Vec::new());
    };

    let mut count = u64::from(le_u16(record, 10));
    let mut size = u64::from(le_u32(record, 12));
    let mut start = (tail_start + eocd as u64).checked_sub(size);

    if count == u64::from(u16::MAX) || size == u64::from(u32::MAX) {
        let locator = eocd
            .checked_sub(ZIP64_LOCATOR_LEN)
            .and_then(|at| tail.get(at..eocd))
            .filter(|locator| locator.starts_with(ZIP64_LOCATOR_SIGNATURE));
        let Some(locator) = locator else {
            return Ok(Vec::new());
        };
        let mut record = [0; ZIP64_EOCD_LEN];
        reader.seek(SeekFrom::Start(le_u64(locator, 8)))?;
        reader.read_exact(&mut record)?;
        if !record.starts_with(ZIP64_EOCD_SIGNATURE) {
            return Ok(Vec::new());
        }
        count = le_u64(&record, 32);
        size = le_u64(&record, 40);
        start = Some(le_u64(&record, 48));
    }

    let Some(start) = start.filter(|&start| size <= len && start <= len - size) else {
        return Ok(Vec::new());
    };
    let mut directory = vec![0; size as usize];
    reader.seek(SeekFrom::Start(start))?;
    reader.read_exact(&mut directory)?;

    let mut names = Vec::new();
    let mut at = 0;
    while (names.len() as u64) < count {
        let Some(header) = directory.get(at..at + CENTRAL_HEADER_LEN) else {
            break;
        };
        if !header.starts_with(CENTRAL_HEADER_SIGNATURE) {
            break;
        }
        let name_len = usize::from(le_u16(header, 28));
        let extra_len = usize::from(le_u16(header, 30));
        let comment_len = usize::from(le_u16(header, 32));
        let name_start = at + CENTRAL_HEADER_LEN;
        let Some(name) = directory.get(name_start..name_start + name_len) else {
            break;
        };
        names.push(String::from_utf8_lossy(name).into_owned());
        at = name_start + name_len + extra_len + comment_len;
    }
    Ok(names)
}

#[inline]
fn le_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

#[inline]
fn le_u32(bytes: &[u8], at: usize) -> u32 {
    let mut raw = [0; 4];
    raw.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(raw)
}

#[inline]
fn le_u64(bytes: &[u8], at: usize) -> u64 {
    let mut raw = [0; 8];
    raw.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(raw)
}

/// Reject paths that cannot name an archive file.
pub(crate) fn check_source_path(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(ProjectError::InvalidSource("empty path".to_string()));
    }
    if path.is_dir() {
        return Err(ProjectError::InvalidSource(format!(
            "{} is a directory",
            path.display()
        )));
    }
    Ok(())
}
