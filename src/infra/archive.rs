//! Zip archive I/O
//!
//! Unpacks the input target-files archive and writes the append-only
//! output image archive.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::error::ArchiveError;

/// Entries at or above this size need zip64 records
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

/// Buffer size used when streaming entries into the archive
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// File type bits of a unix mode
const S_IFMT: u32 = 0o170_000;

/// File type bits of a symbolic link
const S_IFLNK: u32 = 0o120_000;

/// Extract a zip archive into `dest`
///
/// Entries are extracted one by one so that symlink entries come out as
/// symlinks. Entry names that would escape `dest` are rejected.
pub fn unpack(archive: &Path, dest: &Path) -> Result<(), ArchiveError> {
    let file = File::open(archive).map_err(|e| ArchiveError::Open {
        path: archive.to_path_buf(),
        error: e.to_string(),
    })?;

    let mut zip = ZipArchive::new(file).map_err(|e| ArchiveError::Open {
        path: archive.to_path_buf(),
        error: e.to_string(),
    })?;

    tracing::debug!(
        "Extracting {} entries from {} into {}",
        zip.len(),
        archive.display(),
        dest.display()
    );

    let extract_err = |error: String| ArchiveError::Extract {
        path: archive.to_path_buf(),
        dest: dest.to_path_buf(),
        error,
    };

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|e| extract_err(e.to_string()))?;
        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            return Err(extract_err(format!("unsafe entry name '{}'", entry.name())));
        };
        let out = dest.join(relative);
        let io_err = |e: io::Error| extract_err(format!("{}: {e}", out.display()));

        if entry.is_dir() {
            std::fs::create_dir_all(&out).map_err(io_err)?;
            continue;
        }
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mode = entry.unix_mode();
        if mode.is_some_and(|m| m & S_IFMT == S_IFLNK) {
            let mut target = String::new();
            entry.read_to_string(&mut target).map_err(io_err)?;
            write_symlink(&target, &out).map_err(io_err)?;
            continue;
        }

        let mut file = File::create(&out).map_err(io_err)?;
        io::copy(&mut entry, &mut file).map_err(io_err)?;

        #[cfg(unix)]
        if let Some(mode) = mode {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&out, std::fs::Permissions::from_mode(mode & 0o7777))
                .map_err(io_err)?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn write_symlink(target: &str, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

// No portable file symlinks here; keep the link target as file content.
#[cfg(not(unix))]
fn write_symlink(target: &str, link: &Path) -> io::Result<()> {
    std::fs::write(link, target)
}

/// A written archive entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveEntry {
    /// Entry name inside the archive
    pub name: String,
    /// Uncompressed size in bytes
    pub size: u64,
    /// SHA-256 of the uncompressed content, lowercase hex
    pub sha256: String,
}

/// Append-only output archive
///
/// Entries are DEFLATE-compressed and stamped with a fixed modification
/// time. The archive is staged in a temporary file next to the
/// destination and only appears at the destination after [`finish`].
///
/// [`finish`]: OutputArchive::finish
pub struct OutputArchive {
    destination: PathBuf,
    writer: ZipWriter<NamedTempFile>,
    names: HashSet<String>,
    entries: Vec<ArchiveEntry>,
}

impl OutputArchive {
    /// Start a new archive that will be written to `destination`
    pub fn create(destination: &Path) -> Result<Self, ArchiveError> {
        let parent = match destination.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let staged = NamedTempFile::new_in(&parent).map_err(|e| ArchiveError::Create {
            path: destination.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(Self {
            destination: destination.to_path_buf(),
            writer: ZipWriter::new(staged),
            names: HashSet::new(),
            entries: Vec::new(),
        })
    }

    /// Whether an entry with this name was already written
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Entries written so far, in write order
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Write an in-memory entry
    pub fn write_bytes(&mut self, name: &str, data: &[u8]) -> Result<(), ArchiveError> {
        self.write_entry(name, data, data.len() as u64, None)
    }

    /// Write an in-memory entry with unix permission bits
    pub fn write_bytes_with_mode(
        &mut self,
        name: &str,
        data: &[u8],
        mode: u32,
    ) -> Result<(), ArchiveError> {
        self.write_entry(name, data, data.len() as u64, Some(mode))
    }

    /// Stream a file from disk into the archive
    pub fn write_file(&mut self, name: &str, source: &Path) -> Result<(), ArchiveError> {
        let map_err = |e: io::Error| ArchiveError::WriteEntry {
            name: name.to_string(),
            error: format!("{}: {e}", source.display()),
        };

        let file = File::open(source).map_err(map_err)?;
        let size = file.metadata().map_err(map_err)?.len();
        self.write_entry(name, file, size, None)
    }

    fn write_entry<R: Read>(
        &mut self,
        name: &str,
        mut reader: R,
        size_hint: u64,
        mode: Option<u32>,
    ) -> Result<(), ArchiveError> {
        if self.names.contains(name) {
            return Err(ArchiveError::DuplicateEntry {
                name: name.to_string(),
            });
        }

        let mut options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default())
            .large_file(size_hint >= ZIP64_THRESHOLD);
        if let Some(mode) = mode {
            options = options.unix_permissions(mode);
        }

        let write_err = |e: String| ArchiveError::WriteEntry {
            name: name.to_string(),
            error: e,
        };

        self.writer
            .start_file(name, options)
            .map_err(|e| write_err(e.to_string()))?;

        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
        let mut size = 0u64;
        loop {
            let n = reader
                .read(&mut buffer)
                .map_err(|e| write_err(e.to_string()))?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
            self.writer
                .write_all(&buffer[..n])
                .map_err(|e| write_err(e.to_string()))?;
            size += n as u64;
        }

        let entry = ArchiveEntry {
            name: name.to_string(),
            size,
            sha256: hex::encode(hasher.finalize()),
        };
        tracing::debug!("Wrote {} ({} bytes, sha256 {})", entry.name, entry.size, entry.sha256);

        self.names.insert(entry.name.clone());
        self.entries.push(entry);
        Ok(())
    }

    /// Finalize the archive and move it to its destination
    pub fn finish(mut self) -> Result<Vec<ArchiveEntry>, ArchiveError> {
        let finish_err = |e: String| ArchiveError::Finish {
            path: self.destination.clone(),
            error: e,
        };

        let staged = self.writer.finish().map_err(|e| finish_err(e.to_string()))?;
        staged
            .persist(&self.destination)
            .map_err(|e| finish_err(e.error.to_string()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.destination, std::fs::Permissions::from_mode(0o644))
                .map_err(|e| finish_err(e.to_string()))?;
        }

        Ok(std::mem::take(&mut self.entries))
    }
}

/// List entry names of an archive in stored order
pub fn entry_names(archive: &Path) -> Result<Vec<String>, ArchiveError> {
    let file = File::open(archive).map_err(|e| ArchiveError::Open {
        path: archive.to_path_buf(),
        error: e.to_string(),
    })?;
    let mut zip = ZipArchive::new(file).map_err(|e| ArchiveError::Open {
        path: archive.to_path_buf(),
        error: e.to_string(),
    })?;

    let mut names = Vec::with_capacity(zip.len());
    for i in 0..zip.len() {
        let entry = zip.by_index(i).map_err(|e| ArchiveError::Open {
            path: archive.to_path_buf(),
            error: e.to_string(),
        })?;
        names.push(entry.name().to_string());
    }
    Ok(names)
}
