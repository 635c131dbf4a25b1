//! Filesystem operations
//!
//! Handles file and directory operations.

use std::io;
use std::path::{Path, PathBuf};

use crate::error::FilesystemError;

/// Create a directory and all parent directories
pub fn create_dir_all(path: &Path) -> Result<(), FilesystemError> {
    std::fs::create_dir_all(path).map_err(|e| FilesystemError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Read content from a file
pub fn read_file(path: &Path) -> Result<String, FilesystemError> {
    std::fs::read_to_string(path).map_err(|e| FilesystemError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Read a file if it exists, `None` when it does not
pub fn read_optional(path: &Path) -> Result<Option<String>, FilesystemError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(FilesystemError::ReadFile {
            path: path.to_path_buf(),
            error: e.to_string(),
        }),
    }
}

/// Link `link` to the directory `target`
///
/// An existing `link` is accepted as-is, so repeated calls succeed.
pub fn link_dir(target: &Path, link: &Path) -> Result<PathBuf, FilesystemError> {
    match symlink(target, link) {
        Ok(()) => Ok(link.to_path_buf()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(link.to_path_buf()),
        Err(e) => Err(FilesystemError::Symlink {
            target: target.to_path_buf(),
            link: link.to_path_buf(),
            error: e.to_string(),
        }),
    }
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_optional_missing_file() {
        let temp = TempDir::new().unwrap();
        let content = read_optional(&temp.path().join("absent.txt")).unwrap();
        assert!(content.is_none());
    }

    #[test]
    fn test_read_file_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent.txt");
        let err = read_file(&path).unwrap_err();
        assert!(err.to_string().contains("absent.txt"));
    }

    #[test]
    fn test_create_dir_all_nested() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a/b/c");
        create_dir_all(&path).unwrap();
        assert!(path.is_dir());
    }

    #[test]
    fn test_link_dir_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("SYSTEM");
        create_dir_all(&target).unwrap();
        std::fs::write(target.join("build.prop"), "x").unwrap();

        let link = temp.path().join("system");
        link_dir(&target, &link).unwrap();
        link_dir(&target, &link).unwrap();

        assert!(link.join("build.prop").exists());
    }
}
