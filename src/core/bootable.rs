//! Boot and recovery images
//!
//! These are copied verbatim from the target files. A prebuilt image is
//! looked up in the shared image directories first and then inside the
//! partition's own subtree.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::defaults::{entries, PREBUILT_IMAGE_DIRS};
use crate::error::{BootableImageError, PackError};
use crate::infra::archive::OutputArchive;

/// A bootable image carried through unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootableImage {
    /// boot.img, always required
    Boot,
    /// recovery.img, required when the target files have a RECOVERY subtree
    Recovery,
}

impl BootableImage {
    /// Archive entry and file name
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Boot => entries::BOOT,
            Self::Recovery => entries::RECOVERY,
        }
    }

    /// Extracted subtree the image belongs to
    pub fn subtree(self) -> &'static str {
        match self {
            Self::Boot => "BOOT",
            Self::Recovery => "RECOVERY",
        }
    }

    /// Candidate locations relative to the staging root, in lookup order
    pub fn candidates(self) -> Vec<PathBuf> {
        PREBUILT_IMAGE_DIRS
            .iter()
            .chain(std::iter::once(&self.subtree()))
            .map(|dir| Path::new(dir).join(self.file_name()))
            .collect()
    }

    /// Whether a missing image aborts the run
    pub fn is_required(self, root: &Path) -> bool {
        match self {
            Self::Boot => true,
            Self::Recovery => root.join(self.subtree()).is_dir(),
        }
    }
}

impl fmt::Display for BootableImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

/// Find the prebuilt `image` under `root`
pub fn find_prebuilt(root: &Path, image: BootableImage) -> Result<PathBuf, BootableImageError> {
    let candidates = image.candidates();
    candidates
        .iter()
        .map(|relative| root.join(relative))
        .find(|path| path.is_file())
        .ok_or_else(|| BootableImageError::Missing {
            name: image.file_name().to_string(),
            searched: candidates
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
        })
}

/// Copy boot.img and recovery.img into `archive`
///
/// Returns the entries written.
pub fn add_bootable_images(
    root: &Path,
    archive: &mut OutputArchive,
) -> Result<Vec<String>, PackError> {
    let mut written = Vec::new();

    for image in [BootableImage::Boot, BootableImage::Recovery] {
        match find_prebuilt(root, image) {
            Ok(path) => {
                tracing::info!("Adding {} from {}", image, path.display());
                archive.write_file(image.file_name(), &path)?;
                written.push(image.file_name().to_string());
            }
            Err(e) if image.is_required(root) => return Err(e.into()),
            Err(_) => tracing::info!("No {} subtree, skipping {}", image.subtree(), image),
        }
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_prebuilt_dirs_take_precedence() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "BOOT/boot.img", "subtree");
        touch(temp.path(), "IMAGES/boot.img", "images");

        let path = find_prebuilt(temp.path(), BootableImage::Boot).unwrap();
        assert_eq!(path, temp.path().join("IMAGES/boot.img"));
    }

    #[test]
    fn test_missing_boot_lists_search_paths() {
        let temp = TempDir::new().unwrap();
        let err = find_prebuilt(temp.path(), BootableImage::Boot).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("BOOTABLE_IMAGES/boot.img"));
        assert!(message.contains("BOOT/boot.img"));
    }

    #[test]
    fn test_missing_boot_is_fatal() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "RECOVERY/recovery.img", "r");
        let mut archive = OutputArchive::create(&temp.path().join("out.zip")).unwrap();
        assert!(add_bootable_images(temp.path(), &mut archive).is_err());
    }

    #[test]
    fn test_recovery_optional_without_subtree() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "BOOT/boot.img", "b");
        let mut archive = OutputArchive::create(&temp.path().join("out.zip")).unwrap();
        let written = add_bootable_images(temp.path(), &mut archive).unwrap();
        assert_eq!(written, vec!["boot.img".to_string()]);
    }

    #[test]
    fn test_recovery_required_with_subtree() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "BOOT/boot.img", "b");
        std::fs::create_dir_all(temp.path().join("RECOVERY/RAMDISK")).unwrap();
        let mut archive = OutputArchive::create(&temp.path().join("out.zip")).unwrap();
        let err = add_bootable_images(temp.path(), &mut archive).unwrap_err();
        assert!(matches!(err, PackError::Bootable(_)));
    }

    #[test]
    fn test_both_images_written_in_order() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "BOOT/boot.img", "b");
        touch(temp.path(), "RECOVERY/recovery.img", "r");
        let mut archive = OutputArchive::create(&temp.path().join("out.zip")).unwrap();
        let written = add_bootable_images(temp.path(), &mut archive).unwrap();
        assert_eq!(
            written,
            vec!["boot.img".to_string(), "recovery.img".to_string()]
        );
    }
}
