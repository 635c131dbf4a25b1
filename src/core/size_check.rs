//! Image size validation against the configured partition size

use super::properties::ImageProperties;
use crate::config::defaults::{
    SIZE_ERROR_PERCENT, SIZE_WARNING_PERCENT, YAFFS2_PAGE_SIZE, YAFFS2_SPARE_SIZE,
};
use crate::error::AssemblyError;

/// Result of a successful size check
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeVerdict {
    /// No partition size configured
    Unchecked,
    /// Image fits comfortably
    Fits { percent: f64 },
    /// Image fits but is close to the limit
    NearLimit { percent: f64 },
}

/// Effective byte limit for an image, if the partition has a size
///
/// yaffs2 images carry a 64 byte spare area for every 2 KiB page, so
/// their limit grows accordingly.
pub fn size_limit(properties: &ImageProperties) -> Option<u64> {
    let limit = properties.partition_size()?;
    if properties.fs_type() == Some("yaffs2") {
        Some(limit / YAFFS2_PAGE_SIZE * (YAFFS2_PAGE_SIZE + YAFFS2_SPARE_SIZE))
    } else {
        Some(limit)
    }
}

/// Check that `size` bytes of `image` fit the partition described by `properties`
#[allow(clippy::cast_precision_loss)]
pub fn check_size(
    image: &str,
    size: u64,
    properties: &ImageProperties,
) -> Result<SizeVerdict, AssemblyError> {
    let Some(limit) = size_limit(properties) else {
        return Ok(SizeVerdict::Unchecked);
    };

    let percent = size as f64 * 100.0 / limit as f64;
    if percent >= SIZE_ERROR_PERCENT {
        return Err(AssemblyError::SizeExceeded {
            image: image.to_string(),
            size,
            limit,
            percent,
        });
    }

    if percent >= SIZE_WARNING_PERCENT {
        tracing::warn!(
            "{} size ({}) is {:.2}% of limit ({})",
            image,
            size,
            percent,
            limit
        );
        Ok(SizeVerdict::NearLimit { percent })
    } else {
        tracing::debug!(
            "{} size ({}) is {:.2}% of limit ({})",
            image,
            size,
            percent,
            limit
        );
        Ok(SizeVerdict::Fits { percent })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(fs_type: &str, size: &str) -> ImageProperties {
        let mut props = ImageProperties::new("system");
        props.insert("fs_type", fs_type);
        props.insert("partition_size", size);
        props
    }

    #[test]
    fn test_no_size_is_unchecked() {
        let props = ImageProperties::new("system");
        assert_eq!(
            check_size("system.img", u64::MAX, &props).unwrap(),
            SizeVerdict::Unchecked
        );
    }

    #[test]
    fn test_small_image_fits() {
        let verdict = check_size("system.img", 500, &props("ext4", "1000")).unwrap();
        assert_eq!(verdict, SizeVerdict::Fits { percent: 50.0 });
    }

    #[test]
    fn test_near_limit_warns() {
        let verdict = check_size("system.img", 960, &props("ext4", "1000")).unwrap();
        assert!(matches!(verdict, SizeVerdict::NearLimit { .. }));
    }

    #[test]
    fn test_over_limit_fails() {
        let err = check_size("userdata.img", 990, &props("ext4", "1000")).unwrap_err();
        match err {
            AssemblyError::SizeExceeded { image, limit, .. } => {
                assert_eq!(image, "userdata.img");
                assert_eq!(limit, 1000);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_yaffs2_limit_includes_spare_area() {
        assert_eq!(size_limit(&props("yaffs2", "4096")), Some(4224));
        assert_eq!(size_limit(&props("ext4", "4096")), Some(4096));
        // 4100 bytes overflows a 4096 ext4 partition but not the yaffs2 one
        assert!(check_size("cache.img", 4100, &props("yaffs2", "4096")).is_ok());
    }
}
