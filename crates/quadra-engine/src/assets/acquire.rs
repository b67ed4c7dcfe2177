use std::path::Path;

use super::{ImageError, ImageHandle};

/// MIME types accepted for textures.
pub const ACCEPTED_MIME_TYPES: [&str; 3] = ["image/jpg", "image/jpeg", "image/png"];

/// Largest accepted image file, in bytes (50 MiB).
pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Result of a successful acquisition.
#[derive(Debug, Clone)]
pub struct AcquiredImage {
    /// Decoded pixels, ready for `Node::set_texture`.
    pub image: ImageHandle,
    /// File name without its extension.
    pub name: String,
    /// File size in bytes.
    pub size: u64,
}

/// Validates a file's declared type and size.
pub fn check_file(name: &str, mime: &str, size: u64) -> Result<(), ImageError> {
    if !ACCEPTED_MIME_TYPES.contains(&mime) {
        return Err(ImageError::UnsupportedType {
            name: name.to_string(),
            mime: mime.to_string(),
        });
    }

    if size > MAX_FILE_SIZE {
        return Err(ImageError::TooLarge {
            name: name.to_string(),
            size,
            limit: MAX_FILE_SIZE,
        });
    }

    Ok(())
}

/// Infers a MIME type from the file extension.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    image::ImageFormat::from_path(path)
        .ok()
        .map(|format| format.to_mime_type())
}

/// Strips the last extension: `"photo.final.png"` → `"photo.final"`.
pub fn name_without_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() && !ext.contains('/') => stem,
        _ => name,
    }
}

/// Validates, reads and decodes an image file.
pub fn acquire(path: &Path) -> Result<AcquiredImage, ImageError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mime = mime_for_path(path).unwrap_or("application/octet-stream");

    let io_err = |source| ImageError::Io {
        name: file_name.clone(),
        source,
    };

    let size = std::fs::metadata(path).map_err(io_err)?.len();
    check_file(&file_name, mime, size)?;

    let bytes = std::fs::read(path).map_err(io_err)?;

    // `check_file` accepted the MIME type, so the extension maps to a known format.
    let decoded = match image::ImageFormat::from_path(path) {
        Ok(format) => image::load_from_memory_with_format(&bytes, format),
        Err(_) => image::load_from_memory(&bytes),
    }
    .map_err(|source| ImageError::Decode {
        name: file_name.clone(),
        source,
    })?;

    let name = name_without_extension(&file_name).to_string();
    log::debug!(
        "acquired image {file_name}: {}x{} ({size} bytes)",
        decoded.width(),
        decoded.height()
    );

    Ok(AcquiredImage {
        image: ImageHandle::new(name.as_str(), decoded.to_rgba8()),
        name,
        size,
    })
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    // ── check_file ────────────────────────────────────────────────────────

    #[test]
    fn accepts_allowed_types() {
        for mime in ACCEPTED_MIME_TYPES {
            assert!(check_file("a", mime, 10).is_ok(), "{mime}");
        }
    }

    #[test]
    fn rejects_other_types() {
        let err = check_file("anim.gif", "image/gif", 10).unwrap_err();
        assert!(matches!(err, ImageError::UnsupportedType { .. }));
        assert!(err.to_string().contains("anim.gif"));
    }

    #[test]
    fn size_limit_is_inclusive() {
        assert!(check_file("a.png", "image/png", MAX_FILE_SIZE).is_ok());
        let err = check_file("a.png", "image/png", MAX_FILE_SIZE + 1).unwrap_err();
        assert!(matches!(err, ImageError::TooLarge { .. }));
        assert!(err.to_string().contains("too large"));
    }

    // ── names ─────────────────────────────────────────────────────────────

    #[test]
    fn strips_last_extension_only() {
        assert_eq!(name_without_extension("photo.png"), "photo");
        assert_eq!(name_without_extension("photo.final.jpeg"), "photo.final");
        assert_eq!(name_without_extension("noext"), "noext");
        assert_eq!(name_without_extension("dir.v1/file"), "dir.v1/file");
    }

    #[test]
    fn mime_from_extension() {
        assert_eq!(mime_for_path(Path::new("a.png")), Some("image/png"));
        assert_eq!(mime_for_path(Path::new("a.JPG")), Some("image/jpeg"));
        assert_eq!(mime_for_path(Path::new("a")), None);
    }

    // ── acquire ───────────────────────────────────────────────────────────

    #[test]
    fn acquires_png() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sleeve.png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let acquired = acquire(&path).unwrap();
        assert_eq!(acquired.name, "sleeve");
        assert_eq!((acquired.image.width(), acquired.image.height()), (3, 2));
        assert_eq!(&acquired.image.rgba()[..4], &[10, 20, 30, 255]);
        assert!(acquired.size > 0);
    }

    #[test]
    fn rejects_disallowed_extension_before_reading() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("anim.gif");
        std::fs::write(&path, b"GIF89a").unwrap();

        assert!(matches!(
            acquire(&path),
            Err(ImageError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn rejects_oversized_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("huge.png");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(MAX_FILE_SIZE + 1).unwrap();

        assert!(matches!(acquire(&path), Err(ImageError::TooLarge { .. })));
    }

    #[test]
    fn reports_decode_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        assert!(matches!(acquire(&path), Err(ImageError::Decode { .. })));
    }

    #[test]
    fn reports_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.png");
        assert!(matches!(acquire(&path), Err(ImageError::Io { .. })));
    }

    #[test]
    fn oversized_file_is_removed_with_its_directory() {
        let dir = tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let path = root.join("huge.png");
        std::fs::File::create(&path)
            .unwrap()
            .set_len(MAX_FILE_SIZE + 1)
            .unwrap();
        assert!(matches!(acquire(&path), Err(ImageError::TooLarge { .. })));

        dir.close().unwrap();
        assert!(!path.exists());
        assert!(!root.exists());
    }
}
