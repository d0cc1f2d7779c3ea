pub mod local;
pub mod traits;

use crate::error::{GenerationError, Result};
use std::fmt;
use std::path::{Component, Path, PathBuf};

pub use local::LocalFileStore;
pub use traits::{OutputSink, ReferenceStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Character,
    Layout,
}

impl ReferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::Character => "character",
            ReferenceKind::Layout => "layout",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Joins `identifier` onto `base` after rejecting anything that could leave it.
///
/// Only plain path segments are accepted. Nothing touches the filesystem here.
pub fn resolve_within(base: &Path, identifier: &str) -> Result<PathBuf> {
    validate_identifier(identifier)?;
    Ok(base.join(identifier))
}

/// Lexical check shared by every store: plain relative path segments only.
pub fn validate_identifier(identifier: &str) -> Result<()> {
    let reject = |reason: &str| {
        Err(GenerationError::ValidationError(format!(
            "Invalid reference identifier '{}': {}",
            identifier, reason
        )))
    };

    if identifier.trim().is_empty() {
        return reject("empty");
    }
    if identifier.contains('\0') {
        return reject("contains NUL");
    }
    if identifier.contains('\\') {
        return reject("backslash separators are not allowed");
    }

    let relative = Path::new(identifier);
    let mut depth = 0usize;
    for component in relative.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::ParentDir => return reject("parent directory segments are not allowed"),
            Component::CurDir => return reject("'.' segments are not allowed"),
            Component::RootDir | Component::Prefix(_) => {
                return reject("absolute paths are not allowed")
            }
        }
    }
    if depth == 0 {
        return reject("no file name");
    }

    Ok(())
}

pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        _ => None,
    }
}

pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n']) {
        Some("image/png")
    } else if bytes.starts_with(&[0xff, 0xd8, 0xff]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else if bytes.starts_with(b"BM") {
        Some("image/bmp")
    } else {
        None
    }
}

/// Extension from the extension table first, then the file header.
pub fn detect_mime(path: &Path, bytes: &[u8]) -> String {
    mime_for_path(path)
        .or_else(|| sniff_mime(bytes))
        .unwrap_or("application/octet-stream")
        .to_string()
}

pub fn extension_for_mime(mime: &str) -> &'static str {
    let lowered = mime.to_ascii_lowercase();
    if lowered.contains("jpeg") || lowered.contains("jpg") {
        "jpg"
    } else if lowered.contains("webp") {
        "webp"
    } else if lowered.contains("gif") {
        "gif"
    } else {
        "png"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_within_accepts_plain_names() {
        let base = Path::new("/refs");
        assert_eq!(
            resolve_within(base, "alice.png").unwrap(),
            PathBuf::from("/refs/alice.png")
        );
        assert_eq!(
            resolve_within(base, "cast/bob.jpg").unwrap(),
            PathBuf::from("/refs/cast/bob.jpg")
        );
    }

    #[test]
    fn test_resolve_within_rejects_escapes() {
        let base = Path::new("/refs");
        for bad in [
            "../secret.png",
            "cast/../../etc/passwd",
            "/etc/passwd",
            "./alice.png",
            "..\\win.png",
            "",
            "  ",
            "a\0b.png",
        ] {
            let err = resolve_within(base, bad).unwrap_err();
            assert!(
                matches!(err, GenerationError::ValidationError(_)),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_mime_detection() {
        assert_eq!(detect_mime(Path::new("a.JPG"), &[]), "image/jpeg");
        assert_eq!(
            detect_mime(Path::new("noext"), &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n']),
            "image/png"
        );
        assert_eq!(
            detect_mime(Path::new("notes.txt"), b"hello"),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_extension_for_mime() {
        assert_eq!(extension_for_mime("image/jpeg"), "jpg");
        assert_eq!(extension_for_mime("IMAGE/WEBP"), "webp");
        assert_eq!(extension_for_mime("image/png"), "png");
        assert_eq!(extension_for_mime(""), "png");
    }
}
