//! Image storage behind a small trait seam.
//!
//! # Responsibility
//! - Persist uploaded image bytes under a namespaced location and return a
//!   relative reference for the database row.
//! - Remove previously stored images on replacement.
//!
//! # Invariants
//! - Stored names are `<uuid4><.ext>`; the client file name contributes only
//!   its extension.
//! - References never escape the store root.

use log::info;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

/// Namespace for track images.
pub const TRACK_IMAGE_NAMESPACE: &str = "uploads/track";

/// Storage backend for uploaded images.
pub trait ImageStore {
    /// Stores `bytes` under `namespace` and returns the relative reference.
    fn put(&self, namespace: &str, file_name: &str, bytes: &[u8]) -> io::Result<String>;

    /// Deletes the file behind `reference`. A missing file is not an error.
    fn remove(&self, reference: &str) -> io::Result<()>;
}

/// Filesystem store rooted at a media directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsImageStore {
    root: PathBuf,
}

impl FsImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Absolute location of `reference` inside the root.
    pub fn resolve(&self, reference: &str) -> io::Result<PathBuf> {
        let relative = Path::new(reference);
        let is_plain = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if reference.is_empty() || !is_plain {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("media reference escapes the store root: `{reference}`"),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl ImageStore for FsImageStore {
    fn put(&self, namespace: &str, file_name: &str, bytes: &[u8]) -> io::Result<String> {
        let reference = format!("{namespace}/{}", stored_file_name(file_name));
        let path = self.resolve(&reference)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        info!(
            "event=media_put module=media status=ok namespace={namespace} bytes={}",
            bytes.len()
        );
        Ok(reference)
    }

    fn remove(&self, reference: &str) -> io::Result<()> {
        let path = self.resolve(reference)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}

/// Random file name keeping the (lowercased) extension of `original`.
pub fn stored_file_name(original: &str) -> String {
    let extension = Path::new(original)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();
    format!("{}{extension}", Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::{stored_file_name, FsImageStore, ImageStore, TRACK_IMAGE_NAMESPACE};

    #[test]
    fn stored_name_keeps_only_extension() {
        let name = stored_file_name("../../My Photo.PNG");
        assert!(name.ends_with(".png"));
        assert_eq!(name.len(), 36 + 4);
        assert!(!name.contains('/'));

        let bare = stored_file_name("README");
        assert_eq!(bare.len(), 36);
    }

    #[test]
    fn resolve_rejects_escaping_references() {
        let store = FsImageStore::new("/tmp/media");
        assert!(store.resolve("../etc/passwd").is_err());
        assert!(store.resolve("/etc/passwd").is_err());
        assert!(store.resolve("").is_err());
        assert!(store.resolve("uploads/track/a.png").is_ok());
    }

    #[test]
    fn put_then_remove_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(dir.path());
        let reference = store.put(TRACK_IMAGE_NAMESPACE, "cover.jpg", b"jpeg").unwrap();
        assert!(reference.starts_with("uploads/track/"));

        let path = store.resolve(&reference).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"jpeg");

        store.remove(&reference).unwrap();
        assert!(!path.exists());
        store.remove(&reference).unwrap();
    }
}
