//! Artifact stores
//!
//! Generation reads and writes artifacts only through [`ArtifactStore`].
//! [`FsStore`] is the real filesystem, [`MemoryStore`] backs tests, and
//! [`OverlayStore`] captures writes over another store for dry runs.

use crate::error::StoreError;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Where artifacts live
pub trait ArtifactStore: Send + Sync + std::fmt::Debug {
    /// Whether an artifact exists at `path`
    ///
    /// # Errors
    /// `StoreError::Io` if existence cannot be determined
    fn exists(&self, path: &Path) -> Result<bool, StoreError>;

    /// Artifact text
    ///
    /// # Errors
    /// `StoreError::NotFound` or `StoreError::Io`
    fn read(&self, path: &Path) -> Result<String, StoreError>;

    /// Persist `text`; with `overwrite == false` an existing artifact is an error
    ///
    /// Either the whole text is stored or the previous state is kept.
    ///
    /// # Errors
    /// `StoreError::AlreadyExists` or `StoreError::Io`
    fn write(&self, path: &Path, text: &str, overwrite: bool) -> Result<(), StoreError>;

    /// Text if the artifact exists
    ///
    /// # Errors
    /// As [`ArtifactStore::read`], except that absence is `Ok(None)`
    fn read_optional(&self, path: &Path) -> Result<Option<String>, StoreError> {
        if self.exists(path)? {
            self.read(path).map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Filesystem store with atomic replace
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl FsStore {
    /// Create a filesystem store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactStore for FsStore {
    fn exists(&self, path: &Path) -> Result<bool, StoreError> {
        path.try_exists().map_err(|e| StoreError::io(path, e))
    }

    fn read(&self, path: &Path) -> Result<String, StoreError> {
        std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StoreError::NotFound(path.to_path_buf()),
            _ => StoreError::io(path, e),
        })
    }

    fn write(&self, path: &Path, text: &str, overwrite: bool) -> Result<(), StoreError> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;

        let mut temp = NamedTempFile::new_in(parent).map_err(|e| StoreError::io(parent, e))?;
        temp.write_all(text.as_bytes())
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| StoreError::io(temp.path(), e))?;

        if overwrite {
            temp.persist(path).map_err(|e| StoreError::io(path, e.error))?;
        } else {
            temp.persist_noclobber(path).map_err(|e| match e.error.kind() {
                std::io::ErrorKind::AlreadyExists => StoreError::AlreadyExists(path.to_path_buf()),
                _ => StoreError::io(path, e.error),
            })?;
        }
        tracing::trace!(path = %path.display(), bytes = text.len(), "artifact persisted");
        Ok(())
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: RwLock<BTreeMap<PathBuf, String>>,
}

impl MemoryStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with one artifact
    #[must_use]
    pub fn with_file(self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.files.write().insert(path.into(), text.into());
        self
    }

    /// Artifact text, if present
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<String> {
        self.files.read().get(path).cloned()
    }

    /// Snapshot of every artifact
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<PathBuf, String> {
        self.files.read().clone()
    }

    /// Stored paths in order
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.read().keys().cloned().collect()
    }
}

impl ArtifactStore for MemoryStore {
    fn exists(&self, path: &Path) -> Result<bool, StoreError> {
        Ok(self.files.read().contains_key(path))
    }

    fn read(&self, path: &Path) -> Result<String, StoreError> {
        self.get(path).ok_or_else(|| StoreError::NotFound(path.to_path_buf()))
    }

    fn write(&self, path: &Path, text: &str, overwrite: bool) -> Result<(), StoreError> {
        let mut files = self.files.write();
        if !overwrite && files.contains_key(path) {
            return Err(StoreError::AlreadyExists(path.to_path_buf()));
        }
        files.insert(path.to_path_buf(), text.to_string());
        Ok(())
    }
}

/// Captures writes in memory over a read-only base store
#[derive(Debug)]
pub struct OverlayStore<'a> {
    base: &'a dyn ArtifactStore,
    upper: MemoryStore,
}

impl<'a> OverlayStore<'a> {
    /// Overlay on `base`
    #[must_use]
    pub fn new(base: &'a dyn ArtifactStore) -> Self {
        Self {
            base,
            upper: MemoryStore::new(),
        }
    }

    /// Artifacts written through the overlay
    #[must_use]
    pub fn changes(&self) -> BTreeMap<PathBuf, String> {
        self.upper.snapshot()
    }
}

impl ArtifactStore for OverlayStore<'_> {
    fn exists(&self, path: &Path) -> Result<bool, StoreError> {
        if self.upper.exists(path)? {
            return Ok(true);
        }
        self.base.exists(path)
    }

    fn read(&self, path: &Path) -> Result<String, StoreError> {
        match self.upper.get(path) {
            Some(text) => Ok(text),
            None => self.base.read(path),
        }
    }

    fn write(&self, path: &Path, text: &str, overwrite: bool) -> Result<(), StoreError> {
        if !overwrite && self.exists(path)? {
            return Err(StoreError::AlreadyExists(path.to_path_buf()));
        }
        self.upper.write(path, text, true)
    }
}
