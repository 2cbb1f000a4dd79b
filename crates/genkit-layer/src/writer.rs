//! Normalize-then-persist
//!
//! The writer is the only place artifacts are written. Text is normalized
//! first; if normalization fails nothing is written. Normalized text equal
//! to what is stored is not rewritten. Callers that merged into text they
//! read earlier pass its hash, and the write is refused if the stored text
//! moved on in the meantime.

use crate::error::WriteError;
use crate::normalize::Normalizer;
use crate::store::ArtifactStore;
use genkit_artifact::ContentHash;
use serde::Serialize;
use std::path::Path;

/// What happened to one artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteStatus {
    /// New artifact
    Created,
    /// Existing artifact replaced
    Updated,
    /// Stored text already canonical and identical
    Unchanged,
}

impl WriteStatus {
    /// Whether the store was touched
    #[inline]
    #[must_use]
    pub fn written(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Persists artifacts through a store
#[derive(Debug, Clone, Copy)]
pub struct ArtifactWriter<'s> {
    store: &'s dyn ArtifactStore,
}

impl<'s> ArtifactWriter<'s> {
    /// Writer over `store`
    #[must_use]
    pub fn new(store: &'s dyn ArtifactStore) -> Self {
        Self { store }
    }

    /// Normalize `text` and persist it at `path` unless unchanged
    ///
    /// # Errors
    /// `WriteError::Normalize` before anything is written, or
    /// `WriteError::Store` if persisting fails
    pub fn commit(&self, path: &Path, text: &str, normalizer: &dyn Normalizer) -> Result<WriteStatus, WriteError> {
        self.persist(path, text, normalizer, None)
    }

    /// [`commit`](Self::commit) text derived from a read whose hash was `read`
    ///
    /// An absent artifact hashes as empty text.
    ///
    /// # Errors
    /// As [`commit`](Self::commit), plus `WriteError::Changed` when the
    /// stored text no longer hashes to `read`
    pub fn commit_over(
        &self,
        path: &Path,
        text: &str,
        normalizer: &dyn Normalizer,
        read: ContentHash,
    ) -> Result<WriteStatus, WriteError> {
        self.persist(path, text, normalizer, Some(read))
    }

    fn persist(
        &self,
        path: &Path,
        text: &str,
        normalizer: &dyn Normalizer,
        read: Option<ContentHash>,
    ) -> Result<WriteStatus, WriteError> {
        let canonical = normalizer.normalize(text)?;
        let current = self.store.read_optional(path)?;

        if let Some(expected) = read {
            let found = ContentHash::compute(current.as_deref().unwrap_or_default().as_bytes());
            if found != expected {
                tracing::warn!(path = %path.display(), "artifact changed since it was read");
                return Err(WriteError::Changed {
                    path: path.to_path_buf(),
                });
            }
        }

        let status = match current {
            Some(ref existing) if *existing == canonical => {
                tracing::debug!(path = %path.display(), "artifact unchanged");
                return Ok(WriteStatus::Unchanged);
            }
            Some(_) => WriteStatus::Updated,
            None => WriteStatus::Created,
        };
        self.store.write(path, &canonical, true)?;
        tracing::debug!(path = %path.display(), normalizer = normalizer.name(), ?status, "artifact written");
        Ok(status)
    }

    /// Write `text` only if nothing exists at `path`
    ///
    /// # Errors
    /// `WriteError::Store` if persisting fails
    pub fn create_once(&self, path: &Path, text: &str) -> Result<WriteStatus, WriteError> {
        if self.store.exists(path)? {
            return Ok(WriteStatus::Unchanged);
        }
        self.store.write(path, text, false)?;
        Ok(WriteStatus::Created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{GoNormalizer, SchemaNormalizer};
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn created_then_unchanged() {
        let store = MemoryStore::new();
        let writer = ArtifactWriter::new(&store);
        let path = Path::new("/p/a.go");

        assert_eq!(writer.commit(path, "package a\n\n\n", &GoNormalizer).unwrap(), WriteStatus::Created);
        assert_eq!(store.get(path).as_deref(), Some("package a\n"));
        assert_eq!(writer.commit(path, "package a", &GoNormalizer).unwrap(), WriteStatus::Unchanged);
        assert_eq!(writer.commit(path, "package b", &GoNormalizer).unwrap(), WriteStatus::Updated);
    }

    #[test]
    fn normalize_failure_leaves_store_untouched() {
        let store = MemoryStore::new().with_file("/p/a.proto", "syntax = \"proto3\";\n");
        let writer = ArtifactWriter::new(&store);
        let err = writer
            .commit(Path::new("/p/a.proto"), "message {", &SchemaNormalizer)
            .unwrap_err();
        assert!(matches!(err, WriteError::Normalize(_)));
        assert_eq!(store.get(Path::new("/p/a.proto")).as_deref(), Some("syntax = \"proto3\";\n"));
    }

    #[test]
    fn create_once_never_overwrites() {
        let store = MemoryStore::new().with_file("/p/compile.sh", "custom");
        let writer = ArtifactWriter::new(&store);
        assert_eq!(writer.create_once(Path::new("/p/compile.sh"), "x").unwrap(), WriteStatus::Unchanged);
        assert_eq!(store.get(Path::new("/p/compile.sh")).as_deref(), Some("custom"));
    }

    #[test]
    fn edits_after_the_read_are_not_overwritten() {
        let path = Path::new("/p/handler.go");
        let store = MemoryStore::new().with_file("/p/handler.go", "package p\n");
        let read = ContentHash::compute(b"package p\n");
        store.write(path, "package p\n\nvar mine = 1\n", true).unwrap();

        let writer = ArtifactWriter::new(&store);
        let err = writer.commit_over(path, "package p\n\nvar x = 1\n", &GoNormalizer, read).unwrap_err();
        assert!(matches!(err, WriteError::Changed { ref path } if path == Path::new("/p/handler.go")));
        assert_eq!(store.get(path).as_deref(), Some("package p\n\nvar mine = 1\n"));
    }

    #[test]
    fn matching_read_hash_commits() {
        let store = MemoryStore::new().with_file("/p/a.go", "package a\n");
        let writer = ArtifactWriter::new(&store);
        let read = ContentHash::compute(b"package a\n");
        let status = writer.commit_over(Path::new("/p/a.go"), "package a\n\nvar x = 1", &GoNormalizer, read);
        assert_eq!(status.unwrap(), WriteStatus::Updated);

        let fresh = writer.commit_over(Path::new("/p/b.go"), "package b", &GoNormalizer, ContentHash::compute(b""));
        assert_eq!(fresh.unwrap(), WriteStatus::Created);
    }
}
