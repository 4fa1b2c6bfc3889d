//! In-memory tag codec for testing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use super::{TagCodec, TagContainer};
use crate::error::{ErrorKind, Result};
use crate::models::{Artwork, FieldKey};

/// The tag of one fake file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryFile {
    pub fields: HashMap<FieldKey, String>,
    pub artwork: Option<Artwork>,
}
impl MemoryFile {
    /// Set a raw field value.
    pub fn with(mut self, key: FieldKey, value: impl Into<String>) -> Self {
        self.fields.insert(key, value.into());
        self
    }

    pub fn with_artwork(mut self, data: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        self.artwork = Some(Artwork { data: data.into(), mime_type: mime_type.into() });
        self
    }
}

/// [`TagCodec`] that keeps tags in a shared `HashMap`, keyed by path.
///
/// Paths that were never inserted behave like files without a tag. Clones
/// share the same storage, so a test can keep one handle for assertions while
/// the [`Parser`](crate::Parser) owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryCodec {
    files: Arc<RwLock<HashMap<PathBuf, MemoryFile>>>,
    read_only: bool,
}

impl MemoryCodec {
    /// Add (or replace) a file.
    pub fn with_file(self, path: impl Into<PathBuf>, file: MemoryFile) -> Self {
        self.insert(path, file);
        self
    }

    /// Make every commit fail, like a file on a read-only mount.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn insert(&self, path: impl Into<PathBuf>, file: MemoryFile) {
        self.files.write().unwrap_or_else(PoisonError::into_inner).insert(path.into(), file);
    }

    /// The currently committed tag of a file.
    pub fn file(&self, path: impl AsRef<Path>) -> Option<MemoryFile> {
        self.files.read().unwrap_or_else(PoisonError::into_inner).get(path.as_ref()).cloned()
    }

    fn open(&self, path: &Path, file: MemoryFile) -> Box<dyn TagContainer> {
        Box::new(MemoryTag { codec: self.clone(), path: path.to_path_buf(), file })
    }
}

impl TagCodec for MemoryCodec {
    fn read(&self, path: &Path) -> Result<Box<dyn TagContainer>> {
        match self.file(path) {
            Some(file) => Ok(self.open(path, file)),
            None => exn::bail!(ErrorKind::NoTag(path.to_path_buf())),
        }
    }

    fn read_or_create(&self, path: &Path) -> Result<Box<dyn TagContainer>> {
        Ok(self.open(path, self.file(path).unwrap_or_default()))
    }
}

struct MemoryTag {
    codec: MemoryCodec,
    path: PathBuf,
    file: MemoryFile,
}

impl TagContainer for MemoryTag {
    fn field(&self, key: FieldKey) -> Result<Option<String>> {
        Ok(self.file.fields.get(&key).cloned())
    }

    fn set_field(&mut self, key: FieldKey, value: &str) -> Result<()> {
        self.file.fields.insert(key, value.to_string());
        Ok(())
    }

    fn remove_field(&mut self, key: FieldKey) -> Result<()> {
        self.file.fields.remove(&key);
        Ok(())
    }

    fn artwork(&self) -> Result<Option<Artwork>> {
        Ok(self.file.artwork.clone())
    }

    fn commit(self: Box<Self>) -> Result<()> {
        if self.codec.read_only {
            exn::bail!(ErrorKind::TagWrite(self.path));
        }
        self.codec.insert(self.path, self.file);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_has_no_tag() {
        let codec = MemoryCodec::default();
        let Err(err) = codec.read(Path::new("a.mp3")) else {
            panic!("unknown path should have no tag");
        };
        assert_eq!(*err, ErrorKind::NoTag(PathBuf::from("a.mp3")));
    }

    #[test]
    fn test_changes_need_commit() {
        let codec = MemoryCodec::default().with_file("a.mp3", MemoryFile::default().with(FieldKey::Title, "Old"));
        let mut tag = codec.read(Path::new("a.mp3")).unwrap();
        tag.set_field(FieldKey::Title, "New").unwrap();
        assert_eq!(codec.file("a.mp3").unwrap().fields[&FieldKey::Title], "Old");
        tag.commit().unwrap();
        assert_eq!(codec.file("a.mp3").unwrap().fields[&FieldKey::Title], "New");
    }

    #[test]
    fn test_read_only_commit_fails() {
        let codec = MemoryCodec::default().read_only();
        let tag = codec.read_or_create(Path::new("a.mp3")).unwrap();
        let err = tag.commit().unwrap_err();
        assert_eq!(*err, ErrorKind::TagWrite(PathBuf::from("a.mp3")));
        assert!(codec.file("a.mp3").is_none());
    }
}
