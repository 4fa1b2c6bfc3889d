//! Cache-through access to audio metadata.

use exn::{OptionExt, ResultExt};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tagcache_cache::Store;
use tagcache_extract::Parser;
use tagcache_extract::models::{Artwork, Metadata};
use time::OffsetDateTime;
use tracing::instrument;

use crate::error::{ErrorKind, Result};

/// Cache namespace for extracted [`Metadata`].
pub const METADATA: u32 = 1;

/// What is stored in the cache for one file.
///
/// The size and modification time identify the version of the file the
/// record was extracted from; a mismatch means the file changed on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedMetadata {
    pub size: u64,
    /// Nanoseconds since the unix epoch, when the platform reports it.
    pub modified: Option<i128>,
    pub record: Metadata,
}

/// Serves metadata from the cache, extracting it from the file on a miss.
///
/// Entries are keyed by canonical path, so `./a.mp3` and `/music/a.mp3`
/// share one entry. Call [`close`](Self::close) before exiting to persist the
/// last batch of cache writes.
pub struct MetadataService {
    store: Store,
    parser: Arc<Parser>,
}

impl MetadataService {
    pub fn new(store: Store, parser: Parser) -> Self {
        Self { store, parser: Arc::new(parser) }
    }

    /// Metadata for `path`, from the cache when the file is unchanged.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub async fn metadata(&self, path: impl AsRef<Path>) -> Result<Metadata> {
        let path = canonical(path.as_ref()).await?;
        if !self.parser.is_applicable(&path) {
            exn::bail!(ErrorKind::NotApplicable(path));
        }
        let key = cache_key(&path)?;
        let stat = tokio::fs::metadata(&path).await.or_raise(|| ErrorKind::NotFound(path.clone()))?;
        let size = stat.len();
        let modified = stat.modified().ok().map(unix_nanos);

        match self.store.get::<CachedMetadata>(METADATA, key).await {
            Ok(Some(cached)) if cached.size == size && cached.modified == modified => {
                tracing::debug!("Serving cached metadata");
                return Ok(cached.record);
            },
            Ok(Some(_)) => tracing::info!("Cached metadata is stale; re-extracting"),
            Ok(None) => {},
            // An entry written by an older, incompatible version: replace it.
            Err(err) if matches!(*err, tagcache_cache::error::ErrorKind::InvalidData(_)) => {
                tracing::warn!(error = ?err, "Discarding unreadable cache entry");
            },
            Err(err) => return Err(err).or_raise(|| ErrorKind::Cache),
        }

        let record = self.extract(path.clone()).await?;
        let cached = CachedMetadata { size, modified, record };
        self.store.put(METADATA, key, &cached).await.or_raise(|| ErrorKind::Cache)?;
        Ok(cached.record)
    }

    /// Write `record` into the tags of `path` and drop its cache entry.
    #[instrument(skip(self, path, record), fields(path = %path.as_ref().display()))]
    pub async fn write(&self, path: impl AsRef<Path>, record: &Metadata) -> Result<()> {
        let path = canonical(path.as_ref()).await?;
        let key = cache_key(&path)?.to_string();
        let parser = Arc::clone(&self.parser);
        let record = record.clone();
        tokio::task::spawn_blocking(move || parser.write(&path, &record))
            .await
            .or_raise(|| ErrorKind::Tags)?
            .or_raise(|| ErrorKind::Tags)?;
        self.store.delete(METADATA, &key).await.or_raise(|| ErrorKind::Cache)?;
        Ok(())
    }

    /// The first picture embedded in the tags of `path`, never cached.
    pub async fn artwork(&self, path: impl AsRef<Path>) -> Result<Option<Artwork>> {
        let path = canonical(path.as_ref()).await?;
        let parser = Arc::clone(&self.parser);
        tokio::task::spawn_blocking(move || parser.image(&path)).await.or_raise(|| ErrorKind::Tags)
    }

    /// Drop the cache entry for `path`. Works for files that no longer exist.
    pub async fn forget(&self, path: impl AsRef<Path>) -> Result<bool> {
        let path = path.as_ref();
        let path = match canonical(path).await {
            Ok(path) => path,
            Err(_) => std::path::absolute(path).or_raise(|| ErrorKind::NotFound(path.to_path_buf()))?,
        };
        self.store.delete(METADATA, cache_key(&path)?).await.or_raise(|| ErrorKind::Cache)
    }

    /// Persist pending cache writes and close the database.
    pub async fn close(self) -> Result<()> {
        self.store.close().await.or_raise(|| ErrorKind::Cache)
    }

    async fn extract(&self, path: PathBuf) -> Result<Metadata> {
        let parser = Arc::clone(&self.parser);
        tokio::task::spawn_blocking(move || parser.extract(&path)).await.or_raise(|| ErrorKind::Tags)
    }
}

async fn canonical(path: &Path) -> Result<PathBuf> {
    tokio::fs::canonicalize(path).await.or_raise(|| ErrorKind::NotFound(path.to_path_buf()))
}

fn cache_key(path: &Path) -> Result<&str> {
    path.to_str().ok_or_raise(|| ErrorKind::InvalidPath(path.to_path_buf()))
}

fn unix_nanos(time: SystemTime) -> i128 {
    OffsetDateTime::from(time).unix_timestamp_nanos()
}
