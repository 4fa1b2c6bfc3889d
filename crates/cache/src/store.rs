//! The cache store: replace-on-write entries with batched commits.

use crate::error::{ErrorKind, Result};
use crate::models::EntryRow;
use crate::{CacheKey, Database};
use exn::ResultExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::{Connection, Sqlite, SqliteExecutor, Transaction};
use tokio::sync::Mutex;
use tracing::instrument;

/// Number of writes grouped into one transaction before it is committed.
///
/// Bounds what a crash can lose to a single batch.
pub const BATCH_SIZE: usize = 100;

/// The open transaction and how many writes it holds.
#[derive(Default)]
struct Batch {
    tx: Option<Transaction<'static, Sqlite>>,
    writes: usize,
}
impl Batch {
    /// The open transaction, beginning a new one if needed.
    async fn transaction(&mut self, db: &Database) -> Result<&mut Transaction<'static, Sqlite>> {
        let tx = match self.tx.take() {
            Some(tx) => tx,
            None => db.pool().begin().await.or_raise(|| ErrorKind::Database)?,
        };
        Ok(self.tx.insert(tx))
    }

    async fn record_write(&mut self) -> Result<()> {
        self.writes += 1;
        if self.writes >= BATCH_SIZE {
            self.commit().await?;
        }
        Ok(())
    }

    /// Commit the open transaction (if any) and reset the counter, returning
    /// the number of writes that were committed.
    async fn commit(&mut self) -> Result<usize> {
        let writes = std::mem::take(&mut self.writes);
        if let Some(tx) = self.tx.take() {
            tx.commit().await.or_raise(|| ErrorKind::Database)?;
            tracing::debug!(writes, "Committed cache batch");
        }
        Ok(writes)
    }
}

/// Key/value cache on top of the [`Database`].
///
/// Values are stored as JSON, so anything implementing [`Serialize`] can be
/// put and anything implementing [`DeserializeOwned`] can be read back.
///
/// # Consistency
/// - A [`put`](Self::put) deletes every entry for the key before inserting
///   the new one, inside a savepoint: readers see the old value or the new
///   one, never both and never neither.
/// - Writes accumulate in one transaction until [`BATCH_SIZE`] is reached.
///   Reads go through that same transaction, so a value can be read back
///   before it is committed.
/// - Every operation holds the store's lock for its whole duration; there is
///   one logical writer at a time. Reads take the lock too, since
///   uncommitted writes are only visible through the batch transaction. A
///   read with no batch open goes to the pool and never starts one.
///
/// Call [`close`](Self::close) on shutdown. Dropping a store with pending
/// writes rolls them back.
///
/// # Examples
///
/// ```no_run
/// use tagcache_cache::{Database, Store};
///
/// # async fn example() -> tagcache_cache::error::Result<()> {
/// let store = Store::new(Database::connect("/tmp/cache.db").await?);
/// store.put(1, "greeting", "hello").await?;
/// assert_eq!(store.get::<String>(1, "greeting").await?.as_deref(), Some("hello"));
/// store.close().await
/// # }
/// ```
pub struct Store {
    db: Database,
    batch: Mutex<Batch>,
}
impl From<&Database> for Store {
    fn from(db: &Database) -> Self {
        Self::new(db.clone())
    }
}
impl Store {
    pub fn new(db: Database) -> Self {
        Self { db, batch: Mutex::new(Batch::default()) }
    }

    /// Insert or replace the value stored under `(kind, key)`.
    #[instrument(level = "debug", skip(self, value))]
    pub async fn put<T: Serialize + ?Sized>(&self, kind: u32, key: &str, value: &T) -> Result<()> {
        let key = CacheKey::new(kind, key);
        let row = EntryRow::encode(&key, value)?;
        let mut batch = self.batch.lock().await;
        let tx = batch.transaction(&self.db).await?;
        let mut write = Connection::begin(&mut **tx).await.or_raise(|| ErrorKind::Database)?;
        // Removes every row for the key, duplicates included.
        let replaced = sqlx::query(include_str!("../queries/delete_entries.sql"))
            .bind(row.id)
            .bind(row.kind)
            .bind(row.key.as_str())
            .execute(&mut *write)
            .await
            .or_raise(|| ErrorKind::Database)?
            .rows_affected();
        sqlx::query(include_str!("../queries/insert_entry.sql"))
            .bind(row.id)
            .bind(row.kind)
            .bind(row.key.as_str())
            .bind(row.value.as_str())
            .bind(row.written_at)
            .execute(&mut *write)
            .await
            .or_raise(|| ErrorKind::Database)?;
        write.commit().await.or_raise(|| ErrorKind::Database)?;
        if replaced > 1 {
            tracing::warn!(%key, replaced, "Replaced duplicate cache entries");
        }
        batch.record_write().await
    }

    /// Read the value stored under `(kind, key)`.
    ///
    /// There should never be more than one entry per key. If there is, the
    /// anomaly is logged and the most recently written entry is returned.
    #[instrument(level = "debug", skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, kind: u32, key: &str) -> Result<Option<T>> {
        let key = CacheKey::new(kind, key);
        let rows = {
            let mut batch = self.batch.lock().await;
            match batch.tx.as_mut() {
                Some(tx) => Self::select(&mut **tx, &key).await?,
                None => Self::select(self.db.pool(), &key).await?,
            }
        };
        if rows.len() > 1 {
            tracing::error!(%key, matches = rows.len(), "Multiple cache entries share one key; using the most recent");
        }
        rows.first().map(|row| row.decode()).transpose()
    }

    /// Remove the value stored under `(kind, key)`.
    ///
    /// Returns `true` if anything was removed.
    #[instrument(level = "debug", skip(self))]
    pub async fn delete(&self, kind: u32, key: &str) -> Result<bool> {
        let key = CacheKey::new(kind, key);
        let mut batch = self.batch.lock().await;
        let tx = batch.transaction(&self.db).await?;
        let removed = sqlx::query(include_str!("../queries/delete_entries.sql"))
            .bind(key.id())
            .bind(i64::from(key.kind))
            .bind(key.key.as_str())
            .execute(&mut **tx)
            .await
            .or_raise(|| ErrorKind::Database)?
            .rows_affected();
        if removed > 0 {
            batch.record_write().await?;
        }
        Ok(removed > 0)
    }

    /// Commit the current batch now, returning how many writes it held.
    pub async fn flush(&self) -> Result<usize> {
        self.batch.lock().await.commit().await
    }

    /// Number of writes waiting for the next commit.
    pub async fn pending_writes(&self) -> usize {
        self.batch.lock().await.writes
    }

    /// Commit any pending writes and close the database.
    pub async fn close(self) -> Result<()> {
        let writes = self.flush().await?;
        tracing::debug!(writes, "Closing cache store");
        self.db.close().await;
        Ok(())
    }

    async fn select<'e, E: SqliteExecutor<'e>>(executor: E, key: &CacheKey) -> Result<Vec<EntryRow>> {
        sqlx::query_as(include_str!("../queries/select_entries.sql"))
            .bind(key.id())
            .bind(i64::from(key.kind))
            .bind(key.key.clone())
            .fetch_all(executor)
            .await
            .or_raise(|| ErrorKind::Database)
    }
}
impl Drop for Store {
    fn drop(&mut self) {
        let writes = self.batch.get_mut().writes;
        if writes > 0 {
            tracing::warn!(writes, "Cache store dropped without closing; pending writes are rolled back");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde::Deserialize;
    use std::sync::Arc;

    const KIND: u32 = 1;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Album {
        title: String,
        tracks: u32,
    }

    async fn store() -> (Database, Store) {
        let db = Database::connect_in_memory().await.unwrap();
        let store = Store::new(db.clone());
        (db, store)
    }

    /// Only safe to call when the store has no open batch: the in-memory pool
    /// has a single connection.
    async fn count(db: &Database) -> i64 {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cache_entries").fetch_one(db.pool()).await.unwrap();
        row.0
    }

    async fn insert_raw(db: &Database, id: i64, kind: u32, key: &str, value: &str) {
        sqlx::query(include_str!("../queries/insert_entry.sql"))
            .bind(id)
            .bind(i64::from(kind))
            .bind(key)
            .bind(value)
            .bind(0i64)
            .execute(db.pool())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let (_db, store) = store().await;
        let album = Album { title: "Blue".to_string(), tracks: 10 };
        store.put(KIND, "/music/blue", &album).await.unwrap();
        assert_eq!(store.get::<Album>(KIND, "/music/blue").await.unwrap(), Some(album));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let (_db, store) = store().await;
        assert_eq!(store.get::<String>(KIND, "nothing here").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_replaces_previous_value() {
        let (db, store) = store().await;
        store.put(KIND, "key", "v1").await.unwrap();
        store.put(KIND, "key", "v2").await.unwrap();
        assert_eq!(store.get::<String>(KIND, "key").await.unwrap().as_deref(), Some("v2"));
        store.flush().await.unwrap();
        assert_eq!(count(&db).await, 1, "no duplicate entries should remain");
    }

    #[tokio::test]
    async fn test_namespaces_do_not_collide() {
        let (_db, store) = store().await;
        store.put(1, "same", "first").await.unwrap();
        store.put(2, "same", "second").await.unwrap();
        assert_eq!(store.get::<String>(1, "same").await.unwrap().as_deref(), Some("first"));
        assert_eq!(store.get::<String>(2, "same").await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_delete() {
        let (_db, store) = store().await;
        store.put(KIND, "key", "value").await.unwrap();
        assert!(store.delete(KIND, "key").await.unwrap());
        assert_eq!(store.get::<String>(KIND, "key").await.unwrap(), None);
        assert!(!store.delete(KIND, "key").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_counts_toward_batch() {
        let (_db, store) = store().await;
        store.put(KIND, "key", "value").await.unwrap();
        store.delete(KIND, "key").await.unwrap();
        store.delete(KIND, "missing").await.unwrap();
        assert_eq!(store.pending_writes().await, 2);
    }

    #[tokio::test]
    async fn test_batch_commits_at_threshold() {
        let (db, store) = store().await;
        for i in 0..BATCH_SIZE - 1 {
            store.put(KIND, &format!("key-{i}"), &i).await.unwrap();
        }
        assert_eq!(store.pending_writes().await, BATCH_SIZE - 1);
        store.put(KIND, "last", &0).await.unwrap();
        assert_eq!(store.pending_writes().await, 0);
        // Committed: visible through a plain pool connection.
        assert_eq!(count(&db).await, i64::try_from(BATCH_SIZE).unwrap());
        store.put(KIND, "next batch", &0).await.unwrap();
        assert_eq!(store.pending_writes().await, 1);
    }

    #[tokio::test]
    async fn test_flush() {
        let (db, store) = store().await;
        store.put(KIND, "a", &1).await.unwrap();
        store.put(KIND, "b", &2).await.unwrap();
        assert_eq!(store.flush().await.unwrap(), 2);
        assert_eq!(store.pending_writes().await, 0);
        assert_eq!(count(&db).await, 2);
        // Nothing pending: flushing again is a no-op.
        assert_eq!(store.flush().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_get_does_not_open_batch() {
        let (db, store) = store().await;
        store.put(KIND, "a", &1).await.unwrap();
        store.flush().await.unwrap();
        assert_eq!(store.get::<u32>(KIND, "a").await.unwrap(), Some(1));
        assert_eq!(store.get::<u32>(KIND, "b").await.unwrap(), None);
        assert_eq!(store.pending_writes().await, 0);
        // The pool's only connection is free again.
        assert_eq!(count(&db).await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_put_and_get() {
        const TASKS: usize = 8;
        const ROUNDS: usize = 60;
        const KEYS: usize = 10;
        let (db, store) = store().await;
        let store = Arc::new(store);
        let handles: Vec<_> = (0..TASKS)
            .map(|task| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    for round in 0..ROUNDS {
                        let slot = (task * ROUNDS + round) % KEYS;
                        let key = format!("key-{slot}");
                        store.put(KIND, &key, &(slot, task, round)).await.unwrap();
                        // Other tasks may have replaced it since, but never removed it.
                        let (read, _, _) = store.get::<(usize, usize, usize)>(KIND, &key).await.unwrap().unwrap();
                        assert_eq!(read, slot);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.pending_writes().await, TASKS * ROUNDS % BATCH_SIZE);
        assert_eq!(store.flush().await.unwrap(), TASKS * ROUNDS % BATCH_SIZE);
        assert_eq!(count(&db).await, i64::try_from(KEYS).unwrap());
    }

    #[tokio::test]
    async fn test_duplicates_return_most_recent() {
        let (db, store) = store().await;
        let key = CacheKey::new(KIND, "dupe");
        insert_raw(&db, key.id(), KIND, "dupe", r#""older""#).await;
        insert_raw(&db, key.id(), KIND, "dupe", r#""newer""#).await;
        assert_eq!(store.get::<String>(KIND, "dupe").await.unwrap().as_deref(), Some("newer"));
    }

    #[tokio::test]
    async fn test_put_removes_all_duplicates() {
        let (db, store) = store().await;
        let key = CacheKey::new(KIND, "dupe");
        insert_raw(&db, key.id(), KIND, "dupe", r#""one""#).await;
        insert_raw(&db, key.id(), KIND, "dupe", r#""two""#).await;
        store.put(KIND, "dupe", "three").await.unwrap();
        store.flush().await.unwrap();
        assert_eq!(count(&db).await, 1);
        assert_eq!(store.get::<String>(KIND, "dupe").await.unwrap().as_deref(), Some("three"));
    }

    #[tokio::test]
    async fn test_id_collision_is_not_a_match() {
        let (db, store) = store().await;
        // Forge a row that shares the composite id of (KIND, "mine") but
        // belongs to another key.
        let id = CacheKey::new(KIND, "mine").id();
        insert_raw(&db, id, KIND, "theirs", r#""theirs""#).await;
        assert_eq!(store.get::<String>(KIND, "mine").await.unwrap(), None);
        store.put(KIND, "mine", "mine").await.unwrap();
        assert!(!store.delete(KIND, "nobody").await.unwrap());
        store.flush().await.unwrap();
        assert_eq!(count(&db).await, 2, "the colliding row must survive");
        assert_eq!(store.get::<String>(KIND, "mine").await.unwrap().as_deref(), Some("mine"));
    }

    #[tokio::test]
    async fn test_get_wrong_type() {
        let (_db, store) = store().await;
        store.put(KIND, "key", "not an album").await.unwrap();
        let err = store.get::<Album>(KIND, "key").await.unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidData("value"));
    }

    #[tokio::test]
    async fn test_close_persists_partial_batch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");
        let store = Store::new(Database::connect(&path).await.unwrap());
        store.put(KIND, "a", "persisted").await.unwrap();
        assert_eq!(store.pending_writes().await, 1);
        store.close().await.unwrap();

        let store = Store::new(Database::connect(&path).await.unwrap());
        assert_eq!(store.get::<String>(KIND, "a").await.unwrap().as_deref(), Some("persisted"));
        store.close().await.unwrap();
    }
}
