use crate::CacheKey;
use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use time::UtcDateTime;

/// A single row of the `cache_entries` table.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct EntryRow {
    pub(crate) id: i64,
    pub(crate) kind: i64,
    pub(crate) key: String,
    pub(crate) value: String,
    pub(crate) written_at: i64,
}
impl EntryRow {
    /// Serialize a value into a row ready for insertion.
    pub(crate) fn encode<T: Serialize + ?Sized>(key: &CacheKey, value: &T) -> Result<Self, Error> {
        Ok(Self {
            id: key.id(),
            kind: i64::from(key.kind),
            key: key.key.clone(),
            value: serde_json::to_string(value).or_raise(|| ErrorKind::InvalidData("value"))?,
            written_at: UtcDateTime::now().unix_timestamp(),
        })
    }

    pub(crate) fn decode<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_str(&self.value).or_raise(|| ErrorKind::InvalidData("value"))
    }
}
