//! SQLite-backed cache for derived data.
//!
//! The cache maps a composite key, an integer namespace (`kind`) plus an
//! opaque string `key`, to any value that can be serialized with `serde`. It
//! is not a source of truth: every value in it can be recomputed, so deleting
//! the database file only costs the time it takes to rebuild it.
//!
//! # Architecture
//! - [`Database`] owns the connection pool, pragmas and embedded migrations.
//! - [`Store`] is the only writer. Writes are grouped into a long-running
//!   transaction that is committed every [`BATCH_SIZE`] writes, on
//!   [`Store::flush`], or on [`Store::close`].
//! - [`CacheKey`] derives the indexed composite id of an entry. The id only
//!   accelerates lookups; equality is always checked on `(kind, key)`.

mod db;
pub mod error;
mod key;
mod models;
mod store;

pub use crate::db::Database;
pub use crate::key::CacheKey;
pub use crate::store::{BATCH_SIZE, Store};
