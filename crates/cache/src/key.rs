use std::fmt::{Display, Formatter, Result as FmtResult};

/// Identity of a cache entry: a namespace discriminator and an opaque key.
///
/// Identical keys in different namespaces never collide. The derived
/// [`id`](Self::id) is what the database indexes, but two keys are only
/// considered equal when both `kind` and `key` match; the id is an index
/// accelerator, not an equality test.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: u32,
    pub key: String,
}
impl CacheKey {
    pub fn new(kind: u32, key: impl Into<String>) -> Self {
        Self { kind, key: key.into() }
    }

    /// Deterministic composite id of `(kind, key)`.
    ///
    /// The first eight bytes of the BLAKE3 hash of the little-endian kind
    /// followed by the key bytes. Stable across processes and platforms, so it
    /// can be persisted. Distinct pairs may (very rarely) share an id.
    pub fn id(&self) -> i64 {
        let mut hasher = blake3::Hasher::new();
        // Fixed-width prefix: (1, "\0x") and (256, "x") hash different input.
        hasher.update(&self.kind.to_le_bytes());
        hasher.update(self.key.as_bytes());
        let hash = hasher.finalize();
        let mut id = [0u8; 8];
        id.copy_from_slice(&hash.as_bytes()[..8]);
        i64::from_le_bytes(id)
    }
}
impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}:{}", self.kind, self.key)
    }
}
