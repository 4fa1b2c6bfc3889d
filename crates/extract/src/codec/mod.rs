//! Tag codec trait and implementations.
//!
//! A [`TagCodec`] opens a file's tag as a [`TagContainer`], a format-neutral
//! view addressed by [`FieldKey`]. The [`Parser`](crate::Parser) only ever
//! talks to these traits, so tag formats can be added (or faked in tests)
//! without touching the normalization logic.

mod id3v2;
#[cfg(any(test, feature = "mock"))]
mod mock;
#[cfg(feature = "native")]
mod native;

pub use self::id3v2::Id3Codec;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::{MemoryCodec, MemoryFile};
#[cfg(feature = "native")]
pub use self::native::NativeCodec;
use crate::error::Result;
use crate::models::{Artwork, FieldKey};
use std::path::Path;
use std::sync::Arc;

/// Shared, thread-safe handle to a codec.
pub type CodecHandle = Arc<dyn TagCodec>;

/// Opens tags stored in files.
pub trait TagCodec: Send + Sync {
    /// Open the tag of `path`.
    ///
    /// Fails with [`NoTag`](crate::error::ErrorKind::NoTag) when the file has
    /// no tag, and with
    /// [`UnsupportedContainer`](crate::error::ErrorKind::UnsupportedContainer)
    /// when the codec cannot handle the file at all.
    fn read(&self, path: &Path) -> Result<Box<dyn TagContainer>>;

    /// Open the tag of `path`, starting an empty one if the file has none.
    fn read_or_create(&self, path: &Path) -> Result<Box<dyn TagContainer>>;
}

/// An opened tag. Changes are only persisted by [`commit`](Self::commit).
pub trait TagContainer {
    /// The raw (first) value of a field, if present.
    fn field(&self, key: FieldKey) -> Result<Option<String>>;

    fn set_field(&mut self, key: FieldKey, value: &str) -> Result<()>;

    fn remove_field(&mut self, key: FieldKey) -> Result<()>;

    /// The first embedded picture, if any.
    fn artwork(&self) -> Result<Option<Artwork>>;

    /// Write the tag back to the file it was read from.
    fn commit(self: Box<Self>) -> Result<()>;
}

/// Picks a codec by file extension: [`Id3Codec`] for MP3 and WAV, and
/// [`NativeCodec`] (read only) for everything else.
///
/// Without the `native` feature every other extension is an unsupported
/// container.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoCodec;

impl AutoCodec {
    fn codec(path: &Path) -> &'static dyn TagCodec {
        if Id3Codec::handles(path) {
            return &Id3Codec;
        }
        #[cfg(feature = "native")]
        return &NativeCodec;
        #[cfg(not(feature = "native"))]
        &Id3Codec
    }
}

impl TagCodec for AutoCodec {
    fn read(&self, path: &Path) -> Result<Box<dyn TagContainer>> {
        Self::codec(path).read(path)
    }

    fn read_or_create(&self, path: &Path) -> Result<Box<dyn TagContainer>> {
        Self::codec(path).read_or_create(path)
    }
}
