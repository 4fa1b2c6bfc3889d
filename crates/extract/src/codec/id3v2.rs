//! ID3v2 tags in MP3 and WAV files.

use exn::{OptionExt, ResultExt};
use id3::{Tag, TagLike, Version};
use std::path::{Path, PathBuf};

use super::{TagCodec, TagContainer};
use crate::error::{ErrorKind, Result};
use crate::models::{Artwork, FieldKey};

/// Tags are always written as ID3v2.4.
const WRITE_VERSION: Version = Version::Id3v24;

/// Extensions of the containers `id3` reads and writes.
const EXTENSIONS: [&str; 2] = ["mp3", "wav"];

/// [`TagCodec`] backed by the `id3` crate.
///
/// Handles `.mp3` files (tag at the start of the file) and `.wav` files (tag
/// in an `ID3 ` RIFF chunk); `id3` tells the two apart from the file header.
/// Every other extension is reported as an unsupported container.
#[derive(Debug, Clone, Copy, Default)]
pub struct Id3Codec;

impl Id3Codec {
    /// Whether `path` has an extension this codec handles.
    pub fn handles(path: &Path) -> bool {
        extension(path).is_some_and(|ext| EXTENSIONS.contains(&ext.as_str()))
    }

    fn check(path: &Path) -> Result<()> {
        if !Self::handles(path) {
            exn::bail!(ErrorKind::UnsupportedContainer(extension(path).unwrap_or_default()));
        }
        Ok(())
    }

    fn load(path: &Path) -> Result<Option<Tag>> {
        match Tag::read_from_path(path) {
            Ok(tag) => Ok(Some(tag)),
            Err(err) if matches!(err.kind, id3::ErrorKind::NoTag) => Ok(None),
            Err(err) => Err(err).or_raise(|| ErrorKind::TagRead(path.to_path_buf())),
        }
    }
}

impl TagCodec for Id3Codec {
    fn read(&self, path: &Path) -> Result<Box<dyn TagContainer>> {
        Self::check(path)?;
        let tag = Self::load(path)?.ok_or_raise(|| ErrorKind::NoTag(path.to_path_buf()))?;
        Ok(Box::new(Id3Tag { path: path.to_path_buf(), tag }))
    }

    fn read_or_create(&self, path: &Path) -> Result<Box<dyn TagContainer>> {
        Self::check(path)?;
        let tag = Self::load(path)?.unwrap_or_else(Tag::new);
        Ok(Box::new(Id3Tag { path: path.to_path_buf(), tag }))
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase)
}

struct Id3Tag {
    path: PathBuf,
    tag: Tag,
}

impl Id3Tag {
    fn frame_id(key: FieldKey) -> &'static str {
        match key {
            FieldKey::Artist => "TPE1",
            FieldKey::Album => "TALB",
            FieldKey::Title => "TIT2",
            // Recording time (v2.4); v2.3 tags use TYER instead.
            FieldKey::Year => "TDRC",
            FieldKey::Genre => "TCON",
            FieldKey::Track => "TRCK",
            FieldKey::Disc => "TPOS",
        }
    }

    fn text(&self, id: &str) -> Option<String> {
        // Multiple values are NUL-separated in v2.4, only the first is used.
        self.tag
            .get(id)
            .and_then(|frame| frame.content().text())
            .and_then(|text| text.split('\0').next())
            .map(str::to_string)
    }
}

impl TagContainer for Id3Tag {
    fn field(&self, key: FieldKey) -> Result<Option<String>> {
        let value = self.text(Self::frame_id(key));
        Ok(match key {
            FieldKey::Year => value.or_else(|| self.text("TYER")),
            _ => value,
        })
    }

    fn set_field(&mut self, key: FieldKey, value: &str) -> Result<()> {
        self.tag.set_text(Self::frame_id(key), value);
        if key == FieldKey::Year {
            _ = self.tag.remove("TYER");
        }
        Ok(())
    }

    fn remove_field(&mut self, key: FieldKey) -> Result<()> {
        _ = self.tag.remove(Self::frame_id(key));
        if key == FieldKey::Year {
            _ = self.tag.remove("TYER");
        }
        Ok(())
    }

    fn artwork(&self) -> Result<Option<Artwork>> {
        Ok(self.tag.pictures().next().map(|picture| Artwork {
            data: picture.data.clone(),
            mime_type: picture.mime_type.clone(),
        }))
    }

    fn commit(self: Box<Self>) -> Result<()> {
        self.tag
            .write_to_path(&self.path, WRITE_VERSION)
            .or_raise(|| ErrorKind::TagWrite(self.path.clone()))?;
        tracing::debug!(path = %self.path.display(), "Wrote ID3v2 tag");
        Ok(())
    }
}
