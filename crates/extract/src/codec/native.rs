//! Tags read through symphonia's demuxers: Vorbis comments in FLAC and Ogg,
//! metadata atoms in MP4.

use exn::{OptionExt, ResultExt};
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use symphonia::core::errors::Error as MediaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::{MetadataOptions, MetadataRevision, StandardTagKey};
use symphonia::core::probe::Hint;

use super::{TagCodec, TagContainer};
use crate::error::{ErrorKind, Result};
use crate::models::{Artwork, FieldKey};

/// Read-only [`TagCodec`] for containers that `id3` can't open.
///
/// Fields are matched by symphonia's standard tag keys, so `ARTIST` in a
/// Vorbis comment and `©ART` in an MP4 file both land on
/// [`FieldKey::Artist`]. Writing is not supported: [`commit`] fails with
/// [`UnsupportedContainer`](ErrorKind::UnsupportedContainer).
///
/// [`commit`]: TagContainer::commit
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCodec;

impl NativeCodec {
    fn load(path: &Path) -> Result<Option<NativeTag>> {
        let file = File::open(path).or_raise(|| ErrorKind::TagRead(path.to_path_buf()))?;
        let stream = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());
        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(extension);
        }
        let probed = symphonia::default::get_probe().format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        );
        let mut probed = match probed {
            Ok(probed) => probed,
            Err(MediaError::Unsupported(_)) => exn::bail!(ErrorKind::UnsupportedContainer(extension(path))),
            Err(err) => return Err(err).or_raise(|| ErrorKind::TagRead(path.to_path_buf())),
        };
        // Tags in the container itself win over tags found in front of it.
        let tag = match probed.format.metadata().skip_to_latest() {
            Some(revision) => Some(NativeTag::new(path, revision)),
            None => probed
                .metadata
                .get()
                .and_then(|mut log| log.skip_to_latest().map(|revision| NativeTag::new(path, revision))),
        };
        Ok(tag)
    }
}

impl TagCodec for NativeCodec {
    fn read(&self, path: &Path) -> Result<Box<dyn TagContainer>> {
        let tag = Self::load(path)?.ok_or_raise(|| ErrorKind::NoTag(path.to_path_buf()))?;
        Ok(Box::new(tag))
    }

    fn read_or_create(&self, path: &Path) -> Result<Box<dyn TagContainer>> {
        let tag = Self::load(path)?.unwrap_or_else(|| NativeTag::empty(path));
        Ok(Box::new(tag))
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

fn field_key(key: StandardTagKey) -> Option<FieldKey> {
    Some(match key {
        StandardTagKey::Artist => FieldKey::Artist,
        StandardTagKey::Album => FieldKey::Album,
        StandardTagKey::TrackTitle => FieldKey::Title,
        StandardTagKey::Date => FieldKey::Year,
        StandardTagKey::Genre => FieldKey::Genre,
        StandardTagKey::TrackNumber => FieldKey::Track,
        StandardTagKey::DiscNumber => FieldKey::Disc,
        _ => return None,
    })
}

/// Snapshot of one metadata revision. Edits stay in memory.
struct NativeTag {
    path: PathBuf,
    fields: HashMap<FieldKey, String>,
    artwork: Option<Artwork>,
}

impl NativeTag {
    fn new(path: &Path, revision: &MetadataRevision) -> Self {
        let mut fields = HashMap::new();
        for tag in revision.tags() {
            if let Some(key) = tag.std_key.and_then(field_key) {
                // First value wins, as with multi-valued ID3 frames.
                fields.entry(key).or_insert_with(|| tag.value.to_string());
            }
        }
        let artwork = revision.visuals().first().map(|visual| Artwork {
            data: visual.data.to_vec(),
            mime_type: visual.media_type.clone(),
        });
        Self { path: path.to_path_buf(), fields, artwork }
    }

    fn empty(path: &Path) -> Self {
        Self { path: path.to_path_buf(), fields: HashMap::new(), artwork: None }
    }
}

impl TagContainer for NativeTag {
    fn field(&self, key: FieldKey) -> Result<Option<String>> {
        Ok(self.fields.get(&key).cloned())
    }

    fn set_field(&mut self, key: FieldKey, value: &str) -> Result<()> {
        self.fields.insert(key, value.to_string());
        Ok(())
    }

    fn remove_field(&mut self, key: FieldKey) -> Result<()> {
        self.fields.remove(&key);
        Ok(())
    }

    fn artwork(&self) -> Result<Option<Artwork>> {
        Ok(self.artwork.clone())
    }

    fn commit(self: Box<Self>) -> Result<()> {
        exn::bail!(ErrorKind::UnsupportedContainer(extension(&self.path)))
    }
}
