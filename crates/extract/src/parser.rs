use exn::ResultExt;
use std::path::Path;
use tracing::instrument;

use crate::codec::{CodecHandle, TagContainer};
use crate::consts::SUPPORTED_EXTENSIONS;
use crate::error::{Error, ErrorKind, Result};
use crate::genre;
use crate::models::{Artwork, FieldKey, Metadata};
use crate::normalize;

/// Parser behaviour that isn't tied to a particular codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Read stream properties (duration, bit rate) from the audio data.
    /// Without the `probe` feature this has no effect.
    pub probe_audio: bool,
}
impl Default for ParserOptions {
    fn default() -> Self {
        Self { probe_audio: cfg!(feature = "probe") }
    }
}

/// Reads tags into normalized [`Metadata`] and writes [`Metadata`] back.
///
/// Extraction is forgiving: a file that can't be opened still yields the
/// metadata that is known without reading tags, and each field is parsed on
/// its own so one bad value never costs the rest. Writing is strict.
///
/// The parser holds no state besides its codec handle and is cheap to share
/// between threads.
pub struct Parser {
    codec: CodecHandle,
    options: ParserOptions,
}

impl Parser {
    pub fn new(codec: CodecHandle, options: ParserOptions) -> Self {
        Self { codec, options }
    }

    /// Whether `path` is a regular file with a supported audio extension.
    pub fn is_applicable(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        has_supported_extension(path) && path.is_file()
    }

    /// Extract normalized metadata. Never fails; see the type docs.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn extract(&self, path: impl AsRef<Path>) -> Metadata {
        let path = path.as_ref();
        let mut metadata = basic_metadata(path);
        match self.codec.read(path) {
            Ok(tag) => apply_tag(&mut metadata, tag.as_ref()),
            Err(err) if is_missing_tag(&err) => tracing::debug!("File has no tag"),
            Err(err) => tracing::warn!(error = ?err, "Unable to read tags; using basic metadata"),
        }
        #[cfg(feature = "probe")]
        if self.options.probe_audio {
            apply_stream_info(path, &mut metadata);
        }
        metadata
    }

    /// Write `metadata` into the tags of `path`, creating a tag if needed.
    ///
    /// Absent text fields are written as empty strings, absent track and disc
    /// numbers remove the field. Stream properties are never written.
    #[instrument(skip(self, path, metadata), fields(path = %path.as_ref().display()))]
    pub fn write(&self, path: impl AsRef<Path>, metadata: &Metadata) -> Result<()> {
        let path = path.as_ref();
        self.write_tag(path, metadata).or_raise(|| ErrorKind::TagWrite(path.to_path_buf()))
    }

    fn write_tag(&self, path: &Path, metadata: &Metadata) -> Result<()> {
        let mut tag = self.codec.read_or_create(path)?;
        let text = [
            (FieldKey::Artist, &metadata.artist),
            (FieldKey::Album, &metadata.album),
            (FieldKey::Title, &metadata.title),
            (FieldKey::Year, &metadata.year),
            (FieldKey::Genre, &metadata.genre),
        ];
        for (key, value) in text {
            tag.set_field(key, value.as_deref().map(str::trim).unwrap_or_default())?;
        }
        for (key, value) in [(FieldKey::Track, metadata.track_number), (FieldKey::Disc, metadata.disc_number)] {
            match value {
                Some(number) => tag.set_field(key, &number.to_string())?,
                None => tag.remove_field(key)?,
            }
        }
        tag.commit()
    }

    /// Whether tags can be written back. Always `true`; unsupported files
    /// are reported by [`write`](Self::write) itself.
    pub fn is_editing_supported(&self) -> bool {
        true
    }

    pub fn has_image(&self, path: impl AsRef<Path>) -> bool {
        self.image(path).is_some()
    }

    /// The first embedded picture. Failures are logged and treated as "no
    /// image".
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn image(&self, path: impl AsRef<Path>) -> Option<Artwork> {
        match self.codec.read(path.as_ref()).and_then(|tag| tag.artwork()) {
            Ok(artwork) => artwork,
            Err(err) if is_missing_tag(&err) => {
                tracing::debug!("File has no tag");
                None
            },
            Err(err) => {
                tracing::warn!(error = ?err, "Unable to read embedded artwork");
                None
            },
        }
    }

    /// Every genre an editor should offer, alphabetically.
    pub fn genres(&self) -> Vec<&'static str> {
        genre::alphabetical()
    }
}

/// Whether reading failed only because the file has no tag.
fn is_missing_tag(err: &Error) -> bool {
    matches!(**err, ErrorKind::NoTag(_))
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.iter().any(|supported| supported.eq_ignore_ascii_case(ext)))
}

/// What is known about a file without reading its tags.
fn basic_metadata(path: &Path) -> Metadata {
    Metadata {
        format: path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase),
        file_size: std::fs::metadata(path).ok().map(|meta| meta.len()),
        ..Metadata::default()
    }
}

fn apply_tag(metadata: &mut Metadata, tag: &dyn TagContainer) {
    metadata.artist = read_text(tag, FieldKey::Artist);
    metadata.album = read_text(tag, FieldKey::Album);
    metadata.title = read_text(tag, FieldKey::Title);
    metadata.year = read_text(tag, FieldKey::Year);
    metadata.genre = read_text(tag, FieldKey::Genre).map(|raw| normalize::genre(&raw).to_string());
    metadata.track_number = read_parsed(tag, FieldKey::Track, normalize::track_number);
    metadata.disc_number = read_parsed(tag, FieldKey::Disc, normalize::disc_number);
}

fn read_text(tag: &dyn TagContainer, key: FieldKey) -> Option<String> {
    match tag.field(key) {
        Ok(raw) => raw.as_deref().and_then(normalize::text).map(str::to_string),
        Err(err) => {
            tracing::debug!(field = %key, error = ?err, "Unable to read field");
            None
        },
    }
}

fn read_parsed<T>(tag: &dyn TagContainer, key: FieldKey, parse: impl Fn(&str) -> Result<T>) -> Option<T> {
    let raw = read_text(tag, key)?;
    parse(&raw)
        .inspect_err(|err| tracing::debug!(field = %key, error = ?err, "Ignoring unparseable field"))
        .ok()
}

#[cfg(feature = "probe")]
fn apply_stream_info(path: &Path, metadata: &mut Metadata) {
    match crate::probe::probe(path, metadata.file_size.unwrap_or_default()) {
        Ok(info) => {
            metadata.duration = info.duration;
            metadata.bit_rate = info.bit_rate;
            metadata.variable_bit_rate = info.variable_bit_rate;
        },
        Err(err) => tracing::debug!(error = ?err, "Unable to probe audio stream"),
    }
}
