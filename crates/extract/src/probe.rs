//! Stream properties read from the audio itself rather than from tags.

use exn::{OptionExt, ResultExt};
use std::fs::File;
use std::path::Path;
use symphonia::core::codecs::{CODEC_TYPE_ALAC, CODEC_TYPE_FLAC, CODEC_TYPE_VORBIS, CodecParameters, CodecType};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::instrument;

use crate::error::{ErrorKind, Result};

/// Codecs that always encode at a variable bit rate.
///
/// MP3 and AAC can go either way and would need the stream headers (or a
/// full decode) to tell, so they are reported as constant.
const VARIABLE_BIT_RATE_CODECS: [CodecType; 3] = [CODEC_TYPE_FLAC, CODEC_TYPE_VORBIS, CODEC_TYPE_ALAC];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct StreamInfo {
    /// Whole seconds, rounded.
    pub duration: u32,
    /// Average kbit/s over the whole file, tags included.
    pub bit_rate: u32,
    pub variable_bit_rate: bool,
}
impl StreamInfo {
    fn from_params(params: &CodecParameters, file_size: u64) -> Self {
        let seconds = duration(params).unwrap_or_default();
        let bit_rate = if seconds > 0.0 { (file_size as f64 * 8.0 / seconds / 1000.0).round() as u32 } else { 0 };
        Self {
            duration: seconds.round() as u32,
            bit_rate,
            variable_bit_rate: VARIABLE_BIT_RATE_CODECS.contains(&params.codec),
        }
    }
}

/// Probe the default track of `path` for its stream properties.
#[instrument(level = "debug", skip(path), fields(path = %path.display()))]
pub(crate) fn probe(path: &Path, file_size: u64) -> Result<StreamInfo> {
    let error = || ErrorKind::Probe(path.to_path_buf());
    let file = File::open(path).or_raise(error)?;
    let stream = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());
    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }
    let probed = symphonia::default::get_probe()
        .format(&hint, stream, &FormatOptions::default(), &MetadataOptions::default())
        .or_raise(error)?;
    let track = probed.format.default_track().ok_or_raise(error)?;
    Ok(StreamInfo::from_params(&track.codec_params, file_size))
}

/// Duration in seconds: from the time base when the container declares one,
/// otherwise from the sample rate.
fn duration(params: &CodecParameters) -> Option<f64> {
    let frames = params.n_frames?;
    if let Some(time_base) = params.time_base {
        let time = time_base.calc_time(frames);
        return Some(time.seconds as f64 + time.frac);
    }
    let sample_rate = params.sample_rate.filter(|rate| *rate > 0)?;
    Some(frames as f64 / f64::from(sample_rate))
}
