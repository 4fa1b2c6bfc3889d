//! Test fixtures shared between modules.

/// A silent 16-bit mono PCM WAV file at 8 kHz (128 kbit/s of audio data).
pub(crate) fn pcm_wav(seconds: u32) -> Vec<u8> {
    const SAMPLE_RATE: u32 = 8000;
    const BLOCK_ALIGN: u16 = 2;
    let data_len = SAMPLE_RATE * u32::from(BLOCK_ALIGN) * seconds;
    let mut wav = Vec::with_capacity(44 + data_len as usize);
    wav.extend(b"RIFF");
    wav.extend((36 + data_len).to_le_bytes());
    wav.extend(b"WAVE");
    wav.extend(b"fmt ");
    wav.extend(16u32.to_le_bytes());
    wav.extend(1u16.to_le_bytes()); // PCM
    wav.extend(1u16.to_le_bytes()); // mono
    wav.extend(SAMPLE_RATE.to_le_bytes());
    wav.extend((SAMPLE_RATE * u32::from(BLOCK_ALIGN)).to_le_bytes());
    wav.extend(BLOCK_ALIGN.to_le_bytes());
    wav.extend(16u16.to_le_bytes());
    wav.extend(b"data");
    wav.extend(data_len.to_le_bytes());
    wav.resize(44 + data_len as usize, 0);
    wav
}

/// An MPEG audio file without a tag. Only the tag codec reads it, so the
/// frames themselves are never decoded.
pub(crate) fn untagged_mp3() -> Vec<u8> {
    [0xFF, 0xFB, 0x90, 0x64].repeat(64)
}

/// A two second 16-bit stereo FLAC stream at 44.1 kHz carrying `comments`
/// (`KEY=value`) in a Vorbis comment block.
///
/// Only the header of the first frame is present: enough for a demuxer to
/// lock on, not enough to decode any audio.
pub(crate) fn flac(comments: &[&str]) -> Vec<u8> {
    const SAMPLE_RATE: u64 = 44_100;
    let mut flac = b"fLaC".to_vec();

    // STREAMINFO: 4096 sample blocks, frame sizes unknown, no MD5.
    flac.push(0x00);
    flac.extend(&34u32.to_be_bytes()[1..]);
    flac.extend(4096u16.to_be_bytes());
    flac.extend(4096u16.to_be_bytes());
    flac.extend([0; 6]);
    flac.extend(((SAMPLE_RATE << 44) | (1 << 41) | (15 << 36) | (SAMPLE_RATE * 2)).to_be_bytes());
    flac.extend([0; 16]);

    let mut block = Vec::new();
    let vendor = b"tagcache";
    block.extend((vendor.len() as u32).to_le_bytes());
    block.extend(vendor);
    block.extend((comments.len() as u32).to_le_bytes());
    for comment in comments {
        block.extend((comment.len() as u32).to_le_bytes());
        block.extend(comment.as_bytes());
    }
    // VORBIS_COMMENT, last metadata block.
    flac.push(0x84);
    flac.extend(&(block.len() as u32).to_be_bytes()[1..]);
    flac.extend(block);

    // Frame header: fixed blocking, 4096 samples, 44.1 kHz, stereo, 16 bit,
    // frame 0.
    let header = [0xFF, 0xF8, 0xC9, 0x18, 0x00];
    flac.extend(header);
    flac.push(crc8(&header));
    flac
}

/// CRC-8 with polynomial `x^8 + x^2 + x + 1`, as used by FLAC frame headers.
fn crc8(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |crc, byte| {
        (0..8).fold(crc ^ byte, |crc, _| if crc & 0x80 == 0 { crc << 1 } else { (crc << 1) ^ 0x07 })
    })
}
