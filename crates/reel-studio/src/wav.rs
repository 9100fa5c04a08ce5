//! WAV wrapping for raw PCM returned by speech synthesis.

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::error::StudioResult;

pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;

/// Sample rate declared by an `audio/L16;codec=pcm;rate=24000` style MIME type.
pub fn sample_rate_from_mime(mime: &str) -> u32 {
    mime.split(';')
        .filter_map(|param| param.trim().strip_prefix("rate="))
        .find_map(|rate| rate.trim().parse().ok())
        .unwrap_or(DEFAULT_SAMPLE_RATE)
}

/// Whether the MIME type describes headerless 16-bit PCM.
pub fn is_raw_pcm(mime: &str) -> bool {
    let base = mime.split(';').next().unwrap_or_default().trim();
    base.eq_ignore_ascii_case("audio/L16") || base.eq_ignore_ascii_case("audio/pcm")
}

/// Wrap little-endian signed 16-bit PCM in a WAV container.
///
/// A trailing odd byte is dropped.
pub fn pcm16_to_wav(pcm: &[u8], sample_rate: u32, channels: u16) -> StudioResult<Vec<u8>> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(pcm.len() + 44));
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for chunk in pcm.chunks_exact(2) {
            writer.write_sample(i16::from_le_bytes([chunk[0], chunk[1]]))?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}
