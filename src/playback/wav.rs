//! WAV container for the backend's raw PCM audio.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;

pub const SAMPLE_RATE: u32 = 16_000;
pub const CHANNELS: u16 = 1;
pub const BITS_PER_SAMPLE: u16 = 16;

pub fn pcm_spec() -> WavSpec {
    WavSpec {
        channels: CHANNELS,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    }
}

/// Decode a frame's base64 audio payload into raw PCM bytes.
pub fn decode_audio(encoded: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(encoded.trim().as_bytes())
        .context("Audio payload is not valid base64")
}

/// Wrap little-endian 16-bit mono PCM in a WAV header. A trailing odd byte is dropped.
pub fn pcm16_to_wav(pcm: &[u8]) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::with_capacity(pcm.len() + 44));
    {
        let mut writer =
            WavWriter::new(&mut cursor, pcm_spec()).context("Failed to start WAV writer")?;
        for sample in pcm.chunks_exact(2) {
            writer.write_sample(i16::from_le_bytes([sample[0], sample[1]]))?;
        }
        writer.finalize().context("Failed to finalize WAV data")?;
    }
    Ok(cursor.into_inner())
}

/// base64 PCM straight to a playable WAV buffer.
pub fn encoded_pcm_to_wav(encoded: &str) -> Result<Vec<u8>> {
    pcm16_to_wav(&decode_audio(encoded)?)
}
