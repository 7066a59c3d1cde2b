//! 16-bit little-endian PCM conversion for the realtime wire format.
//!
//! Capture runs at 16 kHz and playback at 24 kHz, both mono. These rates are fixed by the
//! remote model.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{VoiceError, VoiceResult};

pub const INPUT_SAMPLE_RATE: u32 = 16_000;
pub const OUTPUT_SAMPLE_RATE: u32 = 24_000;

/// Samples per capture frame.
pub const FRAME_SAMPLES: usize = 4096;

/// MIME type announced with every outbound media chunk.
pub const INPUT_MIME: &str = "audio/pcm;rate=16000";

/// `sample * 32768`, saturated to the i16 range.
#[inline]
pub fn to_i16(sample: f32) -> i16 {
    if sample.is_nan() {
        return 0;
    }
    (sample * 32768.0).clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
}

#[inline]
pub fn to_f32(sample: i16) -> f32 {
    f32::from(sample) / 32768.0
}

/// Float samples to little-endian i16 bytes.
pub fn encode_samples(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        bytes.extend_from_slice(&to_i16(s).to_le_bytes());
    }
    bytes
}

/// Little-endian i16 bytes to float samples. A trailing odd byte is dropped.
pub fn decode_samples(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| to_f32(i16::from_le_bytes([pair[0], pair[1]])))
        .collect()
}

/// One capture frame as the base64 payload of a media chunk.
pub fn encode_frame(samples: &[f32]) -> String {
    STANDARD.encode(encode_samples(samples))
}

/// Base64 payload of an inbound audio part to float samples.
pub fn decode_chunk(data: &str) -> VoiceResult<Vec<f32>> {
    let bytes = STANDARD
        .decode(data.as_bytes())
        .map_err(|e| VoiceError::Protocol(format!("audio payload is not base64: {}", e)))?;
    Ok(decode_samples(&bytes))
}

/// Playback length of `samples` at `sample_rate`, in seconds.
pub fn duration_secs(samples: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    samples as f64 / f64::from(sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturates_out_of_range_samples() {
        assert_eq!(to_i16(1.0), i16::MAX);
        assert_eq!(to_i16(-1.0), i16::MIN);
        assert_eq!(to_i16(3.5), i16::MAX);
        assert_eq!(to_i16(f32::NAN), 0);
        assert_eq!(to_i16(0.5), 16384);
    }

    #[test]
    fn test_little_endian_layout() {
        assert_eq!(encode_samples(&[0.5]), vec![0x00, 0x40]);
        assert_eq!(decode_samples(&[0x00, 0x40, 0x7f]), vec![0.5]);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode_chunk("***"), Err(VoiceError::Protocol(_))));
    }

    #[test]
    fn test_frame_duration() {
        assert_eq!(duration_secs(24_000, OUTPUT_SAMPLE_RATE), 1.0);
        assert_eq!(duration_secs(FRAME_SAMPLES, INPUT_SAMPLE_RATE), 0.256);
    }
}
