//! WAV container helpers.

use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::warn;

use voxrelay_core::error::{Result, VoxError};

use crate::SAMPLE_RATE;

fn audio_err(e: hound::Error) -> VoxError {
    VoxError::Audio(e.to_string())
}

/// Wrap mono 16-bit PCM in a WAV container.
pub fn pcm_to_wav(pcm: &[i16], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + pcm.len() * 2));
    {
        let mut writer = WavWriter::new(&mut cursor, spec).map_err(audio_err)?;
        for &sample in pcm {
            writer.write_sample(sample).map_err(audio_err)?;
        }
        writer.finalize().map_err(audio_err)?;
    }

    Ok(cursor.into_inner())
}

/// Convert float samples in `[-1.0, 1.0]` to 16-bit PCM.
pub fn f32_to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s * 32767.0).clamp(-32768.0, 32767.0) as i16)
        .collect()
}

/// Format fields read back from a WAV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavInfo {
    pub sample_format: SampleFormat,
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    /// Samples per channel.
    pub frames: u32,
}

impl WavInfo {
    /// Whether this is the mono 16 kHz 16-bit PCM the recognizer expects.
    pub fn is_speech_format(&self) -> bool {
        self.sample_format == SampleFormat::Int
            && self.channels == 1
            && self.sample_rate == SAMPLE_RATE
            && self.bits_per_sample == 16
    }

    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.frames as u64 * 1000 / self.sample_rate as u64
    }
}

/// Read the format of an in-memory WAV file.
pub fn inspect_wav(bytes: &[u8]) -> Result<WavInfo> {
    let reader = WavReader::new(Cursor::new(bytes)).map_err(audio_err)?;
    let spec = reader.spec();
    Ok(WavInfo {
        sample_format: spec.sample_format,
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        frames: reader.duration(),
    })
}

/// Log a warning when a clip is not in the recognizer's preferred format.
///
/// Never fails: the service gets the clip either way.
pub fn check_speech_format(bytes: &[u8]) -> Option<WavInfo> {
    match inspect_wav(bytes) {
        Ok(info) => {
            if !info.is_speech_format() {
                warn!(
                    format = ?info.sample_format,
                    channels = info.channels,
                    sample_rate = info.sample_rate,
                    bits = info.bits_per_sample,
                    "Clip is not mono 16 kHz 16-bit PCM; recognition may degrade"
                );
            }
            Some(info)
        }
        Err(e) => {
            warn!(error = %e, bytes = bytes.len(), "Could not read WAV header");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// RIFF file from a raw `fmt ` body, an optional extra chunk and PCM data.
    fn riff(fmt: &[u8], extra: Option<(&[u8; 4], &[u8])>, data: &[u8]) -> Vec<u8> {
        let mut body = b"WAVE".to_vec();
        body.extend_from_slice(b"fmt ");
        body.extend_from_slice(&(fmt.len() as u32).to_le_bytes());
        body.extend_from_slice(fmt);
        if let Some((id, chunk)) = extra {
            body.extend_from_slice(id);
            body.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
            body.extend_from_slice(chunk);
            if chunk.len() % 2 == 1 {
                body.push(0);
            }
        }
        body.extend_from_slice(b"data");
        body.extend_from_slice(&(data.len() as u32).to_le_bytes());
        body.extend_from_slice(data);

        let mut wav = b"RIFF".to_vec();
        wav.extend_from_slice(&(body.len() as u32).to_le_bytes());
        wav.extend_from_slice(&body);
        wav
    }

    fn pcm_fmt(tag: u16, channels: u16, rate: u32) -> Vec<u8> {
        let mut fmt = Vec::new();
        fmt.extend_from_slice(&tag.to_le_bytes());
        fmt.extend_from_slice(&channels.to_le_bytes());
        fmt.extend_from_slice(&rate.to_le_bytes());
        fmt.extend_from_slice(&(rate * channels as u32 * 2).to_le_bytes());
        fmt.extend_from_slice(&(channels * 2).to_le_bytes());
        fmt.extend_from_slice(&16u16.to_le_bytes());
        fmt
    }

    #[test]
    fn test_pcm_to_wav_reads_back_as_speech_format() {
        let wav = pcm_to_wav(&[1i16; 16000], 16000).unwrap();
        assert_eq!(&wav[0..4], b"RIFF");

        let info = inspect_wav(&wav).unwrap();
        assert_eq!(info.channels, 1);
        assert_eq!(info.sample_rate, 16000);
        assert_eq!(info.bits_per_sample, 16);
        assert_eq!(info.frames, 16000);
        assert_eq!(info.duration_ms(), 1000);
        assert!(info.is_speech_format());
    }

    #[test]
    fn test_extensible_pcm_header_is_speech_format() {
        // WAVE_FORMAT_EXTENSIBLE with the KSDATAFORMAT_SUBTYPE_PCM sub-format
        let mut fmt = pcm_fmt(0xFFFE, 1, 16000);
        fmt.extend_from_slice(&22u16.to_le_bytes());
        fmt.extend_from_slice(&16u16.to_le_bytes());
        fmt.extend_from_slice(&4u32.to_le_bytes());
        fmt.extend_from_slice(&[
            0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x80, 0x00, 0x00, 0xAA, 0x00, 0x38,
            0x9B, 0x71,
        ]);
        let wav = riff(&fmt, None, &[0u8; 640]);

        let info = inspect_wav(&wav).unwrap();
        assert_eq!(info.sample_format, SampleFormat::Int);
        assert_eq!(info.frames, 320);
        assert!(info.is_speech_format());
        assert_eq!(check_speech_format(&wav), Some(info));
    }

    #[test]
    fn test_inspect_skips_unknown_chunks() {
        let wav = riff(
            &pcm_fmt(1, 2, 44100),
            Some((b"LIST", &b"abc"[..])),
            &[0u8; 16],
        );

        let info = inspect_wav(&wav).unwrap();
        assert_eq!(info.sample_rate, 44100);
        assert_eq!(info.channels, 2);
        assert_eq!(info.frames, 4);
        assert!(!info.is_speech_format());
    }

    #[test]
    fn test_inspect_rejects_non_wav() {
        assert!(inspect_wav(b"ID3\x03mp3 data here").is_err());
        assert!(inspect_wav(b"RIFF\0\0\0\0WAVE").is_err());
        assert!(check_speech_format(b"").is_none());
    }

    #[test]
    fn test_f32_conversion_clamps() {
        assert_eq!(f32_to_i16(&[0.0, 1.0, -1.0, 2.0]), vec![0, 32767, -32767, 32767]);
    }
}
