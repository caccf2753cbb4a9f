//! Loading recorded clips from disk.

use std::path::Path;

use tracing::{debug, info};

use voxrelay_core::error::Result;
use voxrelay_core::types::AudioClip;

use crate::wav::check_speech_format;

/// Read a recorded clip. An empty file is "no audio" (`Ok(None)`).
pub fn load_clip(path: &Path) -> Result<Option<AudioClip>> {
    let data = std::fs::read(path)?;
    if data.is_empty() {
        debug!(path = %path.display(), "Clip file is empty");
        return Ok(None);
    }

    if let Some(wav) = check_speech_format(&data) {
        info!(
            path = %path.display(),
            duration_ms = wav.duration_ms(),
            sample_rate = wav.sample_rate,
            "Clip loaded"
        );
    }
    Ok(Some(AudioClip::new(data)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wav::pcm_to_wav;
    use voxrelay_core::error::VoxError;

    #[test]
    fn test_load_wav_clip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        let wav = pcm_to_wav(&[5i16; 320], 16000).unwrap();
        std::fs::write(&path, &wav).unwrap();

        let clip = load_clip(&path).unwrap().unwrap();
        assert_eq!(clip.data, wav);
    }

    #[test]
    fn test_empty_file_is_no_audio() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        std::fs::write(&path, b"").unwrap();
        assert!(load_clip(&path).unwrap().is_none());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_clip(Path::new("/nonexistent/voxrelay/clip.wav")).unwrap_err();
        assert!(matches!(err, VoxError::Io(_)));
    }
}
