//! Calibrate, then listen until the speaker stops.

use std::time::Duration;

use tracing::{debug, info};

use voxrelay_core::error::Result;
use voxrelay_core::types::AudioClip;

use crate::vad::{VadEvent, VoiceActivityDetector};
use crate::wav::pcm_to_wav;

/// A blocking source of mono 16-bit PCM.
pub trait PcmSource {
    fn sample_rate(&self) -> u32;

    /// Read the next `len` samples. `Ok(None)` means the source is exhausted;
    /// a short final frame is allowed.
    fn read_frame(&mut self, len: usize) -> Result<Option<Vec<i16>>>;
}

/// In-memory PCM, used for files already decoded and for tests.
pub struct PcmBuffer {
    samples: Vec<i16>,
    pos: usize,
    sample_rate: u32,
}

impl PcmBuffer {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            pos: 0,
            sample_rate,
        }
    }
}

impl PcmSource for PcmBuffer {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read_frame(&mut self, len: usize) -> Result<Option<Vec<i16>>> {
        if self.pos >= self.samples.len() {
            return Ok(None);
        }
        let end = (self.pos + len).min(self.samples.len());
        let frame = self.samples[self.pos..end].to_vec();
        self.pos = end;
        Ok(Some(frame))
    }
}

#[derive(Debug, Clone)]
pub struct ListenOptions {
    /// Background noise sampled before listening.
    pub calibration: Duration,
    /// Give up if nobody starts speaking within this window.
    pub start_timeout: Option<Duration>,
    /// Cut the phrase off after this long.
    pub phrase_limit: Option<Duration>,
    pub frame: Duration,
}

impl Default for ListenOptions {
    fn default() -> Self {
        Self {
            calibration: Duration::from_secs(1),
            start_timeout: Some(Duration::from_secs(10)),
            phrase_limit: Some(Duration::from_secs(15)),
            frame: Duration::from_millis(20),
        }
    }
}

fn frames_in(window: Duration, frame: Duration) -> usize {
    let frame_ms = frame.as_millis().max(1);
    (window.as_millis() / frame_ms) as usize
}

/// Capture one utterance from `source`.
///
/// Returns `Ok(None)` when no speech was heard before the start timeout or
/// the end of the source.
pub fn listen(source: &mut dyn PcmSource, options: &ListenOptions) -> Result<Option<Vec<i16>>> {
    let rate = source.sample_rate();
    let frame_len = ((rate as u128 * options.frame.as_millis()) / 1000).max(1) as usize;
    let mut vad = VoiceActivityDetector::default_16khz();

    let mut ambient = Vec::new();
    for _ in 0..frames_in(options.calibration, options.frame) {
        match source.read_frame(frame_len)? {
            Some(frame) => ambient.push(frame),
            None => break,
        }
    }
    vad.calibrate(ambient.iter().map(Vec::as_slice));

    let start_limit = options.start_timeout.map(|d| frames_in(d, options.frame));
    let phrase_limit = options.phrase_limit.map(|d| frames_in(d, options.frame));

    let mut utterance: Vec<i16> = Vec::new();
    let mut waited = 0usize;
    let mut spoken = 0usize;

    while let Some(frame) = source.read_frame(frame_len)? {
        let event = vad.process_frame(&frame);

        if !vad.is_active() && utterance.is_empty() {
            waited += 1;
            if start_limit.is_some_and(|limit| waited >= limit) {
                debug!(waited_frames = waited, "No speech before start timeout");
                break;
            }
            continue;
        }

        utterance.extend_from_slice(&frame);
        spoken += 1;

        if event == Some(VadEvent::SpeechEnded) {
            debug!(frames = spoken, "End of utterance");
            break;
        }
        if phrase_limit.is_some_and(|limit| spoken >= limit) {
            debug!(frames = spoken, "Phrase time limit reached");
            break;
        }
    }

    if utterance.is_empty() {
        info!("No speech heard");
        return Ok(None);
    }

    info!(
        duration_ms = utterance.len() as u64 * 1000 / rate.max(1) as u64,
        "Utterance captured"
    );
    Ok(Some(utterance))
}

/// Wrap captured PCM as a mono 16-bit WAV clip.
pub fn to_clip(pcm: &[i16], sample_rate: u32) -> Result<AudioClip> {
    Ok(AudioClip::new(pcm_to_wav(pcm, sample_rate)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SAMPLE_RATE;
    use crate::wav::inspect_wav;

    const FRAME: usize = 320;

    fn frames(level: i16, count: usize) -> Vec<i16> {
        vec![level; FRAME * count]
    }

    fn fast_options() -> ListenOptions {
        ListenOptions {
            calibration: Duration::from_millis(100),
            ..ListenOptions::default()
        }
    }

    #[test]
    fn test_captures_speech_until_silence() {
        let mut samples = frames(50, 5); // calibration
        samples.extend(frames(0, 3));
        samples.extend(frames(4000, 10));
        samples.extend(frames(0, 60));
        let mut source = PcmBuffer::new(samples, SAMPLE_RATE);

        let pcm = listen(&mut source, &fast_options()).unwrap().unwrap();
        // Ten speech frames plus the trailing silence that ended the phrase
        assert_eq!(pcm.len(), FRAME * (10 + 40));
        assert!(pcm[..FRAME * 10].iter().all(|&s| s == 4000));
    }

    #[test]
    fn test_ambient_noise_is_not_speech() {
        let mut samples = frames(900, 5);
        samples.extend(frames(900, 20));
        let mut source = PcmBuffer::new(samples, SAMPLE_RATE);

        assert!(listen(&mut source, &fast_options()).unwrap().is_none());
    }

    #[test]
    fn test_phrase_limit_cuts_long_speech() {
        let mut samples = frames(0, 5);
        samples.extend(frames(4000, 500));
        let mut source = PcmBuffer::new(samples, SAMPLE_RATE);
        let options = ListenOptions {
            phrase_limit: Some(Duration::from_millis(200)),
            ..fast_options()
        };

        let pcm = listen(&mut source, &options).unwrap().unwrap();
        assert_eq!(pcm.len(), FRAME * 10);
    }

    #[test]
    fn test_start_timeout_gives_up() {
        let mut samples = frames(0, 5);
        samples.extend(frames(0, 100));
        samples.extend(frames(4000, 10));
        let mut source = PcmBuffer::new(samples, SAMPLE_RATE);
        let options = ListenOptions {
            start_timeout: Some(Duration::from_millis(400)),
            ..fast_options()
        };

        assert!(listen(&mut source, &options).unwrap().is_none());
    }

    #[test]
    fn test_source_ending_mid_phrase_keeps_audio() {
        let mut samples = frames(0, 5);
        samples.extend(frames(4000, 4));
        let mut source = PcmBuffer::new(samples, SAMPLE_RATE);

        let pcm = listen(&mut source, &fast_options()).unwrap().unwrap();
        assert_eq!(pcm.len(), FRAME * 4);
    }

    #[test]
    fn test_to_clip_is_speech_wav() {
        let clip = to_clip(&frames(1, 50), SAMPLE_RATE).unwrap();
        let info = inspect_wav(&clip.data).unwrap();
        assert!(info.is_speech_format());
        assert_eq!(info.duration_ms(), 1000);
    }
}
