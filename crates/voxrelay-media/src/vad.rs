//! Energy-based voice activity detection on 16-bit PCM.

use tracing::debug;

/// Lowest threshold calibration may settle on.
pub const MIN_THRESHOLD: f64 = 300.0;
/// How far above the ambient level speech must rise.
pub const AMBIENT_RATIO: f64 = 1.5;

/// What a processed frame did to the detector state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VadEvent {
    SpeechStarted,
    SpeechEnded,
}

/// Voice activity detector using an RMS energy threshold.
pub struct VoiceActivityDetector {
    threshold: f64,
    /// Consecutive silent frames that end an utterance.
    min_silent_frames: usize,
    speech_active: bool,
    silent_count: usize,
}

impl VoiceActivityDetector {
    pub fn new(threshold: f64, min_silent_frames: usize) -> Self {
        Self {
            threshold,
            min_silent_frames,
            speech_active: false,
            silent_count: 0,
        }
    }

    /// Defaults for 16 kHz audio in 20 ms frames; 0.8 s of silence ends a phrase.
    pub fn default_16khz() -> Self {
        Self::new(MIN_THRESHOLD, 40)
    }

    pub fn rms(samples: &[i16]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
        (sum / samples.len() as f64).sqrt()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Set the threshold from frames of background noise.
    ///
    /// The new threshold sits [`AMBIENT_RATIO`] above the loudest ambient
    /// frame, and never below [`MIN_THRESHOLD`]. Returns the threshold.
    pub fn calibrate<'a>(&mut self, ambient: impl IntoIterator<Item = &'a [i16]>) -> f64 {
        let peak = ambient
            .into_iter()
            .map(Self::rms)
            .fold(0.0_f64, f64::max);
        self.threshold = (peak * AMBIENT_RATIO).max(MIN_THRESHOLD);
        debug!(ambient_rms = peak, threshold = self.threshold, "VAD calibrated");
        self.threshold
    }

    /// Feed one frame. Returns the state change it caused, if any.
    pub fn process_frame(&mut self, pcm: &[i16]) -> Option<VadEvent> {
        let is_speech = Self::rms(pcm) > self.threshold;

        if is_speech {
            self.silent_count = 0;
            if !self.speech_active {
                self.speech_active = true;
                return Some(VadEvent::SpeechStarted);
            }
        } else if self.speech_active {
            self.silent_count += 1;
            if self.silent_count >= self.min_silent_frames {
                self.speech_active = false;
                self.silent_count = 0;
                return Some(VadEvent::SpeechEnded);
            }
        }

        None
    }

    pub fn is_active(&self) -> bool {
        self.speech_active
    }

    pub fn reset(&mut self) {
        self.speech_active = false;
        self.silent_count = 0;
    }
}
