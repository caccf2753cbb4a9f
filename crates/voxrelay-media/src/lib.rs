//! Audio clip handling — WAV encoding, temp-file spooling, energy VAD,
//! and listen-until-silence capture.

pub mod capture;
pub mod listen;
#[cfg(feature = "microphone")]
pub mod microphone;
pub mod spool;
pub mod stream;
pub mod vad;
pub mod wav;

pub use capture::load_clip;
pub use listen::{ListenOptions, PcmBuffer, PcmSource, listen};
pub use spool::SpooledClip;
pub use wav::{WavInfo, inspect_wav, pcm_to_wav};

/// Sample rate clips are recorded and sent at.
pub const SAMPLE_RATE: u32 = 16000;
