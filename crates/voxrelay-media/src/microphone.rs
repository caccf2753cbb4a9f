//! Default input device as a [`PcmSource`].

use std::sync::Arc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream, StreamConfig};
use tracing::{debug, error};

use voxrelay_core::error::{Result, VoxError};

use crate::SAMPLE_RATE;
use crate::listen::PcmSource;
use crate::stream::StreamBuffer;
use crate::wav::f32_to_i16;

/// Longest a frame read waits for the device before giving up.
const STALL_TIMEOUT: Duration = Duration::from_secs(1);

/// Captures mono 16 kHz audio from the default input device.
///
/// Frames are read by blocking until enough samples have arrived. A stream
/// error or a device that stops delivering samples fails the read.
pub struct MicrophoneSource {
    buffer: Arc<StreamBuffer>,
    _stream: Stream,
}

impl MicrophoneSource {
    /// Open the default input device and start capturing.
    pub fn open() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| VoxError::Audio("no input device available".into()))?;

        let supported = device
            .supported_input_configs()
            .map_err(|e| VoxError::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .ok_or_else(|| VoxError::Audio("no mono 16 kHz input config".into()))?;
        let config: StreamConfig = supported.with_sample_rate(SampleRate(SAMPLE_RATE)).config();

        debug!(
            device = %device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            "Microphone opened"
        );

        let buffer = Arc::new(StreamBuffer::new());
        let sink = Arc::clone(&buffer);
        let failures = Arc::clone(&buffer);
        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| sink.push(data),
                move |err| {
                    error!(error = %err, "Microphone stream error");
                    failures.fail(err.to_string());
                },
                None,
            )
            .map_err(|e| VoxError::Audio(e.to_string()))?;
        stream.play().map_err(|e| VoxError::Audio(e.to_string()))?;

        Ok(Self {
            buffer,
            _stream: stream,
        })
    }
}

impl PcmSource for MicrophoneSource {
    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn read_frame(&mut self, len: usize) -> Result<Option<Vec<i16>>> {
        let samples = self.buffer.wait_for(len, STALL_TIMEOUT)?;
        Ok(Some(f32_to_i16(&samples)))
    }
}
