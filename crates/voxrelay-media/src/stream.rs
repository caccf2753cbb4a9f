//! Sample buffer shared between a capture callback and a blocking reader.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use voxrelay_core::error::{Result, VoxError};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Default)]
struct State {
    samples: Vec<f32>,
    failure: Option<String>,
}

/// Samples pushed by a device callback and drained frame by frame.
///
/// A reader never waits longer than its stall timeout, and a recorded stream
/// failure ends every later read.
#[derive(Default)]
pub struct StreamBuffer {
    state: Mutex<State>,
}

impl StreamBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, data: &[f32]) {
        if let Ok(mut state) = self.state.lock() {
            state.samples.extend_from_slice(data);
        }
    }

    /// Record that the stream stopped with `reason`.
    pub fn fail(&self, reason: impl Into<String>) {
        if let Ok(mut state) = self.state.lock() {
            state.failure.get_or_insert_with(|| reason.into());
        }
    }

    fn take(&self, len: usize) -> Result<Option<Vec<f32>>> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| VoxError::Audio("capture buffer poisoned".into()))?;
        if let Some(reason) = &state.failure {
            return Err(VoxError::Audio(format!("input stream failed: {reason}")));
        }
        if state.samples.len() < len {
            return Ok(None);
        }
        Ok(Some(state.samples.drain(..len).collect()))
    }

    /// Block until `len` samples are buffered, the stream fails, or `stall`
    /// passes without enough samples.
    pub fn wait_for(&self, len: usize, stall: Duration) -> Result<Vec<f32>> {
        let deadline = Instant::now() + stall;
        loop {
            if let Some(samples) = self.take(len)? {
                return Ok(samples);
            }
            if Instant::now() >= deadline {
                return Err(VoxError::Audio(format!(
                    "input device delivered no audio for {}ms",
                    stall.as_millis()
                )));
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}
