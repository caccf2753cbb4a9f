//! Voice pipeline — one run turns a recorded clip into a transcript, a
//! reply, optionally spoken audio, and a history entry.
//!
//! A run never aborts with an error: every failure is captured in the
//! [`RunOutcome`] so callers can present partial results.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use voxrelay_core::error::{ClientError, ErrorKind, Service, StageError};
use voxrelay_core::language::LanguageSelection;
use voxrelay_core::types::{HistoryEntry, PipelineMode, Reply, SynthesizedAudio, Transcript};

pub mod pipeline;
pub mod render;

pub use pipeline::{Pipeline, RunRequest};

/// Message shown when a run is triggered without audio.
pub const NO_AUDIO_MESSAGE: &str = "Please record audio first!";

/// A failed service call inside a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFailure {
    pub service: Service,
    #[serde(flatten)]
    pub error: StageError,
}

impl StageFailure {
    pub fn new(service: Service, err: &ClientError) -> Self {
        Self {
            service,
            error: StageError::from(err),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind
    }
}

/// Everything a single run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub mode: PipelineMode,
    pub languages: LanguageSelection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<Transcript>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<Reply>,
    /// Raw audio is left to the caller to encode.
    #[serde(skip)]
    pub audio: Option<SynthesizedAudio>,
    /// User-facing notices that are not service failures.
    pub messages: Vec<String>,
    pub errors: Vec<StageFailure>,
    /// Temporary file the clip was spooled to; removed by the time the run returns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip_path: Option<PathBuf>,
    pub history: Vec<HistoryEntry>,
    pub duration_ms: u64,
}

impl RunOutcome {
    pub(crate) fn new(mode: PipelineMode, languages: LanguageSelection) -> Self {
        Self {
            mode,
            languages,
            transcript: None,
            reply: None,
            audio: None,
            messages: Vec::new(),
            errors: Vec::new(),
            clip_path: None,
            history: Vec::new(),
            duration_ms: 0,
        }
    }

    /// True when every stage the mode calls for produced its result.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty() && self.messages.is_empty() && self.reply.is_some()
    }

    pub fn failure_for(&self, service: Service) -> Option<&StageFailure> {
        self.errors.iter().find(|f| f.service == service)
    }
}
