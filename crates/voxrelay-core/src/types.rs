use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Text shown when the service heard the audio but recognized nothing.
pub const UNRECOGNIZED_SPEECH: &str = "Speech not recognized!";

/// Recorded audio, expected to be mono 16-bit PCM WAV.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioClip {
    pub data: Vec<u8>,
}

impl AudioClip {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }
}

/// Result of a successful speech-to-text call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    /// False when `text` is the fallback rather than recognized speech.
    pub recognized: bool,
}

impl Transcript {
    pub fn recognized(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            recognized: true,
        }
    }

    pub fn unrecognized() -> Self {
        Self {
            text: UNRECOGNIZED_SPEECH.to_string(),
            recognized: false,
        }
    }
}

/// Which downstream processor turned the transcript into a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Processor {
    Translation,
    LanguageModel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    pub processor: Processor,
}

/// Compressed audio returned by the synthesis service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// Pipeline flavor: which processor runs and whether a spoken reply is produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineMode {
    /// Transcribe, ask the language model, speak the answer.
    #[default]
    Assistant,
    /// Transcribe, ask the language model, text only.
    Chat,
    /// Transcribe, translate, optionally speak the translation.
    Translate,
}

impl PipelineMode {
    pub fn processor(self) -> Processor {
        match self {
            Self::Assistant | Self::Chat => Processor::LanguageModel,
            Self::Translate => Processor::Translation,
        }
    }

    /// Whether a run in this mode speaks its reply by default.
    /// Translations are spoken only when `speak_translation` is set.
    pub fn speaks_reply(self, speak_translation: bool) -> bool {
        match self {
            Self::Assistant => true,
            Self::Chat => false,
            Self::Translate => speak_translation,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assistant => "assistant",
            Self::Chat => "chat",
            Self::Translate => "translate",
        }
    }
}

impl std::str::FromStr for PipelineMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "assistant" => Ok(Self::Assistant),
            "chat" => Ok(Self::Chat),
            "translate" => Ok(Self::Translate),
            other => Err(format!("unknown pipeline mode '{other}'")),
        }
    }
}

/// One exchange in the session history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "user")]
    pub user_text: String,
    #[serde(rename = "llm")]
    pub reply_text: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrecognized_transcript_uses_fallback() {
        let t = Transcript::unrecognized();
        assert_eq!(t.text, UNRECOGNIZED_SPEECH);
        assert!(!t.recognized);
    }

    #[test]
    fn test_history_entry_wire_shape() {
        let entry = HistoryEntry {
            user_text: "hello".into(),
            reply_text: "hi".into(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["user"], "hello");
        assert_eq!(json["llm"], "hi");
    }

    #[test]
    fn test_pipeline_mode_parse() {
        assert_eq!("Translate".parse::<PipelineMode>().unwrap(), PipelineMode::Translate);
        assert_eq!(PipelineMode::Chat.processor(), Processor::LanguageModel);
        assert!("karaoke".parse::<PipelineMode>().is_err());
    }

    #[test]
    fn test_default_spoken_reply_per_mode() {
        assert!(PipelineMode::Assistant.speaks_reply(false));
        assert!(!PipelineMode::Chat.speaks_reply(true));
        assert!(!PipelineMode::Translate.speaks_reply(false));
        assert!(PipelineMode::Translate.speaks_reply(true));
    }
}
