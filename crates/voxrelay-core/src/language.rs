//! Fixed language enumerations and the synthesis voice table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Locale of the user's speech. Also selects the synthesis voice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeechLocale {
    #[default]
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "ur-PK")]
    UrPk,
    #[serde(rename = "hi-IN")]
    HiIn,
    #[serde(rename = "fr-FR")]
    FrFr,
    #[serde(rename = "de-DE")]
    DeDe,
    #[serde(rename = "zh-CN")]
    ZhCn,
}

impl SpeechLocale {
    pub const ALL: [SpeechLocale; 6] = [
        Self::EnUs,
        Self::UrPk,
        Self::HiIn,
        Self::FrFr,
        Self::DeDe,
        Self::ZhCn,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::UrPk => "ur-PK",
            Self::HiIn => "hi-IN",
            Self::FrFr => "fr-FR",
            Self::DeDe => "de-DE",
            Self::ZhCn => "zh-CN",
        }
    }

    /// Neural voice used when synthesizing speech in this locale.
    pub fn voice(self) -> &'static str {
        match self {
            Self::EnUs => "en-US-JennyNeural",
            Self::UrPk => "ur-PK-UzmaNeural",
            Self::HiIn => "hi-IN-SwaraNeural",
            Self::FrFr => "fr-FR-DeniseNeural",
            Self::DeDe => "de-DE-KatjaNeural",
            Self::ZhCn => "zh-CN-XiaoxiaoNeural",
        }
    }
}

impl fmt::Display for SpeechLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpeechLocale {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ClientError::UnsupportedLanguage(s.to_string()))
    }
}

/// Look up the synthesis voice for a raw locale tag, failing closed.
pub fn voice_for_tag(tag: &str) -> Result<&'static str, ClientError> {
    tag.parse::<SpeechLocale>().map(SpeechLocale::voice)
}

/// Language the reply (translation or generation) should be written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyLanguage {
    #[default]
    En,
    Ur,
    Hi,
    Fr,
    De,
    Zh,
}

impl ReplyLanguage {
    pub const ALL: [ReplyLanguage; 6] = [
        Self::En,
        Self::Ur,
        Self::Hi,
        Self::Fr,
        Self::De,
        Self::Zh,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ur => "ur",
            Self::Hi => "hi",
            Self::Fr => "fr",
            Self::De => "de",
            Self::Zh => "zh",
        }
    }

    /// English name, used in the reply-language instruction.
    pub fn name(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Ur => "Urdu",
            Self::Hi => "Hindi",
            Self::Fr => "French",
            Self::De => "German",
            Self::Zh => "Chinese",
        }
    }

    /// Translator target tag. Chinese needs the script subtag.
    pub fn translator_tag(self) -> &'static str {
        match self {
            Self::Zh => "zh-Hans",
            other => other.code(),
        }
    }

    /// Speech locale whose voice reads text in this language.
    pub fn locale(self) -> SpeechLocale {
        match self {
            Self::En => SpeechLocale::EnUs,
            Self::Ur => SpeechLocale::UrPk,
            Self::Hi => SpeechLocale::HiIn,
            Self::Fr => SpeechLocale::FrFr,
            Self::De => SpeechLocale::DeDe,
            Self::Zh => SpeechLocale::ZhCn,
        }
    }
}

impl fmt::Display for ReplyLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ReplyLanguage {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|l| l.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ClientError::UnsupportedLanguage(s.to_string()))
    }
}

/// Input locale and output language chosen for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSelection {
    pub speech: SpeechLocale,
    pub reply: ReplyLanguage,
}
