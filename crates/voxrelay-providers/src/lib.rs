//! Service client abstraction.
//!
//! Each pipeline stage talks to one remote service through a trait
//! ([`Transcriber`], [`Translator`], [`ReplyGenerator`], [`Synthesizer`]).
//! The concrete clients speak the Azure Speech, Azure Translator, and
//! OpenAI-compatible chat-completion HTTP APIs.

use std::sync::Arc;

use async_trait::async_trait;

use voxrelay_core::config::Config;
use voxrelay_core::credentials::Credentials;
use voxrelay_core::error::ClientError;
use voxrelay_core::language::{ReplyLanguage, SpeechLocale};
use voxrelay_core::types::{Reply, SynthesizedAudio, Transcript};

pub mod chat;
pub mod http;
pub mod speech_to_text;
pub mod synthesis;
pub mod translator;

pub use http::HttpPolicy;

/// Speech-to-text over recorded audio.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Recognize speech in a WAV clip spoken in `locale`.
    ///
    /// A successful call that recognized nothing yields
    /// [`Transcript::unrecognized`], not an error.
    async fn transcribe(
        &self,
        audio: &[u8],
        locale: SpeechLocale,
        credentials: &Credentials,
    ) -> Result<Transcript, ClientError>;
}

/// Text translation into a target language.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        target: ReplyLanguage,
        credentials: &Credentials,
    ) -> Result<Reply, ClientError>;
}

/// Language-model reply generation.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        language: ReplyLanguage,
        credentials: &Credentials,
    ) -> Result<Reply, ClientError>;
}

/// Text-to-speech.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        locale: SpeechLocale,
        credentials: &Credentials,
    ) -> Result<SynthesizedAudio, ClientError>;
}

/// The four service clients a pipeline runs against.
#[derive(Clone)]
pub struct ServiceClients {
    pub transcriber: Arc<dyn Transcriber>,
    pub translator: Arc<dyn Translator>,
    pub generator: Arc<dyn ReplyGenerator>,
    pub synthesizer: Arc<dyn Synthesizer>,
}

impl ServiceClients {
    /// Build the HTTP-backed clients described by `config`.
    pub fn from_config(config: &Config) -> Self {
        let policy = HttpPolicy::from(&config.http());
        let speech = config.speech.clone().unwrap_or_default();
        let translator = config.translator.clone().unwrap_or_default();

        let mut stt = speech_to_text::AzureSpeechToText::new(policy.clone());
        if let Some(url) = speech.stt_base_url.as_deref() {
            stt = stt.with_base_url(url);
        }

        let mut tts = synthesis::AzureSynthesizer::new(policy.clone());
        if let Some(url) = speech.tts_base_url.as_deref() {
            tts = tts.with_base_url(url);
        }
        if let Some(format) = speech.output_format.as_deref() {
            tts = tts.with_output_format(format);
        }

        let mut trans = translator::AzureTranslator::new(policy.clone());
        if let Some(endpoint) = translator.endpoint.as_deref() {
            trans = trans.with_endpoint(endpoint);
        }
        if let Some(version) = translator.api_version.as_deref() {
            trans = trans.with_api_version(version);
        }

        let chat = chat::ChatCompletionClient::from_config(&config.llm(), policy);

        Self {
            transcriber: Arc::new(stt),
            translator: Arc::new(trans),
            generator: Arc::new(chat),
            synthesizer: Arc::new(tts),
        }
    }
}
