//! The run sequence: spool → transcribe → translate | generate → synthesize → remember.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, info, warn};

use voxrelay_core::config::Config;
use voxrelay_core::error::Service;
use voxrelay_core::language::{LanguageSelection, SpeechLocale};
use voxrelay_core::session::SessionContext;
use voxrelay_core::types::{AudioClip, PipelineMode, Processor};
use voxrelay_media::spool::SpooledClip;
use voxrelay_media::wav::check_speech_format;
use voxrelay_providers::ServiceClients;

use crate::{NO_AUDIO_MESSAGE, RunOutcome, StageFailure};

/// Per-run overrides of the session's settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunRequest {
    pub languages: Option<LanguageSelection>,
    pub mode: Option<PipelineMode>,
    /// Force spoken output on or off regardless of mode.
    pub synthesize: Option<bool>,
}

pub struct Pipeline {
    clients: ServiceClients,
    spool_dir: PathBuf,
    speak_translation: bool,
}

/// User message naming the credentials a mode still needs.
pub fn missing_credentials_message(mode: PipelineMode, missing: &[&str]) -> String {
    let services = match mode {
        PipelineMode::Translate => "Azure Speech & Translator",
        PipelineMode::Assistant | PipelineMode::Chat => "Azure & OpenRouter",
    };
    format!("Enter {services} API keys (missing: {}).", missing.join(", "))
}

impl Pipeline {
    pub fn new(clients: ServiceClients, spool_dir: PathBuf) -> Self {
        Self {
            clients,
            spool_dir,
            speak_translation: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(ServiceClients::from_config(config), config.spool_dir())
            .with_speak_translation(config.speak_translation())
    }

    pub fn with_speak_translation(mut self, speak: bool) -> Self {
        self.speak_translation = speak;
        self
    }

    /// Execute one run against `ctx`.
    ///
    /// Stages run strictly in order and a failed stage skips everything
    /// after it. History is only appended once a reply exists.
    pub async fn run(
        &self,
        ctx: &mut SessionContext,
        clip: Option<AudioClip>,
        request: RunRequest,
    ) -> RunOutcome {
        let start = Instant::now();
        let mode = request.mode.unwrap_or(ctx.mode);
        let languages = request.languages.unwrap_or(ctx.languages);
        let synthesize = request
            .synthesize
            .unwrap_or_else(|| mode.speaks_reply(self.speak_translation));

        let mut outcome = RunOutcome::new(mode, languages);
        self.execute(ctx, clip, synthesize, &mut outcome).await;

        outcome.history = ctx.history.render_all().to_vec();
        outcome.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            mode = mode.as_str(),
            speech = %languages.speech,
            reply = %languages.reply,
            complete = outcome.is_complete(),
            errors = outcome.errors.len(),
            duration_ms = outcome.duration_ms,
            "Pipeline run finished"
        );
        outcome
    }

    async fn execute(
        &self,
        ctx: &mut SessionContext,
        clip: Option<AudioClip>,
        synthesize: bool,
        outcome: &mut RunOutcome,
    ) {
        let mode = outcome.mode;
        let languages = outcome.languages;

        // 1. Something to work with
        let Some(clip) = clip.filter(|c| !c.is_empty()) else {
            debug!("Run triggered without audio");
            outcome.messages.push(NO_AUDIO_MESSAGE.to_string());
            return;
        };

        let missing = ctx.credentials.missing_for(mode);
        if !missing.is_empty() {
            debug!(?missing, "Run triggered without credentials");
            outcome
                .messages
                .push(missing_credentials_message(mode, &missing));
            return;
        }

        // 2. Spool, transcribe, always remove the temp file
        let mut spooled = match SpooledClip::create(&self.spool_dir, &clip) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, dir = %self.spool_dir.display(), "Could not spool clip");
                outcome
                    .messages
                    .push(format!("Error: could not store the recording: {e}"));
                return;
            }
        };
        outcome.clip_path = Some(spooled.path().to_path_buf());

        let transcribed = match spooled.read() {
            Ok(audio) => {
                check_speech_format(&audio);
                Ok(self
                    .clients
                    .transcriber
                    .transcribe(&audio, languages.speech, &ctx.credentials)
                    .await)
            }
            Err(e) => Err(e),
        };
        if let Err(e) = spooled.close() {
            warn!(error = %e, "Could not remove spooled clip");
        }

        let transcript = match transcribed {
            Ok(Ok(t)) => t,
            Ok(Err(err)) => {
                outcome
                    .errors
                    .push(StageFailure::new(Service::SpeechToText, &err));
                return;
            }
            Err(e) => {
                outcome
                    .messages
                    .push(format!("Error: could not read the recording: {e}"));
                return;
            }
        };
        outcome.transcript = Some(transcript.clone());

        if !transcript.recognized {
            debug!("Nothing recognized; skipping reply");
            return;
        }

        // 3. Reply
        let (service, result) = match mode.processor() {
            Processor::Translation => (
                Service::Translation,
                self.clients
                    .translator
                    .translate(&transcript.text, languages.reply, &ctx.credentials)
                    .await,
            ),
            Processor::LanguageModel => (
                Service::ChatCompletion,
                self.clients
                    .generator
                    .generate(&transcript.text, languages.reply, &ctx.credentials)
                    .await,
            ),
        };
        let reply = match result {
            Ok(reply) => reply,
            Err(err) => {
                outcome.errors.push(StageFailure::new(service, &err));
                return;
            }
        };

        ctx.history.append(&transcript.text, &reply.text);
        outcome.reply = Some(reply.clone());

        // 4. Speak
        if !synthesize {
            return;
        }
        let voice_locale = synthesis_locale(mode, languages);
        match self
            .clients
            .synthesizer
            .synthesize(&reply.text, voice_locale, &ctx.credentials)
            .await
        {
            Ok(audio) => outcome.audio = Some(audio),
            Err(err) => outcome
                .errors
                .push(StageFailure::new(Service::TextToSpeech, &err)),
        }
    }
}

/// Voice for the reply: translations are read in the target language's
/// voice, assistant answers in the speaker's locale.
fn synthesis_locale(mode: PipelineMode, languages: LanguageSelection) -> SpeechLocale {
    match mode {
        PipelineMode::Translate => languages.reply.locale(),
        PipelineMode::Assistant | PipelineMode::Chat => languages.speech,
    }
}
