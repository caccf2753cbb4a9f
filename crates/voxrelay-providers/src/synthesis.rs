//! Azure Speech text-to-speech via SSML.

use async_trait::async_trait;
use tracing::{debug, info};

use voxrelay_core::credentials::Credentials;
use voxrelay_core::error::{ClientError, Service};
use voxrelay_core::language::SpeechLocale;
use voxrelay_core::types::SynthesizedAudio;

use crate::{HttpPolicy, Synthesizer};

const SYNTHESIS_PATH: &str = "/cognitiveservices/v1";
const DEFAULT_OUTPUT_FORMAT: &str = "audio-16khz-32kbitrate-mono-mp3";

/// Escape text for inclusion in an SSML element body.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Build the SSML document for `text` in `locale`'s voice.
pub fn build_ssml(text: &str, locale: SpeechLocale) -> String {
    let lang = locale.as_str();
    let voice = locale.voice();
    format!(
        "<speak version='1.0' xml:lang='{lang}'><voice xml:lang='{lang}' xml:gender='Female' name='{voice}'>{}</voice></speak>",
        escape_xml(text)
    )
}

/// Mime type matching an Azure output format name.
fn mime_for_format(format: &str) -> &'static str {
    match format {
        f if f.contains("mp3") => "audio/mpeg",
        f if f.starts_with("riff") => "audio/wav",
        f if f.contains("opus") || f.contains("ogg") => "audio/ogg",
        f if f.contains("webm") => "audio/webm",
        _ => "application/octet-stream",
    }
}

pub struct AzureSynthesizer {
    base_url: Option<String>,
    output_format: String,
    policy: HttpPolicy,
    client: reqwest::Client,
}

impl AzureSynthesizer {
    pub fn new(policy: HttpPolicy) -> Self {
        Self {
            base_url: None,
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
            policy,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    pub fn with_output_format(mut self, format: &str) -> Self {
        self.output_format = format.to_string();
        self
    }

    pub fn endpoint(&self, region: &str) -> String {
        match &self.base_url {
            Some(base) => format!("{base}{SYNTHESIS_PATH}"),
            None => format!("https://{region}.tts.speech.microsoft.com{SYNTHESIS_PATH}"),
        }
    }
}

#[async_trait]
impl Synthesizer for AzureSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        locale: SpeechLocale,
        credentials: &Credentials,
    ) -> Result<SynthesizedAudio, ClientError> {
        let key = credentials.speech_key()?;
        let region = credentials.speech_region()?;
        let url = self.endpoint(region);
        let ssml = build_ssml(text, locale);

        debug!(url = %url, voice = locale.voice(), text_len = text.len(), "Requesting speech synthesis");

        let resp = self
            .policy
            .send(Service::TextToSpeech, || {
                self.client
                    .post(&url)
                    .header("Ocp-Apim-Subscription-Key", key)
                    .header("Content-Type", "application/ssml+xml")
                    .header("X-Microsoft-OutputFormat", self.output_format.as_str())
                    .header("User-Agent", "voxrelay")
                    .body(ssml.clone())
            })
            .await?;

        let data = self.policy.bytes(Service::TextToSpeech, resp).await?;
        if data.is_empty() {
            return Err(ClientError::Malformed {
                service: Service::TextToSpeech,
                body: "synthesis returned no audio".into(),
            });
        }

        info!(voice = locale.voice(), size_kb = data.len() / 1024, "Speech synthesized");
        Ok(SynthesizedAudio {
            data,
            mime_type: mime_for_format(&self.output_format).to_string(),
        })
    }
}
