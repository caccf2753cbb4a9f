//! Azure Speech short-audio recognition.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use voxrelay_core::credentials::Credentials;
use voxrelay_core::error::{ClientError, Service};
use voxrelay_core::language::SpeechLocale;
use voxrelay_core::types::Transcript;

use crate::{HttpPolicy, Transcriber};

const RECOGNITION_PATH: &str = "/speech/recognition/conversation/cognitiveservices/v1";

#[derive(Debug, Deserialize)]
struct RecognitionResponse {
    #[serde(rename = "RecognitionStatus", default)]
    recognition_status: Option<String>,
    #[serde(rename = "DisplayText", default)]
    display_text: Option<String>,
}

/// Extract the transcript from a recognition response body.
///
/// A JSON body without `DisplayText` is the service saying it heard nothing
/// usable, so it maps to the fallback transcript.
pub fn parse_recognition(body: &str) -> Result<Transcript, ClientError> {
    let parsed: RecognitionResponse =
        serde_json::from_str(body).map_err(|_| ClientError::Malformed {
            service: Service::SpeechToText,
            body: body.to_string(),
        })?;

    match parsed.display_text {
        Some(text) if !text.trim().is_empty() => Ok(Transcript::recognized(text)),
        _ => {
            debug!(status = ?parsed.recognition_status, "No display text in recognition response");
            Ok(Transcript::unrecognized())
        }
    }
}

pub struct AzureSpeechToText {
    base_url: Option<String>,
    policy: HttpPolicy,
    client: reqwest::Client,
}

impl AzureSpeechToText {
    pub fn new(policy: HttpPolicy) -> Self {
        Self {
            base_url: None,
            policy,
            client: reqwest::Client::new(),
        }
    }

    /// Use a fixed host instead of the region-derived one.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    /// Recognition URL for `region`, without query parameters.
    pub fn endpoint(&self, region: &str) -> String {
        match &self.base_url {
            Some(base) => format!("{base}{RECOGNITION_PATH}"),
            None => format!("https://{region}.stt.speech.microsoft.com{RECOGNITION_PATH}"),
        }
    }
}

#[async_trait]
impl Transcriber for AzureSpeechToText {
    async fn transcribe(
        &self,
        audio: &[u8],
        locale: SpeechLocale,
        credentials: &Credentials,
    ) -> Result<Transcript, ClientError> {
        let key = credentials.speech_key()?;
        let region = credentials.speech_region()?;
        let url = self.endpoint(region);

        debug!(url = %url, language = %locale, audio_bytes = audio.len(), "Sending audio for recognition");

        let resp = self
            .policy
            .send(Service::SpeechToText, || {
                self.client
                    .post(&url)
                    .query(&[("language", locale.as_str())])
                    .header("Ocp-Apim-Subscription-Key", key)
                    .header("Content-Type", "audio/wav")
                    .body(audio.to_vec())
            })
            .await?;

        let body = self.policy.text(Service::SpeechToText, resp).await?;
        let transcript = parse_recognition(&body)?;

        info!(
            recognized = transcript.recognized,
            chars = transcript.text.len(),
            "Speech recognized"
        );
        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_display_text() {
        let t = parse_recognition(r#"{"RecognitionStatus":"Success","DisplayText":"hello"}"#).unwrap();
        assert_eq!(t, Transcript::recognized("hello"));
    }

    #[test]
    fn test_missing_display_text_is_fallback() {
        let t = parse_recognition(r#"{"RecognitionStatus":"NoMatch","Offset":0}"#).unwrap();
        assert_eq!(t, Transcript::unrecognized());
        assert_eq!(t.text, "Speech not recognized!");
    }

    #[test]
    fn test_blank_display_text_is_fallback() {
        let t = parse_recognition(r#"{"DisplayText":"  "}"#).unwrap();
        assert!(!t.recognized);
    }

    #[test]
    fn test_non_json_body_is_malformed() {
        let err = parse_recognition("<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, ClientError::Malformed { .. }));
        assert!(err.to_string().contains("bad gateway"));
    }

    #[test]
    fn test_endpoint_uses_region() {
        let stt = AzureSpeechToText::new(HttpPolicy::default());
        assert_eq!(
            stt.endpoint("eastasia"),
            "https://eastasia.stt.speech.microsoft.com/speech/recognition/conversation/cognitiveservices/v1"
        );
        let local = AzureSpeechToText::new(HttpPolicy::default()).with_base_url("http://127.0.0.1:1/");
        assert!(local.endpoint("ignored").starts_with("http://127.0.0.1:1/speech/"));
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_network() {
        let stt = AzureSpeechToText::new(HttpPolicy::default()).with_base_url("http://127.0.0.1:9");
        let err = stt
            .transcribe(b"RIFF", SpeechLocale::EnUs, &Credentials::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::MissingCredential(_)));
    }
}
