//! Azure Translator text translation.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use voxrelay_core::credentials::Credentials;
use voxrelay_core::error::{ClientError, Service};
use voxrelay_core::language::ReplyLanguage;
use voxrelay_core::types::{Processor, Reply};

use crate::{HttpPolicy, Translator};

const DEFAULT_ENDPOINT: &str = "https://api.cognitive.microsofttranslator.com";
const DEFAULT_API_VERSION: &str = "3.0";

#[derive(Debug, Deserialize)]
struct TranslationResult {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    text: String,
}

/// Pull `result[0].translations[0].text` out of a response body.
pub fn parse_translation(body: &str) -> Result<String, ClientError> {
    let malformed = || ClientError::Malformed {
        service: Service::Translation,
        body: body.to_string(),
    };

    let results: Vec<TranslationResult> = serde_json::from_str(body).map_err(|_| malformed())?;
    results
        .into_iter()
        .next()
        .and_then(|r| r.translations.into_iter().next())
        .map(|t| t.text)
        .ok_or_else(malformed)
}

pub struct AzureTranslator {
    endpoint: Option<String>,
    api_version: String,
    policy: HttpPolicy,
    client: reqwest::Client,
}

impl AzureTranslator {
    pub fn new(policy: HttpPolicy) -> Self {
        Self {
            endpoint: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            policy,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.trim_end_matches('/').to_string());
        self
    }

    pub fn with_api_version(mut self, version: &str) -> Self {
        self.api_version = version.to_string();
        self
    }

    /// Translate URL. A session credential endpoint wins over configuration.
    pub fn url(&self, credentials: &Credentials) -> String {
        let base = credentials
            .translator_endpoint()
            .map(|e| e.trim_end_matches('/'))
            .or(self.endpoint.as_deref())
            .unwrap_or(DEFAULT_ENDPOINT);
        format!("{base}/translate")
    }
}

#[async_trait]
impl Translator for AzureTranslator {
    async fn translate(
        &self,
        text: &str,
        target: ReplyLanguage,
        credentials: &Credentials,
    ) -> Result<Reply, ClientError> {
        let key = credentials.translator_key()?;
        let region = credentials.translator_region()?;
        let url = self.url(credentials);
        let body = json!([{ "text": text }]);

        debug!(url = %url, to = target.translator_tag(), chars = text.len(), "Sending text for translation");

        let resp = self
            .policy
            .send(Service::Translation, || {
                let trace_id = uuid::Uuid::new_v4().to_string();
                self.client
                    .post(&url)
                    .query(&[
                        ("api-version", self.api_version.as_str()),
                        ("to", target.translator_tag()),
                    ])
                    .header("Ocp-Apim-Subscription-Key", key)
                    .header("Ocp-Apim-Subscription-Region", region)
                    .header("X-ClientTraceId", trace_id)
                    .json(&body)
            })
            .await?;

        let raw = self.policy.text(Service::Translation, resp).await?;
        let translated = parse_translation(&raw)?;

        info!(to = %target, chars = translated.len(), "Text translated");
        Ok(Reply {
            text: translated,
            processor: Processor::Translation,
        })
    }
}
