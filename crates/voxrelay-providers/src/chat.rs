//! OpenAI-compatible chat completions (OpenRouter by default).
//!
//! Sends one non-streaming `/v1/chat/completions` request per reply: a
//! system message fixing the reply language, then the transcript as the
//! user message.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use voxrelay_core::config::LlmConfig;
use voxrelay_core::credentials::Credentials;
use voxrelay_core::error::{ClientError, Service};
use voxrelay_core::language::ReplyLanguage;
use voxrelay_core::types::{Processor, Reply};

use crate::{HttpPolicy, ReplyGenerator};

const OPENAI_BASE_URL: &str = "https://api.openai.com";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api";

pub const DEFAULT_MODEL: &str = "google/gemma-3-27b-it:free";

/// API style — determines minor behavior differences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiStyle {
    OpenAi,
    OpenRouter,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// System instruction pinning the reply language.
pub fn reply_instruction(language: ReplyLanguage) -> String {
    format!("Reply in {} language.", language.name())
}

/// Build the two-message request for `prompt`.
pub fn build_request(model: &str, prompt: &str, language: ReplyLanguage) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage {
                role: "system",
                content: reply_instruction(language),
            },
            ChatMessage {
                role: "user",
                content: prompt.to_string(),
            },
        ],
    }
}

/// Extract `choices[0].message.content` from a response body.
pub fn parse_completion(body: &str) -> Result<String, ClientError> {
    let malformed = || ClientError::Malformed {
        service: Service::ChatCompletion,
        body: body.to_string(),
    };

    let completion: ChatCompletion = serde_json::from_str(body).map_err(|_| malformed())?;
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .ok_or_else(malformed)
}

pub struct ChatCompletionClient {
    pub base_url: String,
    pub api_style: ApiStyle,
    pub model: String,
    policy: HttpPolicy,
    client: reqwest::Client,
}

impl ChatCompletionClient {
    pub fn openai(base_url: Option<&str>, policy: HttpPolicy) -> Self {
        Self {
            base_url: base_url
                .unwrap_or(OPENAI_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            api_style: ApiStyle::OpenAi,
            model: DEFAULT_MODEL.to_string(),
            policy,
            client: reqwest::Client::new(),
        }
    }

    pub fn openrouter(base_url: Option<&str>, policy: HttpPolicy) -> Self {
        Self {
            base_url: base_url
                .unwrap_or(OPENROUTER_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            api_style: ApiStyle::OpenRouter,
            model: DEFAULT_MODEL.to_string(),
            policy,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &LlmConfig, policy: HttpPolicy) -> Self {
        let base_url = config.base_url.as_deref();
        let client = match config.provider.as_str() {
            "openai" => Self::openai(base_url, policy),
            _ => Self::openrouter(base_url, policy),
        };
        match config.model.as_deref() {
            Some(model) => client.with_model(model),
            None => client,
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    /// Send a prepared request and return the first choice's content.
    pub async fn complete(
        &self,
        request: &ChatRequest,
        credentials: &Credentials,
    ) -> Result<String, ClientError> {
        let api_key = credentials.llm_key()?;
        let url = self.completions_url();

        debug!(model = %request.model, base_url = %self.base_url, "Requesting chat completion");

        let resp = self
            .policy
            .send(Service::ChatCompletion, || {
                let mut builder = self
                    .client
                    .post(&url)
                    .header("authorization", format!("Bearer {api_key}"))
                    .json(request);
                if self.api_style == ApiStyle::OpenRouter {
                    builder = builder
                        .header("HTTP-Referer", "https://github.com/Clemens865/voxrelay")
                        .header("X-Title", "voxrelay");
                }
                builder
            })
            .await?;

        let body = self.policy.text(Service::ChatCompletion, resp).await?;
        parse_completion(&body)
    }
}

#[async_trait]
impl ReplyGenerator for ChatCompletionClient {
    async fn generate(
        &self,
        prompt: &str,
        language: ReplyLanguage,
        credentials: &Credentials,
    ) -> Result<Reply, ClientError> {
        let request = build_request(&self.model, prompt, language);
        let text = self.complete(&request, credentials).await?;

        info!(model = %self.model, chars = text.len(), "Reply generated");
        Ok(Reply {
            text,
            processor: Processor::LanguageModel,
        })
    }
}
