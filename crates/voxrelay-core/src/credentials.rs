//! Operator-supplied service credentials, held in memory for one session.

use secrecy::{ExposeSecret, SecretString};

use crate::config::{Config, resolve_secret_field};
use crate::error::ClientError;
use crate::types::PipelineMode;

pub const SPEECH_KEY: &str = "speech key";
pub const SPEECH_REGION: &str = "speech region";
pub const TRANSLATOR_KEY: &str = "translator key";
pub const TRANSLATOR_REGION: &str = "translator region";
pub const LLM_KEY: &str = "LLM key";

/// Session credentials. Keys are wrapped so `Debug` never prints them.
#[derive(Debug, Default)]
pub struct Credentials {
    speech_key: Option<SecretString>,
    speech_region: Option<String>,
    translator_key: Option<SecretString>,
    translator_region: Option<String>,
    translator_endpoint: Option<String>,
    llm_key: Option<SecretString>,
}

fn secret(value: Option<String>) -> Option<SecretString> {
    non_empty(value).map(SecretString::from)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl Credentials {
    /// Resolve whatever credentials the config and environment provide.
    ///
    /// Each secret is taken from the config value, then the env var the config
    /// names, then the conventional env var.
    pub fn resolve(config: &Config) -> Self {
        let speech = config.speech.clone().unwrap_or_default();
        let translator = config.translator.clone().unwrap_or_default();
        let llm = config.llm.clone().unwrap_or_default();

        Self {
            speech_key: secret(
                resolve_secret_field(&speech.api_key, &speech.api_key_env)
                    .or_else(|| env_value("AZURE_SPEECH_KEY")),
            ),
            speech_region: non_empty(speech.region.or_else(|| env_value("AZURE_SPEECH_REGION"))),
            translator_key: secret(
                resolve_secret_field(&translator.api_key, &translator.api_key_env)
                    .or_else(|| env_value("AZURE_TRANSLATOR_KEY")),
            ),
            translator_region: non_empty(
                translator
                    .region
                    .or_else(|| env_value("AZURE_TRANSLATOR_REGION")),
            ),
            translator_endpoint: non_empty(
                translator
                    .endpoint
                    .or_else(|| env_value("AZURE_TRANSLATOR_ENDPOINT")),
            ),
            llm_key: secret(
                resolve_secret_field(&llm.api_key, &llm.api_key_env)
                    .or_else(|| env_value("OPENROUTER_API_KEY")),
            ),
        }
    }

    pub fn set_speech_key(&mut self, key: String) {
        self.speech_key = secret(Some(key));
    }

    pub fn set_speech_region(&mut self, region: String) {
        self.speech_region = non_empty(Some(region));
    }

    pub fn set_translator_key(&mut self, key: String) {
        self.translator_key = secret(Some(key));
    }

    pub fn set_translator_region(&mut self, region: String) {
        self.translator_region = non_empty(Some(region));
    }

    pub fn set_translator_endpoint(&mut self, endpoint: String) {
        self.translator_endpoint = non_empty(Some(endpoint));
    }

    pub fn set_llm_key(&mut self, key: String) {
        self.llm_key = secret(Some(key));
    }

    pub fn speech_key(&self) -> Result<&str, ClientError> {
        self.speech_key
            .as_ref()
            .map(|k| k.expose_secret())
            .ok_or(ClientError::MissingCredential(SPEECH_KEY))
    }

    pub fn speech_region(&self) -> Result<&str, ClientError> {
        self.speech_region
            .as_deref()
            .ok_or(ClientError::MissingCredential(SPEECH_REGION))
    }

    pub fn translator_key(&self) -> Result<&str, ClientError> {
        self.translator_key
            .as_ref()
            .map(|k| k.expose_secret())
            .ok_or(ClientError::MissingCredential(TRANSLATOR_KEY))
    }

    pub fn translator_region(&self) -> Result<&str, ClientError> {
        self.translator_region
            .as_deref()
            .ok_or(ClientError::MissingCredential(TRANSLATOR_REGION))
    }

    /// Optional endpoint override; the client falls back to the global one.
    pub fn translator_endpoint(&self) -> Option<&str> {
        self.translator_endpoint.as_deref()
    }

    pub fn llm_key(&self) -> Result<&str, ClientError> {
        self.llm_key
            .as_ref()
            .map(|k| k.expose_secret())
            .ok_or(ClientError::MissingCredential(LLM_KEY))
    }

    /// Names of credentials a run in `mode` needs but does not have.
    pub fn missing_for(&self, mode: PipelineMode) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.speech_key.is_none() {
            missing.push(SPEECH_KEY);
        }
        if self.speech_region.is_none() {
            missing.push(SPEECH_REGION);
        }
        match mode {
            PipelineMode::Assistant | PipelineMode::Chat => {
                if self.llm_key.is_none() {
                    missing.push(LLM_KEY);
                }
            }
            PipelineMode::Translate => {
                if self.translator_key.is_none() {
                    missing.push(TRANSLATOR_KEY);
                }
                if self.translator_region.is_none() {
                    missing.push(TRANSLATOR_REGION);
                }
            }
        }
        missing
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_output_redacts_keys() {
        let mut creds = Credentials::default();
        creds.set_speech_key("super-secret-speech".into());
        creds.set_llm_key("sk-or-very-secret".into());
        creds.set_speech_region("eastasia".into());
        let debug = format!("{creds:?}");
        assert!(!debug.contains("super-secret-speech"));
        assert!(!debug.contains("sk-or-very-secret"));
        assert!(debug.contains("eastasia"));
    }

    #[test]
    fn test_missing_for_assistant_and_translate() {
        let mut creds = Credentials::default();
        creds.set_speech_key("k".into());
        creds.set_speech_region("westeurope".into());

        assert_eq!(creds.missing_for(PipelineMode::Assistant), vec![LLM_KEY]);
        assert_eq!(
            creds.missing_for(PipelineMode::Translate),
            vec![TRANSLATOR_KEY, TRANSLATOR_REGION]
        );

        creds.set_llm_key("sk".into());
        assert!(creds.missing_for(PipelineMode::Chat).is_empty());
    }

    #[test]
    fn test_empty_values_count_as_missing() {
        let mut creds = Credentials::default();
        creds.set_speech_key(String::new());
        creds.set_speech_region("   ".into());
        assert!(matches!(
            creds.speech_key(),
            Err(ClientError::MissingCredential(SPEECH_KEY))
        ));
        assert!(creds.speech_region().is_err());
    }

    #[test]
    fn test_blank_keys_count_as_missing_and_padding_is_trimmed() {
        let mut creds = Credentials::default();
        creds.set_speech_key("   ".into());
        creds.set_speech_region("eastasia".into());
        creds.set_llm_key("\t\n".into());
        assert_eq!(
            creds.missing_for(PipelineMode::Chat),
            vec![SPEECH_KEY, LLM_KEY]
        );
        assert!(creds.speech_key().is_err());

        creds.set_translator_key("  pasted-key \n".into());
        assert_eq!(creds.translator_key().unwrap(), "pasted-key");
    }

    #[test]
    fn test_resolve_prefers_config_value() {
        let config: Config = json5::from_str(
            r#"{ speech: { api_key: "from-config", region: "eastus" }, llm: { api_key: "sk-config" } }"#,
        )
        .unwrap();
        let creds = Credentials::resolve(&config);
        assert_eq!(creds.speech_key().unwrap(), "from-config");
        assert_eq!(creds.speech_region().unwrap(), "eastus");
        assert_eq!(creds.llm_key().unwrap(), "sk-config");
    }
}
