//! Configuration loading and validation.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::language::{LanguageSelection, ReplyLanguage, SpeechLocale};
use crate::types::PipelineMode;

/// Top-level voxrelay configuration, read from a JSON5 file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech: Option<SpeechConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub translator: Option<TranslatorConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm: Option<LlmConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<GatewayConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

/// Speech service (STT + TTS) configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Service region, e.g. "eastasia". Selects the STT and TTS hosts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Override for the recognition base URL (tests, sovereign clouds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stt_base_url: Option<String>,

    /// Override for the synthesis base URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts_base_url: Option<String>,

    /// Synthesis output format (default: "audio-16khz-32kbitrate-mono-mp3").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
}

/// Text translation service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslatorConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// API version query parameter (default: "3.0").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

/// Chat-completion provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider style: "openrouter" (default) or "openai".
    #[serde(default = "default_llm_provider")]
    pub provider: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            api_key: None,
            api_key_env: None,
            base_url: None,
            model: None,
        }
    }
}

fn default_llm_provider() -> String {
    "openrouter".into()
}

/// Per-session defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_lang: Option<SpeechLocale>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_lang: Option<ReplyLanguage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<PipelineMode>,

    /// Synthesize the reply in translate mode (assistant always does, chat never).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speak_translation: Option<bool>,

    /// Directory for temporary audio clips (default: system temp dir).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spool_dir: Option<String>,
}

/// Outbound HTTP policy shared by all service clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Total attempts per call, including the first (default: 2).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_max_attempts() -> u32 {
    2
}

fn default_backoff_ms() -> u64 {
    500
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,

    /// Largest accepted clip upload in bytes (default: 25 MiB).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_upload_bytes: Option<usize>,
}

fn default_port() -> u16 {
    18790
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "plain" (default) or "json".
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Log level override (trace/debug/info/warn/error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Per-crate log level overrides (e.g. "voxrelay_providers=debug").
    #[serde(default)]
    pub filters: Vec<String>,

    /// Output target: "stderr" (default) or "stdout".
    #[serde(default = "default_log_output")]
    pub output: String,
}

fn default_log_format() -> String {
    "plain".into()
}

fn default_log_output() -> String {
    "stderr".into()
}

/// Resolve a secret: check the direct value first, then the env-var reference.
pub fn resolve_secret_field(direct: &Option<String>, env_var: &Option<String>) -> Option<String> {
    if let Some(val) = direct {
        if !val.is_empty() {
            return Some(val.clone());
        }
    }
    if let Some(env) = env_var {
        if let Ok(val) = std::env::var(env) {
            if !val.is_empty() {
                return Some(val);
            }
        }
    }
    None
}

static ENV_VAR_PATTERN: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"));

/// Substitute `${ENV_VAR}` patterns in a string with their environment variable values.
fn substitute_env_vars(input: &str) -> String {
    ENV_VAR_PATTERN
        .replace_all(input, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_default()
        })
        .into_owned()
}

impl Config {
    /// Load config from a JSON5 file, substituting `${ENV_VAR}` references.
    ///
    /// A missing file yields the default config.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(crate::error::VoxError::Io)?;
        let substituted = substitute_env_vars(&raw);

        let config: Config = json5::from_str(&substituted)
            .map_err(|e| crate::error::VoxError::Config(e.to_string()))?;

        Ok(config)
    }

    /// Default config file path.
    pub fn config_path() -> PathBuf {
        data_dir().join("config.json")
    }

    pub fn http(&self) -> HttpConfig {
        self.http.clone().unwrap_or_default()
    }

    pub fn gateway_port(&self) -> u16 {
        self.gateway.as_ref().map(|g| g.port).unwrap_or(18790)
    }

    pub fn gateway_bind(&self) -> String {
        self.gateway
            .as_ref()
            .and_then(|g| g.bind.clone())
            .unwrap_or_else(|| "127.0.0.1".to_string())
    }

    pub fn gateway_max_upload(&self) -> usize {
        self.gateway
            .as_ref()
            .and_then(|g| g.max_upload_bytes)
            .unwrap_or(25 * 1024 * 1024)
    }

    pub fn default_mode(&self) -> PipelineMode {
        self.session
            .as_ref()
            .and_then(|s| s.mode)
            .unwrap_or_default()
    }

    pub fn default_languages(&self) -> LanguageSelection {
        let session = self.session.as_ref();
        LanguageSelection {
            speech: session.and_then(|s| s.speech_lang).unwrap_or_default(),
            reply: session.and_then(|s| s.reply_lang).unwrap_or_default(),
        }
    }

    /// Whether the reply should be spoken for a run in `mode`.
    pub fn synthesize_reply(&self, mode: PipelineMode) -> bool {
        mode.speaks_reply(self.speak_translation())
    }

    /// Whether translations are spoken (`session.speak_translation`, default off).
    pub fn speak_translation(&self) -> bool {
        self.session
            .as_ref()
            .and_then(|s| s.speak_translation)
            .unwrap_or(false)
    }

    /// Directory where clips are spooled during transcription.
    pub fn spool_dir(&self) -> PathBuf {
        self.session
            .as_ref()
            .and_then(|s| s.spool_dir.as_ref())
            .map(|d| PathBuf::from(shellexpand::tilde(d).as_ref()))
            .unwrap_or_else(std::env::temp_dir)
    }

    pub fn llm(&self) -> LlmConfig {
        self.llm.clone().unwrap_or_default()
    }

    /// Get a config value by dotted path (e.g. "http.timeout_ms").
    pub fn get_path(&self, path: &str) -> Option<serde_json::Value> {
        let json = serde_json::to_value(self.redacted()).ok()?;
        let mut current = &json;
        for segment in path.split('.') {
            current = current.get(segment)?;
        }
        Some(current.clone())
    }

    /// Copy of the config with inline secrets masked, for display.
    pub fn redacted(&self) -> Self {
        fn mask(value: &mut Option<String>) {
            if value.as_ref().is_some_and(|v| !v.is_empty()) {
                *value = Some("********".into());
            }
        }

        let mut copy = self.clone();
        if let Some(speech) = copy.speech.as_mut() {
            mask(&mut speech.api_key);
        }
        if let Some(translator) = copy.translator.as_mut() {
            mask(&mut translator.api_key);
        }
        if let Some(llm) = copy.llm.as_mut() {
            mask(&mut llm.api_key);
        }
        copy
    }

    /// Validate config, returning (warnings, errors).
    pub fn validate(&self) -> (Vec<String>, Vec<String>) {
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        if let Some(speech) = &self.speech {
            if speech.api_key.as_ref().is_some_and(|k| !k.is_empty()) {
                warnings.push(
                    "speech.api_key is stored in the config file; prefer api_key_env".to_string(),
                );
            }
        }
        if let Some(translator) = &self.translator {
            if translator.api_key.as_ref().is_some_and(|k| !k.is_empty()) {
                warnings.push(
                    "translator.api_key is stored in the config file; prefer api_key_env"
                        .to_string(),
                );
            }
        }
        if let Some(llm) = &self.llm {
            if llm.api_key.as_ref().is_some_and(|k| !k.is_empty()) {
                warnings.push(
                    "llm.api_key is stored in the config file; prefer api_key_env".to_string(),
                );
            }
            if llm.provider != "openrouter" && llm.provider != "openai" {
                errors.push(format!("Unknown llm.provider '{}'", llm.provider));
            }
        }

        if self.default_mode() == PipelineMode::Translate && self.translator.is_none() {
            warnings.push("Translate mode selected but no translator section configured".into());
        }

        let http = self.http();
        if http.timeout_ms == 0 {
            errors.push("http.timeout_ms cannot be 0".to_string());
        }
        if http.max_attempts == 0 {
            errors.push("http.max_attempts must be at least 1".to_string());
        }

        if let Some(gw) = &self.gateway {
            if gw.port == 0 {
                errors.push("Gateway port cannot be 0".to_string());
            }
        }

        if let Some(logging) = &self.logging {
            if logging.format != "plain" && logging.format != "json" {
                warnings.push(format!(
                    "Unknown logging.format '{}', using plain",
                    logging.format
                ));
            }
        }

        (warnings, errors)
    }
}

/// Base directory for voxrelay data: `~/.voxrelay/`
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".voxrelay")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_substitution() {
        // SAFETY: test-only, variable name unique to this test
        unsafe { std::env::set_var("TEST_VR_KEY", "sk-test-123") };
        let input = r#"{"key": "${TEST_VR_KEY}", "other": "plain"}"#;
        let result = substitute_env_vars(input);
        assert!(result.contains("sk-test-123"));
        assert!(result.contains("plain"));
        unsafe { std::env::remove_var("TEST_VR_KEY") };
    }

    #[test]
    fn test_env_var_missing() {
        let input = r#"{"key": "${NONEXISTENT_VAR_VR_TEST}"}"#;
        let result = substitute_env_vars(input);
        assert!(result.contains(r#""""#));
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.gateway_port(), 18790);
        assert_eq!(config.default_mode(), PipelineMode::Assistant);
        assert_eq!(config.http().timeout_ms, 30_000);
        assert_eq!(config.http().max_attempts, 2);
        assert!(config.synthesize_reply(PipelineMode::Assistant));
        assert!(!config.synthesize_reply(PipelineMode::Chat));
        assert!(!config.synthesize_reply(PipelineMode::Translate));
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.json")).unwrap();
        assert!(config.speech.is_none());
    }

    #[test]
    fn test_load_json5_with_session_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                // comments are fine in JSON5
                speech: { region: "eastasia", api_key_env: "MY_SPEECH_KEY" },
                session: { speech_lang: "ur-PK", reply_lang: "ur", mode: "translate", speak_translation: true },
                http: { timeout_ms: 5000 },
            }"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        let langs = config.default_languages();
        assert_eq!(langs.speech, SpeechLocale::UrPk);
        assert_eq!(langs.reply, ReplyLanguage::Ur);
        assert_eq!(config.default_mode(), PipelineMode::Translate);
        assert!(config.synthesize_reply(PipelineMode::Translate));
        assert_eq!(config.http().timeout_ms, 5000);
        assert_eq!(config.http().max_attempts, 2);
    }

    #[test]
    fn test_load_rejects_unknown_language() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ session: { speech_lang: "tlh-QO" } }"#).unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_provider_resolve_api_key() {
        // SAFETY: test-only, variable name unique to this test
        unsafe { std::env::set_var("TEST_VR_API_KEY", "from-env") };
        assert_eq!(
            resolve_secret_field(&None, &Some("TEST_VR_API_KEY".into())),
            Some("from-env".into())
        );
        // Direct key takes priority
        assert_eq!(
            resolve_secret_field(&Some("direct-key".into()), &Some("TEST_VR_API_KEY".into())),
            Some("direct-key".into())
        );
        unsafe { std::env::remove_var("TEST_VR_API_KEY") };
    }

    #[test]
    fn test_redacted_masks_inline_keys() {
        let config: Config =
            json5::from_str(r#"{ llm: { api_key: "sk-or-123" }, speech: { region: "eastus" } }"#)
                .unwrap();
        let shown = serde_json::to_string(&config.redacted()).unwrap();
        assert!(!shown.contains("sk-or-123"));
        assert!(shown.contains("eastus"));
        assert_eq!(
            config.get_path("llm.api_key"),
            Some(serde_json::json!("********"))
        );
    }

    #[test]
    fn test_logging_config_defaults() {
        let config: Config = json5::from_str(r#"{ "logging": {} }"#).unwrap();
        let logging = config.logging.expect("logging should be present");
        assert_eq!(logging.format, "plain");
        assert!(logging.level.is_none());
        assert_eq!(logging.output, "stderr");
        assert!(logging.filters.is_empty());
    }

    #[test]
    fn test_validate_flags_bad_values() {
        let config: Config = json5::from_str(
            r#"{ llm: { provider: "mystery" }, http: { timeout_ms: 0 }, gateway: { port: 0 } }"#,
        )
        .unwrap();
        let (_warnings, errors) = config.validate();
        assert!(errors.iter().any(|e| e.contains("mystery")));
        assert!(errors.iter().any(|e| e.contains("timeout_ms")));
        assert!(errors.iter().any(|e| e.contains("port")));
    }

    #[test]
    fn test_validate_warns_on_inline_key() {
        let config: Config = json5::from_str(r#"{ speech: { api_key: "abc" } }"#).unwrap();
        let (warnings, errors) = config.validate();
        assert!(errors.is_empty());
        assert!(warnings.iter().any(|w| w.contains("speech.api_key")));
    }

    #[test]
    fn test_validate_warns_on_inline_translator_key() {
        let config: Config = json5::from_str(
            r#"{ translator: { api_key: "abc", region: "global" }, session: { mode: "translate" } }"#,
        )
        .unwrap();
        let (warnings, errors) = config.validate();
        assert!(errors.is_empty());
        assert_eq!(
            warnings,
            vec!["translator.api_key is stored in the config file; prefer api_key_env"]
        );
    }
}
