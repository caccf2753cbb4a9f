//! Interactive prompts for the session command.

use dialoguer::{Input, Password, Select};

use voxrelay_core::credentials::{
    Credentials, LLM_KEY, SPEECH_KEY, SPEECH_REGION, TRANSLATOR_KEY, TRANSLATOR_REGION,
};
use voxrelay_core::language::{LanguageSelection, ReplyLanguage, SpeechLocale};
use voxrelay_core::types::PipelineMode;

fn secret(name: &str) -> anyhow::Result<String> {
    Ok(Password::new().with_prompt(name).interact()?)
}

fn text(name: &str, hint: &str) -> anyhow::Result<String> {
    Ok(Input::new()
        .with_prompt(format!("{name} ({hint})"))
        .interact_text()?)
}

/// Ask for every credential `mode` needs that config and environment did not supply.
pub fn fill_missing_credentials(
    credentials: &mut Credentials,
    mode: PipelineMode,
) -> anyhow::Result<()> {
    for name in credentials.missing_for(mode) {
        match name {
            SPEECH_KEY => credentials.set_speech_key(secret("Azure speech key")?),
            SPEECH_REGION => credentials.set_speech_region(text("Azure speech region", "e.g. eastasia")?),
            TRANSLATOR_KEY => credentials.set_translator_key(secret("Azure translator key")?),
            TRANSLATOR_REGION => {
                credentials.set_translator_region(text("Azure translator region", "e.g. global")?)
            }
            LLM_KEY => credentials.set_llm_key(secret("OpenRouter API key")?),
            _ => {}
        }
    }
    Ok(())
}

/// Pick the speech locale and reply language, starting from `defaults`.
pub fn choose_languages(defaults: LanguageSelection) -> anyhow::Result<LanguageSelection> {
    let locales: Vec<String> = SpeechLocale::ALL
        .iter()
        .map(|l| format!("{l} ({})", l.voice()))
        .collect();
    let speech_idx = Select::new()
        .with_prompt("Speech language")
        .items(&locales)
        .default(SpeechLocale::ALL.iter().position(|l| *l == defaults.speech).unwrap_or(0))
        .interact()?;

    let replies: Vec<String> = ReplyLanguage::ALL
        .iter()
        .map(|l| format!("{} ({l})", l.name()))
        .collect();
    let reply_idx = Select::new()
        .with_prompt("Reply language")
        .items(&replies)
        .default(ReplyLanguage::ALL.iter().position(|l| *l == defaults.reply).unwrap_or(0))
        .interact()?;

    Ok(LanguageSelection {
        speech: SpeechLocale::ALL[speech_idx],
        reply: ReplyLanguage::ALL[reply_idx],
    })
}

/// Next clip path, or `None` when the user leaves it blank.
pub fn next_clip_path() -> anyhow::Result<Option<String>> {
    let path: String = Input::new()
        .with_prompt("Path to recorded WAV (blank to quit)")
        .allow_empty(true)
        .interact_text()?;
    let path = path.trim();
    Ok((!path.is_empty()).then(|| path.to_string()))
}
