//! Pipeline runs from the terminal.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

use voxrelay_agent::render::{history_text, outcome_text};
use voxrelay_agent::{Pipeline, RunOutcome, RunRequest};
use voxrelay_core::config::Config;
use voxrelay_core::credentials::Credentials;
use voxrelay_core::session::SessionContext;
use voxrelay_core::types::{AudioClip, PipelineMode};
use voxrelay_media::load_clip;

use crate::prompts;

/// File extension for a synthesized audio mime type.
pub fn audio_extension(mime_type: &str) -> &'static str {
    match mime_type {
        "audio/mpeg" => "mp3",
        "audio/wav" => "wav",
        "audio/ogg" => "ogg",
        "audio/webm" => "webm",
        _ => "bin",
    }
}

/// Where reply audio goes when no `--out` was given.
pub fn default_output_path(mime_type: &str) -> PathBuf {
    PathBuf::from(format!("voxrelay-reply.{}", audio_extension(mime_type)))
}

/// Print the outcome and save any reply audio. Returns the audio path written.
pub fn present(outcome: &RunOutcome, out: Option<&Path>) -> anyhow::Result<Option<PathBuf>> {
    print!("{}", outcome_text(outcome));

    let Some(audio) = &outcome.audio else {
        return Ok(None);
    };
    let path = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(&audio.mime_type));
    std::fs::write(&path, &audio.data)
        .with_context(|| format!("writing reply audio to {}", path.display()))?;
    println!("Reply audio: {}", path.display());
    Ok(Some(path))
}

fn read_clip(path: &Path) -> anyhow::Result<Option<AudioClip>> {
    load_clip(path).with_context(|| format!("reading {}", path.display()))
}

/// One run over a clip file with environment/config credentials.
pub async fn run_once(
    config: &Config,
    audio: &Path,
    request: RunRequest,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    let clip = read_clip(audio)?;
    run_clip(config, clip, request, out).await
}

/// One run over an in-memory clip.
pub async fn run_clip(
    config: &Config,
    clip: Option<AudioClip>,
    request: RunRequest,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    let mut ctx = SessionContext::new(
        Credentials::resolve(config),
        config.default_languages(),
        config.default_mode(),
    );
    let pipeline = Pipeline::from_config(config);
    let outcome = pipeline.run(&mut ctx, clip, request).await;
    present(&outcome, out)?;

    if !outcome.errors.is_empty() || !outcome.messages.is_empty() {
        anyhow::bail!(
            "run finished with {} error(s)",
            outcome.errors.len() + outcome.messages.len()
        );
    }
    Ok(())
}

/// Interactive session: prompt for what is missing, then run clip after clip.
pub async fn session(config: &Config, mode: Option<PipelineMode>) -> anyhow::Result<()> {
    let mode = mode.unwrap_or_else(|| config.default_mode());
    let mut credentials = Credentials::resolve(config);
    prompts::fill_missing_credentials(&mut credentials, mode)?;
    let languages = prompts::choose_languages(config.default_languages())?;

    let mut ctx = SessionContext::new(credentials, languages, mode);
    let pipeline = Pipeline::from_config(config);
    info!(mode = mode.as_str(), speech = %languages.speech, reply = %languages.reply, "Session started");

    while let Some(path) = prompts::next_clip_path()? {
        let clip = match read_clip(Path::new(&path)) {
            Ok(clip) => clip,
            Err(e) => {
                eprintln!("{e:#}");
                continue;
            }
        };

        let outcome = pipeline.run(&mut ctx, clip, RunRequest::default()).await;
        if let Err(e) = present(&outcome, None) {
            eprintln!("{e:#}");
        }

        if !ctx.history.is_empty() {
            println!("\nConversation history:");
            print!("{}", history_text(ctx.history.render_all()));
        }
    }

    info!(exchanges = ctx.history.len(), "Session ended");
    Ok(())
}

#[cfg(feature = "microphone")]
pub async fn listen(
    config: &Config,
    request: RunRequest,
    seconds: Option<u64>,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    use std::time::Duration;

    use voxrelay_core::types::Transcript;
    use voxrelay_media::listen::{ListenOptions, to_clip};
    use voxrelay_media::microphone::MicrophoneSource;

    let mut options = ListenOptions::default();
    if let Some(secs) = seconds {
        options.phrase_limit = Some(Duration::from_secs(secs));
    }

    println!("Calibrating for background noise, please stay quiet...");
    let pcm = tokio::task::spawn_blocking(move || {
        let mut mic = MicrophoneSource::open()?;
        println!("Listening...");
        voxrelay_media::listen(&mut mic, &options)
    })
    .await??;

    match pcm {
        Some(pcm) => {
            let clip = to_clip(&pcm, voxrelay_media::SAMPLE_RATE)?;
            run_clip(config, Some(clip), request, out).await
        }
        None => {
            println!("Your speech: {}", Transcript::unrecognized().text);
            Ok(())
        }
    }
}
