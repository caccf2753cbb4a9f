mod logging;
mod prompts;
mod run;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use voxrelay_agent::RunRequest;
use voxrelay_core::config::Config;
use voxrelay_core::language::{LanguageSelection, ReplyLanguage, SpeechLocale};
use voxrelay_core::types::PipelineMode;
use voxrelay_gateway::GatewayState;

#[derive(Parser)]
#[command(
    name = "voxrelay",
    about = "Speak, transcribe, translate or ask a language model, and hear the reply",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Args, Debug, Default)]
struct RunArgs {
    /// Speech locale of the recording (e.g. en-US, ur-PK)
    #[arg(long)]
    speech_lang: Option<SpeechLocale>,

    /// Reply language code (e.g. en, fr, zh)
    #[arg(long)]
    reply_lang: Option<ReplyLanguage>,

    /// assistant, chat or translate
    #[arg(long)]
    mode: Option<PipelineMode>,

    /// Where to write the spoken reply
    #[arg(long)]
    out: Option<PathBuf>,
}

impl RunArgs {
    fn request(&self, defaults: LanguageSelection) -> RunRequest {
        let languages = (self.speech_lang.is_some() || self.reply_lang.is_some()).then(|| {
            LanguageSelection {
                speech: self.speech_lang.unwrap_or(defaults.speech),
                reply: self.reply_lang.unwrap_or(defaults.reply),
            }
        });
        RunRequest {
            languages,
            mode: self.mode,
            synthesize: None,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline once over a recorded WAV file
    Run {
        /// Recorded clip (16 kHz mono PCM WAV)
        #[arg(long)]
        audio: PathBuf,

        #[command(flatten)]
        args: RunArgs,
    },

    /// Interactive session with conversation history
    Session {
        /// assistant, chat or translate
        #[arg(long)]
        mode: Option<PipelineMode>,
    },

    /// Record one phrase from the microphone and run the pipeline on it
    #[cfg(feature = "microphone")]
    Listen {
        /// Stop recording after this many seconds
        #[arg(long)]
        seconds: Option<u64>,

        #[command(flatten)]
        args: RunArgs,
    },

    /// List supported speech locales, voices and reply languages
    Voices,

    /// Start the HTTP gateway
    Serve {
        /// Port to listen on (default: 18790)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration with secrets masked
    Show,
    /// Check the configuration for problems
    Validate,
    /// Get a specific config value
    Get { key: String },
}

fn voices_text() -> String {
    let mut out = String::from("Speech locales:\n");
    for locale in SpeechLocale::ALL {
        out.push_str(&format!("  {:<6} {}\n", locale.as_str(), locale.voice()));
    }
    out.push_str("Reply languages:\n");
    for lang in ReplyLanguage::ALL {
        out.push_str(&format!("  {:<6} {}\n", lang.code(), lang.name()));
    }
    out
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .map(PathBuf::from)
        .unwrap_or_else(Config::config_path);
    let config = Config::load(&config_path)?;

    logging::init(config.logging.as_ref(), cli.verbose);
    tracing::debug!(path = %config_path.display(), "Config loaded");

    match cli.command {
        Commands::Run { audio, args } => {
            let request = args.request(config.default_languages());
            run::run_once(&config, &audio, request, args.out.as_deref()).await?;
        }
        Commands::Session { mode } => {
            run::session(&config, mode).await?;
        }
        #[cfg(feature = "microphone")]
        Commands::Listen { seconds, args } => {
            let request = args.request(config.default_languages());
            run::listen(&config, request, seconds, args.out.as_deref()).await?;
        }
        Commands::Voices => {
            print!("{}", voices_text());
        }
        Commands::Serve { port } => {
            let port = port.unwrap_or_else(|| config.gateway_port());
            tracing::info!("Starting voxrelay gateway on port {port}");
            let state = Arc::new(GatewayState::from_config(Arc::new(config)));
            voxrelay_gateway::start_gateway(state, port).await?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                println!("{}", serde_json::to_string_pretty(&config.redacted())?);
            }
            ConfigAction::Validate => {
                let (warnings, errors) = config.validate();
                for w in &warnings {
                    println!("warning: {w}");
                }
                for e in &errors {
                    println!("error: {e}");
                }
                if !errors.is_empty() {
                    anyhow::bail!("{} configuration error(s)", errors.len());
                }
                println!("Configuration OK ({})", config_path.display());
            }
            ConfigAction::Get { key } => match config.get_path(&key) {
                Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                None => anyhow::bail!("No config value at '{key}'"),
            },
        },
    }

    Ok(())
}
