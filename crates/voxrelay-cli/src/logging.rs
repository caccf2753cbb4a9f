//! Tracing subscriber setup from the `logging` config section.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use voxrelay_core::config::LoggingConfig;

/// Filter directives used when `RUST_LOG` is unset.
pub fn directives(config: Option<&LoggingConfig>, verbose: bool) -> String {
    let level = if verbose {
        "debug"
    } else {
        config.and_then(|c| c.level.as_deref()).unwrap_or("info")
    };

    let mut parts = vec![level.to_string()];
    if let Some(c) = config {
        parts.extend(c.filters.iter().cloned());
    }
    parts.join(",")
}

pub fn init(config: Option<&LoggingConfig>, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directives(config, verbose)));
    let json = config.is_some_and(|c| c.format == "json");
    let stdout = config.is_some_and(|c| c.output == "stdout");

    let registry = tracing_subscriber::registry().with(filter);
    match (json, stdout) {
        (true, true) => registry
            .with(fmt::layer().json().with_writer(std::io::stdout))
            .init(),
        (true, false) => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        (false, true) => registry
            .with(fmt::layer().with_writer(std::io::stdout))
            .init(),
        (false, false) => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}
