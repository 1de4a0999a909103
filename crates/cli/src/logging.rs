//! Tracing subscriber setup.
//!
//! Logs always go to stderr; stdout is reserved for synthesized output so it
//! can be piped or redirected.

use anyhow::{anyhow, Result};
use clap::ValueEnum;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "synth=info,cli=info,assembly=info,trust=info";
const VERBOSE_LOG_FILTER: &str = "synth=debug,cli=debug,assembly=debug,trust=debug";

/// Output format of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration for the binary.
pub struct LogConfig {
    pub format: LogFormat,
    pub verbose: bool,
}

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging(config: LogConfig) -> Result<()> {
    let fallback = if config.verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let layer = match config.format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}
