//! Tracing subscriber setup.
//!
//! - `text`: human-readable lines on stderr
//! - `json`: one structured record per line on stderr
//!
//! `RUST_LOG` wins over the verbosity flag when set.

use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

fn default_level(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

/// Installs the global subscriber. A second call is a no-op.
pub fn init_logging(verbose: bool, format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbose)));

    let installed = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    if let Err(e) = installed {
        tracing::debug!(error = %e, "global subscriber already installed, keeping it");
    }
}
