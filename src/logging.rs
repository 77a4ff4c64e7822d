/// Structured logging setup using tracing
///
/// Writes to stderr ONLY so `infoquest ask` can print JSON on stdout untouched.
/// Human-readable with ANSI colors when stderr is a terminal, JSON lines otherwise.

use std::io::IsTerminal;
use tracing_subscriber::{
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};
use crate::config::Config;

/// HTTP client internals that are too chatty at debug level.
const QUIET_TARGETS: &[&str] = &["hyper", "hyper_util", "reqwest", "h2"];

/// Filter directives for a configured level.
///
/// The level applies to infoquest and request tracing; transport crates stay at warn.
pub fn default_directives(level: &str) -> String {
    let level = match level.trim().to_ascii_lowercase().as_str() {
        l @ ("trace" | "debug" | "info" | "warn" | "error" | "off") => l.to_string(),
        _ => "info".to_string(),
    };

    std::iter::once(level)
        .chain(QUIET_TARGETS.iter().map(|t| format!("{}=warn", t)))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber. `RUST_LOG` overrides `config.log_level`.
pub fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.log_level)));

    if std::io::stderr().is_terminal() {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(false)
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .json()
                    .with_current_span(false)
            )
            .init();
    }
}
