//! # Logging
//!
//! One `tracing` subscriber for the whole process, writing to stderr so the
//! `init` and `version` subcommands keep stdout to themselves. `RUST_LOG`
//! picks the levels; [`DEFAULT_FILTER`] applies when it is unset or invalid.
//!
//! Two shapes are available: a readable layout for terminals, carrying the
//! worker thread's name and source line, and one JSON object per line for
//! collectors.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Levels used without `RUST_LOG`.
pub const DEFAULT_FILTER: &str = "solace_wallet_rpc=info,solace_wallet=info,tower_http=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// Reads the `--log-format` value. Only `json`, in any case, selects
    /// JSON; anything else falls back to the terminal layout.
    pub fn from_flag(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Installs the global subscriber. Fails if one is already installed.
///
/// ```text
/// RUST_LOG=solace_wallet=debug,tower_http=warn solace-wallet-rpc run
/// ```
pub fn init_logging(default_filter: &str, format: LogFormat) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // Exactly one of the two layers is present; `Option<Layer>` is a no-op
    // layer when `None`.
    let (pretty, json) = match format {
        LogFormat::Pretty => (
            Some(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_thread_names(true)
                    .with_line_number(true),
            ),
            None,
        ),
        LogFormat::Json => (
            None,
            Some(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(false),
            ),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .try_init()?;

    tracing::debug!(?format, "log subscriber installed");
    Ok(())
}
