//! Tracing setup. `RUST_LOG` takes precedence; the configured level is the
//! fallback when it is absent or malformed.

use crate::config::TelemetryConfig;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log filter '{value}'")]
    Filter {
        value: String,
        #[source]
        source: ParseError,
    },
    #[error("failed to install tracing subscriber")]
    Subscriber(#[source] Box<dyn std::error::Error + Send + Sync>),
}

fn parse_filter(value: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(value).map_err(|source| TelemetryError::Filter {
        value: value.to_string(),
        source,
    })
}

pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => parse_filter(&config.log_level)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}
