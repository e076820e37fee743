#![forbid(unsafe_code)]

//! Tracing subscriber setup.
//!
//! Installs a `fmt` layer writing to stderr, filtered by the `VEIL_LOG`
//! environment variable (same directive syntax as `RUST_LOG`).

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "VEIL_LOG";

/// Filter used when `VEIL_LOG` is unset.
const DEFAULT_DIRECTIVES: &str = "veil_widgets=info,veil_runtime=info";

/// Errors from installing the subscriber.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid VEIL_LOG directives: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("a global tracing subscriber is already installed")]
    AlreadyInstalled,
}

/// Install the global subscriber.
pub fn init_tracing() -> Result<(), TelemetryError> {
    let directives = std::env::var(LOG_ENV).ok();
    let filter = build_filter(directives.as_deref())?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|_| TelemetryError::AlreadyInstalled)
}

fn build_filter(directives: Option<&str>) -> Result<EnvFilter, TelemetryError> {
    let directives = directives
        .filter(|d| !d.trim().is_empty())
        .unwrap_or(DEFAULT_DIRECTIVES);
    Ok(EnvFilter::try_new(directives)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_directives_fall_back_to_default() {
        let filter = build_filter(Some("  ")).unwrap();
        assert!(filter.to_string().contains("veil_widgets=info"));
    }

    #[test]
    fn explicit_directives_win() {
        let filter = build_filter(Some("veil_widgets=trace")).unwrap();
        assert!(filter.to_string().contains("veil_widgets=trace"));
    }
}
