use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::domain::TwError;

/// Install the global subscriber. The terminal is owned by the UI, so
/// everything goes to `path`; without a path nothing is installed.
pub fn init(path: Option<&Path>, level: &str) -> Result<(), TwError> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| TwError::InvalidConfig(format!("invalid log level: {e}")))?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true),
        )
        .with(filter)
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| TwError::InvalidConfig(format!("logging already initialized: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_path_installs_nothing() {
        assert!(init(None, "debug").is_ok());
    }
}
