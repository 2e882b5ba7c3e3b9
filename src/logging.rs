//! Tracing subscriber setup for binaries and tests that embed the index.

use tracing_subscriber::{fmt, EnvFilter};

use crate::types::{Result, TtreeError};

/// Installs a global `fmt` subscriber filtered by `level`.
///
/// `level` accepts any `EnvFilter` directive, e.g. `"info"` or
/// `"ttree::rotate=trace,info"`. Fails if a subscriber is already installed.
pub fn init_logging(level: &str) -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_new(level)
                .map_err(|e| TtreeError::Config(format!("invalid log level: {e}")))?,
        )
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .map_err(|_| TtreeError::Invalid("logging already initialized"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_directive() {
        assert!(matches!(
            init_logging("ttree=notalevel"),
            Err(TtreeError::Config(_))
        ));
    }
}
