use crate::config::ObservabilityConfig;
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Resolve a configured level name, case-insensitively.
pub fn parse_level(name: &str) -> Option<Level> {
    Level::from_str(name.trim()).ok()
}

/// Install the process-wide fmt subscriber.
///
/// Returns `false` when a global subscriber is already set.
pub fn init_tracing(config: &ObservabilityConfig) -> bool {
    let level = parse_level(&config.log_level);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level.unwrap_or(Level::INFO))
        .with_target(true)
        .finish();
    let installed = tracing::subscriber::set_global_default(subscriber).is_ok();
    if installed && level.is_none() {
        tracing::warn!(
            "Unknown log level '{}', falling back to info",
            config.log_level
        );
    }
    installed
}
