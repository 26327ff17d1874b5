use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `atelier`.
///
/// Only collaborator failures and configuration problems surface here.
/// Malformed descriptor data, missing preferences and absent brand DNA are
/// recovered locally with neutral fallbacks and never become errors.
#[derive(Debug, Error)]
pub enum AtelierError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Bandit parameter store ──────────────────────────────────────────
    #[error("store: {0}")]
    Store(#[from] StoreError),

    // ── Descriptor / profile sources ────────────────────────────────────
    #[error("source: {0}")]
    Source(#[from] SourceError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("validation failed: {0}")]
    Validation(String),
}

// ─── Store errors ────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("fetch bandit params for {user_id} failed: {message}")]
    Fetch { user_id: String, message: String },

    #[error("increment {category}/{attribute} for {user_id} failed: {message}")]
    Increment {
        user_id: String,
        category: String,
        attribute: String,
        message: String,
    },
}

// ─── Source errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("descriptor source failed for {user_id}: {message}")]
    Descriptors { user_id: String, message: String },

    #[error("style profile source failed for {user_id}: {message}")]
    Profile { user_id: String, message: String },
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, AtelierError>;

/// Render an anyhow chain on one line, outermost context first.
pub(crate) fn chain_message(err: &anyhow::Error) -> String {
    format!("{err:#}")
}
