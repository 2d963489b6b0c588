use thiserror::Error;

use crate::models::action::ActionKind;

/// Unified error type for the entire vault-lens-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Configuration ───────────────────────────────────────────────
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    // ── Chain / Network ─────────────────────────────────────────────
    #[error("RPC error ({method}): {message}")]
    Rpc {
        method: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Block {0} not found")]
    BlockNotFound(u64),

    // ── Business Logic ──────────────────────────────────────────────
    #[error("Invalid amount '{input}': {reason}")]
    InvalidAmount {
        input: String,
        reason: String,
    },

    #[error("Validation failed: {0}")]
    ValidationError(String),

    // ── Write path ──────────────────────────────────────────────────
    #[error("{action} failed: {message}")]
    Action {
        action: ActionKind,
        message: String,
    },
}

impl CoreError {
    /// Wrap any error raised while submitting or confirming a transaction
    /// into the named write-path failure shown to the user.
    pub fn action(action: ActionKind, source: CoreError) -> Self {
        let message = match source {
            // Already named: keep the inner message only.
            CoreError::Action { message, .. } => message,
            other => other.to_string(),
        };
        CoreError::Action { action, message }
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Decode(e.to_string())
    }
}

impl From<hex::FromHexError> for CoreError {
    fn from(e: hex::FromHexError) -> Self {
        CoreError::Decode(format!("invalid hex: {e}"))
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // RPC endpoints often carry an API key in the query string.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
