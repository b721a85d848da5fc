// ── Core error types ──
//
// User-facing errors from taxdeck-core. Consumers never see reqwest errors
// or JSON parse failures directly; the `From<taxdeck_api::Error>` impl
// translates transport-layer failures into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{message}")]
    ValidationFailed { message: String },

    #[error("Tax not found: {id}")]
    TaxNotFound { id: String },

    #[error("Cannot reach the tax service: {reason}")]
    ConnectionFailed { reason: String },

    #[error("The tax service rejected the request: {message}")]
    Api {
        message: String,
        status: Option<u16>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }

    /// Returns `true` for local validation failures, which never involve
    /// the network and always leave the session re-submittable.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationFailed { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<taxdeck_api::Error> for CoreError {
    fn from(err: taxdeck_api::Error) -> Self {
        match err {
            taxdeck_api::Error::Transport(ref e) if e.is_timeout() || e.is_connect() => {
                CoreError::ConnectionFailed {
                    reason: e.to_string(),
                }
            }
            taxdeck_api::Error::Transport(e) => CoreError::Api {
                message: e.to_string(),
                status: e.status().map(|s| s.as_u16()),
            },
            taxdeck_api::Error::InvalidUrl(e) => CoreError::Internal(format!("invalid URL: {e}")),
            taxdeck_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            taxdeck_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("undecodable response: {message}"))
            }
        }
    }
}
