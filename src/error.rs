use thiserror::Error;

const SESSION_EXPIRED_REASON: u32 = 5;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("HMC API error: HTTP {status}, reason {reason}: {message}")]
    ConsoleApi {
        status: u16,
        reason: u32,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("HTTP server error: {0}")]
    Server(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unrecognized resource URI: {0}")]
    UnrecognizedUri(String),

    #[error("Resource cache used before setup: {0}")]
    NotSetUp(&'static str),
}

impl ExporterError {
    /// True when the console reported the resource as not found or not
    /// accessible to the session user.
    ///
    /// HTTP 403 with reason 5 is an expired API session and does not count.
    pub fn is_inaccessible(&self) -> bool {
        match self {
            ExporterError::ConsoleApi { status: 404, .. } => true,
            ExporterError::ConsoleApi {
                status: 403,
                reason,
                ..
            } => *reason != SESSION_EXPIRED_REASON,
            _ => false,
        }
    }

    /// True when the console rejected the API session token.
    pub fn is_session_expired(&self) -> bool {
        matches!(
            self,
            ExporterError::ConsoleApi {
                status: 403,
                reason: SESSION_EXPIRED_REASON,
                ..
            }
        )
    }
}

pub type Result<T> = std::result::Result<T, ExporterError>;
