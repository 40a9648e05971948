/// Error taxonomy for the control surface
///
/// Three failure classes reach the UI boundary (transport, HTTP-level,
/// daemon-reported); all of them normalize into `ControlError` so callers
/// surface a single notification and the refresh cadence keeps running.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControlError {
    /// Request never produced a response (DNS, connect, socket drop)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Gateway answered with a non-2xx status
    #[error("gateway returned {status}: {message}")]
    Http { status: u16, message: String },

    /// 2xx response carrying a daemon-reported failure
    #[error("daemon error: {0}")]
    Daemon(String),

    /// Configuration load/save/parse failure
    #[error("config error: {0}")]
    Config(String),

    /// Response body was not the JSON shape we expected
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Caller declined a pending confirmation; no network effect occurred
    #[error("command declined by operator")]
    CommandDeclined,

    /// Command requires the propose/confirm handshake and cannot run directly
    #[error("command requires confirmation before dispatch")]
    ConfirmationRequired,
}

impl ControlError {
    /// Short operator-facing message for transient notifications
    pub fn notification(&self) -> String {
        match self {
            ControlError::Http { message, .. } => message.clone(),
            ControlError::Daemon(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type ControlResult<T> = Result<T, ControlError>;
