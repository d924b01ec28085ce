use thiserror::Error;

/// Errors surfaced by the completion client.
///
/// The UI treats every variant the same way (one fixed apology message in
/// the conversation); the split exists so logs and tests can tell transport
/// failures from API rejections.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (DNS, refused connection, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API rejected the credential (HTTP 401/403).
    #[error("authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },

    /// Any other non-success response from the API.
    #[error("API error ({status}): {message}")]
    Protocol { status: u16, message: String },
}
