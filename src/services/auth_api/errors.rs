use thiserror::Error;

/// Wire-level failures from the remote auth service. The session manager
/// folds these into the caller-facing [`crate::errors::AuthError`] taxonomy
/// depending on which operation was underway.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// 401 from the service.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },
    /// Any other rejection status, with the envelope message when one could
    /// be parsed out of the body.
    #[error("rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
    /// The request never produced a usable response.
    #[error("network error: {0}")]
    Network(String),
    /// The service answered with a body the client could not decode.
    #[error("malformed response body: {0}")]
    Decode(String),
}
