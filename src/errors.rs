use thiserror::Error;

use crate::roles::RoleResolutionError;
use crate::store::session_store::StoreError;

/// Caller-facing failure taxonomy. The UI layer decides how each variant is
/// rendered; nothing here is ever surfaced as a panic.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The service rejected the submitted credentials or code. Carries the
    /// server's own message when one was supplied; recoverable by retrying
    /// with corrected input.
    #[error("{message}")]
    Credential { message: String },
    /// No usable response from the service; recoverable by plain retry and
    /// rendered distinctly from a credential rejection.
    #[error("could not reach the authentication service: {0}")]
    Network(String),
    /// The refresh token is no longer good. Local session state has already
    /// been cleared; only a fresh login recovers.
    #[error("session expired")]
    SessionExpired,
    /// Non-credential rejection of an authenticated request.
    #[error("request failed with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error(transparent)]
    Roles(#[from] RoleResolutionError),
    #[error(transparent)]
    Storage(#[from] StoreError),
    /// A newer submission replaced this one before it completed. Callers
    /// drop this silently; the fresher attempt owns the outcome.
    #[error("superseded by a newer attempt")]
    Superseded,
    /// The session was deliberately logged out while this call was in
    /// flight. Callers drop this silently.
    #[error("cancelled by logout")]
    Cancelled,
}
