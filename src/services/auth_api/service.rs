use async_trait::async_trait;

use crate::models::credentials::{Credentials, OtpPurpose, RegisterPayload};
use crate::models::tokens::TokenPair;
use crate::models::user::{AccountSnapshot, User};

use super::errors::ApiError;

/// Successful login or registration: the issued token pair plus the user
/// record the service returns alongside it.
#[derive(Debug, Clone)]
pub struct LoginSuccess {
    pub tokens: TokenPair,
    pub user: User,
}

/// Client-side contract of the remote auth service. One live HTTP
/// implementation, one scripted mock for tests.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<LoginSuccess, ApiError>;
    async fn register(&self, payload: &RegisterPayload) -> Result<LoginSuccess, ApiError>;
    /// Exchanges the current refresh token for a new pair. The old token is
    /// invalidated on use.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError>;
    /// Retires the refresh token server-side. Callers treat failures as
    /// non-fatal.
    async fn logout(&self, refresh_token: &str) -> Result<(), ApiError>;
    async fn me(&self, access_token: &str) -> Result<AccountSnapshot, ApiError>;
    async fn send_otp(&self, phone_number: &str, purpose: OtpPurpose) -> Result<(), ApiError>;
    async fn verify_otp(&self, phone_number: &str, code: &str) -> Result<(), ApiError>;
}
