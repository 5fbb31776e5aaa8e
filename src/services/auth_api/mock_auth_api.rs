use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::models::credentials::{Credentials, OtpPurpose, RegisterPayload};
use crate::models::tokens::TokenPair;
use crate::models::user::AccountSnapshot;

use super::errors::ApiError;
use super::service::{AuthApi, LoginSuccess};

/// Scripted stand-in for the remote service. Each operation pops the next
/// queued result; call counters and delays let tests exercise concurrent
/// interleavings.
#[derive(Default)]
#[allow(dead_code)]
pub struct MockAuthApi {
    pub login_results: Mutex<VecDeque<Result<LoginSuccess, ApiError>>>,
    pub register_results: Mutex<VecDeque<Result<LoginSuccess, ApiError>>>,
    pub refresh_results: Mutex<VecDeque<Result<TokenPair, ApiError>>>,
    pub me_results: Mutex<VecDeque<Result<AccountSnapshot, ApiError>>>,
    pub logout_should_fail: bool,
    /// Milliseconds each login call sleeps before completing.
    pub login_delay_ms: u64,
    /// Milliseconds each refresh call sleeps before completing.
    pub refresh_delay_ms: u64,
    /// Milliseconds each me call sleeps before completing.
    pub me_delay_ms: u64,
    pub login_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    pub me_calls: AtomicUsize,
    pub sent_otps: Mutex<Vec<(String, OtpPurpose)>>,
    pub verified_otps: Mutex<Vec<(String, String)>>,
}

impl MockAuthApi {
    fn unscripted(operation: &str) -> ApiError {
        ApiError::Network(format!("mock: no scripted {} response", operation))
    }
}

#[async_trait]
impl AuthApi for MockAuthApi {
    async fn login(&self, _: &Credentials) -> Result<LoginSuccess, ApiError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        if self.login_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.login_delay_ms)).await;
        }
        self.login_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Self::unscripted("login")))
    }

    async fn register(&self, _: &RegisterPayload) -> Result<LoginSuccess, ApiError> {
        self.register_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Self::unscripted("register")))
    }

    async fn refresh(&self, _: &str) -> Result<TokenPair, ApiError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.refresh_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.refresh_delay_ms)).await;
        }
        self.refresh_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Self::unscripted("refresh")))
    }

    async fn logout(&self, _: &str) -> Result<(), ApiError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        if self.logout_should_fail {
            return Err(ApiError::Network("mock: logout unreachable".into()));
        }
        Ok(())
    }

    async fn me(&self, _: &str) -> Result<AccountSnapshot, ApiError> {
        self.me_calls.fetch_add(1, Ordering::SeqCst);
        if self.me_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.me_delay_ms)).await;
        }
        self.me_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Self::unscripted("me")))
    }

    async fn send_otp(&self, phone_number: &str, purpose: OtpPurpose) -> Result<(), ApiError> {
        self.sent_otps
            .lock()
            .unwrap()
            .push((phone_number.to_string(), purpose));
        Ok(())
    }

    async fn verify_otp(&self, phone_number: &str, code: &str) -> Result<(), ApiError> {
        self.verified_otps
            .lock()
            .unwrap()
            .push((phone_number.to_string(), code.to_string()));
        Ok(())
    }
}
