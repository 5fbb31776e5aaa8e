use std::env;
use std::path::PathBuf;

use anyhow::Context;

pub struct Config {
    pub auth_base_url: String,
    pub request_timeout_secs: u64,
    pub session_store_path: PathBuf,
    pub otp_resend_cooldown_secs: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok(); // Load .env file

        let auth_base_url =
            env::var("MERITUS_API_URL").context("MERITUS_API_URL must be set")?;

        let request_timeout_secs = env::var("MERITUS_REQUEST_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(10);

        let session_store_path = env::var("MERITUS_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".meritus-session.json"));

        let otp_resend_cooldown_secs = env::var("MERITUS_OTP_COOLDOWN_SECONDS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(45);

        Ok(Config {
            auth_base_url,
            request_timeout_secs,
            session_store_path,
            otp_resend_cooldown_secs,
        })
    }
}
