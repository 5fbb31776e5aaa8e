use async_trait::async_trait;
use thiserror::Error;

/// Store keys for the persisted session. Nothing else is written to durable
/// storage; the user record and profile list are refetched each session.
pub const ACCESS_TOKEN_KEY: &str = "auth.access_token";
pub const REFRESH_TOKEN_KEY: &str = "auth.refresh_token";
pub const ACTIVE_ROLE_KEY: &str = "auth.active_role";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Durable key-value storage behind the session manager. Each platform
/// supplies its own adapter (browser storage on web, async persistent
/// storage on mobile, a file for desktop/CLI use).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}
