use async_trait::async_trait;
use dashmap::DashMap;

use super::session_store::{SessionStore, StoreError};

/// In-memory adapter. Sessions stored here do not survive a restart; used
/// in tests and for callers that opt out of durable persistence.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: DashMap<String, String>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_remove_round_trip() {
        let store = MemorySessionStore::default();
        store.set("auth.access_token", "abc").await.unwrap();
        assert_eq!(
            store.get("auth.access_token").await.unwrap(),
            Some("abc".to_string())
        );

        store.remove("auth.access_token").await.unwrap();
        assert_eq!(store.get("auth.access_token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn get_missing_key_is_none() {
        let store = MemorySessionStore::default();
        assert_eq!(store.get("auth.active_role").await.unwrap(), None);
    }
}
