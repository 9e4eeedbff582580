//! Token storage backends
//!
//! The blueprint stores the token obtained from the dance through a storage
//! backend so deployments can swap in something persistent. The default is
//! process-local memory.

use std::fmt;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// OAuth token as stored after a code or refresh-token exchange
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredToken {
    pub access_token: String,
    pub token_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl StoredToken {
    /// Whether the access token has passed its expiry time
    ///
    /// Tokens without a recorded expiry are treated as still valid.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() >= expires_at,
            None => false,
        }
    }
}

/// Storage backend for the blueprint's token
pub trait TokenStorage: Send + Sync + fmt::Debug {
    fn get(&self) -> Option<StoredToken>;
    fn set(&self, token: StoredToken);
    fn delete(&self);
}

/// In-memory token storage, the default backend
#[derive(Debug, Default)]
pub struct MemoryStorage {
    token: RwLock<Option<StoredToken>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryStorage {
    fn get(&self) -> Option<StoredToken> {
        self.token.read().clone()
    }

    fn set(&self, token: StoredToken) {
        *self.token.write() = Some(token);
    }

    fn delete(&self) {
        *self.token.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_token() -> StoredToken {
        StoredToken {
            access_token: "access".to_string(),
            token_type: "Bearer".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at: Some(Utc::now() + Duration::hours(1)),
            scopes: vec!["openid".to_string(), "profile".to_string()],
        }
    }

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert!(storage.get().is_none());

        let token = sample_token();
        storage.set(token.clone());
        assert_eq!(storage.get(), Some(token));

        storage.delete();
        assert!(storage.get().is_none());
    }

    #[test]
    fn test_token_expiry() {
        let mut token = sample_token();
        assert!(!token.is_expired());

        token.expires_at = Some(Utc::now() - Duration::seconds(1));
        assert!(token.is_expired());

        token.expires_at = None;
        assert!(!token.is_expired());
    }
}
