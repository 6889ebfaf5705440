//! Bearer-token sources for the client.
//!
//! The client only ever reads: before each call it asks its `TokenStore` for
//! the current access token. Issuing, refreshing and clearing tokens belongs
//! to whoever owns the session, which is why the write operations live on the
//! concrete stores rather than on the trait.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::TokenStoreError;
use crate::types::TokenResponse;

/// Storage key of the access token.
pub const AUTH_TOKEN_KEY: &str = "authToken";
/// Storage key of the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
/// Storage key of the serialized signed-in user.
pub const USER_KEY: &str = "user";

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn access_token(&self) -> Option<String>;

    async fn refresh_token(&self) -> Option<String> {
        None
    }
}

/// A store that never has a token.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTokens;

#[async_trait]
impl TokenStore for NoTokens {
    async fn access_token(&self) -> Option<String> {
        None
    }
}

/// In-process key-value store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_access_token(token: impl Into<String>) -> Self {
        let mut entries = HashMap::new();
        entries.insert(AUTH_TOKEN_KEY.to_string(), token.into());
        Self {
            entries: RwLock::new(entries),
        }
    }

    pub async fn set_tokens(&self, access: impl Into<String>, refresh: Option<String>) {
        let mut entries = self.entries.write().await;
        entries.insert(AUTH_TOKEN_KEY.to_string(), access.into());
        match refresh {
            Some(refresh) => entries.insert(REFRESH_TOKEN_KEY.to_string(), refresh),
            None => entries.remove(REFRESH_TOKEN_KEY),
        };
    }

    pub async fn save_session(&self, session: &TokenResponse) {
        self.set_tokens(&session.access_token, Some(session.refresh_token.clone()))
            .await;
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn access_token(&self) -> Option<String> {
        self.entries.read().await.get(AUTH_TOKEN_KEY).cloned()
    }

    async fn refresh_token(&self) -> Option<String> {
        self.entries.read().await.get(REFRESH_TOKEN_KEY).cloned()
    }
}

/// Key-value store persisted as a flat JSON object on disk.
///
/// The file is read on every lookup so that tokens written by another
/// process (or another handle) are picked up by the next call. A missing or
/// unreadable file reads as "no token".
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let raw = tokio::fs::read_to_string(&self.path).await.ok()?;
        match serde_json::from_str::<HashMap<String, String>>(&raw) {
            Ok(mut entries) => entries.remove(key),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "ignoring corrupt token store");
                None
            }
        }
    }

    /// Persist tokens and the signed-in user from a login or refresh.
    pub async fn save_session(&self, session: &TokenResponse) -> Result<(), TokenStoreError> {
        let mut entries = self.load().await?;
        entries.insert(AUTH_TOKEN_KEY.to_string(), session.access_token.clone());
        entries.insert(REFRESH_TOKEN_KEY.to_string(), session.refresh_token.clone());
        entries.insert(USER_KEY.to_string(), serde_json::to_string(&session.user)?);
        self.store(&entries).await
    }

    /// Drop the session keys, leaving any unrelated keys untouched.
    pub async fn clear(&self) -> Result<(), TokenStoreError> {
        let mut entries = self.load().await?;
        for key in [AUTH_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY] {
            entries.remove(key);
        }
        self.store(&entries).await
    }

    async fn load(&self) -> Result<HashMap<String, String>, TokenStoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    /// Write a sibling file and rename it over the store, so readers see
    /// either the old contents or the new ones.
    async fn store(&self, entries: &HashMap<String, String>) -> Result<(), TokenStoreError> {
        let raw = serde_json::to_string_pretty(entries)?;
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        tokio::fs::write(&staging, raw).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn access_token(&self) -> Option<String> {
        self.get(AUTH_TOKEN_KEY).await
    }

    async fn refresh_token(&self) -> Option<String> {
        self.get(REFRESH_TOKEN_KEY).await
    }
}
