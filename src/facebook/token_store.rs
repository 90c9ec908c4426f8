//! File-backed storage for the Facebook access token.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::ToolError;

const APP_DIR: &str = "facebook-ads-universal";
const TOKEN_FILE: &str = "token.json";

/// On-disk token record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub stored_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires| now > expires)
    }
}

/// What `info` reports about the stored token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenStatus {
    Missing,
    Expired {
        stored_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    },
    Valid {
        stored_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    },
}

pub struct TokenStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    /// `<config dir>/facebook-ads-universal/token.json`, falling back to the
    /// working directory when the platform has no config dir.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(TOKEN_FILE))
            .unwrap_or_else(|| PathBuf::from(TOKEN_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn store(
        &self,
        access_token: &str,
        expires_in: Option<Duration>,
    ) -> Result<StoredToken, ToolError> {
        let access_token = access_token.trim();
        if access_token.is_empty() {
            return Err(ToolError::invalid_field("access_token", "must not be empty"));
        }

        let now = Utc::now();
        let expires_at = expires_in
            .map(chrono::Duration::from_std)
            .transpose()
            .map_err(|e| ToolError::invalid_field("expires_in", e))?
            .map(|ttl| now + ttl);
        let record = StoredToken {
            access_token: access_token.to_string(),
            stored_at: now,
            expires_at,
        };

        let _guard = self.lock.write().await;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error("create token directory", &e))?;
        }
        let body = serde_json::to_vec_pretty(&record)?;
        tokio::fs::write(&self.path, body)
            .await
            .map_err(|e| io_error("write token file", &e))?;

        info!(path = %self.path.display(), "Facebook token stored");
        Ok(record)
    }

    /// The stored token, unless missing or expired. An expired token is
    /// removed as a side effect.
    pub async fn token(&self) -> Result<Option<String>, ToolError> {
        let record = {
            let _guard = self.lock.read().await;
            self.read_record().await?
        };

        match record {
            Some(record) if record.is_expired_at(Utc::now()) => {
                warn!("stored Facebook token has expired, clearing it");
                self.clear_expired().await?;
                Ok(None)
            }
            Some(record) => Ok(Some(record.access_token)),
            None => Ok(None),
        }
    }

    /// Remove the token file. Returns whether a token was present.
    pub async fn clear(&self) -> Result<bool, ToolError> {
        let _guard = self.lock.write().await;
        self.remove_file().await
    }

    /// Remove the record only if it is still expired once the write lock is
    /// held; a token stored since the read survives.
    async fn clear_expired(&self) -> Result<bool, ToolError> {
        let _guard = self.lock.write().await;
        match self.read_record().await? {
            Some(record) if record.is_expired_at(Utc::now()) => self.remove_file().await,
            _ => Ok(false),
        }
    }

    // Callers hold the write lock.
    async fn remove_file(&self) -> Result<bool, ToolError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                info!(path = %self.path.display(), "Facebook token cleared");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error("remove token file", &e)),
        }
    }

    pub async fn info(&self) -> Result<TokenStatus, ToolError> {
        let _guard = self.lock.read().await;
        let status = match self.read_record().await? {
            None => TokenStatus::Missing,
            Some(StoredToken {
                stored_at,
                expires_at: Some(expires_at),
                ..
            }) if Utc::now() > expires_at => TokenStatus::Expired {
                stored_at,
                expires_at,
            },
            Some(record) => TokenStatus::Valid {
                stored_at: record.stored_at,
                expires_at: record.expires_at,
            },
        };
        Ok(status)
    }

    // Callers hold the lock. An unreadable record counts as no token.
    async fn read_record(&self) -> Result<Option<StoredToken>, ToolError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error("read token file", &e)),
        };

        match serde_json::from_slice::<StoredToken>(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(path = %self.path.display(), "ignoring unreadable token file: {}", e);
                Ok(None)
            }
        }
    }
}

fn io_error(action: &str, err: &std::io::Error) -> ToolError {
    ToolError::Internal(format!("Failed to {}: {}", action, err))
}
