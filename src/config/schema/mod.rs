use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use sessionstore_codec::{DEFAULT_MAX_LENGTH, KeyPair};
use std::sync::Arc;
use std::time::Duration;

use crate::client::StoreClient;
use crate::errors::SessionError;
use crate::session::Options;
use crate::store::SessionStore;
use crate::sweeper::DEFAULT_CLEANUP_INTERVAL;

/// One codec key pair, base64 (standard alphabet) encoded.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPairConfig {
    pub hash_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_key: Option<String>,
}

impl std::fmt::Debug for KeyPairConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPairConfig")
            .field(
                "hash_key",
                &if self.hash_key.is_empty() {
                    "[empty]"
                } else {
                    "[REDACTED]"
                },
            )
            .field("block_key", &self.block_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl KeyPairConfig {
    pub fn decode(&self) -> Result<KeyPair, SessionError> {
        let hash_key = STANDARD
            .decode(self.hash_key.trim())
            .map_err(|e| SessionError::Config(format!("keyPairs.hashKey is not valid base64: {}", e)))?;
        if hash_key.is_empty() {
            return Err(SessionError::Config(
                "keyPairs.hashKey must not be empty".into(),
            ));
        }
        let mut pair = KeyPair::new(hash_key);
        if let Some(block_key) = &self.block_key {
            let block_key = STANDARD.decode(block_key.trim()).map_err(|e| {
                SessionError::Config(format!("keyPairs.blockKey is not valid base64: {}", e))
            })?;
            if block_key.is_empty() {
                return Err(SessionError::Config(
                    "keyPairs.blockKey must not be empty when set".into(),
                ));
            }
            pair = pair.with_block_key(block_key);
        }
        Ok(pair)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    /// First pair signs new cookies; later pairs are only accepted on decode.
    #[serde(default)]
    pub key_pairs: Vec<KeyPairConfig>,
    #[serde(default)]
    pub cookie: Options,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval: String,
    #[serde(default = "default_database")]
    pub database: String,
}

fn default_max_length() -> usize {
    DEFAULT_MAX_LENGTH
}

fn default_cleanup_interval() -> String {
    "5m".to_string()
}

fn default_database() -> String {
    "sessions.db".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            key_pairs: Vec::new(),
            cookie: Options::default(),
            max_length: default_max_length(),
            cleanup_interval: default_cleanup_interval(),
            database: default_database(),
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.key_pairs.is_empty() {
            return Err(SessionError::Config(
                "keyPairs must contain at least one key pair".into(),
            ));
        }
        self.key_pairs()?;

        if self.cookie.path.is_empty() {
            return Err(SessionError::Config(
                "cookie.path must not be empty".into(),
            ));
        }
        if self.database.trim().is_empty() {
            return Err(SessionError::Config("database must not be empty".into()));
        }
        self.sweep_interval()?;
        Ok(())
    }

    pub fn key_pairs(&self) -> Result<Vec<KeyPair>, SessionError> {
        self.key_pairs.iter().map(KeyPairConfig::decode).collect()
    }

    /// Parsed `cleanupInterval`; zero falls back to the default period.
    pub fn sweep_interval(&self) -> Result<Duration, SessionError> {
        let interval = humantime::parse_duration(self.cleanup_interval.trim()).map_err(|e| {
            SessionError::Config(format!(
                "cleanupInterval '{}' is not a valid duration: {}",
                self.cleanup_interval, e
            ))
        })?;
        Ok(if interval.is_zero() {
            DEFAULT_CLEANUP_INTERVAL
        } else {
            interval
        })
    }

    /// Wire a [`SessionStore`] over `client` with this configuration applied.
    pub async fn build_store(&self, client: Arc<dyn StoreClient>) -> Result<SessionStore, SessionError> {
        let store = SessionStore::new(client, &self.key_pairs()?).await?;
        store.set_default_options(self.cookie.clone());
        store.set_max_length(self.max_length);
        Ok(store)
    }
}

#[cfg(test)]
mod tests;
