use anyhow::Context;
use chrono::{DateTime, Utc};
use data_encoding::BASE32_NOPAD;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sessionstore_codec::generate_random_key;
use std::collections::HashMap;

use crate::errors::Result;


/// Default cookie lifetime: 30 days.
pub const DEFAULT_MAX_AGE: i64 = 86400 * 30;

/// Number of random bytes behind a session id.
const SESSION_ID_BYTES: usize = 32;

/// Values key under which flash messages are kept.
pub const FLASHES_KEY: &str = "_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    Lax,
    Strict,
    None,
}

/// Cookie attributes for a session.
///
/// `max_age` is in seconds: negative deletes the session on save, zero
/// makes a browser-session cookie, positive expires after that many seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default = "default_max_age")]
    pub max_age: i64,
    #[serde(default)]
    pub secure: bool,
    #[serde(default = "default_true")]
    pub http_only: bool,
    #[serde(default)]
    pub same_site: Option<SameSite>,
}

fn default_path() -> String {
    "/".to_string()
}

fn default_max_age() -> i64 {
    DEFAULT_MAX_AGE
}

fn default_true() -> bool {
    true
}

impl Default for Options {
    fn default() -> Self {
        Self {
            path: default_path(),
            domain: None,
            max_age: DEFAULT_MAX_AGE,
            secure: false,
            http_only: true,
            same_site: None,
        }
    }
}

/// Request-scoped session state.
///
/// Sessions are handed out by [`SessionStore`](crate::store::SessionStore)
/// and own their `options`; changing them never affects the store defaults
/// or any other session.
#[derive(Debug, Clone)]
pub struct Session {
    name: String,
    pub id: String,
    pub values: HashMap<String, Value>,
    pub is_new: bool,
    pub options: Options,
    pub(crate) created_on: Option<DateTime<Utc>>,
    pub(crate) expires_on: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(name: impl Into<String>, options: Options) -> Self {
        Self {
            name: name.into(),
            id: String::new(),
            values: HashMap::new(),
            is_new: true,
            options,
            created_on: None,
            expires_on: None,
        }
    }

    /// Cookie name this session is stored under.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_on(&self) -> Option<DateTime<Utc>> {
        self.created_on
    }

    pub fn expires_on(&self) -> Option<DateTime<Utc>> {
        self.expires_on
    }

    pub fn insert<T: Serialize + ?Sized>(&mut self, key: impl Into<String>, value: &T) -> Result<()> {
        let key = key.into();
        let value = serde_json::to_value(value)
            .with_context(|| format!("failed to serialize session value '{}'", key))?;
        self.values.insert(key, value);
        Ok(())
    }

    /// Typed lookup. Missing keys and values of another shape both yield `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|v| T::deserialize(v).ok())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn add_flash(&mut self, message: impl Into<Value>) {
        let entry = self
            .values
            .entry(FLASHES_KEY.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        match entry {
            Value::Array(items) => items.push(message.into()),
            other => *other = Value::Array(vec![message.into()]),
        }
    }

    /// Return and drop all pending flash messages.
    pub fn take_flashes(&mut self) -> Vec<Value> {
        match self.values.remove(FLASHES_KEY) {
            Some(Value::Array(items)) => items,
            Some(other) => vec![other],
            None => Vec::new(),
        }
    }
}

/// Mint a new session id: 32 bytes from the OS RNG, base32 without padding.
pub fn generate_session_id() -> String {
    BASE32_NOPAD.encode(&generate_random_key(SESSION_ID_BYTES))
}
