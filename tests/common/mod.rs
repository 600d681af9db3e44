// Shared test helpers; not all items used by every test binary.
#![allow(unused)]

use cookie::Cookie;
use http::HeaderMap;
use http::header::{COOKIE, HeaderValue, SET_COOKIE};
use sessionstore::client::{SqliteStoreClient, StoreClient};
use sessionstore::{KeyPair, SessionStore};
use std::sync::Arc;
use tempfile::TempDir;

pub const SESSION_NAME: &str = "session-key";

pub fn key_pairs() -> Vec<KeyPair> {
    vec![
        KeyPair::new(b"integration-hash-key".to_vec())
            .with_block_key(b"integration-block-key".to_vec()),
    ]
}

/// SQLite client on a file inside an isolated temp directory.
pub async fn sqlite_client() -> (Arc<SqliteStoreClient>, TempDir) {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let client = SqliteStoreClient::open(tmp.path().join("sessions.db"))
        .expect("Failed to open sqlite store");
    client.ensure_schema().await.expect("ensure schema");
    (Arc::new(client), tmp)
}

pub async fn sqlite_store() -> (SessionStore, Arc<SqliteStoreClient>, TempDir) {
    let (client, tmp) = sqlite_client().await;
    let store = SessionStore::new(client.clone(), &key_pairs())
        .await
        .expect("create session store");
    (store, client, tmp)
}

/// The `Set-Cookie` for `name` in a response.
pub fn response_cookie(response: &HeaderMap, name: &str) -> Option<Cookie<'static>> {
    response
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| Cookie::parse(v.to_string()).ok())
        .find(|c| c.name() == name)
}

/// A request carrying `cookie` the way a browser would send it back.
pub fn replay(cookie: &Cookie<'_>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        COOKIE,
        HeaderValue::from_str(&format!("{}={}", cookie.name(), cookie.value()))
            .expect("valid cookie header"),
    );
    headers
}
