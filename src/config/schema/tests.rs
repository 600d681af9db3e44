use super::*;
use crate::client::MemoryStoreClient;

fn valid_config() -> StoreConfig {
    StoreConfig {
        key_pairs: vec![KeyPairConfig {
            hash_key: STANDARD.encode(b"hash-key-material"),
            block_key: None,
        }],
        ..StoreConfig::default()
    }
}

#[test]
fn test_default_config_requires_keys() {
    let err = StoreConfig::default().validate().unwrap_err();
    assert!(err.to_string().contains("keyPairs"));
}

#[test]
fn test_valid_config_validates() {
    assert!(valid_config().validate().is_ok());
}

#[test]
fn test_defaults() {
    let config = StoreConfig::default();
    assert_eq!(config.max_length, 4096);
    assert_eq!(config.cleanup_interval, "5m");
    assert_eq!(config.database, "sessions.db");
    assert_eq!(config.cookie, Options::default());
}

#[test]
fn test_invalid_base64_key() {
    let mut config = valid_config();
    config.key_pairs[0].hash_key = "not base64!!".into();
    assert!(matches!(config.validate(), Err(SessionError::Config(_))));
}

#[test]
fn test_empty_hash_key() {
    let mut config = valid_config();
    config.key_pairs[0].hash_key = String::new();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("must not be empty"));
}

#[test]
fn test_empty_block_key() {
    let mut config = valid_config();
    config.key_pairs[0].block_key = Some(String::new());
    assert!(config.validate().is_err());
}

#[test]
fn test_block_key_decodes() {
    let mut config = valid_config();
    config.key_pairs[0].block_key = Some(STANDARD.encode(b"block-key-material"));
    let pairs = config.key_pairs().unwrap();
    assert_eq!(pairs[0].block_key.as_deref(), Some(&b"block-key-material"[..]));
}

#[test]
fn test_empty_cookie_path() {
    let mut config = valid_config();
    config.cookie.path = String::new();
    assert!(config.validate().is_err());
}

#[test]
fn test_invalid_cleanup_interval() {
    let mut config = valid_config();
    config.cleanup_interval = "every so often".into();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("cleanupInterval"));
}

#[test]
fn test_sweep_interval_parsing() {
    let mut config = valid_config();
    assert_eq!(config.sweep_interval().unwrap(), Duration::from_secs(300));
    config.cleanup_interval = "90s".into();
    assert_eq!(config.sweep_interval().unwrap(), Duration::from_secs(90));
    config.cleanup_interval = "0s".into();
    assert_eq!(config.sweep_interval().unwrap(), DEFAULT_CLEANUP_INTERVAL);
}

#[test]
fn test_deserialize_camel_case() {
    let json = format!(
        r#"{{
            "keyPairs": [{{"hashKey": "{}"}}],
            "cookie": {{"path": "/app", "maxAge": 3600, "secure": true}},
            "maxLength": 8192,
            "cleanupInterval": "1m",
            "database": "/tmp/s.db"
        }}"#,
        STANDARD.encode(b"k")
    );
    let config: StoreConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(config.cookie.path, "/app");
    assert_eq!(config.cookie.max_age, 3600);
    assert!(config.cookie.secure);
    assert!(config.cookie.http_only);
    assert_eq!(config.max_length, 8192);
    assert!(config.validate().is_ok());
}

#[test]
fn test_debug_redacts_keys() {
    let mut config = valid_config();
    config.key_pairs[0].block_key = Some("c2VjcmV0".into());
    let debug = format!("{:?}", config);
    assert!(!debug.contains(&config.key_pairs[0].hash_key));
    assert!(!debug.contains("c2VjcmV0"));
    assert!(debug.contains("[REDACTED]"));
}

#[test]
fn test_debug_marks_missing_keys() {
    let pair = KeyPairConfig {
        hash_key: String::new(),
        block_key: None,
    };
    assert_eq!(
        format!("{:?}", pair),
        r#"KeyPairConfig { hash_key: "[empty]", block_key: None }"#
    );
}

#[tokio::test]
async fn test_build_store_applies_cookie_options() {
    let mut config = valid_config();
    config.cookie.max_age = 60;
    config.cookie.path = "/app".into();
    let store = config
        .build_store(Arc::new(MemoryStoreClient::new()))
        .await
        .unwrap();
    assert_eq!(store.options().max_age, 60);
    assert_eq!(store.options().path, "/app");
}
