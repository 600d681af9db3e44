use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::{Codec, CodecError, KeyPair, SupportsLimits};


type HmacSha256 = Hmac<Sha256>;

/// Default upper bound on token length, in bytes.
pub const DEFAULT_MAX_LENGTH: usize = 4096;
/// Default upper bound on token age: 30 days.
pub const DEFAULT_MAX_AGE_SECS: i64 = 86400 * 30;

const NONCE_LEN: usize = 12;
const BLOCK_KEY_INFO: &[u8] = b"sessionstore-block-key";

/// HMAC-SHA256 signed codec with optional AES-256-GCM payload encryption.
///
/// Token layout before the outer base64url pass: `timestamp|payload|mac`,
/// where the MAC covers `name|timestamp|payload`. A token only decodes under
/// the cookie name it was encoded for.
pub struct SecureCodec {
    hash_key: Vec<u8>,
    cipher: Option<Aes256Gcm>,
    max_length: AtomicUsize,
    max_age: AtomicI64,
}

impl SecureCodec {
    pub fn new(pair: &KeyPair) -> Result<Self, CodecError> {
        if pair.hash_key.is_empty() {
            return Err(CodecError::InvalidKey("hash key must not be empty".into()));
        }
        let cipher = match pair.block_key.as_deref() {
            Some([]) => {
                return Err(CodecError::InvalidKey(
                    "block key must not be empty".into(),
                ));
            }
            Some(block_key) => Some(derive_cipher(block_key)?),
            None => None,
        };

        Ok(Self {
            hash_key: pair.hash_key.clone(),
            cipher,
            max_length: AtomicUsize::new(DEFAULT_MAX_LENGTH),
            max_age: AtomicI64::new(DEFAULT_MAX_AGE_SECS),
        })
    }

    pub fn is_encrypted(&self) -> bool {
        self.cipher.is_some()
    }

    pub fn max_length(&self) -> usize {
        self.max_length.load(Ordering::Relaxed)
    }

    pub fn max_age(&self) -> i64 {
        self.max_age.load(Ordering::Relaxed)
    }

    fn mac(&self, name: &str, timestamp: &str, payload: &str) -> Result<Vec<u8>, CodecError> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.hash_key)
            .map_err(|e| CodecError::InvalidKey(e.to_string()))?;
        mac.update(name.as_bytes());
        mac.update(b"|");
        mac.update(timestamp.as_bytes());
        mac.update(b"|");
        mac.update(payload.as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }

    fn check_length(&self, len: usize) -> Result<(), CodecError> {
        let max = self.max_length();
        if max != 0 && len > max {
            return Err(CodecError::TooLong { len, max });
        }
        Ok(())
    }

    pub(crate) fn encode_at(&self, name: &str, value: &[u8], now: i64) -> Result<String, CodecError> {
        let sealed = match &self.cipher {
            Some(cipher) => seal(cipher, value)?,
            None => value.to_vec(),
        };
        let payload = URL_SAFE_NO_PAD.encode(sealed);
        let timestamp = now.to_string();
        let mac = self.mac(name, &timestamp, &payload)?;
        let token = URL_SAFE_NO_PAD.encode(format!(
            "{}|{}|{}",
            timestamp,
            payload,
            URL_SAFE_NO_PAD.encode(mac)
        ));
        self.check_length(token.len())?;
        Ok(token)
    }

    pub(crate) fn decode_at(&self, name: &str, token: &str, now: i64) -> Result<Vec<u8>, CodecError> {
        self.check_length(token.len())?;

        let raw = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| CodecError::Malformed("invalid base64"))?;
        let raw = String::from_utf8(raw).map_err(|_| CodecError::Malformed("invalid utf-8"))?;

        let mut parts = raw.splitn(3, '|');
        let (Some(timestamp), Some(payload), Some(tag)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(CodecError::Malformed("expected timestamp, payload and mac"));
        };

        let tag = URL_SAFE_NO_PAD
            .decode(tag)
            .map_err(|_| CodecError::Malformed("invalid mac encoding"))?;
        let expected = self.mac(name, timestamp, payload)?;
        if !bool::from(expected.ct_eq(&tag)) {
            return Err(CodecError::MacInvalid);
        }

        let issued: i64 = timestamp
            .parse()
            .map_err(|_| CodecError::Malformed("invalid timestamp"))?;
        let max_age = self.max_age();
        if max_age != 0 && issued < now - max_age {
            return Err(CodecError::Expired);
        }

        let sealed = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| CodecError::Malformed("invalid payload encoding"))?;
        match &self.cipher {
            Some(cipher) => open(cipher, &sealed),
            None => Ok(sealed),
        }
    }
}

impl Codec for SecureCodec {
    fn encode(&self, name: &str, value: &[u8]) -> Result<String, CodecError> {
        self.encode_at(name, value, Utc::now().timestamp())
    }

    fn decode(&self, name: &str, token: &str) -> Result<Vec<u8>, CodecError> {
        self.decode_at(name, token, Utc::now().timestamp())
    }

    fn limits(&self) -> Option<&dyn SupportsLimits> {
        Some(self)
    }
}

impl SupportsLimits for SecureCodec {
    fn set_max_age(&self, seconds: i64) {
        self.max_age.store(seconds, Ordering::Relaxed);
    }

    fn set_max_length(&self, bytes: usize) {
        self.max_length.store(bytes, Ordering::Relaxed);
    }
}

/// Derive an AES-256 key from arbitrary-length block key material.
fn derive_cipher(block_key: &[u8]) -> Result<Aes256Gcm, CodecError> {
    let hk = Hkdf::<Sha256>::new(None, block_key);
    let mut okm = [0u8; 32];
    hk.expand(BLOCK_KEY_INFO, &mut okm)
        .map_err(|_| CodecError::InvalidKey("block key derivation failed".into()))?;
    Aes256Gcm::new_from_slice(&okm)
        .map_err(|_| CodecError::InvalidKey("block key derivation failed".into()))
}

/// Encrypt with a fresh random nonce, returning `nonce || ciphertext`.
fn seal(cipher: &Aes256Gcm, plaintext: &[u8]) -> Result<Vec<u8>, CodecError> {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| CodecError::Encrypt)?;
    let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(nonce.as_slice());
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

fn open(cipher: &Aes256Gcm, sealed: &[u8]) -> Result<Vec<u8>, CodecError> {
    if sealed.len() < NONCE_LEN {
        return Err(CodecError::Malformed("ciphertext too short"));
    }
    let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CodecError::Decrypt)
}
