#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

//! Authenticated cookie value codec.
//!
//! A [`SecureCodec`] turns bytes into an opaque, URL-safe token carrying a
//! timestamp and an HMAC-SHA256 tag, optionally sealing the payload with
//! AES-256-GCM first. A [`CodecPipeline`] holds an ordered list of codecs:
//! the first one encodes, every one is tried on decode, which is how keys
//! are rotated without invalidating cookies already handed out.

mod error;
mod keys;
mod pipeline;
mod secure;

pub use error::CodecError;
pub use keys::{KeyPair, generate_random_key};
pub use pipeline::CodecPipeline;
pub use secure::{DEFAULT_MAX_AGE_SECS, DEFAULT_MAX_LENGTH, SecureCodec};

/// A reversible name-bound transform from bytes to an opaque token.
pub trait Codec: Send + Sync {
    fn encode(&self, name: &str, value: &[u8]) -> Result<String, CodecError>;

    fn decode(&self, name: &str, token: &str) -> Result<Vec<u8>, CodecError>;

    /// Codecs that enforce age and length bounds expose them here so the
    /// pipeline can reconfigure them. Others return `None` and are skipped.
    fn limits(&self) -> Option<&dyn SupportsLimits> {
        None
    }
}

/// Runtime-adjustable bounds on tokens.
pub trait SupportsLimits: Send + Sync {
    /// Maximum token age in seconds; 0 disables the check.
    fn set_max_age(&self, seconds: i64);

    /// Maximum token length in bytes; 0 disables the check.
    fn set_max_length(&self, bytes: usize);
}
