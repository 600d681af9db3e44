use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::{Codec, CodecError, KeyPair, SecureCodec};

#[cfg(test)]
mod tests;

/// Ordered set of codecs. Encoding always uses the first; decoding tries each
/// in turn and succeeds on the first one that authenticates the token.
pub struct CodecPipeline {
    codecs: Vec<Box<dyn Codec>>,
}

impl CodecPipeline {
    pub fn new(codecs: Vec<Box<dyn Codec>>) -> Self {
        Self { codecs }
    }

    /// Build one [`SecureCodec`] per key pair, preserving order.
    pub fn from_pairs(pairs: &[KeyPair]) -> Result<Self, CodecError> {
        if pairs.is_empty() {
            return Err(CodecError::InvalidKey("at least one key pair is required".into()));
        }
        let codecs = pairs
            .iter()
            .map(|pair| SecureCodec::new(pair).map(|c| Box::new(c) as Box<dyn Codec>))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { codecs })
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    pub fn encode<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<String, CodecError> {
        let Some(codec) = self.codecs.first() else {
            return Err(CodecError::Encode("no codecs configured".into()));
        };
        let bytes = serde_json::to_vec(value).map_err(|e| CodecError::Encode(e.to_string()))?;
        codec.encode(name, &bytes)
    }

    pub fn decode<T: DeserializeOwned>(&self, name: &str, token: &str) -> Result<T, CodecError> {
        let mut errors = Vec::with_capacity(self.codecs.len());
        for (idx, codec) in self.codecs.iter().enumerate() {
            match codec.decode(name, token) {
                // Authenticated; a deserialization failure here is final.
                Ok(bytes) => {
                    return serde_json::from_slice(&bytes)
                        .map_err(|e| CodecError::Decode(e.to_string()));
                }
                Err(e) => {
                    trace!(codec = idx, error = %e, "codec rejected token");
                    errors.push(e);
                }
            }
        }
        match errors.len() {
            0 => Err(CodecError::Decode("no codecs configured".into())),
            1 => Err(errors.remove(0)),
            _ => Err(CodecError::Multi(errors)),
        }
    }

    /// Apply a max-age to every codec that supports limits.
    pub fn set_max_age(&self, seconds: i64) {
        for limits in self.codecs.iter().filter_map(|c| c.limits()) {
            limits.set_max_age(seconds);
        }
    }

    /// Apply a max-length to every codec that supports limits. 0 disables it.
    pub fn set_max_length(&self, bytes: usize) {
        for limits in self.codecs.iter().filter_map(|c| c.limits()) {
            limits.set_max_length(bytes);
        }
    }
}

impl std::fmt::Debug for CodecPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecPipeline")
            .field("codecs", &self.codecs.len())
            .finish()
    }
}
