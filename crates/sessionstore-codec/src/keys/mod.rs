use rand::RngCore;
use rand::rngs::OsRng;


/// Authentication key plus optional encryption key for one codec.
#[derive(Clone)]
pub struct KeyPair {
    pub hash_key: Vec<u8>,
    pub block_key: Option<Vec<u8>>,
}

impl KeyPair {
    pub fn new(hash_key: impl Into<Vec<u8>>) -> Self {
        Self {
            hash_key: hash_key.into(),
            block_key: None,
        }
    }

    pub fn with_block_key(mut self, block_key: impl Into<Vec<u8>>) -> Self {
        self.block_key = Some(block_key.into());
        self
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("hash_key", &"[REDACTED]")
            .field("block_key", &self.block_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Fill a buffer of `len` bytes from the operating system RNG.
pub fn generate_random_key(len: usize) -> Vec<u8> {
    let mut key = vec![0u8; len];
    OsRng.fill_bytes(&mut key);
    key
}
