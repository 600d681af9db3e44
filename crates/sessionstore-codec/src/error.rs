use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to serialize value: {0}")]
    Encode(String),

    #[error("failed to deserialize value: {0}")]
    Decode(String),

    #[error("the value is not valid: mac mismatch")]
    MacInvalid,

    #[error("the value could not be parsed: {0}")]
    Malformed(&'static str),

    #[error("the value is too long: {len} bytes exceeds limit of {max}")]
    TooLong { len: usize, max: usize },

    #[error("expired timestamp")]
    Expired,

    #[error("failed to encrypt value")]
    Encrypt,

    #[error("failed to decrypt value")]
    Decrypt,

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("no codec accepted the value: {}", join_errors(.0))]
    Multi(Vec<CodecError>),
}

fn join_errors(errors: &[CodecError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
