use thiserror::Error;

/// All errors that can occur in gcmseal.
///
/// Codec- and engine-level variants are returned to the immediate caller
/// as-is. The envelope boundary collapses them into `UnableToEncryptData`
/// or `UnableToDecryptData`.
#[derive(Debug, Error)]
pub enum GcmSealError {
    // --- Codec errors ---
    #[error("Invalid hex encoding")]
    InvalidHexEncoding,

    #[error("Invalid {what} length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Malformed envelope: {0} bytes is shorter than nonce + tag")]
    MalformedEnvelope(usize),

    // --- Cipher errors ---
    #[error("Unable to generate authentication tag")]
    UnableToGenerateAuthenticationTag,

    #[error("Authentication failed — data was tampered with or the key is wrong")]
    AuthenticationFailed,

    // --- Boundary errors (deliberately opaque) ---
    #[error("Unable to encrypt data")]
    UnableToEncryptData,

    #[error("Unable to decrypt data")]
    UnableToDecryptData,

    // --- Key store errors ---
    #[error("Key store unavailable: {0}")]
    KeyStoreUnavailable(String),

    #[error("Key generation failed: {0}")]
    KeyGenerationFailed(String),

    #[error("No key stored under alias '{0}'")]
    KeyNotFound(String),

    #[error("Invalid key alias '{0}'")]
    InvalidAlias(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

/// Convenience type alias for gcmseal results.
pub type Result<T> = std::result::Result<T, GcmSealError>;
