//! Common error types for Lockbox.

use thiserror::Error;

/// Top-level error type for Lockbox operations.
///
/// Messages never carry passphrases, secrets or key material.
#[derive(Debug, Error)]
pub enum Error {
    /// The key derivation primitive rejected its parameters or failed.
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    /// Authentication tag mismatch: wrong passphrase or corrupted data.
    #[error("Authentication failed")]
    Authentication,

    /// A stored blob or record does not have the expected layout.
    #[error("Malformed data: {0}")]
    Format(String),

    /// The stored master credential cannot be parsed.
    #[error("Corrupt master credential: {0}")]
    CorruptCredential(String),

    /// No master passphrase has been set yet.
    #[error("No master passphrase exists")]
    NoMaster,

    /// The supplied master passphrase does not match the credential.
    #[error("Incorrect master passphrase")]
    WrongMaster,

    /// The vault directory has not been initialized.
    #[error("No vault at {0}; run `lockbox init` first")]
    VaultNotFound(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Cryptographic operation failed for a reason other than authentication.
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
