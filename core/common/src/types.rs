//! Common types used throughout Lockbox.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use zeroize::Zeroize;

/// Name of a vault entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryName(String);

impl EntryName {
    /// Create a new EntryName from a string.
    ///
    /// # Preconditions
    /// - `name` must be non-empty
    ///
    /// # Errors
    /// - Returns error if name is empty
    pub fn new(name: impl Into<String>) -> crate::Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(crate::Error::InvalidInput(
                "Entry name cannot be empty".to_string(),
            ));
        }
        Ok(Self(name))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EntryName {
    type Error = crate::Error;

    fn try_from(value: String) -> crate::Result<Self> {
        Self::new(value)
    }
}

impl From<EntryName> for String {
    fn from(name: EntryName) -> Self {
        name.0
    }
}

impl fmt::Display for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Encrypted form of one entry's secret: `salt || nonce || ciphertext+tag`.
///
/// The layout is owned by the crypto crate; everything else treats the
/// blob as opaque bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedBlob(Vec<u8>);

impl EncryptedBlob {
    /// Wrap raw blob bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Get the blob bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Get the length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for EncryptedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptedBlob({} bytes)", self.0.len())
    }
}

/// The vault contents: entry name to encrypted blob.
pub type EntryMap = BTreeMap<EntryName, EncryptedBlob>;

/// Salted password hash proving knowledge of the master passphrase.
///
/// Stored as a PHC string. Parsing and verification live in the crypto
/// crate; here it is an opaque single-slot value.
#[derive(Clone, PartialEq, Eq)]
pub struct MasterCredential(String);

impl MasterCredential {
    /// Wrap an encoded credential string.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Get the encoded credential.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for MasterCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MasterCredential([REDACTED])")
    }
}

/// Sensitive data wrapper that zeroizes on drop.
///
/// Holds passphrases and recovered secrets. The full allocation is
/// cleared when the value goes out of scope, on every exit path.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct SensitiveBytes(Vec<u8>);

impl SensitiveBytes {
    /// Create new sensitive bytes.
    pub fn new(data: Vec<u8>) -> Self {
        Self(data)
    }

    /// Get a reference to the inner bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// View the bytes as UTF-8 text.
    ///
    /// # Errors
    /// - Returns `Format` if the bytes are not valid UTF-8
    pub fn as_str(&self) -> crate::Result<&str> {
        std::str::from_utf8(&self.0)
            .map_err(|_| crate::Error::Format("Secret is not valid UTF-8".to_string()))
    }

    /// Get the length.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for SensitiveBytes {
    fn from(value: String) -> Self {
        Self(value.into_bytes())
    }
}

impl fmt::Debug for SensitiveBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SensitiveBytes([REDACTED; {} bytes])", self.0.len())
    }
}
