//! Key derivation using Argon2id.
//!
//! Argon2id is a memory-hard password hashing function that provides
//! resistance to both GPU and time-memory trade-off attacks.

use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::keys::{DerivedKey, Salt, KEY_LENGTH};
use lockbox_common::{Error, Result};

/// Parameters for Argon2id key derivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB (e.g., 65536 = 64 MiB).
    pub memory_cost: u32,
    /// Number of iterations.
    pub time_cost: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl KdfParams {
    /// Create parameters suitable for interactive use.
    ///
    /// These parameters provide a balance between security and usability,
    /// targeting approximately 0.5-1 second of derivation time.
    pub fn interactive() -> Self {
        Self {
            memory_cost: 65536, // 64 MiB
            time_cost: 3,
            parallelism: 4,
        }
    }

    /// Create parameters suitable for sensitive data.
    ///
    /// Higher security parameters that may take several seconds.
    pub fn sensitive() -> Self {
        Self {
            memory_cost: 262144, // 256 MiB
            time_cost: 4,
            parallelism: 4,
        }
    }

    /// Create moderate parameters for constrained machines.
    pub fn moderate() -> Self {
        Self {
            memory_cost: 32768, // 32 MiB
            time_cost: 3,
            parallelism: 2,
        }
    }

    /// Look up a preset by name.
    pub fn from_strength(strength: &str) -> Result<Self> {
        match strength {
            "interactive" => Ok(Self::interactive()),
            "moderate" => Ok(Self::moderate()),
            "sensitive" => Ok(Self::sensitive()),
            other => Err(Error::InvalidInput(format!(
                "Unknown KDF strength '{}': use interactive, moderate or sensitive",
                other
            ))),
        }
    }

    /// Build an Argon2id instance for these parameters.
    ///
    /// # Errors
    /// - Returns `KeyDerivation` if Argon2 rejects the cost parameters
    pub(crate) fn argon2(&self) -> Result<Argon2<'static>> {
        let params = Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            Some(KEY_LENGTH),
        )
        .map_err(|e| Error::KeyDerivation(format!("Invalid KDF parameters: {}", e)))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::interactive()
    }
}

/// Derive a symmetric key from a passphrase and salt using Argon2id.
///
/// # Preconditions
/// - `passphrase` must not be empty
/// - `params` must have valid Argon2id parameters
///
/// # Postconditions
/// - The derived key is deterministic given the same inputs
///
/// # Errors
/// - `InvalidInput` if the passphrase is empty
/// - `KeyDerivation` if the parameters are rejected or hashing fails;
///   no key is returned in that case
pub fn derive_key(passphrase: &[u8], salt: &Salt, params: &KdfParams) -> Result<DerivedKey> {
    if passphrase.is_empty() {
        return Err(Error::InvalidInput("Passphrase cannot be empty".to_string()));
    }

    let argon2 = params.argon2()?;

    let mut key_bytes = Zeroizing::new([0u8; KEY_LENGTH]);
    argon2
        .hash_password_into(passphrase, salt.as_bytes(), &mut key_bytes[..])
        .map_err(|e| Error::KeyDerivation(e.to_string()))?;

    Ok(DerivedKey::from_bytes(*key_bytes))
}

#[cfg(test)]
pub(crate) fn test_params() -> KdfParams {
    KdfParams {
        memory_cost: 256,
        time_cost: 1,
        parallelism: 1,
    }
}
