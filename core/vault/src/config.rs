//! Vault configuration and metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lockbox_common::{Error, Result};
use lockbox_crypto::{KdfParams, DEFAULT_SECRET_LENGTH};

/// Vault format version for migration support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultVersion {
    pub major: u32,
    pub minor: u32,
}

impl VaultVersion {
    /// Current vault format version.
    pub const CURRENT: Self = Self { major: 1, minor: 0 };

    /// Check if this version is compatible with the current version.
    pub fn is_compatible(&self) -> bool {
        self.major == Self::CURRENT.major
    }
}

impl Default for VaultVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

/// Vault configuration, stored in plaintext next to the database.
///
/// Blobs do not record the KDF cost they were sealed with, so the
/// parameters here are fixed when the vault is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Vault format version.
    pub version: VaultVersion,
    /// KDF parameters for entry keys and the master credential.
    pub kdf_params: KdfParams,
    /// Length of generated secrets when none is requested.
    #[serde(default = "default_secret_length")]
    pub secret_length: usize,
    /// Vault creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last time the master passphrase changed.
    pub modified_at: DateTime<Utc>,
}

fn default_secret_length() -> usize {
    DEFAULT_SECRET_LENGTH
}

impl VaultConfig {
    /// Create a configuration for a new vault.
    pub fn new(kdf_params: KdfParams) -> Self {
        let now = Utc::now();
        Self {
            version: VaultVersion::CURRENT,
            kdf_params,
            secret_length: DEFAULT_SECRET_LENGTH,
            created_at: now,
            modified_at: now,
        }
    }

    /// Record a master passphrase change.
    pub fn touch(&mut self) {
        self.modified_at = Utc::now();
    }

    /// Serialize configuration to pretty JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize from bytes, rejecting incompatible versions.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let config: Self =
            serde_json::from_slice(bytes).map_err(|e| Error::Serialization(e.to_string()))?;

        if !config.version.is_compatible() {
            return Err(Error::InvalidInput(format!(
                "Incompatible vault version: {}.{}",
                config.version.major, config.version.minor
            )));
        }

        Ok(config)
    }
}

/// Configuration file name in the vault directory.
pub const CONFIG_FILENAME: &str = "vault.config";

/// Entry database file name in the vault directory.
pub const DATABASE_FILENAME: &str = "vault.db";

/// Master credential file name in the vault directory.
pub const MASTER_FILENAME: &str = "master_hash";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vault_version_compatibility() {
        let current = VaultVersion::CURRENT;
        assert!(current.is_compatible());

        let incompatible = VaultVersion { major: 2, minor: 0 };
        assert!(!incompatible.is_compatible());
    }

    #[test]
    fn test_config_serialization() {
        let config = VaultConfig::new(KdfParams::moderate());

        let bytes = config.to_bytes().unwrap();
        let restored = VaultConfig::from_bytes(&bytes).unwrap();

        assert_eq!(restored.kdf_params, KdfParams::moderate());
        assert_eq!(restored.secret_length, DEFAULT_SECRET_LENGTH);
        assert_eq!(restored.created_at, config.created_at);
    }

    #[test]
    fn test_incompatible_config_rejected() {
        let mut config = VaultConfig::new(KdfParams::moderate());
        config.version = VaultVersion { major: 2, minor: 0 };

        let bytes = config.to_bytes().unwrap();
        assert!(matches!(
            VaultConfig::from_bytes(&bytes),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_missing_secret_length_defaults() {
        let json = serde_json::json!({
            "version": { "major": 1, "minor": 0 },
            "kdf_params": { "memory_cost": 32768, "time_cost": 3, "parallelism": 2 },
            "created_at": "2026-01-01T00:00:00Z",
            "modified_at": "2026-01-01T00:00:00Z"
        });

        let config = VaultConfig::from_bytes(json.to_string().as_bytes()).unwrap();
        assert_eq!(config.secret_length, DEFAULT_SECRET_LENGTH);
    }
}
