//! Vault engine for Lockbox.
//!
//! This module provides:
//! - The vault context: entry map, master credential and their stores
//! - Master passphrase creation and change with all-or-nothing re-keying
//! - Entry add, get and delete under master verification
//! - Directory layout and configuration for local vaults
//!
//! # Architecture
//! The vault crate sits between the caller and the storage backends,
//! handling all encryption and decryption through the crypto crate.

pub mod config;
pub mod context;
pub mod manager;
pub mod rekey;
pub mod status;

pub use config::{VaultConfig, VaultVersion};
pub use context::VaultContext;
pub use manager::VaultManager;
pub use rekey::reencrypt;
pub use status::Status;

#[cfg(test)]
pub(crate) mod test_support {
    use lockbox_crypto::KdfParams;

    /// Cheap Argon2 cost so tests stay fast.
    pub fn fast_params() -> KdfParams {
        KdfParams {
            memory_cost: 256,
            time_cost: 1,
            parallelism: 1,
        }
    }
}
