//! Storage backends for Lockbox.
//!
//! The vault talks to persistence through two narrow traits: a map of
//! entry name to encrypted blob, and a single-slot master credential.
//!
//! # Design Principles
//! - Backend isolation: no backend-specific logic in vault or crypto crates
//! - Synchronous: every call runs to completion on the calling thread
//! - Byte fidelity: blobs come back exactly as they were saved

pub mod local;
pub mod memory;
pub mod provider;
pub mod sqlite;

pub use local::FileCredentialStore;
pub use memory::{MemoryCredentialStore, MemoryVaultStore};
pub use provider::{MasterCredentialStore, VaultStore};
pub use sqlite::SqliteVaultStore;
