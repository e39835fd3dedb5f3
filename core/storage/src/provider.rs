//! Storage trait definitions.

use lockbox_common::{EntryMap, MasterCredential, Result};

/// Durable map of entry name to encrypted blob.
///
/// Implementations own the physical schema. The vault only relies on
/// unique names and on blobs coming back byte-for-byte as saved.
pub trait VaultStore: Send {
    /// Get the backend name (e.g., "sqlite", "memory").
    fn name(&self) -> &str;

    /// Load every stored entry.
    ///
    /// # Errors
    /// - `Format` if a stored record cannot be decoded
    /// - Storage or I/O errors
    fn load(&self) -> Result<EntryMap>;

    /// Replace the stored contents with `entries`.
    ///
    /// # Postconditions
    /// - A following `load` returns exactly `entries`; names absent from
    ///   `entries` are gone
    ///
    /// # Errors
    /// - Storage or I/O errors; the previous contents stay intact
    fn save(&self, entries: &EntryMap) -> Result<()>;
}

/// Single-slot store for the master credential.
pub trait MasterCredentialStore: Send {
    /// Load the credential, or `None` if the vault has no master yet.
    ///
    /// # Errors
    /// - `CorruptCredential` if the slot exists but is unusable
    /// - Storage or I/O errors
    fn load(&self) -> Result<Option<MasterCredential>>;

    /// Overwrite the slot with `credential`.
    fn save(&self, credential: &MasterCredential) -> Result<()>;
}
