//! In-memory stores for testing and embedding.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::provider::{MasterCredentialStore, VaultStore};
use lockbox_common::{EntryMap, Error, MasterCredential, Result};

fn lock<T>(slot: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    slot.lock()
        .map_err(|_| Error::Storage("Memory store lock poisoned".to_string()))
}

/// In-memory vault store.
///
/// Clones share the same contents, so a test can keep a handle and
/// inspect what the vault flushed. All data is lost on drop.
#[derive(Clone, Default)]
pub struct MemoryVaultStore {
    entries: Arc<Mutex<EntryMap>>,
    fail_saves: Arc<Mutex<bool>>,
}

impl MemoryVaultStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `entries`.
    pub fn with_entries(entries: EntryMap) -> Self {
        Self {
            entries: Arc::new(Mutex::new(entries)),
            fail_saves: Arc::default(),
        }
    }

    /// Make subsequent saves fail with a storage error.
    pub fn set_fail_saves(&self, fail: bool) -> Result<()> {
        *lock(&self.fail_saves)? = fail;
        Ok(())
    }
}

impl VaultStore for MemoryVaultStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn load(&self) -> Result<EntryMap> {
        Ok(lock(&self.entries)?.clone())
    }

    fn save(&self, entries: &EntryMap) -> Result<()> {
        if *lock(&self.fail_saves)? {
            return Err(Error::Storage("Injected save failure".to_string()));
        }
        *lock(&self.entries)? = entries.clone();
        Ok(())
    }
}

/// In-memory credential slot. Clones share the slot.
#[derive(Clone, Default)]
pub struct MemoryCredentialStore {
    slot: Arc<Mutex<Option<MasterCredential>>>,
    fail_saves: Arc<Mutex<bool>>,
}

impl MemoryCredentialStore {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent saves fail with a storage error.
    pub fn set_fail_saves(&self, fail: bool) -> Result<()> {
        *lock(&self.fail_saves)? = fail;
        Ok(())
    }
}

impl MasterCredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<MasterCredential>> {
        Ok(lock(&self.slot)?.clone())
    }

    fn save(&self, credential: &MasterCredential) -> Result<()> {
        if *lock(&self.fail_saves)? {
            return Err(Error::Storage("Injected save failure".to_string()));
        }
        *lock(&self.slot)? = Some(credential.clone());
        Ok(())
    }
}
