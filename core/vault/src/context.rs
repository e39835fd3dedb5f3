//! The vault context: entry map, master credential and their stores.
//!
//! A `VaultContext` is owned by the top-level caller and mutated only
//! through `&mut self`, so there is exactly one writer. Every action
//! returns its own result; map it to a [`Status`](crate::Status) for
//! display.

use tracing::{debug, error, info, warn};

use lockbox_common::{EntryMap, EntryName, Error, MasterCredential, Result, SensitiveBytes};
use lockbox_crypto::{
    create_credential, decrypt_entry, encrypt_entry, generate_secret, verify_credential,
    KdfParams,
};
use lockbox_storage::{MasterCredentialStore, VaultStore};

use crate::rekey::reencrypt;

/// State of the master credential slot.
enum Master {
    Missing,
    Present(MasterCredential),
    /// The stored credential cannot be read; master operations fail until
    /// it is repaired outside the vault.
    Corrupt(String),
}

/// In-memory vault state bound to its persistence collaborators.
pub struct VaultContext {
    params: KdfParams,
    entries: EntryMap,
    master: Master,
    vault_store: Box<dyn VaultStore>,
    credential_store: Box<dyn MasterCredentialStore>,
    dirty: bool,
}

impl VaultContext {
    /// Load the vault from its stores.
    ///
    /// A corrupt master credential does not prevent opening: listing and
    /// generating still work, and master operations report
    /// `CorruptCredential`.
    ///
    /// # Errors
    /// - Errors from either store; nothing is created on failure
    pub fn open(
        params: KdfParams,
        vault_store: Box<dyn VaultStore>,
        credential_store: Box<dyn MasterCredentialStore>,
    ) -> Result<Self> {
        let master = match credential_store.load() {
            Ok(Some(credential)) => Master::Present(credential),
            Ok(None) => Master::Missing,
            Err(Error::CorruptCredential(reason)) => {
                warn!(reason = %reason, "Master credential is corrupt");
                Master::Corrupt(reason)
            }
            Err(e) => return Err(e),
        };
        let entries = vault_store.load()?;

        info!(
            backend = vault_store.name(),
            entries = entries.len(),
            has_master = !matches!(master, Master::Missing),
            "Vault opened"
        );

        Ok(Self {
            params,
            entries,
            master,
            vault_store,
            credential_store,
            dirty: false,
        })
    }

    /// Whether a master passphrase has been set, even if its stored
    /// credential is unreadable.
    pub fn has_master(&self) -> bool {
        !matches!(self.master, Master::Missing)
    }

    /// Whether the stored master credential could not be read.
    pub fn is_credential_corrupt(&self) -> bool {
        matches!(self.master, Master::Corrupt(_))
    }

    /// KDF parameters used for new blobs and credentials.
    pub fn kdf_params(&self) -> &KdfParams {
        &self.params
    }

    /// Check `passphrase` against the current credential.
    fn authorize(&self, passphrase: &[u8]) -> Result<()> {
        let credential = match &self.master {
            Master::Missing => return Err(Error::NoMaster),
            Master::Corrupt(reason) => return Err(Error::CorruptCredential(reason.clone())),
            Master::Present(credential) => credential,
        };
        if verify_credential(passphrase, credential)? {
            Ok(())
        } else {
            debug!("Master passphrase rejected");
            Err(Error::WrongMaster)
        }
    }

    fn lookup(&self, name: &str) -> Result<EntryName> {
        let name = EntryName::new(name)?;
        if self.entries.contains_key(&name) {
            Ok(name)
        } else {
            Err(Error::NotFound(name.to_string()))
        }
    }

    /// Set the first master passphrase.
    ///
    /// # Errors
    /// - `InvalidInput` if the passphrase is empty or a master already exists
    /// - `CorruptCredential` if the stored credential is unreadable
    /// - `KeyDerivation` or storage errors; the vault stays uninitialized
    pub fn create_master(&mut self, passphrase: &[u8]) -> Result<()> {
        if passphrase.is_empty() {
            return Err(Error::InvalidInput("Master passphrase cannot be empty".to_string()));
        }
        match &self.master {
            Master::Missing => {}
            Master::Present(_) => {
                return Err(Error::InvalidInput(
                    "A master passphrase already exists; change it instead".to_string(),
                ))
            }
            Master::Corrupt(reason) => return Err(Error::CorruptCredential(reason.clone())),
        }
        if !self.entries.is_empty() {
            warn!(
                entries = self.entries.len(),
                "Creating a master for a vault that already holds entries"
            );
        }

        let credential = create_credential(passphrase, &self.params)?;
        self.credential_store.save(&credential)?;
        self.master = Master::Present(credential);

        info!("Master passphrase created");
        Ok(())
    }

    /// Replace the master passphrase, re-encrypting every entry.
    ///
    /// All entries are re-encrypted into a new map before anything is
    /// written. The new entries are saved, then the new credential; if the
    /// credential cannot be saved the previous entries are written back.
    /// The in-memory map and credential change together, only on success.
    ///
    /// # Errors
    /// - `NoMaster`, `InvalidInput` (empty new passphrase), `WrongMaster`
    /// - `CorruptCredential` if the stored credential is unreadable
    /// - Any re-key or storage failure; the vault is left as it was
    pub fn change_master(&mut self, old_passphrase: &[u8], new_passphrase: &[u8]) -> Result<()> {
        if !self.has_master() {
            return Err(Error::NoMaster);
        }
        if new_passphrase.is_empty() {
            return Err(Error::InvalidInput("Master passphrase cannot be empty".to_string()));
        }
        self.authorize(old_passphrase)?;

        let rekeyed = reencrypt(&self.entries, old_passphrase, new_passphrase, &self.params)?;
        let credential = create_credential(new_passphrase, &self.params)?;

        self.vault_store.save(&rekeyed)?;
        if let Err(e) = self.credential_store.save(&credential) {
            error!(error = %e, "Saving new master credential failed, restoring entries");
            if let Err(rollback) = self.vault_store.save(&self.entries) {
                error!(error = %rollback, "Restoring previous entries failed");
            }
            return Err(e);
        }

        self.entries = rekeyed;
        self.master = Master::Present(credential);
        self.dirty = false;

        info!(entries = self.entries.len(), "Master passphrase changed");
        Ok(())
    }

    /// Store `secret` under `name`, replacing any existing entry.
    ///
    /// # Errors
    /// - `NoMaster`, `WrongMaster`
    /// - `InvalidInput` for an empty name, an empty secret or an oversized secret
    pub fn add_entry(&mut self, name: &str, secret: &[u8], master: &[u8]) -> Result<()> {
        self.authorize(master)?;

        let name = EntryName::new(name)?;
        if secret.is_empty() {
            return Err(Error::InvalidInput("Secret cannot be empty".to_string()));
        }

        let blob = encrypt_entry(secret, master, &self.params)?;
        if self.entries.insert(name.clone(), blob).is_some() {
            info!(entry = %name, "Entry replaced");
        } else {
            info!(entry = %name, "Entry added");
        }
        self.dirty = true;
        Ok(())
    }

    /// Recover the secret stored under `name`.
    ///
    /// # Errors
    /// - `NoMaster`, `NotFound`, `WrongMaster`
    /// - `Authentication` if the entry does not open under the master
    pub fn get_entry(&self, name: &str, master: &[u8]) -> Result<SensitiveBytes> {
        if !self.has_master() {
            return Err(Error::NoMaster);
        }
        let name = self.lookup(name)?;
        self.authorize(master)?;

        decrypt_entry(&self.entries[&name], master, &self.params)
    }

    /// Remove the entry stored under `name`.
    ///
    /// # Errors
    /// - `NoMaster`, `NotFound`, `WrongMaster`
    pub fn delete_entry(&mut self, name: &str, master: &[u8]) -> Result<()> {
        if !self.has_master() {
            return Err(Error::NoMaster);
        }
        let name = self.lookup(name)?;
        self.authorize(master)?;

        self.entries.remove(&name);
        self.dirty = true;

        info!(entry = %name, "Entry deleted");
        Ok(())
    }

    /// Names of all entries, in order.
    pub fn entry_names(&self) -> impl Iterator<Item = &EntryName> {
        self.entries.keys()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the vault holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Generate a random secret of `length` characters.
    pub fn generate_secret(&self, length: usize) -> Result<SensitiveBytes> {
        generate_secret(length)
    }

    /// Copy of the current entries, for persisting from another thread.
    pub fn snapshot(&self) -> EntryMap {
        self.entries.clone()
    }

    /// Whether entries changed since the last load or flush.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write pending entry changes to the vault store.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        self.vault_store.save(&self.entries)?;
        self.dirty = false;

        debug!(entries = self.entries.len(), "Vault flushed");
        Ok(())
    }
}

impl Drop for VaultContext {
    fn drop(&mut self) {
        if self.dirty {
            warn!("Vault dropped with unflushed changes");
        }
    }
}
