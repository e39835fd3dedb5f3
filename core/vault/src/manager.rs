//! Vault manager for opening vaults stored in a local directory.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::{VaultConfig, CONFIG_FILENAME, DATABASE_FILENAME, MASTER_FILENAME};
use crate::context::VaultContext;
use lockbox_common::{Error, Result};
use lockbox_crypto::KdfParams;
use lockbox_storage::{FileCredentialStore, SqliteVaultStore};

/// Manages the on-disk layout of a vault directory:
///
/// ```text
/// <root>/vault.config   JSON VaultConfig
/// <root>/vault.db       SQLite entry store
/// <root>/master_hash    master credential
/// ```
pub struct VaultManager {
    root: PathBuf,
}

impl VaultManager {
    /// Create a manager for the vault directory at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Get the vault directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the configuration file.
    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILENAME)
    }

    /// Load the vault configuration, if the vault has been created.
    ///
    /// # Errors
    /// - Unreadable or incompatible configuration
    pub fn load_config(&self) -> Result<Option<VaultConfig>> {
        let path = self.config_path();
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        VaultConfig::from_bytes(&bytes).map(Some)
    }

    /// Persist the vault configuration.
    pub fn save_config(&self, config: &VaultConfig) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.config_path(), config.to_bytes()?)?;
        Ok(())
    }

    /// Create the vault directory and config with `params`, or open it if
    /// it already exists.
    ///
    /// A vault that has neither a master passphrase nor entries takes
    /// `params` even if a config was written before. Once a master exists
    /// the stored parameters are kept, because blobs do not record them.
    ///
    /// # Errors
    /// - Config, database or credential file errors
    pub fn init(&self, params: KdfParams) -> Result<(VaultConfig, VaultContext)> {
        let Some(existing) = self.load_config()? else {
            let config = VaultConfig::new(params);
            self.save_config(&config)?;
            info!(root = %self.root.display(), "Vault directory initialized");
            return self.open_with(config);
        };

        let (config, context) = self.open_with(existing)?;
        if *context.kdf_params() == params {
            return Ok((config, context));
        }
        if context.has_master() || !context.is_empty() {
            warn!("Vault already initialized; keeping its existing KDF parameters");
            return Ok((config, context));
        }
        drop(context);

        let config = VaultConfig {
            secret_length: config.secret_length,
            ..VaultConfig::new(params)
        };
        self.save_config(&config)?;
        info!(root = %self.root.display(), "Vault KDF parameters replaced");
        self.open_with(config)
    }

    /// Open a vault that has already been initialized.
    ///
    /// Nothing is created on disk.
    ///
    /// # Errors
    /// - `VaultNotFound` if the directory holds no vault config
    /// - Config, database or credential file errors
    pub fn open_existing(&self) -> Result<(VaultConfig, VaultContext)> {
        let config = self
            .load_config()?
            .ok_or_else(|| Error::VaultNotFound(self.root.display().to_string()))?;
        self.open_with(config)
    }

    /// Change the master passphrase and record the change in the config.
    ///
    /// The config is written after the credential, so a failure there only
    /// loses the timestamp and is logged.
    ///
    /// # Errors
    /// - Any error from [`VaultContext::change_master`]
    pub fn change_master(
        &self,
        config: &mut VaultConfig,
        context: &mut VaultContext,
        old_passphrase: &[u8],
        new_passphrase: &[u8],
    ) -> Result<()> {
        context.change_master(old_passphrase, new_passphrase)?;

        config.touch();
        if let Err(e) = self.save_config(config) {
            warn!(error = %e, "Master changed but the vault config could not be updated");
        }
        Ok(())
    }

    /// Open the SQLite entry store and credential file under `config`.
    fn open_with(&self, config: VaultConfig) -> Result<(VaultConfig, VaultContext)> {
        let vault_store = SqliteVaultStore::open(self.root.join(DATABASE_FILENAME))?;
        let credential_store = FileCredentialStore::new(self.root.join(MASTER_FILENAME));

        let context = VaultContext::open(
            config.kdf_params.clone(),
            Box::new(vault_store),
            Box::new(credential_store),
        )?;

        Ok((config, context))
    }
}
