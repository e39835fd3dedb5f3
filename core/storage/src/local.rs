//! Local filesystem credential store.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::provider::MasterCredentialStore;
use lockbox_common::{Error, MasterCredential, Result};

/// Stores the master credential in a single file.
///
/// Writes go to a sibling temporary file that is renamed over the slot,
/// so a crash leaves either the old or the new credential.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Create a store for the credential file at `path`.
    ///
    /// The file does not need to exist yet.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the credential file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl MasterCredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<MasterCredential>> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No master credential file");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let text = String::from_utf8(raw)
            .map_err(|_| Error::CorruptCredential("Credential file is not UTF-8".to_string()))?;
        // Fixed-width slots are NUL padded.
        let encoded = text.trim_end_matches(|c: char| c == '\0' || c.is_whitespace());
        if encoded.is_empty() {
            return Err(Error::CorruptCredential(
                "Credential file is empty".to_string(),
            ));
        }

        Ok(Some(MasterCredential::new(encoded)))
    }

    fn save(&self, credential: &MasterCredential) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp = self.temp_path();
        {
            let mut file = fs::File::create(&temp)?;
            file.write_all(credential.as_str().as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()?;
        }
        fs::rename(&temp, &self.path)?;

        info!(path = %self.path.display(), "Master credential written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("master_hash"));

        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_and_overwrite() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("master_hash"));

        store.save(&MasterCredential::new("$argon2id$first")).unwrap();
        store.save(&MasterCredential::new("$argon2id$second")).unwrap();

        assert_eq!(store.load().unwrap().unwrap().as_str(), "$argon2id$second");
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_nul_padding_is_stripped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("master_hash");
        let mut padded = b"$argon2id$v=19$abc".to_vec();
        padded.resize(128, 0);
        fs::write(&path, padded).unwrap();

        let store = FileCredentialStore::new(&path);
        assert_eq!(store.load().unwrap().unwrap().as_str(), "$argon2id$v=19$abc");
    }

    #[test]
    fn test_empty_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("master_hash");
        fs::write(&path, b"\n").unwrap();

        let store = FileCredentialStore::new(&path);
        assert!(matches!(store.load(), Err(Error::CorruptCredential(_))));
    }

    #[test]
    fn test_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested").join("master_hash"));

        store.save(&MasterCredential::new("$argon2id$x")).unwrap();
        assert!(store.path().exists());
    }
}
