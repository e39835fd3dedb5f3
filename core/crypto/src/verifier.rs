//! Master passphrase verification.
//!
//! The credential is an Argon2id PHC string (`$argon2id$v=19$m=..`) with
//! its own random salt. It only authenticates the passphrase; entry keys
//! are derived separately with per-entry salts.

use argon2::password_hash::{
    Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use rand::rngs::OsRng;
use tracing::debug;

use crate::kdf::KdfParams;
use lockbox_common::{Error, MasterCredential, Result};

/// Hash a passphrase into a fresh master credential.
///
/// # Errors
/// - `InvalidInput` if the passphrase is empty
/// - `KeyDerivation` if the hashing parameters are rejected
pub fn create_credential(passphrase: &[u8], params: &KdfParams) -> Result<MasterCredential> {
    if passphrase.is_empty() {
        return Err(Error::InvalidInput("Passphrase cannot be empty".to_string()));
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = params
        .argon2()?
        .hash_password(passphrase, &salt)
        .map_err(|e| Error::KeyDerivation(e.to_string()))?;

    Ok(MasterCredential::new(hash.to_string()))
}

/// Check a passphrase against a stored credential.
///
/// The hash comparison is constant-time. The cost parameters are read
/// from the credential itself, so credentials created under older
/// parameters keep verifying.
///
/// # Returns
/// - `Ok(true)` if the passphrase matches
/// - `Ok(false)` if it does not (including an empty passphrase)
///
/// # Errors
/// - `CorruptCredential` if the credential cannot be parsed or names
///   unusable parameters
pub fn verify_credential(passphrase: &[u8], credential: &MasterCredential) -> Result<bool> {
    let hash = PasswordHash::new(credential.as_str())
        .map_err(|e| Error::CorruptCredential(e.to_string()))?;

    if passphrase.is_empty() {
        return Ok(false);
    }

    match argon2::Argon2::default().verify_password(passphrase, &hash) {
        Ok(()) => Ok(true),
        Err(PasswordHashError::Password) => Ok(false),
        Err(e) => {
            debug!(error = %e, "Master credential rejected by verifier");
            Err(Error::CorruptCredential(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdf::test_params;

    #[test]
    fn test_verify_matching_passphrase() {
        let credential = create_credential(b"M@ster1", &test_params()).unwrap();

        assert!(verify_credential(b"M@ster1", &credential).unwrap());
    }

    #[test]
    fn test_verify_wrong_passphrase() {
        let credential = create_credential(b"M@ster1", &test_params()).unwrap();

        assert!(!verify_credential(b"M@ster2", &credential).unwrap());
        assert!(!verify_credential(b"", &credential).unwrap());
    }

    #[test]
    fn test_credentials_are_salted() {
        let params = test_params();
        let first = create_credential(b"same", &params).unwrap();
        let second = create_credential(b"same", &params).unwrap();

        assert_ne!(first, second);
        assert!(first.as_str().starts_with("$argon2id$"));
    }

    #[test]
    fn test_malformed_credential_is_corrupt() {
        let credential = MasterCredential::new("not a phc string");

        assert!(matches!(
            verify_credential(b"anything", &credential),
            Err(Error::CorruptCredential(_))
        ));
    }

    #[test]
    fn test_empty_passphrase_rejected() {
        assert!(matches!(
            create_credential(b"", &test_params()),
            Err(Error::InvalidInput(_))
        ));
    }
}
