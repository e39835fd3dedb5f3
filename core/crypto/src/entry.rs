//! Per-entry encryption under the master passphrase.
//!
//! Every entry gets its own salt, so every entry gets its own key. The
//! stored layout is:
//!
//! ```text
//! salt (SALT_SIZE) || nonce (NONCE_SIZE) || ciphertext || tag (TAG_SIZE)
//! ```

use tracing::debug;

use crate::aead::{self, NONCE_SIZE, TAG_SIZE};
use crate::kdf::{derive_key, KdfParams};
use crate::keys::{Salt, SALT_SIZE};
use lockbox_common::{EncryptedBlob, Error, Result, SensitiveBytes};

/// Largest secret accepted for storage, in bytes.
pub const MAX_SECRET_LENGTH: usize = 1024;

/// Smallest well-formed blob: an empty secret.
pub const MIN_BLOB_LENGTH: usize = SALT_SIZE + NONCE_SIZE + TAG_SIZE;

/// Encrypt one secret under the master passphrase.
///
/// A fresh salt and nonce are drawn on every call, so identical inputs
/// never produce identical blobs.
///
/// # Errors
/// - `InvalidInput` if the secret exceeds MAX_SECRET_LENGTH or the
///   passphrase is empty
/// - `KeyDerivation` if key derivation fails
pub fn encrypt_entry(
    secret: &[u8],
    passphrase: &[u8],
    params: &KdfParams,
) -> Result<EncryptedBlob> {
    if secret.len() > MAX_SECRET_LENGTH {
        return Err(Error::InvalidInput(format!(
            "Secret exceeds {} bytes",
            MAX_SECRET_LENGTH
        )));
    }

    let salt = Salt::generate();
    let key = derive_key(passphrase, &salt, params)?;
    let sealed = aead::encrypt(&key, secret)?;

    let mut blob = Vec::with_capacity(SALT_SIZE + sealed.len());
    blob.extend_from_slice(salt.as_bytes());
    blob.extend_from_slice(&sealed);

    Ok(EncryptedBlob::from_bytes(blob))
}

/// Decrypt one entry with the master passphrase.
///
/// The layout is validated before any key derivation runs. Callers must
/// not distinguish a wrong passphrase from corrupted data.
///
/// # Errors
/// - `Format` if the blob is shorter than MIN_BLOB_LENGTH or would
///   decrypt to more than MAX_SECRET_LENGTH bytes
/// - `Authentication` if the tag does not verify
/// - `KeyDerivation` if key derivation fails
pub fn decrypt_entry(
    blob: &EncryptedBlob,
    passphrase: &[u8],
    params: &KdfParams,
) -> Result<SensitiveBytes> {
    let bytes = blob.as_bytes();
    if bytes.len() < MIN_BLOB_LENGTH {
        return Err(Error::Format(format!(
            "Blob is {} bytes, expected at least {}",
            bytes.len(),
            MIN_BLOB_LENGTH
        )));
    }
    if bytes.len() - MIN_BLOB_LENGTH > MAX_SECRET_LENGTH {
        return Err(Error::Format("Blob exceeds maximum secret size".to_string()));
    }

    let (salt_bytes, sealed) = bytes.split_at(SALT_SIZE);
    let mut salt = [0u8; SALT_SIZE];
    salt.copy_from_slice(salt_bytes);

    let key = derive_key(passphrase, &Salt::from_bytes(salt), params)?;
    aead::decrypt(&key, sealed).inspect_err(|e| {
        debug!(error = %e, "Entry decryption failed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdf::test_params;
    use proptest::prelude::*;

    #[test]
    fn test_entry_roundtrip() {
        let params = test_params();
        let blob = encrypt_entry(b"Secr3t!", b"M@ster1", &params).unwrap();

        let secret = decrypt_entry(&blob, b"M@ster1", &params).unwrap();
        assert_eq!(secret.as_str().unwrap(), "Secr3t!");
    }

    #[test]
    fn test_blob_layout() {
        let params = test_params();
        let blob = encrypt_entry(b"abc", b"master", &params).unwrap();

        assert_eq!(blob.len(), MIN_BLOB_LENGTH + 3);
    }

    #[test]
    fn test_same_input_yields_distinct_blobs() {
        let params = test_params();
        let blob1 = encrypt_entry(b"repeat", b"master", &params).unwrap();
        let blob2 = encrypt_entry(b"repeat", b"master", &params).unwrap();

        assert_ne!(blob1, blob2);
        assert_ne!(&blob1.as_bytes()[..SALT_SIZE], &blob2.as_bytes()[..SALT_SIZE]);
    }

    #[test]
    fn test_wrong_passphrase_is_authentication_error() {
        let params = test_params();
        let blob = encrypt_entry(b"Secr3t!", b"M@ster1", &params).unwrap();

        assert!(matches!(
            decrypt_entry(&blob, b"wrong", &params),
            Err(Error::Authentication)
        ));
    }

    #[test]
    fn test_every_byte_is_authenticated() {
        let params = test_params();
        let blob = encrypt_entry(b"pw", b"master", &params).unwrap();

        for index in 0..blob.len() {
            let mut tampered = blob.as_bytes().to_vec();
            tampered[index] ^= 0x01;
            let tampered = EncryptedBlob::from_bytes(tampered);

            assert!(
                decrypt_entry(&tampered, b"master", &params).is_err(),
                "flipping byte {} went undetected",
                index
            );
        }
    }

    #[test]
    fn test_short_blob_rejected_before_derivation() {
        // Invalid cost parameters prove derivation never ran: reaching it
        // would yield KeyDerivation instead of Format.
        let broken = KdfParams {
            memory_cost: 1,
            time_cost: 1,
            parallelism: 4,
        };
        let blob = EncryptedBlob::from_bytes(vec![0u8; MIN_BLOB_LENGTH - 1]);

        assert!(matches!(
            decrypt_entry(&blob, b"master", &broken),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_oversized_secret_rejected() {
        let params = test_params();
        let secret = vec![b'x'; MAX_SECRET_LENGTH + 1];

        assert!(matches!(
            encrypt_entry(&secret, b"master", &params),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_oversized_blob_rejected() {
        let params = test_params();
        let blob = EncryptedBlob::from_bytes(vec![0u8; MIN_BLOB_LENGTH + MAX_SECRET_LENGTH + 1]);

        assert!(matches!(
            decrypt_entry(&blob, b"master", &params),
            Err(Error::Format(_))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn prop_roundtrip_and_authentication(
            secret in proptest::collection::vec(any::<u8>(), 0..64),
            passphrase in "[ -~]{1,24}",
            other in "[ -~]{1,24}",
        ) {
            let params = test_params();
            let blob = encrypt_entry(&secret, passphrase.as_bytes(), &params).unwrap();

            let recovered = decrypt_entry(&blob, passphrase.as_bytes(), &params).unwrap();
            prop_assert_eq!(recovered.as_bytes(), secret.as_slice());

            if other != passphrase {
                prop_assert!(matches!(
                    decrypt_entry(&blob, other.as_bytes(), &params),
                    Err(Error::Authentication)
                ));
            }
        }
    }
}
