//! Authenticated encryption using XChaCha20-Poly1305.
//!
//! XChaCha20-Poly1305 provides both confidentiality and authenticity,
//! with a 24-byte nonce that is safe for random generation.

use chacha20poly1305::{
    aead::{generic_array::GenericArray, Aead, AeadCore, AeadInPlace, KeyInit, OsRng},
    XChaCha20Poly1305,
};
use zeroize::Zeroizing;

use crate::keys::DerivedKey;
use lockbox_common::{Error, Result, SensitiveBytes};

/// Nonce size for XChaCha20-Poly1305 (24 bytes).
pub const NONCE_SIZE: usize = 24;

/// Authentication tag size (16 bytes).
pub const TAG_SIZE: usize = 16;

/// Encrypt plaintext using XChaCha20-Poly1305.
///
/// # Postconditions
/// - Returns nonce || ciphertext || tag
/// - The nonce is randomly generated
/// - The output length is plaintext length + TAG_SIZE + NONCE_SIZE
///
/// # Errors
/// - Returns `Crypto` if encryption fails
pub fn encrypt(key: &DerivedKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(GenericArray::from_slice(key.as_bytes()));
    let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| Error::Crypto(format!("Encryption failed: {}", e)))?;

    // Prepend nonce to ciphertext
    let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(&nonce);
    result.extend_from_slice(&ciphertext);

    Ok(result)
}

/// Decrypt `nonce || ciphertext || tag` using XChaCha20-Poly1305.
///
/// Decryption happens in place inside a buffer sized exactly for the
/// ciphertext, so the plaintext is never reallocated into untracked
/// memory. The buffer is zeroized on every exit path.
///
/// # Errors
/// - `Format` if the input is shorter than NONCE_SIZE + TAG_SIZE
/// - `Authentication` if the tag does not verify (wrong key or tampered data)
pub fn decrypt(key: &DerivedKey, sealed: &[u8]) -> Result<SensitiveBytes> {
    if sealed.len() < NONCE_SIZE + TAG_SIZE {
        return Err(Error::Format("Ciphertext too short".to_string()));
    }

    let (nonce_bytes, encrypted) = sealed.split_at(NONCE_SIZE);
    let nonce = GenericArray::from_slice(nonce_bytes);

    let cipher = XChaCha20Poly1305::new(GenericArray::from_slice(key.as_bytes()));

    let mut buffer = Zeroizing::new(Vec::with_capacity(encrypted.len()));
    buffer.extend_from_slice(encrypted);

    cipher
        .decrypt_in_place(nonce, b"", &mut *buffer)
        .map_err(|_| Error::Authentication)?;

    Ok(SensitiveBytes::new(std::mem::take(&mut *buffer)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KEY_LENGTH;

    fn key(byte: u8) -> DerivedKey {
        DerivedKey::from_bytes([byte; KEY_LENGTH])
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = key(42);
        let plaintext = b"Hello, World!";

        let ciphertext = encrypt(&key, plaintext).unwrap();
        let decrypted = decrypt(&key, &ciphertext).unwrap();

        assert_eq!(decrypted.as_bytes(), plaintext);
    }

    #[test]
    fn test_ciphertext_size() {
        let key = key(42);
        let plaintext = b"Test message";

        let ciphertext = encrypt(&key, plaintext).unwrap();

        assert_eq!(ciphertext.len(), NONCE_SIZE + plaintext.len() + TAG_SIZE);
    }

    #[test]
    fn test_different_nonce_each_time() {
        let key = key(42);
        let plaintext = b"Same plaintext";

        let ct1 = encrypt(&key, plaintext).unwrap();
        let ct2 = encrypt(&key, plaintext).unwrap();

        assert_ne!(&ct1[..NONCE_SIZE], &ct2[..NONCE_SIZE]);
        assert_ne!(ct1, ct2);
    }

    #[test]
    fn test_wrong_key_fails() {
        let ciphertext = encrypt(&key(1), b"Secret data").unwrap();

        assert!(matches!(
            decrypt(&key(2), &ciphertext),
            Err(Error::Authentication)
        ));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = key(42);

        let mut ciphertext = encrypt(&key, b"Important data").unwrap();
        ciphertext[NONCE_SIZE + 5] ^= 0xFF;

        assert!(matches!(decrypt(&key, &ciphertext), Err(Error::Authentication)));
    }

    #[test]
    fn test_short_input_is_format_error() {
        let key = key(42);

        assert!(matches!(
            decrypt(&key, &[0u8; NONCE_SIZE + TAG_SIZE - 1]),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_empty_plaintext() {
        let key = key(42);

        let ciphertext = encrypt(&key, b"").unwrap();
        let decrypted = decrypt(&key, &ciphertext).unwrap();

        assert!(decrypted.is_empty());
    }
}
