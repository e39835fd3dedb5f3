//! Random secret generation.

use rand::rngs::OsRng;
use rand::Rng;

use crate::entry::MAX_SECRET_LENGTH;
use lockbox_common::{Error, Result, SensitiveBytes};

/// Characters a generated secret is drawn from.
pub const ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*()-_=+";

/// Length used when the caller does not ask for one.
pub const DEFAULT_SECRET_LENGTH: usize = 8;

/// Generate a random secret of exactly `length` characters.
///
/// Characters are sampled uniformly from [`ALPHABET`] using the operating
/// system CSPRNG.
///
/// # Errors
/// - `InvalidInput` if `length` is zero or exceeds MAX_SECRET_LENGTH
pub fn generate_secret(length: usize) -> Result<SensitiveBytes> {
    if length == 0 || length > MAX_SECRET_LENGTH {
        return Err(Error::InvalidInput(format!(
            "Secret length must be between 1 and {}",
            MAX_SECRET_LENGTH
        )));
    }

    let mut rng = OsRng;
    let mut secret = Vec::with_capacity(length);
    for _ in 0..length {
        secret.push(ALPHABET[rng.gen_range(0..ALPHABET.len())]);
    }

    Ok(SensitiveBytes::new(secret))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_length() {
        let secret = generate_secret(DEFAULT_SECRET_LENGTH).unwrap();

        assert_eq!(secret.len(), 8);
        assert_eq!(secret.as_str().unwrap().chars().count(), 8);
        assert!(secret.as_bytes().iter().all(|c| ALPHABET.contains(c)));
    }

    #[test]
    fn test_successive_secrets_differ() {
        let first = generate_secret(16).unwrap();
        let second = generate_secret(16).unwrap();

        assert_ne!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn test_invalid_lengths() {
        assert!(generate_secret(0).is_err());
        assert!(generate_secret(MAX_SECRET_LENGTH + 1).is_err());
        assert_eq!(generate_secret(MAX_SECRET_LENGTH).unwrap().len(), MAX_SECRET_LENGTH);
    }

    #[test]
    fn test_alphabet() {
        assert_eq!(ALPHABET.len(), 76);
    }
}
