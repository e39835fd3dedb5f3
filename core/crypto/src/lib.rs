//! Cryptographic primitives for Lockbox.
//!
//! This module provides:
//! - Key derivation using Argon2id
//! - Authenticated encryption using XChaCha20-Poly1305
//! - Per-entry encryption with fresh salt and nonce
//! - Master passphrase verification via Argon2id PHC strings
//! - Random secret generation
//!
//! # Security Guarantees
//! - All key material is automatically zeroized on drop
//! - No plaintext or key material is ever logged
//! - Constant-time comparison for passphrase verification

pub mod aead;
pub mod entry;
pub mod generator;
pub mod kdf;
pub mod keys;
pub mod verifier;

pub use entry::{decrypt_entry, encrypt_entry, MAX_SECRET_LENGTH, MIN_BLOB_LENGTH};
pub use generator::{generate_secret, ALPHABET, DEFAULT_SECRET_LENGTH};
pub use kdf::{derive_key, KdfParams};
pub use keys::{DerivedKey, Salt};
pub use verifier::{create_credential, verify_credential};
