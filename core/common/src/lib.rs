//! Common utilities and types shared across Lockbox crates.
//!
//! This module provides foundational types that are used throughout the codebase,
//! ensuring consistency and type safety.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{EncryptedBlob, EntryMap, EntryName, MasterCredential, SensitiveBytes};
