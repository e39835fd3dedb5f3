//! Re-encryption of the whole vault under a new master passphrase.

use tracing::{debug, warn};

use lockbox_common::{EntryMap, Result};
use lockbox_crypto::{decrypt_entry, encrypt_entry, KdfParams};

/// Re-encrypt every entry from `old_passphrase` to `new_passphrase`.
///
/// The input map is only borrowed; the result is a complete replacement
/// map. If any entry fails to decrypt or re-encrypt, the error is returned
/// and no partial map escapes, so the caller's state is untouched.
///
/// # Errors
/// - `Authentication` if an entry does not open under `old_passphrase`
/// - `Format` if an entry is malformed
/// - `KeyDerivation` / `InvalidInput` from the cipher
pub fn reencrypt(
    entries: &EntryMap,
    old_passphrase: &[u8],
    new_passphrase: &[u8],
    params: &KdfParams,
) -> Result<EntryMap> {
    let mut rekeyed = EntryMap::new();

    for (name, blob) in entries {
        let secret = decrypt_entry(blob, old_passphrase, params).inspect_err(|e| {
            warn!(entry = %name, error = %e, "Re-key aborted");
        })?;
        let blob = encrypt_entry(secret.as_bytes(), new_passphrase, params)?;
        rekeyed.insert(name.clone(), blob);
    }

    debug!(count = rekeyed.len(), "Re-encrypted vault entries");
    Ok(rekeyed)
}
