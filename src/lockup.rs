use sha2::{Digest, Sha256};

/// Number of hex characters of the account id digest kept in a lockup id.
const LOCKUP_HASH_LEN: usize = 40;

/// Checks whether `account_id` already is a lockup account, i.e. ends with
/// `.{lockup_suffix}`.
pub fn is_lockup_account(account_id: &str, lockup_suffix: &str) -> bool {
    account_id
        .strip_suffix(lockup_suffix)
        .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Returns the lockup account id owned by `account_id`.
///
/// A lockup account is its own lockup id. Any other id maps to the first 40
/// hex characters of the SHA-256 digest of its bytes, followed by
/// `.{lockup_suffix}`.
pub fn derive_lockup_id(account_id: &str, lockup_suffix: &str) -> String {
    if is_lockup_account(account_id, lockup_suffix) {
        return account_id.to_owned();
    }
    let digest = hex::encode(Sha256::digest(account_id.as_bytes()));
    format!("{}.{lockup_suffix}", &digest[..LOCKUP_HASH_LEN])
}
