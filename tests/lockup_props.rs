use account_details::lockup::{derive_lockup_id, is_lockup_account};
use proptest::prelude::*;

const SUFFIX: &str = "lockup.near";

proptest! {
    /// Lockup accounts map to themselves.
    #[test]
    fn suffixed_ids_are_unchanged(prefix in "[a-z0-9_-]{1,40}") {
        let account_id = format!("{prefix}.{SUFFIX}");
        prop_assert!(is_lockup_account(&account_id, SUFFIX));
        prop_assert_eq!(derive_lockup_id(&account_id, SUFFIX), account_id);
    }

    /// Other ids map to 40 lowercase hex characters plus the suffix, deterministically.
    #[test]
    fn derived_ids_are_hash_plus_suffix(account_id in "[a-z0-9_.-]{2,64}\\.near") {
        prop_assume!(!is_lockup_account(&account_id, SUFFIX));
        let lockup = derive_lockup_id(&account_id, SUFFIX);
        prop_assert_eq!(&lockup, &derive_lockup_id(&account_id, SUFFIX));
        let hash = lockup.strip_suffix(".lockup.near").unwrap();
        prop_assert_eq!(hash.len(), 40);
        prop_assert!(hash.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
        prop_assert!(is_lockup_account(&lockup, SUFFIX));
    }

    /// Distinct owners get distinct lockups.
    #[test]
    fn distinct_ids_do_not_collide(a in "[a-z0-9]{1,32}\\.near", b in "[a-z0-9]{1,32}\\.near") {
        prop_assume!(a != b);
        prop_assert_ne!(derive_lockup_id(&a, SUFFIX), derive_lockup_id(&b, SUFFIX));
    }
}
