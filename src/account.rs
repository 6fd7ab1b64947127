use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use crate::balance::Balance;

/// Subset of the ledger's `view_account` reply needed for the balance breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountInfo {
    /// Non-staked balance.
    pub amount: Balance,
    /// Staked balance.
    pub locked: Balance,
    pub storage_usage: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisConfig {
    pub storage_amount_per_byte: Balance,
}

/// Everything gathered from the ledger for one account.
#[derive(Debug, Clone)]
pub struct FactSet {
    pub account: AccountInfo,
    pub lockup_account: Option<AccountInfo>,
    pub lockup_locked: Option<Balance>,
    pub lockup_staking_pool: Option<String>,
    pub lockup_delegated: Option<Balance>,
    pub genesis: GenesisConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountShape {
    /// Regular account without a lockup.
    Plain,
    /// Regular account owning an existing lockup account.
    WithLockup,
    /// The lockup account itself.
    Lockup,
}

impl AccountShape {
    pub fn classify(account_id: &str, lockup_account_id: &str, lockup_exists: bool) -> Self {
        match (account_id == lockup_account_id, lockup_exists) {
            (true, _) => Self::Lockup,
            (false, true) => Self::WithLockup,
            (false, false) => Self::Plain,
        }
    }
}

/// A subtraction that would have gone below zero and was clamped instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceAnomaly {
    /// Reserved balance exceeds what the account holds.
    AvailableBalance,
    /// Locked amount reported by the lockup contract exceeds its total balance.
    LockupUnlockedBalance,
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Lockup account `{lockup_account_id}` exists but did not report its locked amount")]
    MissingLockedAmount { lockup_account_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockupDetails {
    pub lockup_account_id: String,
    pub lockup_total_balance: Balance,
    pub lockup_locked_balance: Balance,
    pub lockup_unlocked_balance: Balance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDetails {
    #[serde(serialize_with = "decimal_string")]
    pub storage_usage: u64,
    pub staked_balance: Balance,
    pub non_staked_balance: Balance,
    pub minimum_balance: Balance,
    pub available_balance: Balance,
    pub total_balance: Balance,
    #[serde(flatten)]
    pub lockup: Option<LockupDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedBalances {
    pub details: AccountDetails,
    pub anomalies: Vec<BalanceAnomaly>,
}

fn decimal_string<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(value)
}

impl AccountDetails {
    /// Combines gathered facts into the balance breakdown of `account_id`.
    ///
    /// Subtractions that would underflow are clamped to zero and reported in
    /// [`CombinedBalances::anomalies`].
    pub fn combine(
        facts: &FactSet,
        account_id: &str,
        lockup_account_id: &str,
    ) -> Result<CombinedBalances, AccountError> {
        let mut anomalies = Vec::new();

        let storage_usage = facts.account.storage_usage;
        let staked_balance = facts.account.locked.clone();
        let non_staked_balance = facts.account.amount.clone();
        let minimum_balance = facts.genesis.storage_amount_per_byte.times(storage_usage);

        let reserved = staked_balance.clone().max(minimum_balance.clone());
        let available_balance = (&non_staked_balance + &staked_balance)
            .checked_sub(&reserved)
            .unwrap_or_else(|| {
                anomalies.push(BalanceAnomaly::AvailableBalance);
                Balance::zero()
            });

        let mut total_balance = &staked_balance + &non_staked_balance;
        let shape = AccountShape::classify(
            account_id,
            lockup_account_id,
            facts.lockup_account.is_some(),
        );
        let lockup = match (shape, &facts.lockup_account) {
            (AccountShape::WithLockup, Some(lockup_account)) => {
                let Some(lockup_locked_balance) = facts.lockup_locked.clone() else {
                    return Err(AccountError::MissingLockedAmount {
                        lockup_account_id: lockup_account_id.to_owned(),
                    });
                };
                let mut lockup_total_balance = &lockup_account.locked + &lockup_account.amount;
                if let Some(delegated) = &facts.lockup_delegated {
                    lockup_total_balance += delegated;
                }
                total_balance += &lockup_total_balance;
                let lockup_unlocked_balance = lockup_total_balance
                    .checked_sub(&lockup_locked_balance)
                    .unwrap_or_else(|| {
                        anomalies.push(BalanceAnomaly::LockupUnlockedBalance);
                        Balance::zero()
                    });
                Some(LockupDetails {
                    lockup_account_id: lockup_account_id.to_owned(),
                    lockup_total_balance,
                    lockup_locked_balance,
                    lockup_unlocked_balance,
                })
            }
            (AccountShape::Lockup, _) => {
                // own amount/locked already are the lockup balance
                if let Some(delegated) = &facts.lockup_delegated {
                    total_balance += delegated;
                }
                None
            }
            _ => None,
        };

        Ok(CombinedBalances {
            details: AccountDetails {
                storage_usage,
                staked_balance,
                non_staked_balance,
                minimum_balance,
                available_balance,
                total_balance,
                lockup,
            },
            anomalies,
        })
    }
}
