use std::fmt;

use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    account::{AccountDetails, AccountError, FactSet},
    balance::Balance,
    lockup::derive_lockup_id,
    query::{AbsentIfNotFound, LedgerQuery, QueryError},
};

pub const GET_LOCKED_AMOUNT: &str = "get_locked_amount";
pub const GET_STAKING_POOL_ACCOUNT_ID: &str = "get_staking_pool_account_id";
pub const GET_ACCOUNT_TOTAL_BALANCE: &str = "get_account_total_balance";

/// Per-network settings the aggregator needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorConfig {
    pub network_name: String,
    pub lockup_suffix: String,
}

/// Identifies which ledger query of a request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerCall {
    AccountInfo,
    LockupAccountInfo,
    LockupLockedAmount,
    LockupStakingPool,
    StakingPoolBalance,
    GenesisConfig,
}

impl fmt::Display for LedgerCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AccountInfo => "view_account",
            Self::LockupAccountInfo => "lockup view_account",
            Self::LockupLockedAmount => GET_LOCKED_AMOUNT,
            Self::LockupStakingPool => GET_STAKING_POOL_ACCOUNT_ID,
            Self::StakingPoolBalance => GET_ACCOUNT_TOTAL_BALANCE,
            Self::GenesisConfig => "genesis_config",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum AccountDetailsError {
    #[error("Account id must not be empty")]
    EmptyAccountId,
    #[error("`{call}` query for `{account_id}` failed")]
    Upstream {
        call: LedgerCall,
        account_id: String,
        #[source]
        source: QueryError,
    },
    #[error(transparent)]
    Account(#[from] AccountError),
}

impl AccountDetailsError {
    /// The failing ledger call, if the failure came from the ledger.
    pub fn call(&self) -> Option<LedgerCall> {
        match self {
            Self::Upstream { call, .. } => Some(*call),
            _ => None,
        }
    }
}

fn upstream(call: LedgerCall, account_id: &str) -> impl FnOnce(QueryError) -> AccountDetailsError {
    let account_id = account_id.to_owned();
    move |source| AccountDetailsError::Upstream {
        call,
        account_id,
        source,
    }
}

fn balance_from_value(value: Value) -> Result<Balance, QueryError> {
    serde_json::from_value(value)
        .map_err(|e| QueryError::InvalidResponse(format!("expected a balance: {e}")))
}

fn account_id_from_value(value: Value) -> Result<Option<String>, QueryError> {
    match value {
        Value::Null => Ok(None),
        // lockup contracts report an unset pool as either null or ""
        Value::String(account_id) if account_id.is_empty() => Ok(None),
        Value::String(account_id) => Ok(Some(account_id)),
        other => Err(QueryError::InvalidResponse(format!(
            "expected an account id, got {other}"
        ))),
    }
}

/// Builds [`AccountDetails`] from concurrent ledger queries.
pub struct AccountDetailsAggregator<Q> {
    config: AggregatorConfig,
    client: Q,
}

impl<Q> AccountDetailsAggregator<Q>
where
    Q: LedgerQuery,
{
    pub fn new(config: AggregatorConfig, client: Q) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    pub fn client(&self) -> &Q {
        &self.client
    }

    /// Queries everything needed for the balance breakdown at once.
    ///
    /// Returns `None` when `account_id` does not exist. Missing lockup data is
    /// recorded as absent; any other failure fails the whole request.
    pub async fn gather_facts(
        &self,
        account_id: &str,
        lockup_account_id: &str,
    ) -> Result<Option<FactSet>, AccountDetailsError> {
        let client = &self.client;

        let account = async {
            client
                .view_account(account_id)
                .await
                .absent_if_not_found()
                .map_err(upstream(LedgerCall::AccountInfo, account_id))
        };

        let lockup_account = async {
            if account_id == lockup_account_id {
                return Ok(None);
            }
            client
                .view_account(lockup_account_id)
                .await
                .absent_if_not_found()
                .map_err(upstream(LedgerCall::LockupAccountInfo, lockup_account_id))
        };

        let lockup_locked = async {
            client
                .call_view_method(lockup_account_id, GET_LOCKED_AMOUNT, json!({}))
                .await
                .and_then(balance_from_value)
                .absent_if_not_found()
                .map_err(upstream(LedgerCall::LockupLockedAmount, lockup_account_id))
        };

        // the pool balance depends on the pool id only, so it runs in this
        // branch while the others are still pending
        let staking = async {
            let pool = client
                .call_view_method(lockup_account_id, GET_STAKING_POOL_ACCOUNT_ID, json!({}))
                .await
                .and_then(account_id_from_value)
                .absent_if_not_found()
                .map_err(upstream(LedgerCall::LockupStakingPool, lockup_account_id))?
                .flatten();
            let Some(pool) = pool else {
                return Ok((None, None));
            };
            let delegated = client
                .call_view_method(
                    &pool,
                    GET_ACCOUNT_TOTAL_BALANCE,
                    json!({ "account_id": lockup_account_id }),
                )
                .await
                .and_then(balance_from_value)
                .absent_if_not_found()
                .map_err(upstream(LedgerCall::StakingPoolBalance, &pool))?;
            Ok::<_, AccountDetailsError>((Some(pool), delegated))
        };

        let genesis = async {
            client
                .genesis_config()
                .await
                .map_err(upstream(LedgerCall::GenesisConfig, account_id))
        };

        let (account, lockup_account, lockup_locked, (lockup_staking_pool, lockup_delegated), genesis) =
            tokio::try_join!(account, lockup_account, lockup_locked, staking, genesis)?;

        Ok(account.map(|account| FactSet {
            account,
            lockup_account,
            lockup_locked,
            lockup_staking_pool,
            lockup_delegated,
            genesis,
        }))
    }

    /// Balance breakdown of `account_id`, or `None` if the account does not exist.
    #[tracing::instrument(skip(self), fields(network = %self.config.network_name))]
    pub async fn get_account_details(
        &self,
        account_id: &str,
    ) -> Result<Option<AccountDetails>, AccountDetailsError> {
        if account_id.is_empty() {
            return Err(AccountDetailsError::EmptyAccountId);
        }
        debug!("get account details start");

        let lockup_account_id = derive_lockup_id(account_id, &self.config.lockup_suffix);
        let Some(facts) = self.gather_facts(account_id, &lockup_account_id).await? else {
            info!("account does not exist");
            return Ok(None);
        };

        let combined = AccountDetails::combine(&facts, account_id, &lockup_account_id)?;
        for anomaly in &combined.anomalies {
            warn!(
                ?anomaly,
                %lockup_account_id,
                "balance subtraction went negative, clamped to zero"
            );
        }

        debug!(
            lockup = combined.details.lockup.is_some(),
            total_balance = %combined.details.total_balance,
            "get account details end"
        );
        Ok(Some(combined.details))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_view_method_values() {
        assert_eq!(
            balance_from_value(json!("91037770393145811562101780866"))
                .unwrap()
                .to_string(),
            "91037770393145811562101780866"
        );
        assert!(matches!(
            balance_from_value(json!("-1")),
            Err(QueryError::InvalidResponse(_))
        ));

        assert_eq!(account_id_from_value(Value::Null).unwrap(), None);
        assert_eq!(account_id_from_value(json!("")).unwrap(), None);
        assert_eq!(
            account_id_from_value(json!("pool.near")).unwrap(),
            Some("pool.near".to_owned())
        );
        assert!(account_id_from_value(json!(7)).is_err());
    }

    #[test]
    fn upstream_error_names_call_and_account() {
        let err = upstream(LedgerCall::LockupLockedAmount, "x.lockup.near")(QueryError::Timeout {
            method: "query".to_owned(),
        });
        assert_eq!(err.call(), Some(LedgerCall::LockupLockedAmount));
        assert_eq!(
            err.to_string(),
            "`get_locked_amount` query for `x.lockup.near` failed"
        );
        assert_eq!(AccountDetailsError::EmptyAccountId.call(), None);
    }
}
