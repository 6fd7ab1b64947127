#![allow(dead_code)]

use std::{collections::HashMap, sync::Mutex, time::Duration};

use account_details::{
    account::{AccountInfo, GenesisConfig},
    aggregator::{AccountDetailsAggregator, AggregatorConfig},
    balance::Balance,
    query::{LedgerQuery, QueryError},
};
use async_trait::async_trait;
use serde_json::Value;

pub const SUFFIX: &str = "lockup.near";

/// Scripted ledger. Anything not scripted answers "does not exist".
#[derive(Default)]
pub struct FakeLedger {
    accounts: HashMap<String, Result<AccountInfo, QueryError>>,
    views: HashMap<(String, String), Result<Value, QueryError>>,
    genesis: Option<Result<GenesisConfig, QueryError>>,
    delays: HashMap<String, Duration>,
    pub calls: Mutex<Vec<String>>,
}

fn not_found(what: &str) -> QueryError {
    QueryError::NotFound {
        reason: format!("{what} does not exist while viewing"),
    }
}

impl FakeLedger {
    pub fn new() -> Self {
        Self::default().with_genesis(1)
    }

    pub fn with_account(mut self, account_id: &str, amount: u64, locked: u64, storage: u64) -> Self {
        self.accounts.insert(
            account_id.to_owned(),
            Ok(AccountInfo {
                amount: Balance::from(amount),
                locked: Balance::from(locked),
                storage_usage: storage,
            }),
        );
        self
    }

    pub fn with_account_info(mut self, account_id: &str, info: AccountInfo) -> Self {
        self.accounts.insert(account_id.to_owned(), Ok(info));
        self
    }

    pub fn with_account_error(mut self, account_id: &str, err: QueryError) -> Self {
        self.accounts.insert(account_id.to_owned(), Err(err));
        self
    }

    pub fn with_view(mut self, contract_id: &str, method: &str, value: Value) -> Self {
        self.views
            .insert((contract_id.to_owned(), method.to_owned()), Ok(value));
        self
    }

    pub fn with_view_error(mut self, contract_id: &str, method: &str, err: QueryError) -> Self {
        self.views
            .insert((contract_id.to_owned(), method.to_owned()), Err(err));
        self
    }

    pub fn with_genesis(mut self, storage_amount_per_byte: u64) -> Self {
        self.genesis = Some(Ok(GenesisConfig {
            storage_amount_per_byte: Balance::from(storage_amount_per_byte),
        }));
        self
    }

    pub fn with_genesis_error(mut self, err: QueryError) -> Self {
        self.genesis = Some(Err(err));
        self
    }

    /// Delays `view_account` of an account id, or every call of a view method.
    pub fn with_delay(mut self, key: &str, delay: Duration) -> Self {
        self.delays.insert(key.to_owned(), delay);
        self
    }

    pub fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    async fn delay(&self, keys: &[&str]) {
        for key in keys {
            if let Some(delay) = self.delays.get(*key) {
                tokio::time::sleep(*delay).await;
            }
        }
    }
}

#[async_trait]
impl LedgerQuery for FakeLedger {
    async fn view_account(&self, account_id: &str) -> Result<AccountInfo, QueryError> {
        self.record(format!("view_account {account_id}"));
        self.delay(&[account_id]).await;
        self.accounts
            .get(account_id)
            .cloned()
            .unwrap_or_else(|| Err(not_found(account_id)))
    }

    async fn call_view_method(
        &self,
        contract_id: &str,
        method_name: &str,
        args: Value,
    ) -> Result<Value, QueryError> {
        self.record(format!("{contract_id}.{method_name} {args}"));
        self.delay(&[method_name]).await;
        self.views
            .get(&(contract_id.to_owned(), method_name.to_owned()))
            .cloned()
            .unwrap_or_else(|| Err(not_found(contract_id)))
    }

    async fn genesis_config(&self) -> Result<GenesisConfig, QueryError> {
        self.record("genesis_config".to_owned());
        self.delay(&["genesis_config"]).await;
        self.genesis
            .clone()
            .unwrap_or_else(|| Err(QueryError::Transport("no genesis scripted".to_owned())))
    }
}

pub fn aggregator(ledger: FakeLedger) -> AccountDetailsAggregator<FakeLedger> {
    AccountDetailsAggregator::new(
        AggregatorConfig {
            network_name: "testnet".to_owned(),
            lockup_suffix: SUFFIX.to_owned(),
        },
        ledger,
    )
}
