use std::io::Write;

use anyhow::Context;
use csv::Writer;
use serde::Serialize;

use crate::account::AccountDetails;

/// One output line; balance columns stay empty for nonexistent accounts.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct DetailsRow {
    pub account_id: String,
    pub exists: bool,
    pub storage_usage: Option<u64>,
    pub staked_balance: Option<String>,
    pub non_staked_balance: Option<String>,
    pub minimum_balance: Option<String>,
    pub available_balance: Option<String>,
    pub total_balance: Option<String>,
    pub lockup_account_id: Option<String>,
    pub lockup_total_balance: Option<String>,
    pub lockup_locked_balance: Option<String>,
    pub lockup_unlocked_balance: Option<String>,
}

impl DetailsRow {
    pub fn new(account_id: String, details: Option<&AccountDetails>) -> Self {
        let Some(details) = details else {
            return Self {
                account_id,
                exists: false,
                storage_usage: None,
                staked_balance: None,
                non_staked_balance: None,
                minimum_balance: None,
                available_balance: None,
                total_balance: None,
                lockup_account_id: None,
                lockup_total_balance: None,
                lockup_locked_balance: None,
                lockup_unlocked_balance: None,
            };
        };
        let lockup = details.lockup.as_ref();
        Self {
            account_id,
            exists: true,
            storage_usage: Some(details.storage_usage),
            staked_balance: Some(details.staked_balance.to_string()),
            non_staked_balance: Some(details.non_staked_balance.to_string()),
            minimum_balance: Some(details.minimum_balance.to_string()),
            available_balance: Some(details.available_balance.to_string()),
            total_balance: Some(details.total_balance.to_string()),
            lockup_account_id: lockup.map(|l| l.lockup_account_id.clone()),
            lockup_total_balance: lockup.map(|l| l.lockup_total_balance.to_string()),
            lockup_locked_balance: lockup.map(|l| l.lockup_locked_balance.to_string()),
            lockup_unlocked_balance: lockup.map(|l| l.lockup_unlocked_balance.to_string()),
        }
    }
}

/// Writes `rows` as CSV with a header taken from the first row's field names
/// and returns how many rows were written.
pub fn write_rows<W, T>(output: W, rows: impl IntoIterator<Item = T>) -> anyhow::Result<usize>
where
    W: Write,
    T: Serialize,
{
    let mut writer = Writer::from_writer(output);
    let mut written = 0;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to write CSV row {}", written + 1))?;
        written += 1;
    }
    writer.flush().context("Failed to flush CSV output")?;
    Ok(written)
}
