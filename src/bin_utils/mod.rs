//! Batch front end over [`AccountDetailsAggregator`]: account ids in, CSV out.
//! Lives in the library so the integration tests can drive it with a fake
//! ledger.

use std::io::{Read, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::{
    aggregator::{AccountDetailsAggregator, AccountDetailsError},
    query::LedgerQuery,
};
use csv_parser::CsvAccountIdParser;
use csv_printer::{DetailsRow, write_rows};
pub mod csv_parser;
pub mod csv_printer;

/// Collects account ids given on the command line followed by those of an
/// optional CSV input.
pub fn collect_account_ids<R>(mut account_ids: Vec<String>, input: Option<R>) -> Result<Vec<String>>
where
    R: Read,
{
    if let Some(input) = input {
        for (line, row) in CsvAccountIdParser::new(input) {
            let account_id = row.with_context(|| format!("Invalid input row at line {line}"))?;
            account_ids.push(account_id);
        }
    }
    Ok(account_ids)
}

pub struct Service<'a, Q, W: 'a> {
    pub aggregator: &'a AccountDetailsAggregator<Q>,
    pub output: &'a mut W,
    pub error_printer: Box<dyn FnMut(usize, &str, AccountDetailsError) + 'a>,
}

impl<'a, Q, W> Service<'a, Q, W>
where
    Q: LedgerQuery,
    W: Write + 'a,
{
    /// Looks up every account in turn. A failed account is handed to the
    /// error printer with its 1-based position and left out of the output.
    pub async fn run(mut self, account_ids: Vec<String>) -> Result<()> {
        let mut rows = Vec::with_capacity(account_ids.len());
        for (position, account_id) in account_ids.into_iter().enumerate() {
            match self.aggregator.get_account_details(&account_id).await {
                Ok(details) => rows.push(DetailsRow::new(account_id, details.as_ref())),
                Err(err) => (self.error_printer)(position + 1, &account_id, err),
            }
        }
        let written = write_rows(&mut *self.output, rows)?;
        info!(accounts = written, "printed account details");
        Ok(())
    }
}
