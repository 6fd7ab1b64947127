use std::io::Read;

use csv::{Reader, StringRecord, Trim};
use thiserror::Error;

const ACCOUNT_ID_COLUMN: &str = "account_id";

#[derive(Debug, Error)]
pub enum AccountRowError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("Header has no `{ACCOUNT_ID_COLUMN}` column")]
    MissingColumn,
    #[error("Row has no `{ACCOUNT_ID_COLUMN}` value")]
    MissingValue,
}

/// Parses account ids from CSV with an `account_id` column.
///
/// Other columns are ignored and rows may be ragged, as long as they reach
/// the `account_id` column. Yields the line number of each row with either
/// its account id or the reason it could not be read.
pub struct CsvAccountIdParser<R> {
    reader: Reader<R>,
    record: StringRecord,
    done: bool,
}

impl<R> CsvAccountIdParser<R>
where
    R: Read,
{
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(source);

        Self {
            reader,
            record: StringRecord::new(),
            done: false,
        }
    }

    fn fail(
        &mut self,
        line: u64,
        err: AccountRowError,
    ) -> Option<(u64, Result<String, AccountRowError>)> {
        self.done = true;
        Some((line, Err(err)))
    }
}

impl<R> Iterator for CsvAccountIdParser<R>
where
    R: Read,
{
    type Item = (u64, Result<String, AccountRowError>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let column = match self.reader.headers() {
            // empty input
            Ok(headers) if headers.is_empty() => {
                self.done = true;
                return None;
            }
            Ok(headers) => headers.iter().position(|name| name == ACCOUNT_ID_COLUMN),
            Err(err) => return self.fail(1, err.into()),
        };
        let Some(column) = column else {
            return self.fail(1, AccountRowError::MissingColumn);
        };

        match self.reader.read_record(&mut self.record) {
            Ok(false) => {
                self.done = true;
                None
            }
            Ok(true) => {
                let line = self.record.position().map_or(0, |pos| pos.line());
                let account_id = self
                    .record
                    .get(column)
                    .filter(|value| !value.is_empty())
                    .map(str::to_owned)
                    .ok_or(AccountRowError::MissingValue);
                Some((line, account_id))
            }
            Err(err) => {
                let line = self.reader.position().line();
                self.fail(line, err.into())
            }
        }
    }
}
