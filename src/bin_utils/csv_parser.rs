use std::io::Read;

use csv::{DeserializeRecordsIntoIter, Trim};
use rust_decimal::Decimal;
use serde::{Deserialize, de::DeserializeOwned};

use crate::account::{Account, AccountError};

#[derive(Debug, Deserialize)]
pub struct AccountRecord {
    pub id: String,
    pub name: String,
    pub balance: Decimal,
}

impl TryFrom<AccountRecord> for Account {
    type Error = AccountError;

    fn try_from(record: AccountRecord) -> Result<Self, Self::Error> {
        Account::new(record.id, record.name, record.balance)
    }
}

/// Parses records of type `T` from CSV with a header row.
/// Yields the line each record started on together with the parse outcome.
pub struct CsvRecordParser<R, T> {
    iter: DeserializeRecordsIntoIter<R, T>,
}

impl<R, T> CsvRecordParser<R, T>
where
    R: Read,
    T: DeserializeOwned,
{
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(source);

        Self {
            iter: reader.into_deserialize(),
        }
    }
}

impl<R, T> Iterator for CsvRecordParser<R, T>
where
    R: Read,
    T: DeserializeOwned,
{
    type Item = (u64, Result<T, csv::Error>);

    fn next(&mut self) -> Option<Self::Item> {
        let curr_line = self.iter.reader().position().line();
        self.iter.next().map(|row| (curr_line, row))
    }
}
