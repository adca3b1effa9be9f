//! Record-by-record JSON ingestion.
//!
//! Each element is decoded on its own so a failure names the record kind
//! and position instead of a byte offset into the whole file.

use crate::{
    error::{LoyaltyError, LoyaltyResult},
    record::{Customer, Transaction},
};
use serde::de::DeserializeOwned;

pub fn parse_customers(json: &str) -> LoyaltyResult<Vec<Customer>> {
    parse_records("customer", json)
}

pub fn parse_transactions(json: &str) -> LoyaltyResult<Vec<Transaction>> {
    parse_records("transaction", json)
}

fn parse_records<T: DeserializeOwned>(record: &'static str, json: &str) -> LoyaltyResult<Vec<T>> {
    // A file that is not a JSON array at all is reported against its first record.
    let raw: Vec<serde_json::Value> = serde_json::from_str(json).map_err(|e| LoyaltyError::DataFormat {
        record,
        index: 0,
        reason: format!("expected a JSON array of {record} records: {e}"),
    })?;
    raw.into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value(value).map_err(|e| LoyaltyError::DataFormat {
                record,
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}
