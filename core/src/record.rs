//! Customer and transaction records as supplied by the data collaborator.
//!
//! Field names, types, and the `Completed` status are a compatibility
//! contract with the generator. Aliases accept the generator's original
//! field names (`segment`, `registration_date`, `final_amount`).

use crate::types::CustomerId;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    pub customer_id:    CustomerId,
    /// Generation-time label. Independent of the computed segment.
    #[serde(alias = "segment")]
    pub segment_label:  String,
    pub loyalty_tier:   String,
    #[serde(alias = "registration_date")]
    pub join_date:      NaiveDate,
    pub lifetime_value: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TransactionStatus {
    #[serde(alias = "completed", alias = "COMPLETED")]
    Completed,
    #[serde(alias = "failed", alias = "FAILED")]
    Failed,
    #[serde(alias = "pending", alias = "PENDING")]
    Pending,
    #[serde(alias = "refunded", alias = "REFUNDED")]
    Refunded,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id:   Option<String>,
    pub customer_id:      CustomerId,
    #[serde(with = "timestamp_format")]
    pub timestamp:        NaiveDateTime,
    #[serde(alias = "final_amount")]
    pub amount:           f64,
    pub status:           TransactionStatus,
    pub product_category: String,
}

impl Transaction {
    pub fn is_completed(&self) -> bool {
        self.status == TransactionStatus::Completed
    }
}

/// Accepts `YYYY-MM-DD HH:MM:SS` (generator output) and ISO-8601
/// `YYYY-MM-DDTHH:MM:SS[.f]`. Always writes the generator form.
pub mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    const GENERATOR_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
    const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(raw, GENERATOR_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(raw, ISO_FORMAT))
            .ok()
    }

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.format(GENERATOR_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp '{raw}'")))
    }
}
