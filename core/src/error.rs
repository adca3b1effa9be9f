use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoyaltyError {
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Customer not found: {customer_id}")]
    CustomerNotFound { customer_id: String },

    #[error("Malformed {record} record at index {index}: {reason}")]
    DataFormat {
        record: &'static str,
        index:  usize,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Encoding results. Load-time decode failures are always `DataFormat`.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LoyaltyError {
    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        LoyaltyError::Validation {
            field:  field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn not_found(customer_id: &str) -> Self {
        LoyaltyError::CustomerNotFound {
            customer_id: customer_id.to_string(),
        }
    }
}

pub type LoyaltyResult<T> = Result<T, LoyaltyError>;
