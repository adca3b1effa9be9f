//! Input validation for facade operations.
//!
//! RULE: validation runs before any data access and never clamps. A value
//! outside its range is an error, not a corrected input.

use crate::error::{LoyaltyError, LoyaltyResult};

pub const MAX_CUSTOMER_ID_LEN: usize = 50;

/// Returns the trimmed id.
pub fn validate_customer_id(customer_id: &str) -> LoyaltyResult<&str> {
    let id = customer_id.trim();
    if id.is_empty() {
        return Err(LoyaltyError::validation("customer_id", "cannot be empty"));
    }
    if id.chars().count() > MAX_CUSTOMER_ID_LEN {
        return Err(LoyaltyError::validation(
            "customer_id",
            format!("too long (max {MAX_CUSTOMER_ID_LEN} characters)"),
        ));
    }
    Ok(id)
}

pub fn validate_probability(value: f64, field: &str) -> LoyaltyResult<f64> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(LoyaltyError::validation(
            field,
            format!("must be between 0 and 1, got {value}"),
        ));
    }
    Ok(value)
}

pub fn validate_non_negative(value: f64, field: &str) -> LoyaltyResult<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(LoyaltyError::validation(
            field,
            format!("must be a non-negative number, got {value}"),
        ));
    }
    Ok(value)
}

pub fn validate_limit(limit: usize) -> LoyaltyResult<usize> {
    if limit == 0 {
        return Err(LoyaltyError::validation("limit", "must be positive"));
    }
    Ok(limit)
}

pub fn validate_id_list<S: AsRef<str>>(customer_ids: &[S]) -> LoyaltyResult<()> {
    if customer_ids.is_empty() {
        return Err(LoyaltyError::validation("customer_ids", "list cannot be empty"));
    }
    Ok(())
}
