//! Shared primitive types used across the analytics core.

/// A stable, unique customer key as supplied by the data collaborator.
pub type CustomerId = String;

/// A whole number of calendar days.
pub type Days = i64;

/// A 0–100 score (RFM sub-scores and the combined score).
pub type Score = f64;
