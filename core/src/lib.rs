//! Customer analytics core: RFM scoring, churn estimation, segmentation,
//! and reward recommendation over an in-memory customer index.

pub mod analysis;
pub mod churn_model;
pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod record;
pub mod reward_recommender;
pub mod rfm_scorer;
pub mod segmenter;
pub mod store;
pub mod types;
pub mod validation;

pub use analysis::{AnalysisResult, BatchOutcome, LoyaltySummary};
pub use engine::LoyaltyEngine;
pub use error::{LoyaltyError, LoyaltyResult};
