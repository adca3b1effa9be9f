//! Result shapes returned by the engine. Computed on demand, never stored.

use crate::{
    churn_model::{ChurnEstimate, RiskTier},
    config::RewardConfig,
    reward_recommender::{Recommendation, Strategy},
    rfm_scorer::RfmScore,
    segmenter::Segment,
    types::{CustomerId, Days},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerProfile {
    pub segment_label:  String,
    pub loyalty_tier:   String,
    pub join_date:      NaiveDate,
    pub tenure_days:    Days,
    pub lifetime_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub customer_id:    CustomerId,
    pub profile:        CustomerProfile,
    pub rfm:            RfmScore,
    pub churn:          ChurnEstimate,
    pub segment:        Segment,
    pub is_new:         bool,
    pub recommendation: Recommendation,
}

/// Compact view for callers that only act on the recommendation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoyaltySummary {
    pub customer_id:         CustomerId,
    pub segment:             Segment,
    pub rfm_score:           f64,
    pub churn_risk:          RiskTier,
    pub predicted_retention: f64,
    pub reward:              RewardConfig,
    pub confidence:          f64,
    pub strategy:            Strategy,
}

impl From<&AnalysisResult> for LoyaltySummary {
    fn from(a: &AnalysisResult) -> Self {
        Self {
            customer_id:         a.customer_id.clone(),
            segment:             a.segment,
            rfm_score:           a.rfm.combined,
            churn_risk:          a.churn.tier,
            predicted_retention: a.churn.predicted_retention,
            reward:              a.recommendation.reward.clone(),
            confidence:          a.recommendation.confidence,
            strategy:            a.recommendation.strategy,
        }
    }
}

/// Successes plus a per-id failure record. One bad id never aborts a batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub results:  Vec<AnalysisResult>,
    /// Requested id (as given) → error description. Keyed by id, so an id
    /// repeated in one batch appears once; `failure_count` counts distinct ids.
    pub failures: BTreeMap<String, String>,
}

impl BatchOutcome {
    pub fn success_count(&self) -> usize {
        self.results.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}
