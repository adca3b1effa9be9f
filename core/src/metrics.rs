//! Portfolio-level aggregates over the whole loaded customer base.

use crate::{churn_model::RiskTier, engine::LoyaltyEngine, error::LoyaltyResult, segmenter::Segment};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    pub total_customers:         usize,
    pub total_transactions:      usize,
    pub completed_transactions:  usize,
    /// Generation-time labels as supplied with the records.
    pub label_distribution:      BTreeMap<String, usize>,
    pub tier_distribution:       BTreeMap<String, usize>,
    /// Computed segments.
    pub segment_distribution:    BTreeMap<Segment, usize>,
    pub risk_distribution:       BTreeMap<RiskTier, usize>,
    pub avg_churn_probability:   f64,
    pub avg_predicted_retention: f64,
    pub avg_rfm_score:           f64,
}

impl LoyaltyEngine {
    /// One pass over every customer in the current snapshot.
    pub fn portfolio_metrics(&self) -> LoyaltyResult<PortfolioMetrics> {
        let index = self.snapshot();
        let mut m = PortfolioMetrics {
            total_customers:    index.customer_count(),
            total_transactions: index.transaction_count(),
            ..Default::default()
        };

        let mut churn_sum = 0.0;
        let mut rfm_sum = 0.0;

        for customer in index.customers() {
            *m.label_distribution.entry(customer.segment_label.clone()).or_insert(0) += 1;
            *m.tier_distribution.entry(customer.loyalty_tier.clone()).or_insert(0) += 1;

            let history = index.history(&customer.customer_id)?;
            m.completed_transactions += history.completed.len();

            let scored = self.score(&history);
            *m.segment_distribution.entry(scored.segment).or_insert(0) += 1;
            *m.risk_distribution.entry(scored.churn.tier).or_insert(0) += 1;
            churn_sum += scored.churn.probability;
            rfm_sum += scored.rfm.combined;
        }

        if m.total_customers > 0 {
            let n = m.total_customers as f64;
            m.avg_churn_probability = churn_sum / n;
            m.avg_predicted_retention = 1.0 - m.avg_churn_probability;
            m.avg_rfm_score = rfm_sum / n;
        }

        log::debug!(
            "metrics: {} customers, avg churn {:.3}",
            m.total_customers,
            m.avg_churn_probability,
        );
        Ok(m)
    }
}
