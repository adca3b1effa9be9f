//! Churn model: closed-form attrition probability.
//!
//! Probability is a weighted sum of four independently bounded risks:
//!   1. recency     days since last purchase over a horizon
//!   2. frequency   inverse of completed purchase count
//!   3. engagement  exponentially decayed purchase mass (gap-sensitive)
//!   4. rfm         complement of the combined RFM score
//!
//! Each risk lies in [0, 1]; the weighted sum is clamped to [0, 1].

use crate::{
    config::{ChurnConfig, ChurnThresholds},
    rfm_scorer::{days_since_last_purchase, RfmScore},
    store::CustomerHistory,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn classify(probability: f64, thresholds: &ChurnThresholds) -> Self {
        if probability >= thresholds.high_risk {
            RiskTier::High
        } else if probability >= thresholds.medium_risk {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskTier::Low    => "Low",
            RiskTier::Medium => "Medium",
            RiskTier::High   => "High",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChurnEstimate {
    pub probability:         f64,
    pub tier:                RiskTier,
    pub predicted_retention: f64,
    // Components
    pub recency_risk:        f64,
    pub frequency_risk:      f64,
    pub engagement_risk:     f64,
    pub rfm_risk:            f64,
}

pub struct ChurnEstimator {
    config: ChurnConfig,
}

impl ChurnEstimator {
    pub fn new(config: ChurnConfig) -> Self {
        Self { config }
    }

    pub fn estimate(
        &self,
        history: &CustomerHistory<'_>,
        rfm: &RfmScore,
        as_of: NaiveDate,
    ) -> ChurnEstimate {
        let c = &self.config;

        let recency_risk = match days_since_last_purchase(history, as_of) {
            Some(days) => (days as f64 / c.recency_horizon_days).clamp(0.0, 1.0),
            None => 1.0,
        };

        let count = history.completed.len();
        let frequency_risk = if count == 0 {
            1.0
        } else {
            (c.frequency_pivot / count as f64).min(1.0)
        };

        let engagement_risk = 1.0 - (self.activity_mass(history, as_of) / c.engagement_saturation).min(1.0);

        let rfm_risk = (1.0 - rfm.combined / 100.0).clamp(0.0, 1.0);

        let probability = (recency_risk * c.recency_weight
            + frequency_risk * c.frequency_weight
            + engagement_risk * c.engagement_weight
            + rfm_risk * c.rfm_weight)
            .clamp(0.0, 1.0);

        ChurnEstimate {
            probability,
            tier: RiskTier::classify(probability, &c.thresholds),
            predicted_retention: 1.0 - probability,
            recency_risk,
            frequency_risk,
            engagement_risk,
            rfm_risk,
        }
    }

    /// Sum of per-purchase weights halving every `engagement_half_life_days`.
    /// Steady recent activity keeps this high; long gaps drain it.
    fn activity_mass(&self, history: &CustomerHistory<'_>, as_of: NaiveDate) -> f64 {
        let half_life = self.config.engagement_half_life_days;
        history
            .completed
            .iter()
            .map(|t| {
                let age = (as_of - t.timestamp.date()).num_days().max(0) as f64;
                0.5f64.powf(age / half_life)
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoyaltyConfig;
    use crate::record::{Customer, Transaction, TransactionStatus};
    use crate::rfm_scorer::RfmScorer;
    use chrono::Duration;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    fn customer() -> Customer {
        Customer {
            customer_id:    "C1".into(),
            segment_label:  "Occasional".into(),
            loyalty_tier:   "Bronze".into(),
            join_date:      NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            lifetime_value: 1_000.0,
        }
    }

    fn completed(days_ago: i64, amount: f64) -> Transaction {
        Transaction {
            transaction_id:   None,
            customer_id:      "C1".into(),
            timestamp:        (as_of() - Duration::days(days_ago)).and_hms_opt(18, 0, 0).unwrap(),
            amount,
            status:           TransactionStatus::Completed,
            product_category: "Beauty".into(),
        }
    }

    fn estimate(txns: &[Transaction]) -> ChurnEstimate {
        let config = LoyaltyConfig::defaults();
        let c = customer();
        let history = CustomerHistory { customer: &c, completed: txns.iter().collect() };
        let rfm = RfmScorer::new(config.rfm).score(&history, as_of());
        ChurnEstimator::new(config.churn).estimate(&history, &rfm, as_of())
    }

    #[test]
    fn no_history_is_maximal_risk() {
        let e = estimate(&[]);
        assert_eq!(e.recency_risk, 1.0);
        assert_eq!(e.frequency_risk, 1.0);
        assert_eq!(e.engagement_risk, 1.0);
        assert_eq!(e.rfm_risk, 1.0);
        assert_eq!(e.probability, 1.0);
        assert_eq!(e.tier, RiskTier::High);
    }

    #[test]
    fn frequent_recent_buyer_is_low_risk() {
        let txns: Vec<_> = (0..30).map(|i| completed(i * 3, 400.0)).collect();
        let e = estimate(&txns);
        assert!(e.probability < 0.4, "probability={}", e.probability);
        assert_eq!(e.tier, RiskTier::Low);
        assert!((e.predicted_retention + e.probability - 1.0).abs() < 1e-12);
    }

    #[test]
    fn engagement_distinguishes_gaps_from_recency() {
        // Same last purchase date and count, different spacing.
        let bunched: Vec<_> = (0..6).map(|i| completed(10 + i, 50.0)).collect();
        let spread: Vec<_> = (0..6).map(|i| completed(10 + i * 120, 50.0)).collect();
        let a = estimate(&bunched);
        let b = estimate(&spread);
        assert_eq!(a.recency_risk, b.recency_risk);
        assert!(b.engagement_risk > a.engagement_risk);
    }

    #[test]
    fn components_and_probability_are_bounded() {
        for days in [0, 1, 30, 90, 180, 365, 1_000, 10_000] {
            for n in [1usize, 2, 5, 50] {
                let txns: Vec<_> = (0..n).map(|i| completed(days + i as i64, 75.0)).collect();
                let e = estimate(&txns);
                for v in [e.recency_risk, e.frequency_risk, e.engagement_risk, e.rfm_risk, e.probability] {
                    assert!((0.0..=1.0).contains(&v), "value {v} out of range (days={days}, n={n})");
                }
            }
        }
    }

    #[test]
    fn tier_boundaries_follow_config() {
        let t = ChurnThresholds { medium_risk: 0.4, high_risk: 0.7 };
        assert_eq!(RiskTier::classify(0.39, &t), RiskTier::Low);
        assert_eq!(RiskTier::classify(0.40, &t), RiskTier::Medium);
        assert_eq!(RiskTier::classify(0.69, &t), RiskTier::Medium);
        assert_eq!(RiskTier::classify(0.70, &t), RiskTier::High);

        let strict = ChurnThresholds { medium_risk: 0.2, high_risk: 0.5 };
        assert_eq!(RiskTier::classify(0.6, &strict), RiskTier::High);
    }
}
