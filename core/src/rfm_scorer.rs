//! RFM scoring: recency, frequency and monetary sub-scores.
//!
//! All three sub-scores are derived from the customer's completed
//! transactions only. Monetary uses summed completed spend, not the stored
//! lifetime value, so the three signals describe the same history.

use crate::{
    config::RfmConfig,
    store::CustomerHistory,
    types::{Days, Score},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RfmScore {
    /// Days since the latest completed purchase. None when there is none.
    pub recency_days:    Option<Days>,
    pub completed_count: usize,
    pub monetary_total:  f64,
    pub recency:         Score,
    pub frequency:       Score,
    pub monetary:        Score,
    pub combined:        Score,
}

pub struct RfmScorer {
    config: RfmConfig,
}

impl RfmScorer {
    pub fn new(config: RfmConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, history: &CustomerHistory<'_>, as_of: NaiveDate) -> RfmScore {
        let c = &self.config;

        let recency_days = days_since_last_purchase(history, as_of);
        let recency = match recency_days {
            Some(days) => (100.0 - days as f64 / c.recency_days_per_point).clamp(0.0, 100.0),
            // Never purchased: maximally stale.
            None => 0.0,
        };

        let completed_count = history.completed.len();
        let frequency = (completed_count as f64 / c.frequency_saturation * 100.0).min(100.0);

        let monetary_total: f64 = history.completed.iter().map(|t| t.amount).sum();
        let monetary = (monetary_total / c.monetary_saturation * 100.0).clamp(0.0, 100.0);

        let combined = (recency * c.recency_weight
            + frequency * c.frequency_weight
            + monetary * c.monetary_weight)
            .clamp(0.0, 100.0);

        RfmScore {
            recency_days,
            completed_count,
            monetary_total,
            recency,
            frequency,
            monetary,
            combined,
        }
    }
}

/// Whole days between the latest completed purchase and `as_of`.
/// Purchases dated after `as_of` count as zero days ago.
pub fn days_since_last_purchase(history: &CustomerHistory<'_>, as_of: NaiveDate) -> Option<Days> {
    history
        .completed
        .iter()
        .map(|t| t.timestamp.date())
        .max()
        .map(|last| (as_of - last).num_days().max(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoyaltyConfig;
    use crate::record::{Customer, Transaction, TransactionStatus};
    use chrono::Duration;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    fn customer() -> Customer {
        Customer {
            customer_id:    "C1".into(),
            segment_label:  "Regular".into(),
            loyalty_tier:   "Silver".into(),
            join_date:      NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            lifetime_value: 5_000.0,
        }
    }

    fn completed(days_ago: i64, amount: f64) -> Transaction {
        Transaction {
            transaction_id:   None,
            customer_id:      "C1".into(),
            timestamp:        (as_of() - Duration::days(days_ago)).and_hms_opt(9, 30, 0).unwrap(),
            amount,
            status:           TransactionStatus::Completed,
            product_category: "Sports".into(),
        }
    }

    fn scorer() -> RfmScorer {
        RfmScorer::new(LoyaltyConfig::defaults().rfm)
    }

    #[test]
    fn no_purchases_scores_stale_floor() {
        let c = customer();
        let history = CustomerHistory { customer: &c, completed: vec![] };
        let s = scorer().score(&history, as_of());
        assert_eq!(s.recency_days, None);
        assert_eq!(s.recency, 0.0);
        assert_eq!(s.frequency, 0.0);
        assert_eq!(s.monetary, 0.0);
        assert_eq!(s.combined, 0.0);
    }

    #[test]
    fn recency_decays_to_zero_over_a_year() {
        let c = customer();
        let today = completed(0, 10.0);
        let half = completed(182, 10.0);
        let old = completed(400, 10.0);

        let s = |t: &Transaction| {
            scorer()
                .score(&CustomerHistory { customer: &c, completed: vec![t] }, as_of())
                .recency
        };
        assert_eq!(s(&today), 100.0);
        assert!((s(&half) - 50.14).abs() < 0.01, "got {}", s(&half));
        assert_eq!(s(&old), 0.0);
    }

    #[test]
    fn frequency_and_monetary_saturate_at_100() {
        let c = customer();
        let txns: Vec<_> = (0..80).map(|d| completed(d, 2_000.0)).collect();
        let history = CustomerHistory { customer: &c, completed: txns.iter().collect() };
        let s = scorer().score(&history, as_of());
        assert_eq!(s.frequency, 100.0);
        assert_eq!(s.monetary, 100.0);
        assert_eq!(s.combined, 100.0);
    }

    #[test]
    fn combined_is_weighted_sum() {
        let c = customer();
        let txns = [completed(73, 5_000.0), completed(100, 5_000.0)];
        let history = CustomerHistory { customer: &c, completed: txns.iter().collect() };
        let s = scorer().score(&history, as_of());
        // recency 80, frequency 4, monetary 20
        assert!((s.recency - 80.0).abs() < 1e-9);
        assert!((s.frequency - 4.0).abs() < 1e-9);
        assert!((s.monetary - 20.0).abs() < 1e-9);
        assert!((s.combined - (80.0 * 0.30 + 4.0 * 0.35 + 20.0 * 0.35)).abs() < 1e-9);
    }

    #[test]
    fn future_dated_purchase_counts_as_today() {
        let c = customer();
        let t = completed(-5, 1.0);
        let history = CustomerHistory { customer: &c, completed: vec![&t] };
        assert_eq!(days_since_last_purchase(&history, as_of()), Some(0));
    }
}
