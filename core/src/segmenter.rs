//! Segmenter: deterministic decision table over (RFM, churn, newness).
//!
//! Rules are evaluated in a fixed priority order and the first match wins.
//! The bands are half-open and tile the whole input space, so exactly one
//! rule matches any valid input; `rules_matching` exposes that for tests.

use crate::{config::SegmentationConfig, rfm_scorer::RfmScore, store::CustomerHistory};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    Champion,
    LoyalCustomer,
    AtRiskChampion,
    AtRiskLoyal,
    PotentialLoyalist,
    Hibernating,
    NewCustomer,
    LostCustomer,
}

impl Segment {
    pub const ALL: [Segment; 8] = [
        Segment::Champion,
        Segment::LoyalCustomer,
        Segment::AtRiskChampion,
        Segment::AtRiskLoyal,
        Segment::PotentialLoyalist,
        Segment::Hibernating,
        Segment::NewCustomer,
        Segment::LostCustomer,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Segment::Champion          => "Champion",
            Segment::LoyalCustomer     => "Loyal Customer",
            Segment::AtRiskChampion    => "At-Risk Champion",
            Segment::AtRiskLoyal       => "At-Risk Loyal",
            Segment::PotentialLoyalist => "Potential Loyalist",
            Segment::Hibernating       => "Hibernating",
            Segment::NewCustomer       => "New Customer",
            Segment::LostCustomer      => "Lost Customer",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Half-open interval `[min, max)`.
#[derive(Debug, Clone, Copy)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    fn contains(&self, v: f64) -> bool {
        v >= self.min && v < self.max
    }
}

#[derive(Debug, Clone)]
pub struct SegmentRule {
    pub segment:  Segment,
    pub rfm:      Band,
    pub churn:    Band,
    /// None matches either way.
    pub is_new:   Option<bool>,
}

impl SegmentRule {
    pub fn matches(&self, signals: &SegmentSignals) -> bool {
        self.rfm.contains(signals.rfm_score)
            && self.churn.contains(signals.churn_probability)
            && self.is_new.is_none_or(|n| n == signals.is_new)
    }
}

/// The inputs the decision table looks at.
#[derive(Debug, Clone, Copy)]
pub struct SegmentSignals {
    pub rfm_score:         f64,
    pub churn_probability: f64,
    pub is_new:            bool,
}

pub struct Segmenter {
    config: SegmentationConfig,
    rules:  Vec<SegmentRule>,
}

impl Segmenter {
    pub fn new(config: SegmentationConfig) -> Self {
        let rules = build_rules(&config);
        Self { config, rules }
    }

    /// Newness: few completed purchases and a short tenure.
    pub fn signals(
        &self,
        history: &CustomerHistory<'_>,
        rfm: &RfmScore,
        churn_probability: f64,
        as_of: NaiveDate,
    ) -> SegmentSignals {
        let tenure_days = (as_of - history.customer.join_date).num_days();
        let is_new = rfm.completed_count < self.config.new_customer_purchase_limit
            && tenure_days <= self.config.new_customer_max_tenure_days;
        SegmentSignals {
            rfm_score: rfm.combined,
            churn_probability,
            is_new,
        }
    }

    pub fn classify(&self, signals: &SegmentSignals) -> Segment {
        self.rules
            .iter()
            .find(|r| r.matches(signals))
            .map(|r| r.segment)
            // Unreachable for in-range inputs: the last rule covers every
            // remaining (rfm, churn) pair for non-new customers.
            .unwrap_or(Segment::LostCustomer)
    }

    pub fn rules_matching(&self, signals: &SegmentSignals) -> Vec<Segment> {
        self.rules
            .iter()
            .filter(|r| r.matches(signals))
            .map(|r| r.segment)
            .collect()
    }
}

fn build_rules(c: &SegmentationConfig) -> Vec<SegmentRule> {
    // Upper bounds are open; infinity makes the top bands include 100 / 1.0.
    let top = f64::INFINITY;
    let bottom = f64::NEG_INFINITY;
    let rule = |segment: Segment, rfm: (f64, f64), churn: (f64, f64), is_new: Option<bool>| SegmentRule {
        segment,
        rfm:   Band { min: rfm.0, max: rfm.1 },
        churn: Band { min: churn.0, max: churn.1 },
        is_new,
    };

    vec![
        rule(Segment::Champion,          (c.champion_rfm, top),          (bottom, c.champion_max_churn),  None),
        rule(Segment::AtRiskChampion,    (c.champion_rfm, top),          (c.champion_max_churn, top),     None),
        rule(Segment::LoyalCustomer,     (c.loyal_rfm, c.champion_rfm),  (bottom, c.loyal_max_churn),     None),
        rule(Segment::AtRiskLoyal,       (c.loyal_rfm, c.champion_rfm),  (c.loyal_max_churn, top),        None),
        rule(Segment::PotentialLoyalist, (c.potential_rfm, c.loyal_rfm), (bottom, c.potential_max_churn), None),
        rule(Segment::Hibernating,       (c.potential_rfm, c.loyal_rfm), (c.potential_max_churn, top),    None),
        rule(Segment::NewCustomer,       (bottom, c.potential_rfm),      (bottom, top),                   Some(true)),
        rule(Segment::LostCustomer,      (bottom, c.potential_rfm),      (bottom, top),                   Some(false)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoyaltyConfig;

    fn segmenter() -> Segmenter {
        Segmenter::new(LoyaltyConfig::defaults().segmentation)
    }

    fn signals(rfm_score: f64, churn_probability: f64, is_new: bool) -> SegmentSignals {
        SegmentSignals { rfm_score, churn_probability, is_new }
    }

    #[test]
    fn decision_table_is_total_and_exclusive() {
        let s = segmenter();
        // Quarter-point RFM steps land on every threshold exactly.
        for r in 0..=400 {
            for p in 0..=200 {
                for is_new in [false, true] {
                    let sig = signals(r as f64 * 0.25, p as f64 * 0.005, is_new);
                    let hits = s.rules_matching(&sig);
                    assert_eq!(hits.len(), 1, "signals {sig:?} matched {hits:?}");
                    assert_eq!(hits[0], s.classify(&sig));
                }
            }
        }
    }

    #[test]
    fn every_segment_is_reachable() {
        let s = segmenter();
        let seen: std::collections::HashSet<_> = [
            signals(90.0, 0.1, false),
            signals(90.0, 0.6, false),
            signals(60.0, 0.2, false),
            signals(60.0, 0.5, false),
            signals(40.0, 0.3, false),
            signals(40.0, 0.8, false),
            signals(10.0, 0.9, true),
            signals(10.0, 0.9, false),
        ]
        .iter()
        .map(|sig| s.classify(sig))
        .collect();
        assert_eq!(seen.len(), Segment::ALL.len());
    }

    #[test]
    fn boundaries_belong_to_the_upper_band() {
        let s = segmenter();
        assert_eq!(s.classify(&signals(75.0, 0.0, false)), Segment::Champion);
        assert_eq!(s.classify(&signals(75.0, 0.3, false)), Segment::AtRiskChampion);
        assert_eq!(s.classify(&signals(50.0, 0.39, false)), Segment::LoyalCustomer);
        assert_eq!(s.classify(&signals(30.0, 0.5, false)), Segment::Hibernating);
        assert_eq!(s.classify(&signals(29.99, 0.0, false)), Segment::LostCustomer);
        assert_eq!(s.classify(&signals(100.0, 1.0, true)), Segment::AtRiskChampion);
    }

    #[test]
    fn labels_are_stable() {
        let labels: Vec<_> = Segment::ALL.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            labels,
            [
                "Champion",
                "Loyal Customer",
                "At-Risk Champion",
                "At-Risk Loyal",
                "Potential Loyalist",
                "Hibernating",
                "New Customer",
                "Lost Customer",
            ]
        );
    }
}
