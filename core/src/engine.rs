//! The analytics engine: the single entry point external collaborators use.
//!
//! PIPELINE (fixed order, per customer):
//!   1. Index lookup         (store)
//!   2. RFM scoring          (rfm_scorer)
//!   3. Churn estimation     (churn_model)
//!   4. Segmentation         (segmenter)
//!   5. Reward selection     (reward_recommender)
//!
//! RULES:
//!   - The engine is constructed explicitly; there is no process-wide state.
//!   - Inputs are validated before any lookup.
//!   - Every operation reads one index snapshot from start to finish, so a
//!     concurrent reload never mixes two datasets in one result.

use crate::{
    analysis::{AnalysisResult, BatchOutcome, CustomerProfile, LoyaltySummary},
    churn_model::{ChurnEstimate, ChurnEstimator},
    config::LoyaltyConfig,
    error::LoyaltyResult,
    record::{Customer, Transaction},
    reward_recommender::{Recommendation, RewardRecommender},
    rfm_scorer::{RfmScore, RfmScorer},
    segmenter::{Segment, SegmentSignals, Segmenter},
    store::{CustomerHistory, CustomerIndex, RecordStore},
    validation::{
        validate_customer_id, validate_id_list, validate_limit, validate_non_negative,
        validate_probability,
    },
};
use chrono::NaiveDate;
use std::sync::Arc;

pub struct LoyaltyEngine {
    as_of:       NaiveDate,
    store:       RecordStore,
    rfm:         RfmScorer,
    churn:       ChurnEstimator,
    segmenter:   Segmenter,
    recommender: RewardRecommender,
}

/// Steps 2–4 for one customer.
pub(crate) struct Scored {
    pub rfm:     RfmScore,
    pub churn:   ChurnEstimate,
    pub signals: SegmentSignals,
    pub segment: Segment,
}

impl LoyaltyEngine {
    /// Validate the configuration and wire every scoring component.
    /// `as_of` is the reference date all recency and tenure figures use.
    pub fn new(config: LoyaltyConfig, as_of: NaiveDate) -> LoyaltyResult<Self> {
        config.validate()?;
        Ok(Self {
            as_of,
            store:       RecordStore::new(),
            rfm:         RfmScorer::new(config.rfm),
            churn:       ChurnEstimator::new(config.churn),
            segmenter:   Segmenter::new(config.segmentation),
            recommender: RewardRecommender::new(config.rewards)?,
        })
    }

    /// Engine with built-in constants. Used by tests and the demo runner.
    pub fn with_defaults(as_of: NaiveDate) -> LoyaltyResult<Self> {
        Self::new(LoyaltyConfig::defaults(), as_of)
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    // ── Loading ────────────────────────────────────────────────

    pub fn load(&self, customers: Vec<Customer>, transactions: Vec<Transaction>) -> LoyaltyResult<()> {
        self.store.load(customers, transactions)?;
        Ok(())
    }

    pub fn load_json(&self, customers_json: &str, transactions_json: &str) -> LoyaltyResult<()> {
        self.store.load_json(customers_json, transactions_json)?;
        Ok(())
    }

    /// The current index. Unaffected by later reloads.
    pub fn snapshot(&self) -> Arc<CustomerIndex> {
        self.store.snapshot()
    }

    // ── Per-component operations ───────────────────────────────

    pub fn rfm_score(&self, customer_id: &str) -> LoyaltyResult<RfmScore> {
        let id = validate_customer_id(customer_id)?;
        let index = self.snapshot();
        let history = index.history(id)?;
        Ok(self.rfm.score(&history, self.as_of))
    }

    pub fn churn_probability(&self, customer_id: &str) -> LoyaltyResult<ChurnEstimate> {
        let id = validate_customer_id(customer_id)?;
        let index = self.snapshot();
        let history = index.history(id)?;
        Ok(self.score(&history).churn)
    }

    pub fn segment(&self, customer_id: &str) -> LoyaltyResult<Segment> {
        let id = validate_customer_id(customer_id)?;
        let index = self.snapshot();
        let history = index.history(id)?;
        Ok(self.score(&history).segment)
    }

    pub fn recommend_reward(&self, customer_id: &str) -> LoyaltyResult<Recommendation> {
        Ok(self.analyze(customer_id)?.recommendation)
    }

    // ── Composed analysis ──────────────────────────────────────

    pub fn analyze(&self, customer_id: &str) -> LoyaltyResult<AnalysisResult> {
        let id = validate_customer_id(customer_id)?;
        let index = self.snapshot();
        self.analyze_in(&index, id)
    }

    /// Analyze against an explicit snapshot. `customer_id` must already be validated.
    pub fn analyze_in(&self, index: &CustomerIndex, customer_id: &str) -> LoyaltyResult<AnalysisResult> {
        let history = index.history(customer_id)?;
        let scored = self.score(&history);
        let customer = history.customer;

        let recommendation = self.recommender.recommend(
            scored.segment,
            scored.churn.tier,
            customer.lifetime_value,
        );

        log::debug!(
            "analyze: {} segment={} rfm={:.2} churn={:.3} ({}) reward={}",
            customer.customer_id,
            scored.segment,
            scored.rfm.combined,
            scored.churn.probability,
            scored.churn.tier,
            recommendation.reward.reward_id,
        );

        Ok(AnalysisResult {
            customer_id: customer.customer_id.clone(),
            profile: CustomerProfile {
                segment_label:  customer.segment_label.clone(),
                loyalty_tier:   customer.loyalty_tier.clone(),
                join_date:      customer.join_date,
                tenure_days:    (self.as_of - customer.join_date).num_days().max(0),
                lifetime_value: customer.lifetime_value,
            },
            rfm: scored.rfm,
            churn: scored.churn,
            segment: scored.segment,
            is_new: scored.signals.is_new,
            recommendation,
        })
    }

    pub fn loyalty_summary(&self, customer_id: &str) -> LoyaltyResult<LoyaltySummary> {
        Ok(LoyaltySummary::from(&self.analyze(customer_id)?))
    }

    // ── Batch and scans ────────────────────────────────────────

    /// Analyze the first `limit` ids. Per-id failures (bad format or unknown
    /// customer) are recorded; only an empty list or a zero limit fails the call.
    pub fn batch_analyze<S: AsRef<str>>(&self, customer_ids: &[S], limit: usize) -> LoyaltyResult<BatchOutcome> {
        validate_id_list(customer_ids)?;
        let limit = validate_limit(limit)?;
        let index = self.snapshot();

        let mut outcome = BatchOutcome::default();
        for raw in customer_ids.iter().take(limit) {
            let raw = raw.as_ref();
            match validate_customer_id(raw).and_then(|id| self.analyze_in(&index, id)) {
                Ok(result) => outcome.results.push(result),
                Err(e) => {
                    outcome.failures.insert(raw.to_string(), e.to_string());
                }
            }
        }

        log::info!(
            "batch: analyzed {} customers, {} failures",
            outcome.success_count(),
            outcome.failure_count(),
        );
        Ok(outcome)
    }

    /// Batch over every loaded customer in load order.
    pub fn analyze_all(&self, limit: Option<usize>) -> LoyaltyResult<BatchOutcome> {
        let limit = limit.map(validate_limit).transpose()?;
        let index = self.snapshot();

        let mut outcome = BatchOutcome::default();
        let customers = index.customers().take(limit.unwrap_or(usize::MAX));
        for customer in customers {
            match self.analyze_in(&index, &customer.customer_id) {
                Ok(result) => outcome.results.push(result),
                Err(e) => {
                    outcome.failures.insert(customer.customer_id.clone(), e.to_string());
                }
            }
        }
        log::info!("batch: analyzed all {} customers", outcome.success_count());
        Ok(outcome)
    }

    /// Customers with lifetime value ≥ `min_lifetime_value` and churn
    /// probability ≥ `churn_threshold`, highest value first. Full O(n) scan.
    pub fn get_high_value_at_risk(
        &self,
        churn_threshold: f64,
        min_lifetime_value: f64,
    ) -> LoyaltyResult<Vec<AnalysisResult>> {
        let churn_threshold = validate_probability(churn_threshold, "churn_threshold")?;
        let min_lifetime_value = validate_non_negative(min_lifetime_value, "min_lifetime_value")?;
        let index = self.snapshot();

        let mut at_risk = Vec::new();
        for customer in index.customers() {
            if customer.lifetime_value < min_lifetime_value {
                continue;
            }
            let result = self.analyze_in(&index, &customer.customer_id)?;
            if result.churn.probability >= churn_threshold {
                at_risk.push(result);
            }
        }

        at_risk.sort_by(|a, b| {
            b.profile
                .lifetime_value
                .total_cmp(&a.profile.lifetime_value)
                .then_with(|| a.customer_id.cmp(&b.customer_id))
        });

        log::info!("scan: {} high-value customers at risk", at_risk.len());
        Ok(at_risk)
    }

    // ── Internals ──────────────────────────────────────────────

    pub(crate) fn score(&self, history: &CustomerHistory<'_>) -> Scored {
        let rfm = self.rfm.score(history, self.as_of);
        let churn = self.churn.estimate(history, &rfm, self.as_of);
        let signals = self.segmenter.signals(history, &rfm, churn.probability, self.as_of);
        let segment = self.segmenter.classify(&signals);
        Scored { rfm, churn, signals, segment }
    }
}
