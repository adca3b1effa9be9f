//! Reward recommender: strategy selection, reward choice, and ROI projection.
//!
//! Strategy rules are an ordered table; the first rule whose condition
//! holds decides the strategy and its ranked reward candidates. The catalog
//! is configuration; rule candidates are resolved against it once, at
//! construction, so a recommendation can never reference a missing reward.
//!
//! ROI projection:
//!   lift  = min(confidence × max_retention_lift, max_retention_lift)
//!   value = lifetime_value × lift
//!   roi%  = (value − cost) / cost × 100     (0 for free rewards)

use crate::{
    churn_model::RiskTier,
    config::{RewardConfig, RewardPolicyConfig},
    error::{LoyaltyError, LoyaltyResult},
    segmenter::Segment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Strategy {
    ChurnPrevention,
    WinBack,
    LoyaltyReinforcement,
    GrowthUpsell,
    NewCustomerActivation,
    Default,
}

impl Strategy {
    pub fn label(self) -> &'static str {
        match self {
            Strategy::ChurnPrevention       => "Churn Prevention - High Value Retention",
            Strategy::WinBack               => "Win-Back Campaign",
            Strategy::LoyaltyReinforcement  => "Engagement & Loyalty Reinforcement",
            Strategy::GrowthUpsell          => "Growth & Upsell",
            Strategy::NewCustomerActivation => "New Customer Activation",
            Strategy::Default               => "Default Reward",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// When a strategy rule applies.
#[derive(Debug, Clone, Copy)]
pub enum RuleCondition {
    AnySegment(&'static [Segment]),
    RiskAtLeast(RiskTier),
}

impl RuleCondition {
    fn holds(&self, segment: Segment, tier: RiskTier) -> bool {
        match self {
            RuleCondition::AnySegment(segments) => segments.contains(&segment),
            RuleCondition::RiskAtLeast(min)     => tier >= *min,
        }
    }
}

pub struct StrategyRule {
    pub strategy:   Strategy,
    pub condition:  RuleCondition,
    /// Ranked (reward id, base confidence).
    pub candidates: &'static [(&'static str, f64)],
}

/// Evaluated top to bottom; first match wins.
pub const STRATEGY_RULES: &[StrategyRule] = &[
    StrategyRule {
        strategy:   Strategy::ChurnPrevention,
        condition:  RuleCondition::AnySegment(&[Segment::AtRiskChampion, Segment::AtRiskLoyal]),
        candidates: &[("vip_upgrade", 0.90), ("premium_discount", 0.85), ("gift_voucher", 0.80), ("cashback", 0.75)],
    },
    StrategyRule {
        strategy:   Strategy::WinBack,
        condition:  RuleCondition::AnySegment(&[Segment::Hibernating, Segment::LostCustomer]),
        candidates: &[("premium_discount", 0.90), ("gift_voucher", 0.85), ("cashback", 0.80)],
    },
    StrategyRule {
        strategy:   Strategy::ChurnPrevention,
        condition:  RuleCondition::RiskAtLeast(RiskTier::High),
        candidates: &[("vip_upgrade", 0.90), ("premium_discount", 0.85), ("gift_voucher", 0.80), ("cashback", 0.75)],
    },
    StrategyRule {
        strategy:   Strategy::LoyaltyReinforcement,
        condition:  RuleCondition::AnySegment(&[Segment::Champion, Segment::LoyalCustomer]),
        candidates: &[("early_access", 0.90), ("vip_upgrade", 0.80), ("birthday_special", 0.75), ("premium_discount", 0.70)],
    },
    StrategyRule {
        strategy:   Strategy::GrowthUpsell,
        condition:  RuleCondition::AnySegment(&[Segment::PotentialLoyalist]),
        candidates: &[("loyalty_points", 0.90), ("bundle_offer", 0.85), ("standard_discount", 0.80), ("free_shipping", 0.70)],
    },
    StrategyRule {
        strategy:   Strategy::NewCustomerActivation,
        condition:  RuleCondition::AnySegment(&[Segment::NewCustomer]),
        candidates: &[("standard_discount", 0.90), ("free_shipping", 0.85), ("loyalty_points", 0.80)],
    },
];

const DEFAULT_CANDIDATES: &[(&str, f64)] = &[("standard_discount", 0.50)];

/// Share of base confidence kept when no candidate is affordable.
const UNAFFORDABLE_CONFIDENCE_FACTOR: f64 = 0.5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlternativeReward {
    pub reward_id:  String,
    pub name:       String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub reward:                  RewardConfig,
    pub strategy:                Strategy,
    pub confidence:              f64,
    /// False when every candidate exceeded the cost budget and the cheapest was taken.
    pub within_budget:           bool,
    pub expected_retention_lift: f64,
    pub expected_value:          f64,
    /// Percent.
    pub projected_roi:           f64,
    pub alternatives:            Vec<AlternativeReward>,
}

struct StrategyPlan {
    strategy:   Strategy,
    condition:  Option<RuleCondition>,
    candidates: Vec<(RewardConfig, f64)>,
}

pub struct RewardRecommender {
    policy: RewardPolicyConfig,
    plans:  Vec<StrategyPlan>,
}

impl RewardRecommender {
    pub fn new(policy: RewardPolicyConfig) -> LoyaltyResult<Self> {
        let plans = resolve_plans(&policy.catalog)?;
        Ok(Self { policy, plans })
    }

    pub fn strategy_for(&self, segment: Segment, tier: RiskTier) -> Strategy {
        self.plan_for(segment, tier).strategy
    }

    pub fn recommend(&self, segment: Segment, tier: RiskTier, lifetime_value: f64) -> Recommendation {
        let plan = self.plan_for(segment, tier);
        let budget = lifetime_value.max(0.0) * self.policy.max_cost_share;

        let affordable = plan
            .candidates
            .iter()
            .position(|(reward, _)| reward.cost <= budget);

        let (chosen, confidence, within_budget) = match affordable {
            Some(i) => (i, plan.candidates[i].1, true),
            None => {
                let cheapest = plan
                    .candidates
                    .iter()
                    .enumerate()
                    .min_by(|a, b| a.1 .0.cost.total_cmp(&b.1 .0.cost))
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                (
                    cheapest,
                    plan.candidates[cheapest].1 * UNAFFORDABLE_CONFIDENCE_FACTOR,
                    false,
                )
            }
        };
        let confidence = confidence.clamp(0.0, 1.0);
        let reward = plan.candidates[chosen].0.clone();

        let alternatives = plan
            .candidates
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != chosen)
            .take(2)
            .map(|(_, (r, c))| AlternativeReward {
                reward_id:  r.reward_id.clone(),
                name:       r.name.clone(),
                confidence: *c,
            })
            .collect();

        let projection = self.project_roi(confidence, lifetime_value, reward.cost);

        Recommendation {
            reward,
            strategy: plan.strategy,
            confidence,
            within_budget,
            expected_retention_lift: projection.lift,
            expected_value: projection.value,
            projected_roi: projection.roi_percent,
            alternatives,
        }
    }

    /// The lift cap bounds projections for high-confidence, high-value customers.
    pub fn project_roi(&self, confidence: f64, lifetime_value: f64, cost: f64) -> RoiProjection {
        let cap = self.policy.max_retention_lift;
        let lift = (confidence.clamp(0.0, 1.0) * cap).min(cap);
        let value = lifetime_value.max(0.0) * lift;
        let roi_percent = if cost > 0.0 {
            (value - cost) / cost * 100.0
        } else {
            0.0
        };
        RoiProjection { lift, value, roi_percent }
    }

    fn plan_for(&self, segment: Segment, tier: RiskTier) -> &StrategyPlan {
        // The default plan has no condition and is always last.
        self.plans
            .iter()
            .find(|p| p.condition.is_none_or(|c| c.holds(segment, tier)))
            .unwrap_or(&self.plans[self.plans.len() - 1])
    }
}

fn resolve_plans(rewards: &[RewardConfig]) -> LoyaltyResult<Vec<StrategyPlan>> {
    let catalog: HashMap<&str, &RewardConfig> = rewards
        .iter()
        .map(|r| (r.reward_id.as_str(), r))
        .collect();

    let resolve = |strategy: Strategy, candidates: &[(&str, f64)]| {
        candidates
            .iter()
            .map(|(id, confidence)| {
                catalog
                    .get(*id)
                    .map(|r| ((*r).clone(), *confidence))
                    .ok_or_else(|| {
                        LoyaltyError::Config(format!(
                            "strategy '{strategy}' references reward '{id}' missing from catalog"
                        ))
                    })
            })
            .collect::<LoyaltyResult<Vec<_>>>()
    };

    let mut plans = Vec::with_capacity(STRATEGY_RULES.len() + 1);
    for rule in STRATEGY_RULES {
        plans.push(StrategyPlan {
            strategy:   rule.strategy,
            condition:  Some(rule.condition),
            candidates: resolve(rule.strategy, rule.candidates)?,
        });
    }
    plans.push(StrategyPlan {
        strategy:   Strategy::Default,
        condition:  None,
        candidates: resolve(Strategy::Default, DEFAULT_CANDIDATES)?,
    });
    Ok(plans)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoiProjection {
    pub lift:        f64,
    pub value:       f64,
    pub roi_percent: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoyaltyConfig;

    fn recommender() -> RewardRecommender {
        RewardRecommender::new(LoyaltyConfig::defaults().rewards).unwrap()
    }

    const TIERS: [RiskTier; 3] = [RiskTier::Low, RiskTier::Medium, RiskTier::High];

    #[test]
    fn every_segment_and_tier_has_a_non_default_strategy() {
        let r = recommender();
        for segment in Segment::ALL {
            for tier in TIERS {
                assert_ne!(r.strategy_for(segment, tier), Strategy::Default, "{segment} / {tier}");
            }
        }
    }

    #[test]
    fn at_risk_segments_get_churn_prevention() {
        let r = recommender();
        for tier in TIERS {
            assert_eq!(r.strategy_for(Segment::AtRiskChampion, tier), Strategy::ChurnPrevention);
            assert_eq!(r.strategy_for(Segment::AtRiskLoyal, tier), Strategy::ChurnPrevention);
        }
    }

    #[test]
    fn lapsed_segments_get_win_back_even_at_high_risk() {
        let r = recommender();
        assert_eq!(r.strategy_for(Segment::LostCustomer, RiskTier::High), Strategy::WinBack);
        assert_eq!(r.strategy_for(Segment::Hibernating, RiskTier::High), Strategy::WinBack);
    }

    #[test]
    fn high_risk_new_customer_gets_churn_prevention() {
        let r = recommender();
        assert_eq!(r.strategy_for(Segment::NewCustomer, RiskTier::High), Strategy::ChurnPrevention);
        assert_eq!(r.strategy_for(Segment::NewCustomer, RiskTier::Low), Strategy::NewCustomerActivation);
    }

    #[test]
    fn top_candidate_chosen_when_affordable() {
        let rec = recommender().recommend(Segment::Champion, RiskTier::Low, 100_000.0);
        assert_eq!(rec.reward.reward_id, "early_access");
        assert_eq!(rec.confidence, 0.90);
        assert!(rec.within_budget);
        assert_eq!(rec.alternatives.len(), 2);
        assert_eq!(rec.alternatives[0].reward_id, "vip_upgrade");
    }

    #[test]
    fn budget_skips_expensive_candidates() {
        // Budget 800: vip_upgrade (1000) is skipped for premium_discount (500).
        let rec = recommender().recommend(Segment::AtRiskChampion, RiskTier::Medium, 8_000.0);
        assert_eq!(rec.reward.reward_id, "premium_discount");
        assert_eq!(rec.confidence, 0.85);
        assert_eq!(rec.alternatives[0].reward_id, "vip_upgrade");
    }

    #[test]
    fn nothing_affordable_falls_back_to_cheapest_with_reduced_confidence() {
        let rec = recommender().recommend(Segment::LostCustomer, RiskTier::High, 1_000.0);
        assert_eq!(rec.strategy, Strategy::WinBack);
        assert_eq!(rec.reward.reward_id, "cashback");
        assert!(!rec.within_budget);
        assert!((rec.confidence - 0.40).abs() < 1e-12);
    }

    #[test]
    fn lift_never_exceeds_cap() {
        let r = recommender();
        for confidence in [0.0, 0.3, 0.9, 1.0, 5.0] {
            for ltv in [0.0, 1.0, 1e3, 1e9, f64::MAX / 10.0] {
                let p = r.project_roi(confidence, ltv, 500.0);
                assert!(p.lift <= 0.30 + 1e-12, "lift {} for confidence {confidence}", p.lift);
                let ceiling = (ltv * 0.30 - 500.0) / 500.0 * 100.0;
                assert!(p.roi_percent <= ceiling + 1e-6 * ceiling.abs().max(1.0));
            }
        }
    }

    #[test]
    fn roi_formula() {
        let p = recommender().project_roi(0.9, 10_000.0, 500.0);
        assert!((p.lift - 0.27).abs() < 1e-12);
        assert!((p.value - 2_700.0).abs() < 1e-9);
        assert!((p.roi_percent - 440.0).abs() < 1e-9);
    }

    #[test]
    fn free_reward_has_zero_roi() {
        let p = recommender().project_roi(0.9, 10_000.0, 0.0);
        assert_eq!(p.roi_percent, 0.0);
    }

    #[test]
    fn missing_catalog_entry_is_a_config_error() {
        let mut policy = LoyaltyConfig::defaults().rewards;
        policy.catalog.retain(|r| r.reward_id != "bundle_offer");
        assert!(matches!(
            RewardRecommender::new(policy),
            Err(LoyaltyError::Config(_))
        ));
    }
}
