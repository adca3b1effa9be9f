use crate::error::{LoyaltyError, LoyaltyResult};
use crate::types::Days;
use serde::{Deserialize, Serialize};

const WEIGHT_TOLERANCE: f64 = 1e-6;

// ── RFM scoring ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RfmConfig {
    /// Days of staleness that cost one recency point (3.65 → zero at one year).
    pub recency_days_per_point: f64,
    /// Completed purchase count that maps to a frequency score of 100.
    pub frequency_saturation:   f64,
    /// Completed spend that maps to a monetary score of 100.
    pub monetary_saturation:    f64,
    pub recency_weight:         f64,
    pub frequency_weight:       f64,
    pub monetary_weight:        f64,
}

// ── Churn model ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChurnConfig {
    pub recency_horizon_days:      f64,
    pub frequency_pivot:           f64,
    pub engagement_half_life_days: f64,
    pub engagement_saturation:     f64,
    pub recency_weight:            f64,
    pub frequency_weight:          f64,
    pub engagement_weight:         f64,
    pub rfm_weight:                f64,
    pub thresholds:                ChurnThresholds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChurnThresholds {
    pub medium_risk: f64,
    pub high_risk:   f64,
}

// ── Segmentation ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationConfig {
    pub champion_rfm:                f64,
    pub loyal_rfm:                   f64,
    pub potential_rfm:               f64,
    pub champion_max_churn:          f64,
    pub loyal_max_churn:             f64,
    pub potential_max_churn:         f64,
    pub new_customer_purchase_limit: usize,
    pub new_customer_max_tenure_days: Days,
}

// ── Rewards ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RewardConfig {
    pub reward_id:   String,
    pub name:        String,
    pub cost:        f64,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardPolicyConfig {
    /// Upper bound on the retention lift any recommendation may project.
    pub max_retention_lift: f64,
    /// A reward is affordable when its cost is at most this share of lifetime value.
    pub max_cost_share:     f64,
    pub catalog:            Vec<RewardConfig>,
}

#[derive(Debug, Clone, Deserialize)]
struct RewardCatalogFile {
    max_retention_lift: f64,
    max_cost_share:     f64,
    rewards:            Vec<RewardConfig>,
}

#[derive(Debug, Clone, Deserialize)]
struct ScoringFile {
    rfm:          RfmConfig,
    churn:        ChurnConfig,
    segmentation: SegmentationConfig,
}

// ── Root ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoyaltyConfig {
    pub rfm:          RfmConfig,
    pub churn:        ChurnConfig,
    pub segmentation: SegmentationConfig,
    pub rewards:      RewardPolicyConfig,
}

impl LoyaltyConfig {
    /// Load from the data/ directory.
    /// In tests, use LoyaltyConfig::defaults().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let scoring_path = format!("{data_dir}/scoring/scoring_config.json");
        let scoring_content = std::fs::read_to_string(&scoring_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {scoring_path}: {e}"))?;
        let scoring: ScoringFile = serde_json::from_str(&scoring_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {scoring_path}: {e}"))?;

        let catalog_path = format!("{data_dir}/rewards/reward_catalog.json");
        let catalog_content = std::fs::read_to_string(&catalog_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {catalog_path}: {e}"))?;
        let catalog: RewardCatalogFile = serde_json::from_str(&catalog_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {catalog_path}: {e}"))?;

        let config = Self {
            rfm:          scoring.rfm,
            churn:        scoring.churn,
            segmentation: scoring.segmentation,
            rewards: RewardPolicyConfig {
                max_retention_lift: catalog.max_retention_lift,
                max_cost_share:     catalog.max_cost_share,
                catalog:            catalog.rewards,
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Built-in constants. Mirrors the files shipped under data/.
    pub fn defaults() -> Self {
        let reward = |id: &str, name: &str, cost: f64, description: &str| RewardConfig {
            reward_id:   id.into(),
            name:        name.into(),
            cost,
            description: description.into(),
        };

        Self {
            rfm: RfmConfig {
                recency_days_per_point: 3.65,
                frequency_saturation:   50.0,
                monetary_saturation:    50_000.0,
                recency_weight:         0.30,
                frequency_weight:       0.35,
                monetary_weight:        0.35,
            },
            churn: ChurnConfig {
                recency_horizon_days:      180.0,
                frequency_pivot:           3.0,
                engagement_half_life_days: 90.0,
                engagement_saturation:     3.0,
                recency_weight:            0.35,
                frequency_weight:          0.25,
                engagement_weight:         0.25,
                rfm_weight:                0.15,
                thresholds: ChurnThresholds {
                    medium_risk: 0.4,
                    high_risk:   0.7,
                },
            },
            segmentation: SegmentationConfig {
                champion_rfm:                 75.0,
                loyal_rfm:                    50.0,
                potential_rfm:                30.0,
                champion_max_churn:           0.3,
                loyal_max_churn:              0.4,
                potential_max_churn:          0.5,
                new_customer_purchase_limit:  3,
                new_customer_max_tenure_days: 90,
            },
            rewards: RewardPolicyConfig {
                max_retention_lift: 0.30,
                max_cost_share:     0.10,
                catalog: vec![
                    reward("premium_discount", "20% Premium Discount", 500.0, "20% off next purchase"),
                    reward("standard_discount", "10% Standard Discount", 200.0, "10% off next purchase"),
                    reward("free_shipping", "Free Shipping Voucher", 150.0, "Free shipping on next order"),
                    reward("gift_voucher", "PKR 500 Gift Voucher", 500.0, "PKR 500 gift card"),
                    reward("loyalty_points", "1000 Loyalty Points", 100.0, "1000 bonus points"),
                    reward("early_access", "Early Access to Sales", 50.0, "24-hour early access"),
                    reward("birthday_special", "Birthday Special Offer", 300.0, "Special birthday gift"),
                    reward("bundle_offer", "Bundle Deal", 250.0, "Buy 2 Get 1 Free"),
                    reward("vip_upgrade", "VIP Tier Upgrade", 1000.0, "Upgrade to next tier"),
                    reward("cashback", "15% Cashback", 350.0, "15% cashback on purchase"),
                ],
            },
        }
    }

    /// Startup checks. Scoring code assumes these hold and never re-checks per call.
    pub fn validate(&self) -> LoyaltyResult<()> {
        let r = &self.rfm;
        check_weights("rfm", &[r.recency_weight, r.frequency_weight, r.monetary_weight])?;
        check_positive("rfm.recency_days_per_point", r.recency_days_per_point)?;
        check_positive("rfm.frequency_saturation", r.frequency_saturation)?;
        check_positive("rfm.monetary_saturation", r.monetary_saturation)?;

        let c = &self.churn;
        check_weights(
            "churn",
            &[c.recency_weight, c.frequency_weight, c.engagement_weight, c.rfm_weight],
        )?;
        check_positive("churn.recency_horizon_days", c.recency_horizon_days)?;
        check_positive("churn.frequency_pivot", c.frequency_pivot)?;
        check_positive("churn.engagement_half_life_days", c.engagement_half_life_days)?;
        check_positive("churn.engagement_saturation", c.engagement_saturation)?;
        let t = &c.thresholds;
        if !(0.0 < t.medium_risk && t.medium_risk < t.high_risk && t.high_risk <= 1.0) {
            return Err(LoyaltyError::Config(format!(
                "churn thresholds must satisfy 0 < medium ({}) < high ({}) <= 1",
                t.medium_risk, t.high_risk
            )));
        }

        let s = &self.segmentation;
        if !(0.0 < s.potential_rfm && s.potential_rfm < s.loyal_rfm && s.loyal_rfm < s.champion_rfm
            && s.champion_rfm <= 100.0)
        {
            return Err(LoyaltyError::Config(format!(
                "segment RFM thresholds must satisfy 0 < potential ({}) < loyal ({}) < champion ({}) <= 100",
                s.potential_rfm, s.loyal_rfm, s.champion_rfm
            )));
        }
        for (name, v) in [
            ("champion_max_churn", s.champion_max_churn),
            ("loyal_max_churn", s.loyal_max_churn),
            ("potential_max_churn", s.potential_max_churn),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(LoyaltyError::Config(format!(
                    "segmentation.{name} must lie in [0, 1], got {v}"
                )));
            }
        }

        let p = &self.rewards;
        if !(p.max_retention_lift > 0.0 && p.max_retention_lift <= 1.0) {
            return Err(LoyaltyError::Config(format!(
                "rewards.max_retention_lift must lie in (0, 1], got {}",
                p.max_retention_lift
            )));
        }
        check_positive("rewards.max_cost_share", p.max_cost_share)?;
        let mut seen = std::collections::HashSet::new();
        for reward in &p.catalog {
            if !seen.insert(reward.reward_id.as_str()) {
                return Err(LoyaltyError::Config(format!(
                    "duplicate reward id '{}' in catalog",
                    reward.reward_id
                )));
            }
            if !reward.cost.is_finite() || reward.cost < 0.0 {
                return Err(LoyaltyError::Config(format!(
                    "reward '{}' has invalid cost {}",
                    reward.reward_id, reward.cost
                )));
            }
        }

        Ok(())
    }
}

fn check_weights(group: &str, weights: &[f64]) -> LoyaltyResult<()> {
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(LoyaltyError::Config(format!(
            "{group} weights must be finite and non-negative: {weights:?}"
        )));
    }
    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(LoyaltyError::Config(format!(
            "{group} weights must sum to 1.0, got {sum}"
        )));
    }
    Ok(())
}

fn check_positive(name: &str, value: f64) -> LoyaltyResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(LoyaltyError::Config(format!("{name} must be positive, got {value}")))
    }
}
