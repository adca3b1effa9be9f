//! Seeded synthetic dataset for demo runs.
//!
//! RULE: Nothing here may call a platform RNG. Customers and transactions
//! each draw from their own Pcg64Mcg stream derived from the run seed, so
//! changing how transactions are generated never reshuffles the customers.
//!
//! Population mix: Premium 10%, Regular 30%, Occasional 40%, New 20%.

use chrono::{Duration, NaiveDate, NaiveTime};
use loyalty_core::record::{Customer, Transaction, TransactionStatus};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

const CATEGORIES: [&str; 8] = [
    "Electronics",
    "Fashion",
    "Home & Kitchen",
    "Beauty",
    "Sports",
    "Books",
    "Grocery",
    "Toys",
];

/// Upper bound on generated purchases per customer. Keeps demo files small.
const MAX_TXNS_PER_CUSTOMER: u32 = 60;

/// Stable stream slots. Append only.
#[derive(Clone, Copy)]
#[repr(u64)]
enum Stream {
    Customers = 0,
    Transactions = 1,
}

fn stream(seed: u64, slot: Stream) -> Pcg64Mcg {
    Pcg64Mcg::seed_from_u64(seed ^ (slot as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Profile {
    Premium,
    Regular,
    Occasional,
    New,
}

impl Profile {
    fn pick(rng: &mut Pcg64Mcg) -> Self {
        match rng.gen::<f64>() {
            r if r < 0.10 => Profile::Premium,
            r if r < 0.40 => Profile::Regular,
            r if r < 0.80 => Profile::Occasional,
            _ => Profile::New,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Profile::Premium    => "Premium",
            Profile::Regular    => "Regular",
            Profile::Occasional => "Occasional",
            Profile::New        => "New",
        }
    }

    fn tier(self, rng: &mut Pcg64Mcg) -> &'static str {
        let coin = rng.gen_bool(0.5);
        match (self, coin) {
            (Profile::Premium, true)     => "Gold",
            (Profile::Premium, false)    => "Silver",
            (Profile::Regular, true)     => "Silver",
            (Profile::Regular, false)    => "Bronze",
            (Profile::Occasional, true)  => "Bronze",
            (Profile::Occasional, false) => "Standard",
            (Profile::New, _)            => "Standard",
        }
    }

    fn tenure_days(self, rng: &mut Pcg64Mcg) -> i64 {
        match self {
            Profile::New        => rng.gen_range(1..=90),
            Profile::Occasional => rng.gen_range(91..=365),
            _                   => rng.gen_range(366..=730),
        }
    }

    fn purchases(self, rng: &mut Pcg64Mcg) -> u32 {
        match self {
            Profile::Premium    => rng.gen_range(50..=150),
            Profile::Regular    => rng.gen_range(20..=60),
            Profile::Occasional => rng.gen_range(5..=25),
            Profile::New        => rng.gen_range(1..=5),
        }
    }

    fn order_value(self, rng: &mut Pcg64Mcg) -> f64 {
        match self {
            Profile::Premium    => rng.gen_range(300.0..2_500.0),
            Profile::Regular    => rng.gen_range(150.0..1_000.0),
            Profile::Occasional => rng.gen_range(50.0..600.0),
            Profile::New        => rng.gen_range(20.0..400.0),
        }
    }

    fn days_since_last_purchase(self, rng: &mut Pcg64Mcg) -> i64 {
        match self {
            Profile::Premium | Profile::Regular => rng.gen_range(1..=180),
            _                                   => rng.gen_range(30..=365),
        }
    }

    /// Average gap between purchases.
    fn mean_gap_days(self) -> f64 {
        match self {
            Profile::Premium    => 10.0,
            Profile::Regular    => 20.0,
            Profile::Occasional => 45.0,
            Profile::New        => 15.0,
        }
    }

    fn discount_rate(self, rng: &mut Pcg64Mcg) -> f64 {
        let (p, lo, hi) = match self {
            Profile::Premium => (0.75, 0.10, 0.30),
            Profile::Regular => (0.50, 0.05, 0.20),
            _                => (0.25, 0.05, 0.15),
        };
        if rng.gen_bool(p) {
            rng.gen_range(lo..hi)
        } else {
            0.0
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Generate `count` customers (CUST000001..) with purchase histories ending
/// on or before `as_of`.
pub fn generate(count: usize, seed: u64, as_of: NaiveDate) -> (Vec<Customer>, Vec<Transaction>) {
    let mut crng = stream(seed, Stream::Customers);
    let mut trng = stream(seed, Stream::Transactions);

    let mut customers = Vec::with_capacity(count);
    let mut transactions = Vec::new();

    for i in 1..=count {
        let profile = Profile::pick(&mut crng);
        let customer_id = format!("CUST{i:06}");
        let tenure = profile.tenure_days(&mut crng);
        let total_purchases = profile.purchases(&mut crng);
        let avg_order_value = profile.order_value(&mut crng);

        customers.push(Customer {
            customer_id:    customer_id.clone(),
            segment_label:  profile.label().into(),
            loyalty_tier:   profile.tier(&mut crng).into(),
            join_date:      as_of - Duration::days(tenure),
            lifetime_value: round2(total_purchases as f64 * avg_order_value),
        });

        // Walk backwards from the most recent purchase with exponential gaps.
        let mut days_ago = profile.days_since_last_purchase(&mut trng).min(tenure);
        for _ in 0..total_purchases.min(MAX_TXNS_PER_CUSTOMER) {
            if days_ago > tenure {
                break;
            }
            let amount = profile.order_value(&mut trng);
            let final_amount = round2(amount * (1.0 - profile.discount_rate(&mut trng)));
            let status = if trng.gen_bool(0.99) {
                TransactionStatus::Completed
            } else {
                TransactionStatus::Failed
            };
            let seconds = trng.gen_range(8 * 3600..22 * 3600);

            transactions.push(Transaction {
                transaction_id:   Some(format!("TXN{:08}", transactions.len() + 1)),
                customer_id:      customer_id.clone(),
                timestamp:        (as_of - Duration::days(days_ago)).and_time(NaiveTime::MIN)
                    + Duration::seconds(seconds),
                amount:           final_amount,
                status,
                product_category: CATEGORIES[trng.gen_range(0..CATEGORIES.len())].into(),
            });

            let u: f64 = trng.gen_range(f64::EPSILON..1.0);
            days_ago += (-u.ln() * profile.mean_gap_days()).ceil() as i64;
        }
    }

    log::info!(
        "demo: generated {} customers, {} transactions (seed {seed})",
        customers.len(),
        transactions.len(),
    );
    (customers, transactions)
}
