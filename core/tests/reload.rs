use chrono::{Duration, NaiveDate};
use loyalty_core::{
    record::{Customer, Transaction, TransactionStatus},
    LoyaltyEngine, LoyaltyError,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
}

fn customer(id: &str, ltv: f64) -> Customer {
    Customer {
        customer_id:    id.into(),
        segment_label:  "Regular".into(),
        loyalty_tier:   "Silver".into(),
        join_date:      as_of() - Duration::days(400),
        lifetime_value: ltv,
    }
}

fn purchases(id: &str, count: i64, amount: f64) -> Vec<Transaction> {
    (0..count)
        .map(|k| Transaction {
            transaction_id:   None,
            customer_id:      id.into(),
            timestamp:        (as_of() - Duration::days(5 + k * 7)).and_hms_opt(11, 0, 0).unwrap(),
            amount,
            status:           TransactionStatus::Completed,
            product_category: "Home".into(),
        })
        .collect()
}

/// Dataset A: C1 worth 100 with 2 purchases.
fn dataset_a() -> (Vec<Customer>, Vec<Transaction>) {
    (vec![customer("C1", 100.0)], purchases("C1", 2, 50.0))
}

/// Dataset B: C1 worth 999 with 5 purchases, plus C2.
fn dataset_b() -> (Vec<Customer>, Vec<Transaction>) {
    let mut txns = purchases("C1", 5, 199.8);
    txns.extend(purchases("C2", 1, 10.0));
    (vec![customer("C1", 999.0), customer("C2", 10.0)], txns)
}

fn make_engine() -> LoyaltyEngine {
    let _ = env_logger::builder().is_test(true).try_init();
    let engine = LoyaltyEngine::with_defaults(as_of()).unwrap();
    let (c, t) = dataset_a();
    engine.load(c, t).unwrap();
    engine
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn reload_replaces_instead_of_appending() {
    let engine = make_engine();
    let (c, t) = dataset_a();
    engine.load(c, t).unwrap();

    let index = engine.snapshot();
    assert_eq!(index.customer_count(), 1);
    assert_eq!(index.transaction_count(), 2);
    assert_eq!(engine.rfm_score("C1").unwrap().completed_count, 2);
}

#[test]
fn snapshot_taken_before_reload_is_unchanged() {
    let engine = make_engine();
    let before = engine.snapshot();

    let (c, t) = dataset_b();
    engine.load(c, t).unwrap();

    assert_eq!(before.get_customer("C1").unwrap().lifetime_value, 100.0);
    assert!(before.get_customer("C2").is_none());
    assert!(matches!(
        engine.analyze_in(&before, "C2"),
        Err(LoyaltyError::CustomerNotFound { .. })
    ));

    assert_eq!(engine.analyze("C1").unwrap().profile.lifetime_value, 999.0);
    assert!(engine.analyze("C2").is_ok());
}

#[test]
fn failed_reload_keeps_serving_previous_dataset() {
    let engine = make_engine();
    let (mut c, t) = dataset_b();
    c[1].lifetime_value = -5.0;

    let err = engine.load(c, t).unwrap_err();
    assert!(matches!(err, LoyaltyError::DataFormat { record: "customer", index: 1, .. }), "{err:?}");

    assert_eq!(engine.analyze("C1").unwrap().profile.lifetime_value, 100.0);
    assert!(engine.analyze("C2").is_err());
}

#[test]
fn readers_never_see_a_mixed_dataset_during_reloads() {
    let engine = make_engine();

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..500 {
                    let a = engine.analyze("C1").unwrap();
                    let consistent = (a.profile.lifetime_value == 100.0 && a.rfm.completed_count == 2)
                        || (a.profile.lifetime_value == 999.0 && a.rfm.completed_count == 5);
                    assert!(
                        consistent,
                        "ltv {} with {} purchases",
                        a.profile.lifetime_value,
                        a.rfm.completed_count,
                    );
                }
            });
        }

        s.spawn(|| {
            for round in 0..100 {
                let (c, t) = if round % 2 == 0 { dataset_b() } else { dataset_a() };
                engine.load(c, t).unwrap();
            }
        });
    });
}
