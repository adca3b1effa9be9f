//! Record store: owns the loaded dataset behind an atomically swappable index.
//!
//! RULE: A loaded index is never mutated. A reload builds a complete new
//! index first and only then replaces the shared reference, so a reader
//! holding a snapshot never observes a partially built index.

mod index;
mod ingest;

pub use index::{CustomerHistory, CustomerIndex};
pub use ingest::{parse_customers, parse_transactions};

use crate::{
    error::LoyaltyResult,
    record::{Customer, Transaction},
};
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Default)]
pub struct RecordStore {
    current: RwLock<Arc<CustomerIndex>>,
}

impl RecordStore {
    /// An empty store. Every lookup fails until the first load.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fresh index from the given records and swap it in.
    /// Repeated loads replace the previous dataset; they never append.
    pub fn load(
        &self,
        customers: Vec<Customer>,
        transactions: Vec<Transaction>,
    ) -> LoyaltyResult<Arc<CustomerIndex>> {
        let index = Arc::new(CustomerIndex::build(customers, transactions)?);
        log::info!(
            "store: loaded {} customers, {} transactions",
            index.customer_count(),
            index.transaction_count(),
        );
        self.replace(Arc::clone(&index));
        Ok(index)
    }

    /// Parse raw JSON arrays and load them.
    pub fn load_json(
        &self,
        customers_json: &str,
        transactions_json: &str,
    ) -> LoyaltyResult<Arc<CustomerIndex>> {
        let customers = parse_customers(customers_json)?;
        let transactions = parse_transactions(transactions_json)?;
        self.load(customers, transactions)
    }

    fn replace(&self, index: Arc<CustomerIndex>) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = index;
    }

    /// The index as of now. Stays valid and unchanged across later reloads.
    pub fn snapshot(&self) -> Arc<CustomerIndex> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }
}
