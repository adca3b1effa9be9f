use crate::{
    error::{LoyaltyError, LoyaltyResult},
    record::{Customer, Transaction},
    types::CustomerId,
    validation::validate_customer_id,
};
use std::collections::HashMap;

/// O(1) lookup structure over one loaded dataset. Never mutated after build.
#[derive(Debug, Default)]
pub struct CustomerIndex {
    customers:         HashMap<CustomerId, Customer>,
    transactions:      HashMap<CustomerId, Vec<Transaction>>,
    load_order:        Vec<CustomerId>,
    transaction_count: usize,
    orphans_dropped:   usize,
}

/// One customer together with their completed transactions, oldest first.
#[derive(Debug, Clone)]
pub struct CustomerHistory<'a> {
    pub customer:  &'a Customer,
    pub completed: Vec<&'a Transaction>,
}

impl CustomerIndex {
    /// Build both mappings in a single pass over each input.
    ///
    /// Rejects records that scoring cannot trust (ids a lookup could never
    /// resolve, duplicate ids, negative or non-finite money). Transactions whose customer is not in
    /// the customer set are dropped: no lookup could ever reach them.
    pub fn build(customers: Vec<Customer>, transactions: Vec<Transaction>) -> LoyaltyResult<Self> {
        let mut index = CustomerIndex {
            customers:         HashMap::with_capacity(customers.len()),
            transactions:      HashMap::with_capacity(customers.len()),
            load_order:        Vec::with_capacity(customers.len()),
            transaction_count: 0,
            orphans_dropped:   0,
        };

        for (i, customer) in customers.into_iter().enumerate() {
            check_id("customer", i, &customer.customer_id)?;
            if !customer.lifetime_value.is_finite() || customer.lifetime_value < 0.0 {
                return Err(malformed(
                    "customer",
                    i,
                    format!("lifetime_value must be a non-negative number, got {}", customer.lifetime_value),
                ));
            }
            if index.customers.contains_key(&customer.customer_id) {
                return Err(malformed(
                    "customer",
                    i,
                    format!("duplicate customer_id '{}'", customer.customer_id),
                ));
            }
            index.load_order.push(customer.customer_id.clone());
            index.transactions.insert(customer.customer_id.clone(), Vec::new());
            index.customers.insert(customer.customer_id.clone(), customer);
        }

        for (i, txn) in transactions.into_iter().enumerate() {
            check_id("transaction", i, &txn.customer_id)?;
            if !txn.amount.is_finite() || txn.amount < 0.0 {
                return Err(malformed(
                    "transaction",
                    i,
                    format!("amount must be a non-negative number, got {}", txn.amount),
                ));
            }
            match index.transactions.get_mut(&txn.customer_id) {
                Some(list) => {
                    list.push(txn);
                    index.transaction_count += 1;
                }
                None => index.orphans_dropped += 1,
            }
        }

        for list in index.transactions.values_mut() {
            list.sort_by_key(|t| t.timestamp);
        }

        if index.orphans_dropped > 0 {
            log::warn!(
                "index: dropped {} transactions referencing unknown customers",
                index.orphans_dropped
            );
        }

        Ok(index)
    }

    pub fn get_customer(&self, customer_id: &str) -> Option<&Customer> {
        self.customers.get(customer_id)
    }

    /// All transactions for a customer, oldest first. Empty when unknown.
    pub fn get_transactions(&self, customer_id: &str) -> &[Transaction] {
        self.transactions
            .get(customer_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Resolve a customer and their completed history, or fail.
    pub fn history(&self, customer_id: &str) -> LoyaltyResult<CustomerHistory<'_>> {
        let customer = self.get_customer(customer_id).ok_or_else(|| {
            log::warn!("index: customer not found: {customer_id}");
            LoyaltyError::not_found(customer_id)
        })?;
        let completed = self
            .get_transactions(customer_id)
            .iter()
            .filter(|t| t.is_completed())
            .collect();
        Ok(CustomerHistory { customer, completed })
    }

    /// Customers in the order they were loaded.
    pub fn customers(&self) -> impl Iterator<Item = &Customer> {
        self.load_order.iter().filter_map(|id| self.customers.get(id))
    }

    pub fn customer_count(&self) -> usize {
        self.customers.len()
    }

    pub fn transaction_count(&self) -> usize {
        self.transaction_count
    }

    pub fn orphans_dropped(&self) -> usize {
        self.orphans_dropped
    }
}

/// An indexed id must be exactly what `validate_customer_id` hands to a lookup.
fn check_id(record: &'static str, index: usize, id: &str) -> LoyaltyResult<()> {
    match validate_customer_id(id) {
        Ok(valid) if valid == id => Ok(()),
        Ok(_) => Err(malformed(
            record,
            index,
            format!("customer_id '{id}' has leading or trailing whitespace"),
        )),
        Err(e) => Err(malformed(record, index, e.to_string())),
    }
}

fn malformed(record: &'static str, index: usize, reason: impl Into<String>) -> LoyaltyError {
    LoyaltyError::DataFormat {
        record,
        index,
        reason: reason.into(),
    }
}
