use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

use super::transaction::{new_id, Transaction};

/// Newest-first collection of spending transactions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ledger from an arbitrary set of records, re-keying duplicate ids.
    pub fn from_transactions(transactions: Vec<Transaction>) -> Self {
        let mut ledger = Self::new();
        ledger.replace_all(transactions);
        ledger
    }

    /// Validates input and prepends a new transaction stamped with `timestamp`.
    pub fn add(
        &mut self,
        description: &str,
        amount: f64,
        timestamp: DateTime<FixedOffset>,
    ) -> Result<&Transaction, ValidationError> {
        let description = validate_entry(description, amount)?;
        let mut transaction = Transaction::new(description, amount, timestamp);
        while self.contains(&transaction.id) {
            transaction.id = new_id();
        }
        self.transactions.insert(0, transaction);
        Ok(&self.transactions[0])
    }

    /// Removes the transaction with `id`. Unknown ids are ignored.
    pub fn remove(&mut self, id: &str) -> Option<Transaction> {
        let index = self.transactions.iter().position(|txn| txn.id == id)?;
        Some(self.transactions.remove(index))
    }

    /// Swaps in a whole new set of transactions.
    pub fn replace_all(&mut self, transactions: Vec<Transaction>) {
        let mut seen = HashSet::with_capacity(transactions.len());
        let mut accepted = Vec::with_capacity(transactions.len());
        for mut transaction in transactions {
            while !seen.insert(transaction.id.clone()) {
                transaction.id = new_id();
            }
            accepted.push(transaction);
        }
        self.transactions = accepted;
    }

    /// Transactions at or after `since`, in ledger order.
    pub fn filter_since<Tz: TimeZone>(&self, since: &DateTime<Tz>) -> Vec<&Transaction> {
        let since = since.with_timezone(&Utc);
        self.transactions
            .iter()
            .filter(|txn| txn.occurred_at() >= since)
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|txn| txn.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transaction> {
        self.transactions.iter()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a Transaction;
    type IntoIter = std::slice::Iter<'a, Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Checks user input for a new transaction and returns the trimmed description.
pub fn validate_entry(description: &str, amount: f64) -> Result<String, ValidationError> {
    let description = description.trim();
    if description.is_empty() {
        return Err(ValidationError::EmptyDescription);
    }
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ValidationError::InvalidAmount(amount));
    }
    Ok(description.to_string())
}
