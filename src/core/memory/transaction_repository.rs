//! Thread-safe in-memory audit journal
//!
//! This module provides the `InMemoryTransactionRepository` struct, an append-only
//! journal of audit records with a per-account index for history queries.
//!
//! # Design
//!
//! Unlike account records, journal appends must be atomic across several records
//! (both halves of a transfer) and ids must follow append order. A single
//! `parking_lot::RwLock` around the journal gives both: appends take the write
//! lock once for the whole group, and history reads share the read lock.

use crate::core::traits::TransactionRepository;
use crate::types::{AccountId, HistoryQuery, NewTransaction, RepositoryError, Transaction};
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct Journal {
    /// Every record, in append order; a record's id is its position plus one
    records: Vec<Transaction>,

    /// Positions in `records` for each account
    by_account: HashMap<AccountId, Vec<usize>>,
}

/// Append-only journal backed by a `Vec`
#[derive(Debug, Default)]
pub struct InMemoryTransactionRepository {
    journal: RwLock<Journal>,
}

impl InMemoryTransactionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record in append order
    pub fn all(&self) -> Vec<Transaction> {
        self.journal.read().records.clone()
    }

    pub fn len(&self) -> usize {
        self.journal.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.journal.read().records.is_empty()
    }
}

impl TransactionRepository for InMemoryTransactionRepository {
    fn append_all(
        &self,
        records: Vec<NewTransaction>,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        let mut journal = self.journal.write();
        let mut appended = Vec::with_capacity(records.len());

        for record in records {
            let position = journal.records.len();
            let transaction = record.into_transaction(position as u64 + 1);
            journal
                .by_account
                .entry(transaction.account)
                .or_default()
                .push(position);
            journal.records.push(transaction.clone());
            appended.push(transaction);
        }

        Ok(appended)
    }

    fn query(
        &self,
        account: AccountId,
        query: &HistoryQuery,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        let journal = self.journal.read();

        let mut matched: Vec<Transaction> = journal
            .by_account
            .get(&account)
            .into_iter()
            .flatten()
            .filter_map(|&position| journal.records.get(position))
            .filter(|transaction| query.matches(transaction))
            .cloned()
            .collect();

        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));

        let page = matched.into_iter().skip(query.offset);
        Ok(match query.limit {
            Some(limit) => page.take(limit).collect(),
            None => page.collect(),
        })
    }
}
