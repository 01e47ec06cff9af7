//! Batch processing with account-group partitioning
//!
//! This module provides the `BatchProcessor` struct, which runs a batch of ledger
//! requests concurrently while keeping requests that share an account in their
//! original order.
//!
//! # Design
//!
//! Requests are partitioned into *account groups*: the connected components of
//! the graph whose nodes are account ids and whose edges are transfers. Two
//! requests land in the same group iff they are linked through a chain of shared
//! accounts. Groups never share an account, so running them in parallel cannot
//! reorder two operations on the same balance.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     └── Arc<LedgerEngine>  (shared operation executor)
//! ```
//!
//! Each group runs on `tokio::task::spawn_blocking`, because engine operations
//! block on account mutexes.

use std::collections::HashMap;
use std::sync::Arc;

use super::dispatch::dispatch;
use super::engine::LedgerEngine;
use crate::types::{AccountId, LedgerRequest, Outcome};
use tracing::error;

/// Result of processing a single request
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// Position of the request within its batch
    pub sequence: usize,

    /// The request that was processed
    pub request: LedgerRequest,

    pub outcome: Outcome,
}

/// Batch processor with account-group partitioning
///
/// Cloning is cheap; every clone shares the same engine.
#[derive(Clone)]
pub struct BatchProcessor {
    engine: Arc<LedgerEngine>,
}

impl BatchProcessor {
    /// Create a new BatchProcessor
    ///
    /// # Arguments
    ///
    /// * `engine` - Arc-wrapped LedgerEngine shared by every group task
    pub fn new(engine: Arc<LedgerEngine>) -> Self {
        Self { engine }
    }

    /// Partition a batch into account groups
    ///
    /// # Arguments
    ///
    /// * `batch` - Requests in input order
    ///
    /// # Returns
    ///
    /// Groups of `(sequence, request)` pairs, where `sequence` is the request's
    /// position in `batch`.
    ///
    /// # Guarantees
    ///
    /// - Each request appears in exactly one group
    /// - Requests sharing an account, directly or through transfers, share a group
    /// - Requests keep their relative order within a group
    /// - Groups are ordered by the position of their first request
    pub fn partition_by_account_group(
        &self,
        batch: Vec<LedgerRequest>,
    ) -> Vec<Vec<(usize, LedgerRequest)>> {
        let mut parents: HashMap<AccountId, AccountId> = HashMap::new();

        for request in &batch {
            let accounts = request.operation.accounts();
            for &account in &accounts {
                parents.entry(account).or_insert(account);
            }
            if let Some((&first, rest)) = accounts.split_first() {
                for &other in rest {
                    union(&mut parents, first, other);
                }
            }
        }

        let mut group_of_root: HashMap<AccountId, usize> = HashMap::new();
        let mut groups: Vec<Vec<(usize, LedgerRequest)>> = Vec::new();

        for (sequence, request) in batch.into_iter().enumerate() {
            let root = find(&mut parents, request.operation.source_account());
            let index = *group_of_root.entry(root).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[index].push((sequence, request));
        }

        groups
    }

    /// Process one account group sequentially, on the calling thread
    ///
    /// Every request is processed even if earlier ones fail. Results keep the
    /// group's order.
    pub fn process_group(&self, group: Vec<(usize, LedgerRequest)>) -> Vec<ProcessingResult> {
        group
            .into_iter()
            .map(|(sequence, request)| {
                let outcome = dispatch(&self.engine, &request);
                ProcessingResult {
                    sequence,
                    request,
                    outcome,
                }
            })
            .collect()
    }

    /// Process a batch with account-group partitioning
    ///
    /// This method:
    /// 1. Partitions the batch into account groups
    /// 2. Runs each group on a blocking worker thread
    /// 3. Waits for every group to finish
    /// 4. Returns all results sorted back into batch order
    ///
    /// A group whose task panics is logged and its results are missing from the
    /// returned vector.
    pub async fn process_batch(&self, batch: Vec<LedgerRequest>) -> Vec<ProcessingResult> {
        let groups = self.partition_by_account_group(batch);

        let mut tasks = Vec::with_capacity(groups.len());
        for group in groups {
            let processor = self.clone();
            tasks.push(tokio::task::spawn_blocking(move || {
                processor.process_group(group)
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(group_results) => results.extend(group_results),
                Err(e) => error!(error = %e, "account group task failed"),
            }
        }

        results.sort_by_key(|result| result.sequence);
        results
    }
}

fn find(parents: &mut HashMap<AccountId, AccountId>, account: AccountId) -> AccountId {
    let mut root = account;
    while let Some(&parent) = parents.get(&root) {
        if parent == root {
            break;
        }
        root = parent;
    }

    // Path compression
    let mut current = account;
    while current != root {
        let next = parents.get(&current).copied().unwrap_or(root);
        parents.insert(current, root);
        current = next;
    }

    root
}

fn union(parents: &mut HashMap<AccountId, AccountId>, a: AccountId, b: AccountId) {
    let root_a = find(parents, a);
    let root_b = find(parents, b);
    if root_a != root_b {
        parents.insert(root_b, root_a);
    }
}
