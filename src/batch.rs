use std::hash::Hash;

use log::debug;
use rayon::prelude::*;

use crate::util::{HashMap, IndexSet};
use crate::{ValueNumber, VnTable};

/// How [`congruence_classes`] executes a batch of queries.
///
/// Every strategy produces the same classes for the same table and queries;
/// they differ only in how work is ordered and spread across threads. All of
/// them are read-only over the table, so any number of batches may run
/// concurrently — but not concurrently with table mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStrategy {
    /// One lookup and one class walk per query, in input order. The
    /// correctness baseline; does redundant work when queries repeat.
    Sequential,
    /// Collects the distinct value numbers first, walks each class exactly
    /// once, then fans the classes back out to the queries. Wins when the
    /// query sequence repeats heavily.
    Deduplicated,
    /// Sequential lookups, but each class's members are consumed on the
    /// `rayon` pool. Only pays off when per-member work dominates the
    /// lookup.
    ParallelMembers,
    /// Deduplicates, then walks the distinct classes in parallel. The
    /// highest-throughput option when both repetition and class sizes are
    /// large, since each worker runs an independent read-only range query.
    ParallelUniqueKeys,
    /// Parallelizes straight over the query sequence, duplicates and all.
    /// Repeats redundant lookups across workers but skips the deduplication
    /// pass, which can win when queries rarely repeat.
    ParallelQueries,
}

impl BatchStrategy {
    /// Every strategy, so a test or benchmark can sweep them uniformly.
    pub const ALL: [BatchStrategy; 5] = [
        BatchStrategy::Sequential,
        BatchStrategy::Deduplicated,
        BatchStrategy::ParallelMembers,
        BatchStrategy::ParallelUniqueKeys,
        BatchStrategy::ParallelQueries,
    ];
}

/// Computes the congruence class of every query entity against `table`.
///
/// The result is parallel to `queries`: element `i` holds the members of the
/// class query `i` belongs to, or an empty vector if the table doesn't know
/// that entity. Member order within a class is unspecified and may differ
/// between strategies.
pub fn congruence_classes<T>(
    table: &VnTable<T>,
    queries: &[T],
    strategy: BatchStrategy,
) -> Vec<Vec<T>>
where
    T: Copy + Eq + Hash + Send + Sync,
{
    match strategy {
        BatchStrategy::Sequential => queries.iter().map(|&q| class_of(table, q)).collect(),
        BatchStrategy::Deduplicated => {
            let keys = distinct_keys(table, queries);
            debug!(
                "Batch of {} queries over {} distinct value numbers",
                queries.len(),
                keys.len()
            );
            let index: HashMap<ValueNumber, Vec<T>> = keys
                .into_iter()
                .map(|vn| (vn, table.congruence(vn).collect()))
                .collect();
            fan_out(table, queries, &index)
        }
        BatchStrategy::ParallelMembers => queries
            .iter()
            .map(|&q| match table.value(q) {
                Some(vn) => {
                    let members: Vec<T> = table.congruence(vn).collect();
                    members.par_iter().copied().collect()
                }
                None => Vec::new(),
            })
            .collect(),
        BatchStrategy::ParallelUniqueKeys => {
            let keys: Vec<ValueNumber> = distinct_keys(table, queries).into_iter().collect();
            debug!(
                "Batch of {} queries over {} distinct value numbers",
                queries.len(),
                keys.len()
            );
            let index: HashMap<ValueNumber, Vec<T>> = keys
                .par_iter()
                .map(|&vn| (vn, table.congruence(vn).collect::<Vec<T>>()))
                .collect::<Vec<_>>()
                .into_iter()
                .collect();
            fan_out(table, queries, &index)
        }
        BatchStrategy::ParallelQueries => {
            queries.par_iter().map(|&q| class_of(table, q)).collect()
        }
    }
}

fn class_of<T: Copy + Eq + Hash>(table: &VnTable<T>, query: T) -> Vec<T> {
    match table.value(query) {
        Some(vn) => table.congruence(vn).collect(),
        None => Vec::new(),
    }
}

fn distinct_keys<T: Copy + Eq + Hash>(table: &VnTable<T>, queries: &[T]) -> IndexSet<ValueNumber> {
    queries.iter().filter_map(|&q| table.value(q)).collect()
}

fn fan_out<T: Copy + Eq + Hash>(
    table: &VnTable<T>,
    queries: &[T],
    index: &HashMap<ValueNumber, Vec<T>>,
) -> Vec<Vec<T>> {
    queries
        .iter()
        .map(|&q| {
            table
                .value(q)
                .and_then(|vn| index.get(&vn))
                .cloned()
                .unwrap_or_default()
        })
        .collect()
}
