use std::collections::{BTreeSet, HashMap};

use tracing::trace;

use crate::domain::FVError;
use crate::store::RowStore;

/// Value counts for one column, together with the total number of
/// records that passed the non-empty and filter checks. Keys are trimmed
/// and never empty; counts are positive.
#[derive(Debug, Default)]
pub struct Frequency {
    pub counts: HashMap<String, usize>,
    pub total: usize,
}

/// Two-dimensional count matrix between the values of two columns.
/// `unique_a` and `unique_b` are sorted lexicographically and every
/// (a, b) pair is present in `cells`, zero-count pairs included.
#[derive(Debug)]
pub struct CrossTab {
    pub cells: HashMap<String, HashMap<String, usize>>,
    pub unique_a: Vec<String>,
    pub unique_b: Vec<String>,
    pub total_relations: usize,
}

/// Counts the occurrences of each value of `column`, skipping blank
/// values and, when `filter` is non-empty, values that do not contain it
/// case-insensitively. An unknown column or an empty store yields an
/// empty result; absence of data is not an error.
pub fn aggregate(store: &RowStore, column: &str, filter: &str) -> Frequency {
    let mut frequency = Frequency::default();
    let needle = filter.to_lowercase();

    for record in store.records() {
        let Some(value) = record.get(column) else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        if !needle.is_empty() && !value.to_lowercase().contains(&needle) {
            continue;
        }
        *frequency.counts.entry(value.to_string()).or_insert(0) += 1;
        frequency.total += 1;
    }

    trace!(
        "Aggregated column \"{}\" with filter \"{}\": {} values, {} records",
        column,
        filter,
        frequency.counts.len(),
        frequency.total
    );
    frequency
}

/// Orders the frequency entries by count descending. Equal counts break
/// lexicographically by value, keeping the ranking deterministic.
/// Returns all entries; any display limit is applied by the presentation
/// layer so the totals keep reflecting the full table.
pub fn rank(frequency: &Frequency) -> Vec<(String, usize)> {
    let mut entries: Vec<(String, usize)> = frequency
        .counts
        .iter()
        .map(|(value, count)| (value.clone(), *count))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries
}

/// Builds the count matrix between two distinct known columns. Rows
/// count only where both values are non-empty after trimming. Selecting
/// the same or an unknown column is rejected, distinct from the valid
/// empty result an empty store produces.
pub fn cross_tab(store: &RowStore, column_a: &str, column_b: &str) -> Result<CrossTab, FVError> {
    if column_a == column_b {
        return Err(FVError::InvalidSelection(
            "Select two different columns to relate".into(),
        ));
    }
    for column in [column_a, column_b] {
        if !store.headers().iter().any(|h| h == column) {
            return Err(FVError::InvalidSelection(format!(
                "Unknown column \"{column}\""
            )));
        }
    }

    let mut unique_a = BTreeSet::new();
    let mut unique_b = BTreeSet::new();
    for record in store.records() {
        if let Some(value) = record.get(column_a)
            && !value.trim().is_empty()
        {
            unique_a.insert(value.trim().to_string());
        }
        if let Some(value) = record.get(column_b)
            && !value.trim().is_empty()
        {
            unique_b.insert(value.trim().to_string());
        }
    }

    let mut cells: HashMap<String, HashMap<String, usize>> = unique_a
        .iter()
        .map(|a| (a.clone(), unique_b.iter().map(|b| (b.clone(), 0)).collect()))
        .collect();

    let mut total_relations = 0;
    for record in store.records() {
        let (Some(a), Some(b)) = (record.get(column_a), record.get(column_b)) else {
            continue;
        };
        let (a, b) = (a.trim(), b.trim());
        if a.is_empty() || b.is_empty() {
            continue;
        }
        if let Some(row) = cells.get_mut(a)
            && let Some(count) = row.get_mut(b)
        {
            *count += 1;
            total_relations += 1;
        }
    }

    trace!(
        "Cross tabulated \"{}\" x \"{}\": {} x {} values, {} relations",
        column_a,
        column_b,
        unique_a.len(),
        unique_b.len(),
        total_relations
    );
    Ok(CrossTab {
        cells,
        unique_a: unique_a.into_iter().collect(),
        unique_b: unique_b.into_iter().collect(),
        total_relations,
    })
}
