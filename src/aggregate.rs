//! Value counts and two-way pivot tables over a set of records.

use crate::types::{Field, Key, Record};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeSet;

/// Count per distinct value, largest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCounts {
    pub field: Field,
    pub entries: Vec<(Key, usize)>,
}

impl ValueCounts {
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    pub fn max(&self) -> usize {
        self.entries.iter().map(|(_, n)| *n).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Share of the total per entry, in percent rounded to one decimal.
    pub fn percentages(&self) -> Vec<f64> {
        let total = self.total();
        self.entries
            .iter()
            .map(|(_, n)| percent(*n, total))
            .collect()
    }
}

pub fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = count as f64 / total as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}

/// Groups records by `field`. Ties keep the order in which values first appear.
pub fn count_by_category(records: &[&Record], field: Field) -> ValueCounts {
    let mut counts: IndexMap<Key, usize> = IndexMap::new();
    for record in records {
        *counts.entry(record.key(field)).or_insert(0) += 1;
    }

    let mut entries: Vec<(Key, usize)> = counts.into_iter().collect();
    // sort_by is stable
    entries.sort_by(|a, b| b.1.cmp(&a.1));

    ValueCounts { field, entries }
}

/// Record counts for every (row value, column value) pair.
///
/// Rows and columns are the values observed in the input, sorted ascending.
/// Every pair has a cell; combinations with no records hold zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PivotTable {
    pub row_field: Field,
    pub col_field: Field,
    pub value_field: Field,
    pub rows: Vec<Key>,
    pub columns: Vec<Key>,
    pub cells: Vec<Vec<usize>>,
}

impl PivotTable {
    pub fn get(&self, row: &Key, col: &Key) -> Option<usize> {
        let r = self.rows.binary_search(row).ok()?;
        let c = self.columns.binary_search(col).ok()?;
        Some(self.cells[r][c])
    }

    pub fn max(&self) -> usize {
        self.cells.iter().flatten().copied().max().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.cells.iter().flatten().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Builds a zero-filled pivot counting `value_field` per (`row_field`, `col_field`).
///
/// Loaded records never have a missing field, so the count of `value_field`
/// equals the number of matching records.
pub fn pivot(records: &[&Record], row_field: Field, col_field: Field, value_field: Field) -> PivotTable {
    let rows: Vec<Key> = records
        .iter()
        .map(|r| r.key(row_field))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let columns: Vec<Key> = records
        .iter()
        .map(|r| r.key(col_field))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut cells = vec![vec![0usize; columns.len()]; rows.len()];
    for record in records {
        // both keys were collected from these same records
        if let (Ok(r), Ok(c)) = (
            rows.binary_search(&record.key(row_field)),
            columns.binary_search(&record.key(col_field)),
        ) {
            cells[r][c] += 1;
        }
    }

    PivotTable {
        row_field,
        col_field,
        value_field,
        rows,
        columns,
        cells,
    }
}
