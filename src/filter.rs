//! Filters over borrowed record views. Each one is independent and pure.

use crate::types::Record;
use std::collections::HashSet;

pub const ALL_STATUSES: &str = "All";

/// Status drop-down selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Only(String),
}

impl StatusFilter {
    pub fn parse(value: &str) -> Self {
        if value == ALL_STATUSES {
            StatusFilter::All
        } else {
            StatusFilter::Only(value.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            StatusFilter::All => ALL_STATUSES,
            StatusFilter::Only(s) => s,
        }
    }
}

/// Widget selections for one render pass of the data overview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    pub status: StatusFilter,
    /// Inclusive (min, max). `None` when there is no data to bound a slider.
    pub zip_range: Option<(u32, u32)>,
    pub categories: HashSet<String>,
}

pub fn filter_by_status<'a>(records: &[&'a Record], status: &StatusFilter) -> Vec<&'a Record> {
    match status {
        StatusFilter::All => records.to_vec(),
        StatusFilter::Only(wanted) => records
            .iter()
            .copied()
            .filter(|r| &r.status == wanted)
            .collect(),
    }
}

/// Records with `min <= zip <= max`. A reversed range matches nothing.
pub fn filter_by_zip_range<'a>(records: &[&'a Record], min: u32, max: u32) -> Vec<&'a Record> {
    records
        .iter()
        .copied()
        .filter(|r| (min..=max).contains(&r.zip_code))
        .collect()
}

pub fn filter_by_categories<'a>(records: &[&'a Record], categories: &HashSet<String>) -> Vec<&'a Record> {
    records
        .iter()
        .copied()
        .filter(|r| categories.contains(&r.category))
        .collect()
}
