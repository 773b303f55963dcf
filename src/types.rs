use geo::Point;
use serde::Serialize;
use std::fmt;

/// One licensed facility from the registry, with every schema field present.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub name: String,
    pub status: String,
    pub category: String,
    pub zip_code: u32,
    /// x = longitude, y = latitude
    pub location: Point<f64>,
}

impl Record {
    pub fn latitude(&self) -> f64 {
        self.location.y()
    }

    pub fn longitude(&self) -> f64 {
        self.location.x()
    }

    pub fn key(&self, field: Field) -> Key {
        match field {
            Field::Status => Key::Text(self.status.clone()),
            Field::Category => Key::Text(self.category.clone()),
            Field::ZipCode => Key::Int(i64::from(self.zip_code)),
            Field::Name => Key::Text(self.name.clone()),
        }
    }
}

/// Categorical columns that can be grouped or pivoted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Status,
    Category,
    ZipCode,
    Name,
}

/// A grouping key. Integers order before text and sort numerically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum Key {
    Int(i64),
    Text(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(n) => write!(f, "{}", n),
            Key::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Text(s.to_string())
    }
}

impl From<u32> for Key {
    fn from(n: u32) -> Self {
        Key::Int(i64::from(n))
    }
}

/// Header names used when displaying records as a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNames {
    pub name: String,
    pub status: String,
    pub category: String,
    pub zip_code: String,
    pub latitude: String,
    pub longitude: String,
}

/// The cleaned registry. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<Record>,
    columns: ColumnNames,
}

impl Dataset {
    pub fn new(records: Vec<Record>, columns: ColumnNames) -> Self {
        Self { records, columns }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn columns(&self) -> &ColumnNames {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Borrowed view over every record, in source order.
    pub fn view(&self) -> Vec<&Record> {
        self.records.iter().collect()
    }

    /// Distinct license statuses in first-seen order.
    pub fn statuses(&self) -> Vec<String> {
        unique(self.records.iter().map(|r| r.status.as_str()))
    }

    /// Distinct license categories in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        unique(self.records.iter().map(|r| r.category.as_str()))
    }

    /// Observed (min, max) zip code, or `None` for an empty dataset.
    pub fn zip_bounds(&self) -> Option<(u32, u32)> {
        let min = self.records.iter().map(|r| r.zip_code).min()?;
        let max = self.records.iter().map(|r| r.zip_code).max()?;
        Some((min, max))
    }
}

fn unique<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = indexmap::IndexSet::new();
    for v in values {
        seen.insert(v);
    }
    seen.into_iter().map(str::to_string).collect()
}


#[cfg(test)]
mod tests {
    use super::fixtures::sample;
    use super::*;

    #[test]
    fn unique_values_keep_first_seen_order() {
        let ds = sample();
        assert_eq!(ds.statuses(), vec!["Active", "Pending", "Expired"]);
        assert_eq!(ds.categories(), vec!["Retailer", "Cultivator", "Delivery"]);
    }

    #[test]
    fn zip_bounds_cover_observed_range() {
        assert_eq!(sample().zip_bounds(), Some((2115, 2130)));
        assert_eq!(Dataset::new(vec![], fixtures::columns()).zip_bounds(), None);
    }

    #[test]
    fn int_keys_sort_numerically() {
        let mut keys = vec![Key::from(10u32), Key::from(9u32), Key::from(100u32)];
        keys.sort();
        assert_eq!(keys, vec![Key::Int(9), Key::Int(10), Key::Int(100)]);
    }
}
