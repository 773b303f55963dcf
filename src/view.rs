use crate::aggregate::PivotTable;
use crate::chart::ChartSpec;
use crate::pages::Page;
use crate::types::{ColumnNames, Record};
use serde::Serialize;

/// Everything one page shows for the current widget values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView {
    pub page: Page,
    pub title: String,
    pub controls: Vec<Control>,
    pub sections: Vec<Section>,
}

impl PageView {
    pub fn new(page: Page, title: &str) -> Self {
        Self {
            page,
            title: title.to_string(),
            controls: Vec::new(),
            sections: Vec::new(),
        }
    }

    pub fn push(&mut self, section: Section) -> &mut Self {
        self.sections.push(section);
        self
    }

    pub fn subheader(&mut self, text: &str) -> &mut Self {
        self.push(Section::Subheader { text: text.to_string() })
    }

    pub fn text(&mut self, text: &str) -> &mut Self {
        self.push(Section::Text { text: text.to_string() })
    }

    pub fn no_data(&mut self, message: &str) -> &mut Self {
        self.push(Section::NoData { message: message.to_string() })
    }

    pub fn has_no_data(&self) -> bool {
        self.sections.iter().any(|s| matches!(s, Section::NoData { .. }))
    }
}

/// Sidebar or inline widget, with its current value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum Control {
    Select {
        id: String,
        label: String,
        options: Vec<String>,
        selected: String,
    },
    RangeSlider {
        id: String,
        label: String,
        min: u32,
        max: u32,
        selected: (u32, u32),
    },
    MultiSelect {
        id: String,
        label: String,
        options: Vec<String>,
        selected: Vec<String>,
    },
    NumberInput {
        id: String,
        label: String,
        value: f64,
        format: String,
    },
    Slider {
        id: String,
        label: String,
        min: u8,
        max: u8,
        value: u8,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Section {
    Subheader { text: String },
    Text { text: String },
    Table(TableView),
    Chart(ChartSpec),
    NoData { message: String },
    Image {
        src: String,
        caption: String,
        width: Option<u32>,
        height: Option<u32>,
    },
    Link { label: String, url: String },
    Balloons,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableView {
    pub fn from_records(records: &[&Record], names: &ColumnNames) -> Self {
        let columns = vec![
            names.name.clone(),
            names.status.clone(),
            names.category.clone(),
            names.zip_code.clone(),
            names.latitude.clone(),
            names.longitude.clone(),
        ];
        let rows = records
            .iter()
            .map(|r| {
                vec![
                    r.name.clone(),
                    r.status.clone(),
                    r.category.clone(),
                    r.zip_code.to_string(),
                    r.latitude().to_string(),
                    r.longitude().to_string(),
                ]
            })
            .collect();
        Self { columns, rows }
    }

    /// First column holds the row keys; the rest are the pivot's columns.
    pub fn from_pivot(table: &PivotTable, index_label: &str) -> Self {
        let columns = std::iter::once(index_label.to_string())
            .chain(table.columns.iter().map(ToString::to_string))
            .collect();
        let rows = table
            .rows
            .iter()
            .zip(&table.cells)
            .map(|(key, cells)| {
                std::iter::once(key.to_string())
                    .chain(cells.iter().map(ToString::to_string))
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::pivot;
    use crate::types::fixtures::sample;
    use crate::types::Field;
    use pretty_assertions::assert_eq;

    #[test]
    fn record_table_uses_configured_headers() {
        let ds = sample();
        let table = TableView::from_records(&ds.view(), ds.columns());
        assert_eq!(table.columns[2], "app_license_category");
        assert_eq!(table.rows.len(), ds.len());
        assert_eq!(table.rows[0][..4].to_vec(), vec!["Ann", "Active", "Retailer", "2118"]);
    }

    #[test]
    fn pivot_table_is_rendered_with_zeroes() {
        let ds = sample();
        let table = TableView::from_pivot(
            &pivot(&ds.view(), Field::ZipCode, Field::Status, Field::Name),
            "facility_zip_code",
        );
        assert_eq!(table.columns, vec!["facility_zip_code", "Active", "Expired", "Pending"]);
        assert_eq!(table.rows[2], vec!["2130", "0", "1", "0"]);
    }

    #[test]
    fn sections_serialize_with_type_tag() {
        let json = serde_json::to_value(Section::NoData { message: "none".into() }).unwrap();
        assert_eq!(json["type"], "no_data");
        assert_eq!(json["message"], "none");
    }
}
