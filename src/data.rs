use crate::config::InputConfig;
use crate::error::LoadError;
use crate::types::{ColumnNames, Dataset, Record};
use csv::{ReaderBuilder, StringRecord};
use geo::Point;
use once_cell::sync::OnceCell;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

// Cell values treated as missing, in addition to blank cells.
const MISSING_MARKERS: &[&str] = &["NA", "N/A", "n/a", "#N/A", "NaN", "nan", "-NaN", "NULL", "null", "None"];

/// Row counts from one load pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows_read: usize,
    pub kept: usize,
    pub dropped_incomplete: usize,
    pub dropped_malformed: usize,
}

/// Reads the registry once and hands out the same cleaned dataset afterwards.
///
/// The cache lives inside the loader, so two loaders never share results.
/// There is no invalidation: the source file is static for the session.
pub struct DataLoader {
    source: PathBuf,
    columns: ColumnNames,
    require_all_columns: bool,
    cache: OnceCell<Arc<Dataset>>,
}

impl DataLoader {
    pub fn new(source: impl Into<PathBuf>, columns: ColumnNames, require_all_columns: bool) -> Self {
        Self {
            source: source.into(),
            columns,
            require_all_columns,
            cache: OnceCell::new(),
        }
    }

    pub fn from_config(input: &InputConfig) -> Self {
        Self::new(&input.data_csv, (&input.columns).into(), input.require_all_columns)
    }

    pub fn load(&self) -> Result<Arc<Dataset>, LoadError> {
        self.cache
            .get_or_try_init(|| {
                let (dataset, report) = load_dataset(&self.source, &self.columns, self.require_all_columns)?;
                info!(
                    path = ?self.source,
                    rows = report.rows_read,
                    kept = report.kept,
                    dropped_incomplete = report.dropped_incomplete,
                    dropped_malformed = report.dropped_malformed,
                    "Loaded registry"
                );
                Ok(Arc::new(dataset))
            })
            .cloned()
    }
}

pub fn load_dataset(
    path: &Path,
    columns: &ColumnNames,
    require_all_columns: bool,
) -> Result<(Dataset, LoadReport), LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_dataset(file, path, columns, require_all_columns)
}

/// Parses registry CSV from any reader. `path` is only used in error messages.
pub fn parse_dataset<R: Read>(
    reader: R,
    path: &Path,
    columns: &ColumnNames,
    require_all_columns: bool,
) -> Result<(Dataset, LoadReport), LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    // short rows are dropped as incomplete below instead of failing the load
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers().map_err(csv_err)?.clone();

    let find = |column: &str| {
        headers
            .iter()
            .position(|h| h.trim() == column)
            .ok_or_else(|| LoadError::MissingColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            })
    };
    let idx = SchemaIndex {
        name: find(&columns.name)?,
        status: find(&columns.status)?,
        category: find(&columns.category)?,
        zip_code: find(&columns.zip_code)?,
        latitude: find(&columns.latitude)?,
        longitude: find(&columns.longitude)?,
    };

    let mut report = LoadReport::default();
    let mut records = Vec::new();

    for (line, result) in rdr.records().enumerate() {
        let row = result.map_err(csv_err)?;
        report.rows_read += 1;

        if row.len() > headers.len() {
            return Err(LoadError::RowTooLong {
                path: path.to_path_buf(),
                line: line + 2,
                expected: headers.len(),
                found: row.len(),
            });
        }

        let complete = if require_all_columns {
            row.len() == headers.len() && row.iter().all(|cell| !is_missing(cell))
        } else {
            idx.all().iter().all(|&i| row.get(i).is_some_and(|cell| !is_missing(cell)))
        };
        if !complete {
            report.dropped_incomplete += 1;
            continue;
        }

        match idx.parse(&row) {
            Ok(record) => records.push(record),
            Err(reason) => {
                // header is line 1
                warn!(line = line + 2, %reason, "Dropping registry row that does not fit the schema");
                report.dropped_malformed += 1;
            }
        }
    }

    report.kept = records.len();
    Ok((Dataset::new(records, columns.clone()), report))
}

fn is_missing(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty() || MISSING_MARKERS.contains(&cell)
}

struct SchemaIndex {
    name: usize,
    status: usize,
    category: usize,
    zip_code: usize,
    latitude: usize,
    longitude: usize,
}

impl SchemaIndex {
    fn all(&self) -> [usize; 6] {
        [self.name, self.status, self.category, self.zip_code, self.latitude, self.longitude]
    }

    fn parse(&self, row: &StringRecord) -> Result<Record, String> {
        let cell = |i: usize| row.get(i).unwrap_or("").trim();

        let zip_code = parse_zip(cell(self.zip_code))?;
        let latitude = parse_coordinate(cell(self.latitude), 90.0)?;
        let longitude = parse_coordinate(cell(self.longitude), 180.0)?;

        Ok(Record {
            name: cell(self.name).to_string(),
            status: cell(self.status).to_string(),
            category: cell(self.category).to_string(),
            zip_code,
            location: Point::new(longitude, latitude),
        })
    }
}

// Accepts "02115" and integral floats such as "2115.0".
fn parse_zip(raw: &str) -> Result<u32, String> {
    if let Ok(zip) = raw.parse::<u32>() {
        return Ok(zip);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && v >= 0.0 && v <= f64::from(u32::MAX) => Ok(v as u32),
        _ => Err(format!("invalid zip code '{}'", raw)),
    }
}

fn parse_coordinate(raw: &str, limit: f64) -> Result<f64, String> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v.abs() <= limit => Ok(v),
        _ => Err(format!("invalid coordinate '{}'", raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::columns;
    use std::io::Write;

    const HEADER: &str = "id_name_first,app_license_status,app_license_category,facility_zip_code,latitude,longitude,notes";

    fn parse(body: &str, require_all: bool) -> (Dataset, LoadReport) {
        let csv = format!("{}\n{}", HEADER, body);
        parse_dataset(csv.as_bytes(), Path::new("test.csv"), &columns(), require_all).unwrap()
    }

    #[test]
    fn row_missing_zip_is_dropped() {
        let (ds, report) = parse(
            "Ann,Active,Retailer,2118,42.33,-71.07,x\n\
             Bo,Active,Retailer,,42.34,-71.10,x\n\
             Cy,Pending,Delivery,02115,42.35,-71.09,x\n",
            true,
        );
        assert_eq!(ds.len(), 2);
        assert_eq!(report.rows_read, 3);
        assert_eq!(report.dropped_incomplete, 1);
        assert_eq!(ds.records()[1].zip_code, 2115);
        assert_eq!(ds.records()[1].latitude(), 42.35);
        assert_eq!(ds.records()[1].longitude(), -71.09);
    }

    #[test]
    fn blanket_policy_drops_gaps_outside_schema() {
        let body = "Ann,Active,Retailer,2118,42.33,-71.07,\nBo,Active,Retailer,2118,42.33,-71.07,NaN\n";
        assert_eq!(parse(body, true).0.len(), 0);
        assert_eq!(parse(body, false).0.len(), 2);
    }

    #[test]
    fn unparsable_values_are_reported_not_fatal() {
        let (ds, report) = parse(
            "Ann,Active,Retailer,abc,42.33,-71.07,x\n\
             Bo,Active,Retailer,2118,north,-71.07,x\n\
             Cy,Active,Retailer,2118.0,42.33,-71.07,x\n",
            true,
        );
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records()[0].zip_code, 2118);
        assert_eq!(report.dropped_malformed, 2);
    }

    #[test]
    fn missing_header_is_fatal() {
        let csv = "name,status\nAnn,Active\n";
        let err = parse_dataset(csv.as_bytes(), Path::new("t.csv"), &columns(), true).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { ref column, .. } if column == "id_name_first"));
    }

    #[test]
    fn short_row_is_dropped_as_incomplete() {
        for require_all in [true, false] {
            let (ds, report) = parse(
                "Ann,Active,Retailer,2118,42.33,-71.07,x\n\
                 Bo,Active,Retailer\n\
                 Cy,Pending,Delivery,02115,42.35,-71.09,x\n",
                require_all,
            );
            assert_eq!(ds.len(), 2);
            assert_eq!(report.rows_read, 3);
            assert_eq!(report.dropped_incomplete, 1);
        }
    }

    #[test]
    fn short_row_with_all_schema_fields_survives_selective_policy() {
        let body = "Ann,Active,Retailer,2118,42.33,-71.07\n";
        assert_eq!(parse(body, true).1.dropped_incomplete, 1);
        assert_eq!(parse(body, false).0.len(), 1);
    }

    #[test]
    fn over_long_row_is_fatal() {
        let csv = format!("{}\nAnn,Active,Retailer,2118,42.33,-71.07,x,extra\n", HEADER);
        let err = parse_dataset(csv.as_bytes(), Path::new("t.csv"), &columns(), true).unwrap_err();
        assert!(matches!(err, LoadError::RowTooLong { line: 2, expected: 7, found: 8, .. }));
    }

    #[test]
    fn unreadable_path_is_fatal() {
        let loader = DataLoader::new("/definitely/not/here.csv", columns(), true);
        assert!(matches!(loader.load(), Err(LoadError::Io { .. })));
    }

    #[test]
    fn loader_reads_source_once() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        writeln!(file, "Ann,Active,Retailer,2118,42.33,-71.07,x").unwrap();
        file.flush().unwrap();

        let loader = DataLoader::new(file.path(), columns(), true);
        let first = loader.load().unwrap();

        // later edits to the file are invisible to the cached loader
        writeln!(file, "Bo,Active,Retailer,2119,42.33,-71.07,x").unwrap();
        file.flush().unwrap();
        let second = loader.load().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 1);
    }
}
