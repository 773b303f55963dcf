use std::path::PathBuf;
use thiserror::Error;

/// Fatal failures while reading the registry. No page can render without data.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open registry CSV {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed registry CSV {path:?}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("row at line {line} of {path:?} has {found} fields, header has {expected}")]
    RowTooLong {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("column '{column}' not found in registry CSV {path:?}")]
    MissingColumn { path: PathBuf, column: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("unknown page '{0}'")]
    UnknownPage(String),
}
