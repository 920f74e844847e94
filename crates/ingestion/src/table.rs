//! Delimited text tables with a header row.

use csv::{ReaderBuilder, StringRecord, Trim};
use reach_core::{Error, Result};
use std::collections::HashMap;
use std::io::Read;
use std::str::FromStr;

/// Open a headed, quote-aware table over `input`.
pub fn table_reader<R: Read>(input: R, delimiter: char) -> Result<csv::Reader<R>> {
    let delimiter = u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| {
            Error::config(format!("delimiter {delimiter:?} must be a single ASCII character"))
        })?;
    Ok(ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(input))
}

/// Convert a csv error, keeping I/O failures as I/O.
pub fn from_csv(err: csv::Error) -> Error {
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(io) => Error::Io(io),
        _ => Error::data(message),
    }
}

/// Column positions taken from a header row.
#[derive(Debug, Clone)]
pub struct Header {
    columns: HashMap<String, usize>,
}

impl Header {
    /// Index the columns of a header record.
    pub fn from_record(record: &StringRecord) -> Result<Self> {
        let mut columns = HashMap::new();
        for (idx, name) in record.iter().enumerate() {
            let name = name.trim_start_matches('\u{feff}');
            if columns.insert(name.to_string(), idx).is_some() {
                return Err(Error::data(format!("duplicate column '{name}' in header")));
            }
        }
        Ok(Self { columns })
    }

    /// Whether the header has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of a required column.
    pub fn require(&self, name: &str) -> Result<usize> {
        self.columns
            .get(name)
            .copied()
            .ok_or_else(|| Error::data(format!("missing column '{name}' in header")))
    }

    /// Position of an optional column.
    pub fn optional(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }
}

/// 1-based line a record starts on.
pub fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, |p| p.line())
}

/// Raw text of one field.
pub fn field(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("")
}

/// Parse one field, naming the column and line on failure.
pub fn parse_field<T: FromStr>(record: &StringRecord, idx: usize, column: &str) -> Result<T> {
    let raw = field(record, idx);
    raw.parse::<T>().map_err(|_| {
        Error::data(format!(
            "line {}: invalid value '{raw}' in column '{column}'",
            line_of(record)
        ))
    })
}
