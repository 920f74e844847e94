//! Impression history loading.
//!
//! Reads a delimited table with at least the columns `hour`, `cpm`,
//! `publisher` and `user_id`. Extra columns are ignored. Any malformed row
//! fails the whole load.

use crate::table::{from_csv, line_of, parse_field, table_reader, Header};
use reach_core::config::InputConfig;
use reach_core::{Error, Event, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Reader for the impression history table.
#[derive(Debug, Clone)]
pub struct HistoryReader {
    delimiter: char,
}

impl HistoryReader {
    /// Create a reader with the given column delimiter.
    pub fn new(delimiter: char) -> Self {
        Self { delimiter }
    }

    /// Create a reader from input configuration.
    pub fn from_config(config: &InputConfig) -> Self {
        Self::new(config.delimiter)
    }

    /// Load events from a file.
    pub fn read_path(&self, path: impl AsRef<Path>) -> Result<Vec<Event>> {
        let path = path.as_ref();
        let events = self.read(File::open(path)?)?;
        info!(path = %path.display(), events = events.len(), "loaded history");
        Ok(events)
    }

    /// Load events from a reader.
    pub fn read<R: Read>(&self, input: R) -> Result<Vec<Event>> {
        let mut reader = table_reader(input, self.delimiter)?;
        let header = Header::from_record(reader.headers().map_err(from_csv)?)?;
        if header.is_empty() {
            return Err(Error::data("history table is empty"));
        }
        let hour = header.require("hour")?;
        let cpm = header.require("cpm")?;
        let publisher = header.require("publisher")?;
        let user_id = header.require("user_id")?;

        let mut events = Vec::new();
        for record in reader.records() {
            let record = record.map_err(from_csv)?;
            let price: f64 = parse_field(&record, cpm, "cpm")?;
            if !price.is_finite() {
                return Err(Error::data(format!(
                    "line {}: non-finite value '{price}' in column 'cpm'",
                    line_of(&record)
                )));
            }
            events.push(Event {
                user_id: parse_field(&record, user_id, "user_id")?,
                hour: parse_field(&record, hour, "hour")?,
                publisher: parse_field(&record, publisher, "publisher")?,
                cpm: price,
            });
        }

        Ok(events)
    }
}

impl Default for HistoryReader {
    fn default() -> Self {
        Self::from_config(&InputConfig::default())
    }
}
