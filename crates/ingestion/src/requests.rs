//! Request loading.
//!
//! Two input shapes are accepted: a delimited table with a header row, and
//! JSON lines with one request object per line. A bad row fails only its own
//! entry; a bad header or I/O failure fails the load.

use crate::table::{field, from_csv, parse_field, table_reader, Header};
use csv::StringRecord;
use reach_core::config::InputConfig;
use reach_core::{Error, RawRequest, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::info;

/// Column positions of a request table.
struct RequestColumns {
    cpm: Option<usize>,
    hour_start: usize,
    hour_end: usize,
    publishers: usize,
    audience_size: Option<usize>,
    user_ids: usize,
}

impl RequestColumns {
    fn from_header(header: &Header) -> Result<Self> {
        Ok(Self {
            cpm: header.optional("cpm"),
            hour_start: header.require("hour_start")?,
            hour_end: header.require("hour_end")?,
            publishers: header.require("publishers")?,
            audience_size: header.optional("audience_size"),
            user_ids: header.require("user_ids")?,
        })
    }

    fn parse_row(&self, record: &StringRecord) -> Result<RawRequest> {
        // A blank price cell means the price was not supplied.
        let cpm = match self.cpm {
            Some(idx) if !field(record, idx).is_empty() => Some(parse_field(record, idx, "cpm")?),
            _ => None,
        };
        let audience_size = match self.audience_size {
            Some(idx) if !field(record, idx).is_empty() => {
                parse_field(record, idx, "audience_size")?
            }
            _ => 0,
        };

        Ok(RawRequest {
            cpm,
            hour_start: parse_field(record, self.hour_start, "hour_start")?,
            hour_end: parse_field(record, self.hour_end, "hour_end")?,
            publishers: field(record, self.publishers).to_string(),
            audience_size,
            user_ids: field(record, self.user_ids).to_string(),
        })
    }
}

/// Reader for request tables and JSON-lines request streams.
#[derive(Debug, Clone)]
pub struct RequestReader {
    delimiter: char,
}

impl RequestReader {
    /// Create a reader with the given column delimiter.
    pub fn new(delimiter: char) -> Self {
        Self { delimiter }
    }

    /// Create a reader from input configuration.
    pub fn from_config(config: &InputConfig) -> Self {
        Self::new(config.delimiter)
    }

    /// Load requests from a file, choosing JSON lines for `.json`/`.jsonl`.
    pub fn read_path(&self, path: impl AsRef<Path>) -> Result<Vec<Result<RawRequest>>> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let is_json = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("json") | Some("jsonl")
        );
        let requests = if is_json {
            self.read_json_lines(BufReader::new(file))?
        } else {
            self.read_table(file)?
        };
        info!(path = %path.display(), requests = requests.len(), "loaded requests");
        Ok(requests)
    }

    /// Load requests from a delimited table.
    pub fn read_table<R: Read>(&self, input: R) -> Result<Vec<Result<RawRequest>>> {
        let mut reader = table_reader(input, self.delimiter)?;
        let header = Header::from_record(reader.headers().map_err(from_csv)?)?;
        if header.is_empty() {
            return Ok(Vec::new());
        }
        let columns = RequestColumns::from_header(&header)?;

        let mut requests = Vec::new();
        for record in reader.records() {
            let request = match record {
                Ok(record) => columns.parse_row(&record),
                Err(e) if e.is_io_error() => return Err(from_csv(e)),
                Err(e) => Err(from_csv(e)),
            };
            requests.push(request);
        }

        Ok(requests)
    }

    /// Load requests from JSON lines. Blank lines are skipped.
    pub fn read_json_lines<R: BufRead>(&self, reader: R) -> Result<Vec<Result<RawRequest>>> {
        let mut requests = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            requests.push(serde_json::from_str::<RawRequest>(&line).map_err(Error::from));
        }
        Ok(requests)
    }
}

impl Default for RequestReader {
    fn default() -> Self {
        Self::from_config(&InputConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str = "cpm\thour_start\thour_end\tpublishers\taudience_size\tuser_ids";

    #[test]
    fn test_read_table() {
        let data = format!("{HEADER}\n220.0\t1058\t1061\t7,16\t1906\t12,44,73\n");
        let requests = RequestReader::default().read_table(Cursor::new(data)).unwrap();
        assert_eq!(requests.len(), 1);
        let raw = requests[0].as_ref().unwrap();
        assert_eq!(raw.cpm, Some(220.0));
        assert_eq!(raw.hour_end, 1061);
        assert_eq!(raw.audience_size, 1906);
        assert_eq!(raw.user_ids, "12,44,73");
        assert_eq!(raw.parse().unwrap().user_ids.len(), 3);
    }

    #[test]
    fn test_blank_cpm_is_absent() {
        let data = format!("{HEADER}\n\t10\t12\t1\t5\t3\n");
        let requests = RequestReader::default().read_table(Cursor::new(data)).unwrap();
        assert_eq!(requests[0].as_ref().unwrap().cpm, None);
    }

    #[test]
    fn test_missing_cpm_column() {
        let data = "hour_start\thour_end\tpublishers\tuser_ids\n10\t12\t1\t3\n";
        let requests = RequestReader::default().read_table(Cursor::new(data)).unwrap();
        let raw = requests[0].as_ref().unwrap();
        assert_eq!(raw.cpm, None);
        assert_eq!(raw.audience_size, 0);
    }

    #[test]
    fn test_bad_row_does_not_abort() {
        let data = format!(
            "{HEADER}\n1.0\t10\t12\t1\t5\t3\n1.0\tten\t12\t1\t5\t3\n2.0\t20\t22\t2\t5\t4\n"
        );
        let requests = RequestReader::default().read_table(Cursor::new(data)).unwrap();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].is_ok());
        assert!(matches!(requests[1], Err(Error::Data(_))));
        assert_eq!(requests[2].as_ref().unwrap().hour_start, 20);
    }

    #[test]
    fn test_quoted_id_lists() {
        let data = format!("{HEADER}\n220\t10\t12\t\"1,2\"\t3\t\"12,44\"\n");
        let requests = RequestReader::default().read_table(Cursor::new(data)).unwrap();
        let request = requests[0].as_ref().unwrap().parse().unwrap();
        assert_eq!(request.user_ids.into_iter().collect::<Vec<_>>(), vec![12, 44]);
        assert_eq!(request.publishers.into_iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_short_row_fails_only_itself() {
        let data = format!("{HEADER}\n1.0\t10\t12\n2.0\t20\t22\t2\t5\t4\n");
        let requests = RequestReader::default().read_table(Cursor::new(data)).unwrap();
        assert_eq!(requests.len(), 2);
        assert!(matches!(requests[0], Err(Error::Data(_))));
        assert_eq!(requests[1].as_ref().unwrap().hour_start, 20);
    }

    #[test]
    fn test_empty_table() {
        let requests = RequestReader::default().read_table(Cursor::new("")).unwrap();
        assert!(requests.is_empty());
    }

    #[test]
    fn test_missing_required_column() {
        let data = "cpm\thour_start\tpublishers\tuser_ids\n1\t2\t3\t4\n";
        assert!(RequestReader::default().read_table(Cursor::new(data)).is_err());
    }

    #[test]
    fn test_read_json_lines() {
        let data = concat!(
            r#"{"cpm": 220, "hour_start": 1058, "hour_end": 1061, "publishers": "1,2", "audience_size": 3, "user_ids": "1,2,3"}"#,
            "\n\n",
            r#"{"hour_start": 5}"#,
            "\n",
            r#"{"hour_start": 5, "hour_end": 6, "publishers": "", "user_ids": ""}"#,
            "\n",
        );
        let requests = RequestReader::default().read_json_lines(Cursor::new(data)).unwrap();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].as_ref().unwrap().cpm, Some(220.0));
        assert!(matches!(requests[1], Err(Error::Json(_))));
        assert!(requests[2].as_ref().unwrap().cpm.is_none());
    }
}
