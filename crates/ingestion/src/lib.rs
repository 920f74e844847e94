//! Data ingestion for the reach feature system.
//!
//! This crate handles:
//! - Loading the impression history table
//! - Loading request tables and JSON-lines request streams
//! - Header-driven column lookup for delimited text

pub mod table;
pub mod history;
pub mod requests;

pub use history::HistoryReader;
pub use requests::RequestReader;
