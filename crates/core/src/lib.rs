//! Core types and configuration for the reach feature system.
//!
//! This crate provides shared types used across all other crates:
//! - Impression history events and feature vectors
//! - Request parsing (delimited identifier lists)
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod request;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use request::{parse_id_list, RawRequest, Request};
pub use types::*;
