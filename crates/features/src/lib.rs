//! Feature computation for impression requests.
//!
//! This crate handles:
//! - Impression history indexed by user
//! - Session segmentation of a user's event hours
//! - Cohort-level aggregation over a history slice
//! - Feature vector assembly for request batches

pub mod history;
pub mod session;
pub mod aggregator;
pub mod assembler;

pub use history::{HistorySlice, HistoryStore};
pub use session::{Session, SessionSegmenter};
pub use aggregator::WindowedAggregator;
pub use assembler::FeatureAssembler;
