//! Feature vector assembly.
//!
//! Combines history statistics with request fields into one feature vector
//! per request. Requests are independent: a failure fails only its own index.

use crate::aggregator::WindowedAggregator;
use crate::history::HistoryStore;
use crate::session::SessionSegmenter;
use reach_core::{
    Config, Error, FeatureVector, PublisherId, RawRequest, Request, Result,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Publisher whose membership sets `p1`.
pub const P1_PUBLISHER: PublisherId = 1;

/// Publisher whose membership sets `p2`.
pub const P2_PUBLISHER: PublisherId = 2;

/// Per-request feature computation over a shared history.
#[derive(Debug, Clone)]
pub struct FeatureAssembler {
    aggregator: WindowedAggregator,
    publishers_amount: u32,
    id_list_separator: char,
}

impl FeatureAssembler {
    /// Create an assembler over the given history.
    pub fn new(history: Arc<HistoryStore>, config: &Config) -> Self {
        Self {
            aggregator: WindowedAggregator::new(
                history,
                SessionSegmenter::new(config.session.gap_threshold),
            ),
            publishers_amount: config.publishers.publishers_amount,
            id_list_separator: config.input.id_list_separator,
        }
    }

    /// Get the aggregator.
    pub fn aggregator(&self) -> &WindowedAggregator {
        &self.aggregator
    }

    /// Compute the feature vector for one request.
    pub fn compute(&self, request: &Request) -> Result<FeatureVector> {
        let cpm = request.cpm.ok_or_else(|| Error::missing_field("cpm"))?;
        self.check_publishers(request);

        let stats = self.aggregator.aggregate(&request.user_ids, request.hour_start);
        let delay = request.delay();
        let remaining_time_to_next_ad = (delay as f64 - stats.avg_time_between_ads).max(0.0);

        debug!(
            cohort = request.user_ids.len(),
            hour_start = request.hour_start,
            events = stats.event_count,
            "computed features"
        );

        Ok(FeatureVector {
            p1: request.targets(P1_PUBLISHER) as u8,
            p2: request.targets(P2_PUBLISHER) as u8,
            delay,
            cpm,
            remaining_time_to_next_ad,
            avg_session_duration: stats.avg_session_duration,
            history_cpm_mean: stats.history_cpm_mean,
            adv_shown_freq: stats.adv_shown_freq,
        })
    }

    /// Compute feature vectors for a batch, one result per request in input order.
    pub fn compute_features(&self, requests: &[Request]) -> Vec<Result<FeatureVector>> {
        requests
            .iter()
            .enumerate()
            .map(|(index, request)| {
                self.compute(request)
                    .inspect_err(|e| warn!(index, error = %e, "feature computation failed"))
            })
            .collect()
    }

    /// Parse and compute a batch of transport requests, one result per request.
    pub fn compute_raw(&self, requests: &[RawRequest]) -> Vec<Result<FeatureVector>> {
        requests
            .iter()
            .enumerate()
            .map(|(index, raw)| self.compute_loaded(index, Ok(raw)))
            .collect()
    }

    /// Compute loaded rows, one result per row in input order.
    ///
    /// A row that failed to load keeps its error at its own index.
    pub fn compute_rows<I>(&self, rows: I) -> Vec<Result<FeatureVector>>
    where
        I: IntoIterator<Item = Result<RawRequest>>,
    {
        rows.into_iter()
            .enumerate()
            .map(|(index, row)| match row {
                Ok(raw) => self.compute_loaded(index, Ok(&raw)),
                Err(e) => self.compute_loaded(index, Err(e)),
            })
            .collect()
    }

    fn compute_loaded(&self, index: usize, row: Result<&RawRequest>) -> Result<FeatureVector> {
        row.and_then(|raw| raw.parse_with(self.id_list_separator))
            .and_then(|request| self.compute(&request))
            .inspect_err(|e| warn!(index, error = %e, "feature computation failed"))
    }

    /// Log publisher ids outside the declared range. Features are unaffected.
    fn check_publishers(&self, request: &Request) {
        let max = PublisherId::from(self.publishers_amount);
        if let Some(&publisher) = request.publishers.iter().find(|&&p| p < 1 || p > max) {
            warn!(
                publisher,
                publishers_amount = self.publishers_amount,
                "request names a publisher outside the declared range"
            );
        }
    }
}
