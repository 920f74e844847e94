//! Cohort-level aggregation over a history slice.
//!
//! All statistics for a request come from a single filtered slice, so they
//! always describe the same set of events.

use crate::history::{HistorySlice, HistoryStore};
use crate::session::SessionSegmenter;
use reach_core::{Event, Hour, HistoryStats, UserId};
use statrs::statistics::Statistics;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Computes history statistics for a cohort before a cutoff hour.
#[derive(Debug, Clone)]
pub struct WindowedAggregator {
    /// Shared impression history.
    history: Arc<HistoryStore>,
    /// Session segmenter.
    segmenter: SessionSegmenter,
}

impl WindowedAggregator {
    /// Create an aggregator over the given history.
    pub fn new(history: Arc<HistoryStore>, segmenter: SessionSegmenter) -> Self {
        Self { history, segmenter }
    }

    /// Get the underlying history.
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Statistics for `user_ids` over events strictly before `before_hour`.
    pub fn aggregate(&self, user_ids: &BTreeSet<UserId>, before_hour: Hour) -> HistoryStats {
        let slice = self.history.filter(user_ids, before_hour);
        let stats = self.summarize(&slice, user_ids.len());
        debug!(
            cohort = user_ids.len(),
            before_hour,
            events = stats.event_count,
            "aggregated history slice"
        );
        stats
    }

    /// Statistics for an already filtered slice of a cohort of `cohort_size` users.
    pub fn summarize(&self, slice: &HistorySlice<'_>, cohort_size: usize) -> HistoryStats {
        let event_count = slice.len();
        if cohort_size == 0 || event_count == 0 {
            return HistoryStats {
                event_count,
                ..HistoryStats::default()
            };
        }

        // Non-finite prices are left out of the mean.
        let prices: Vec<f64> = slice.events().map(|e| e.cpm).filter(|c| c.is_finite()).collect();
        let history_cpm_mean = if prices.is_empty() { 0.0 } else { prices.iter().mean() };
        let adv_shown_freq = event_count as f64 / cohort_size as f64;

        let mut gap_sum = 0.0;
        let mut total_duration: Hour = 0;
        let mut session_count: usize = 0;
        let mut hours: Vec<Hour> = Vec::new();
        for (_, events) in slice.users() {
            gap_sum += mean_distinct_gap(events);

            hours.clear();
            hours.extend(events.iter().map(|e| e.hour));
            let sessions = self.segmenter.segment(&hours);
            session_count += sessions.len();
            total_duration = sessions
                .iter()
                .fold(total_duration, |acc, s| acc.saturating_add(s.duration()));
        }

        let avg_session_duration = if session_count > 0 {
            total_duration as f64 / session_count as f64
        } else {
            0.0
        };

        HistoryStats {
            history_cpm_mean,
            adv_shown_freq,
            avg_time_between_ads: gap_sum / cohort_size as f64,
            avg_session_duration,
            event_count,
        }
    }
}

/// Mean gap between consecutive distinct hours of one user's sorted events.
///
/// Zero when the user has fewer than two distinct hours.
fn mean_distinct_gap(events: &[Event]) -> f64 {
    let (Some(first), Some(last)) = (events.first(), events.last()) else {
        return 0.0;
    };
    let distinct = 1 + events.windows(2).filter(|w| w[1].hour != w[0].hour).count();
    if distinct < 2 {
        return 0.0;
    }
    // Consecutive gaps telescope to last - first.
    last.hour.saturating_sub(first.hour) as f64 / (distinct - 1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn event(user_id: UserId, hour: Hour, cpm: f64) -> Event {
        Event {
            user_id,
            hour,
            publisher: 1,
            cpm,
        }
    }

    fn cohort(ids: &[UserId]) -> BTreeSet<UserId> {
        ids.iter().copied().collect()
    }

    fn aggregator(events: Vec<Event>) -> WindowedAggregator {
        WindowedAggregator::new(Arc::new(HistoryStore::new(events)), SessionSegmenter::new(6))
    }

    #[test]
    fn test_empty_cohort_is_zero() {
        let agg = aggregator(vec![event(1, 1, 10.0)]);
        let stats = agg.aggregate(&BTreeSet::new(), 100);
        assert_eq!(stats, HistoryStats::default());
    }

    #[test]
    fn test_cold_start_is_zero() {
        let agg = aggregator(vec![event(1, 50, 10.0)]);
        let stats = agg.aggregate(&cohort(&[1, 2]), 50);
        assert_eq!(stats, HistoryStats::default());
    }

    #[test]
    fn test_cpm_mean_and_frequency() {
        let agg = aggregator(vec![
            event(1, 1, 100.0),
            event(1, 2, 200.0),
            event(2, 3, 300.0),
            event(3, 4, 1000.0),
        ]);
        let stats = agg.aggregate(&cohort(&[1, 2, 4, 5]), 10);
        assert_eq!(stats.event_count, 3);
        assert_relative_eq!(stats.history_cpm_mean, 200.0, epsilon = 1e-9);
        assert_relative_eq!(stats.adv_shown_freq, 0.75);
    }

    #[test]
    fn test_time_between_ads_uses_distinct_hours() {
        let agg = aggregator(vec![
            event(1, 1, 1.0),
            event(1, 3, 1.0),
            event(1, 3, 1.0),
            event(1, 7, 1.0),
        ]);
        let stats = agg.aggregate(&cohort(&[1, 2]), 100);
        // distinct hours [1, 3, 7], gaps [2, 4], mean 3, over a cohort of 2
        assert_relative_eq!(stats.avg_time_between_ads, 1.5);
    }

    #[test]
    fn test_time_between_ads_single_hour_users_contribute_zero() {
        let agg = aggregator(vec![
            event(1, 5, 1.0),
            event(1, 5, 1.0),
            event(2, 2, 1.0),
            event(2, 6, 1.0),
        ]);
        let stats = agg.aggregate(&cohort(&[1, 2]), 100);
        assert_relative_eq!(stats.avg_time_between_ads, 2.0);
    }

    #[test]
    fn test_session_duration_single_user() {
        let events = [1, 2, 3, 10, 11, 20]
            .iter()
            .map(|&h| event(1, h, 1.0))
            .collect();
        let agg = aggregator(events);
        let stats = agg.aggregate(&cohort(&[1]), 21);
        assert_relative_eq!(stats.avg_session_duration, 1.0);
    }

    #[test]
    fn test_session_duration_pooled_across_users() {
        let agg = aggregator(vec![
            event(1, 0, 1.0),
            event(1, 4, 1.0),
            event(2, 10, 1.0),
        ]);
        let stats = agg.aggregate(&cohort(&[1, 2]), 100);
        // sessions: [0, 4] duration 4, [10] duration 0
        assert_relative_eq!(stats.avg_session_duration, 2.0);
    }

    #[test]
    fn test_session_keeps_duplicate_hours() {
        let agg = aggregator(vec![
            event(1, 0, 1.0),
            event(1, 0, 1.0),
            event(1, 20, 1.0),
        ]);
        let stats = agg.aggregate(&cohort(&[1]), 100);
        assert_relative_eq!(stats.avg_session_duration, 0.0);
        assert_relative_eq!(stats.avg_time_between_ads, 20.0);
    }

    #[test]
    fn test_non_finite_prices_skipped() {
        let agg = aggregator(vec![
            event(1, 1, f64::NAN),
            event(1, 2, 100.0),
            event(2, 3, f64::INFINITY),
            event(2, 4, 300.0),
        ]);
        let stats = agg.aggregate(&cohort(&[1, 2]), 10);
        assert_eq!(stats.event_count, 4);
        assert_relative_eq!(stats.history_cpm_mean, 200.0, epsilon = 1e-9);

        let agg = aggregator(vec![event(1, 1, f64::NAN)]);
        let stats = agg.aggregate(&cohort(&[1]), 10);
        assert_eq!(stats.history_cpm_mean, 0.0);
        assert_relative_eq!(stats.adv_shown_freq, 1.0);
    }

    #[test]
    fn test_extreme_hours_do_not_overflow() {
        let agg = aggregator(vec![
            event(1, Hour::MIN, 1.0),
            event(1, Hour::MAX - 1, 1.0),
            event(2, Hour::MIN, 1.0),
            event(2, Hour::MAX - 1, 1.0),
        ]);
        let stats = agg.aggregate(&cohort(&[1, 2]), Hour::MAX);
        assert_eq!(stats.event_count, 4);
        assert!(stats.avg_time_between_ads.is_finite());
        assert_eq!(stats.avg_session_duration, 0.0);
    }

    #[test]
    fn test_mean_distinct_gap() {
        assert_eq!(mean_distinct_gap(&[]), 0.0);
        assert_eq!(mean_distinct_gap(&[event(1, 3, 0.0)]), 0.0);
        let events = [event(1, 1, 0.0), event(1, 3, 0.0), event(1, 3, 0.0), event(1, 7, 0.0)];
        assert_relative_eq!(mean_distinct_gap(&events), 3.0);
    }
}
