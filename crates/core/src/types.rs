//! Core data types for the reach feature system.

use serde::{Deserialize, Serialize};

/// User identifier.
pub type UserId = i64;

/// Publisher identifier.
pub type PublisherId = i64;

/// Absolute time in hours.
pub type Hour = i64;

/// A single served impression from the history log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// User the impression was shown to.
    pub user_id: UserId,
    /// Hour the impression was served.
    pub hour: Hour,
    /// Publisher that served the impression.
    pub publisher: PublisherId,
    /// Price paid (cost per mille).
    pub cpm: f64,
}

/// Cohort-level statistics over a history slice.
///
/// Every field is zero when the cohort or the slice is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryStats {
    /// Mean price over all events in the slice.
    pub history_cpm_mean: f64,
    /// Events in the slice per cohort member.
    pub adv_shown_freq: f64,
    /// Sum of per-user mean inter-event gaps, divided by cohort size.
    pub avg_time_between_ads: f64,
    /// Total session duration divided by total session count.
    pub avg_session_duration: f64,
    /// Number of events in the slice.
    pub event_count: usize,
}

/// Feature vector for one request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// 1 if publisher 1 is targeted.
    pub p1: u8,
    /// 1 if publisher 2 is targeted.
    pub p2: u8,
    /// Length of the request window (hour_end - hour_start).
    pub delay: i64,
    /// Request price.
    pub cpm: f64,
    /// max(0, delay - avg_time_between_ads).
    pub remaining_time_to_next_ad: f64,
    /// Mean historical session duration for the cohort.
    pub avg_session_duration: f64,
    /// Mean historical price for the cohort.
    pub history_cpm_mean: f64,
    /// Historical impressions per cohort member.
    pub adv_shown_freq: f64,
}

impl FeatureVector {
    /// Feature names in model input order.
    pub const NAMES: [&'static str; 8] = [
        "p1",
        "remaining_time_to_next_ad",
        "delay",
        "cpm",
        "p2",
        "avg_session_duration",
        "history_cpm_mean",
        "adv_shown_freq",
    ];

    /// Look up a feature by name.
    pub fn get(&self, name: &str) -> Option<f64> {
        let value = match name {
            "p1" => self.p1 as f64,
            "p2" => self.p2 as f64,
            "delay" => self.delay as f64,
            "cpm" => self.cpm,
            "remaining_time_to_next_ad" => self.remaining_time_to_next_ad,
            "avg_session_duration" => self.avg_session_duration,
            "history_cpm_mean" => self.history_cpm_mean,
            "adv_shown_freq" => self.adv_shown_freq,
            _ => return None,
        };
        Some(value)
    }

    /// Features as a numeric row, ordered as [`FeatureVector::NAMES`].
    pub fn to_model_input(&self) -> [f64; 8] {
        [
            self.p1 as f64,
            self.remaining_time_to_next_ad,
            self.delay as f64,
            self.cpm,
            self.p2 as f64,
            self.avg_session_duration,
            self.history_cpm_mean,
            self.adv_shown_freq,
        ]
    }
}
