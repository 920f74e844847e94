//! Session segmentation.
//!
//! Splits one user's sorted event hours into sessions: a new session starts
//! whenever an hour lies more than the gap threshold after the previous hour
//! of the current session.

use reach_core::Hour;

/// A maximal run of event hours with no internal gap above the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    /// First hour in the session.
    pub start: Hour,
    /// Last hour in the session.
    pub end: Hour,
    /// Number of events in the session.
    pub events: usize,
}

impl Session {
    fn open(hour: Hour) -> Self {
        Self {
            start: hour,
            end: hour,
            events: 1,
        }
    }

    /// Session length in hours (0 for a single-event session).
    #[inline]
    pub fn duration(&self) -> Hour {
        self.end.saturating_sub(self.start)
    }
}

/// Gap-threshold session segmenter.
#[derive(Debug, Clone, Copy)]
pub struct SessionSegmenter {
    gap_threshold: Hour,
}

impl SessionSegmenter {
    /// Create a segmenter with the given gap threshold in hours.
    pub fn new(gap_threshold: Hour) -> Self {
        Self { gap_threshold }
    }

    /// Get the gap threshold.
    pub fn gap_threshold(&self) -> Hour {
        self.gap_threshold
    }

    /// Segment hours sorted ascending (duplicates allowed) into sessions.
    pub fn segment(&self, hours: &[Hour]) -> Vec<Session> {
        let mut sessions = Vec::new();
        let mut iter = hours.iter().copied();
        let Some(first) = iter.next() else {
            return sessions;
        };

        let mut current = Session::open(first);
        for hour in iter {
            if hour.saturating_sub(current.end) > self.gap_threshold {
                sessions.push(current);
                current = Session::open(hour);
            } else {
                current.end = hour;
                current.events += 1;
            }
        }
        sessions.push(current);

        sessions
    }

    /// Durations of the sessions in `hours`, in order.
    pub fn durations(&self, hours: &[Hour]) -> Vec<Hour> {
        self.segment(hours).iter().map(Session::duration).collect()
    }
}

impl Default for SessionSegmenter {
    fn default() -> Self {
        Self::new(6)
    }
}
