//! Read-only store of served impressions, indexed by user.
//!
//! Each user's events are kept sorted by hour so that a cutoff query is a
//! binary search rather than a scan.

use reach_core::{Event, Hour, UserId};
use std::collections::{BTreeSet, HashMap};

/// In-memory impression history.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    /// Events per user, sorted ascending by hour.
    by_user: HashMap<UserId, Vec<Event>>,
    /// Total number of events.
    len: usize,
}

impl HistoryStore {
    /// Build the store from a collection of events.
    pub fn new(events: impl IntoIterator<Item = Event>) -> Self {
        let mut by_user: HashMap<UserId, Vec<Event>> = HashMap::new();
        let mut len = 0;
        for event in events {
            by_user.entry(event.user_id).or_default().push(event);
            len += 1;
        }
        // Stable sort keeps load order among events in the same hour.
        for events in by_user.values_mut() {
            events.sort_by_key(|e| e.hour);
        }
        Self { by_user, len }
    }

    /// Total number of events.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the store holds no events.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of distinct users.
    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }

    /// Earliest and latest hour in the store.
    pub fn hour_range(&self) -> Option<(Hour, Hour)> {
        let min = self.by_user.values().filter_map(|v| v.first()).map(|e| e.hour).min()?;
        let max = self.by_user.values().filter_map(|v| v.last()).map(|e| e.hour).max()?;
        Some((min, max))
    }

    /// All events of `user_id` with `hour < before_hour`, sorted by hour.
    pub fn user_events(&self, user_id: UserId, before_hour: Hour) -> &[Event] {
        match self.by_user.get(&user_id) {
            Some(events) => {
                let end = events.partition_point(|e| e.hour < before_hour);
                &events[..end]
            }
            None => &[],
        }
    }

    /// The history slice for a cohort: events of `user_ids` strictly before `before_hour`.
    pub fn filter<'a>(&'a self, user_ids: &BTreeSet<UserId>, before_hour: Hour) -> HistorySlice<'a> {
        let groups: Vec<(UserId, &'a [Event])> = user_ids
            .iter()
            .map(|&user_id| (user_id, self.user_events(user_id, before_hour)))
            .filter(|(_, events)| !events.is_empty())
            .collect();
        HistorySlice { groups }
    }
}

/// Events of a cohort preceding a cutoff, grouped by user.
///
/// Users are in ascending id order and each group is sorted by hour.
#[derive(Debug, Clone)]
pub struct HistorySlice<'a> {
    groups: Vec<(UserId, &'a [Event])>,
}

impl<'a> HistorySlice<'a> {
    /// Number of events in the slice.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|(_, events)| events.len()).sum()
    }

    /// Whether the slice holds no events.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterate over all events in the slice.
    pub fn events(&self) -> impl Iterator<Item = &'a Event> + '_ {
        self.groups.iter().flat_map(|&(_, events)| events.iter())
    }

    /// Iterate over users that have at least one event, with their events.
    pub fn users(&self) -> impl Iterator<Item = (UserId, &'a [Event])> + '_ {
        self.groups.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn store() -> HistoryStore {
        HistoryStore::new(vec![
            event(1, 10, 100.0),
            event(2, 5, 50.0),
            event(1, 3, 30.0),
            event(1, 20, 200.0),
            event(3, 1, 10.0),
            event(1, 3, 35.0),
        ])
    }

    #[test]
    fn test_store_counts() {
        let store = store();
        assert_eq!(store.len(), 6);
        assert_eq!(store.user_count(), 3);
        assert_eq!(store.hour_range(), Some((1, 20)));
        assert!(HistoryStore::default().hour_range().is_none());
    }

    #[test]
    fn test_user_events_sorted_and_cut() {
        let store = store();
        let hours: Vec<Hour> = store.user_events(1, 20).iter().map(|e| e.hour).collect();
        assert_eq!(hours, vec![3, 3, 10]);
        assert!(store.user_events(99, 100).is_empty());
    }

    #[test]
    fn test_filter_excludes_cutoff_hour() {
        let store = store();
        let slice = store.filter(&cohort(&[1, 2]), 10);
        // hour 10 itself is not history for a request starting at 10
        assert_eq!(slice.len(), 3);
        assert!(slice.events().all(|e| e.hour < 10));
    }

    #[test]
    fn test_filter_only_cohort_members() {
        let store = store();
        let slice = store.filter(&cohort(&[2, 3]), 100);
        let users: Vec<UserId> = slice.users().map(|(id, _)| id).collect();
        assert_eq!(users, vec![2, 3]);
        assert_eq!(slice.len(), 2);
    }

    #[test]
    fn test_filter_keeps_duplicates() {
        let store = store();
        let slice = store.filter(&cohort(&[1]), 4);
        assert_eq!(slice.len(), 2);
    }

    #[test]
    fn test_filter_empty_cohort() {
        let store = store();
        let slice = store.filter(&BTreeSet::new(), 100);
        assert!(slice.is_empty());
        assert_eq!(slice.events().count(), 0);
    }
}
