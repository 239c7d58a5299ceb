use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::types::activity::{Activity, ActivityId, ActivityInput};

#[derive(Clone, Default)]
pub struct ActivityStore {
    activities: Arc<DashMap<ActivityId, Activity>>,
    by_strava_id: Arc<DashMap<u64, ActivityId>>,
    next_id: Arc<AtomicU64>,
}

impl ActivityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, activity_id: ActivityId) -> Option<Activity> {
        self.activities.get(&activity_id).map(|entry| entry.clone())
    }

    /// Inserts a new activity, or updates the one already carrying the same upstream id.
    pub fn upsert(&self, input: ActivityInput) -> Activity {
        let id = match input.strava_activity_id {
            Some(strava_id) => *self
                .by_strava_id
                .entry(strava_id)
                .or_insert_with(|| self.allocate_id()),
            None => self.allocate_id(),
        };
        let activity = input.into_activity(id);
        self.activities.insert(id, activity.clone());
        activity
    }

    /// Newest `start_date` first, activities without a date last; ties by id.
    pub fn list(&self, limit: usize, offset: usize) -> Vec<Activity> {
        let mut activities: Vec<Activity> = self
            .activities
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        activities.sort_by(|a, b| match (a.start_date, b.start_date) {
            (Some(x), Some(y)) => y.cmp(&x).then(a.id.cmp(&b.id)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.id.cmp(&b.id),
        });
        activities.into_iter().skip(offset).take(limit).collect()
    }

    /// All ids in ascending order.
    pub fn ids(&self) -> Vec<ActivityId> {
        let mut ids: Vec<ActivityId> = self.activities.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn remove(&self, activity_id: ActivityId) -> Option<Activity> {
        let (_, activity) = self.activities.remove(&activity_id)?;
        if let Some(strava_id) = activity.strava_activity_id {
            self.by_strava_id.remove(&strava_id);
        }
        Some(activity)
    }

    fn allocate_id(&self) -> ActivityId {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }
}
