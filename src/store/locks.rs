use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;

use crate::types::activity::ActivityId;

/// One write gate per activity. Ingest, quality recompute and feature persistence run their
/// whole read-compute-write step inside the activity's gate, so two writers never interleave
/// on the same track. Readers never take a gate.
///
/// Gates are never dropped from the map: a deleted activity keeps its gate as a tombstone, and
/// every later write on it is refused. Activity ids are never reused.
#[derive(Clone, Default)]
pub struct WriteGates {
    gates: Arc<DashMap<ActivityId, Arc<Mutex<GateState>>>>,
}

#[derive(Debug, Default)]
struct GateState {
    retired: bool,
}

impl WriteGates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `write` while holding the activity's gate. Returns `None` without running it when
    /// the activity has been retired.
    pub fn with_gate<T>(&self, activity_id: ActivityId, write: impl FnOnce() -> T) -> Option<T> {
        let gate = self.gate(activity_id);
        let state = lock(&gate);
        if state.retired {
            return None;
        }
        Some(write())
    }

    /// Runs `remove` under the gate and retires the activity when it reports a removal.
    /// Writers already queued on the gate observe the tombstone once they acquire it.
    pub fn retire<T>(
        &self,
        activity_id: ActivityId,
        remove: impl FnOnce() -> Option<T>,
    ) -> Option<T> {
        let gate = self.gate(activity_id);
        let mut state = lock(&gate);
        if state.retired {
            return None;
        }
        let removed = remove();
        if removed.is_some() {
            state.retired = true;
        }
        removed
    }

    fn gate(&self, activity_id: ActivityId) -> Arc<Mutex<GateState>> {
        self.gates
            .entry(activity_id)
            .or_insert_with(|| Arc::new(Mutex::new(GateState::default())))
            .clone()
    }
}

// Track swaps are single inserts, so a poisoned gate guards no partial state.
fn lock(gate: &Mutex<GateState>) -> MutexGuard<'_, GateState> {
    gate.lock().unwrap_or_else(PoisonError::into_inner)
}
