use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters for repository and DAO operations.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub entities: BTreeMap<String, EntityCounters>,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    // Method classification
    pub explicit_methods: u64,
    pub delegate_methods: u64,
    pub derived_methods: u64,

    // Execution entrypoints
    pub query_calls: u64,
    pub count_calls: u64,
    pub update_calls: u64,
    pub save_calls: u64,
    pub remove_calls: u64,

    // Rows touched
    pub rows_loaded: u64,
    pub rows_updated: u64,

    // Post-processing
    pub count_rewrites: u64,
}

///
/// EntityCounters
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EntityCounters {
    pub query_calls: u64,
    pub count_calls: u64,
    pub update_calls: u64,
    pub save_calls: u64,
    pub remove_calls: u64,
    pub rows_loaded: u64,
    pub rows_updated: u64,
    pub count_rewrites: u64,
}

///
/// EventReport
/// Snapshot handed to callers; entity counters are sorted by activity.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    pub ops: EventOps,
    pub entities: Vec<(String, EntityCounters)>,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters.
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

pub(crate) fn report() -> EventReport {
    with_state(|state| {
        let mut entities: Vec<_> = state
            .entities
            .iter()
            .map(|(name, counters)| (name.clone(), counters.clone()))
            .collect();

        entities.sort_by(|(a_name, a), (b_name, b)| {
            let a_calls = a.query_calls + a.count_calls + a.update_calls;
            let b_calls = b.query_calls + b.count_calls + b.update_calls;
            b_calls.cmp(&a_calls).then_with(|| a_name.cmp(b_name))
        });

        EventReport {
            ops: state.ops.clone(),
            entities,
        }
    })
}
