//! Metrics sink boundary.
//!
//! This module is the only bridge between execution logic and the
//! thread-local metrics state.
use crate::{db::MethodKind, obs::metrics};

///
/// ExecKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExecKind {
    Query,
    Count,
    Update,
    Save,
    Remove,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug)]
pub enum MetricsEvent {
    Classified {
        kind: MethodKind,
        entity: &'static str,
    },
    ExecStart {
        kind: ExecKind,
        entity: &'static str,
    },
    ExecFinish {
        kind: ExecKind,
        entity: &'static str,
        rows: u64,
    },
    CountRewrite {
        entity: &'static str,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink: Sync {
    fn record(&self, event: MetricsEvent);
}

///
/// GlobalMetricsSink
/// Default sink that writes into the thread-local event state.
///

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        match event {
            MetricsEvent::Classified { kind, .. } => {
                metrics::with_state_mut(|m| {
                    let counter = match kind {
                        MethodKind::Explicit => &mut m.ops.explicit_methods,
                        MethodKind::Delegate => &mut m.ops.delegate_methods,
                        MethodKind::Derive => &mut m.ops.derived_methods,
                    };
                    *counter = counter.saturating_add(1);
                });
            }

            MetricsEvent::ExecStart { kind, entity } => {
                metrics::with_state_mut(|m| {
                    let global = match kind {
                        ExecKind::Query => &mut m.ops.query_calls,
                        ExecKind::Count => &mut m.ops.count_calls,
                        ExecKind::Update => &mut m.ops.update_calls,
                        ExecKind::Save => &mut m.ops.save_calls,
                        ExecKind::Remove => &mut m.ops.remove_calls,
                    };
                    *global = global.saturating_add(1);

                    let entry = m.entities.entry(entity.to_string()).or_default();
                    let local = match kind {
                        ExecKind::Query => &mut entry.query_calls,
                        ExecKind::Count => &mut entry.count_calls,
                        ExecKind::Update => &mut entry.update_calls,
                        ExecKind::Save => &mut entry.save_calls,
                        ExecKind::Remove => &mut entry.remove_calls,
                    };
                    *local = local.saturating_add(1);
                });
            }

            MetricsEvent::ExecFinish { kind, entity, rows } => {
                metrics::with_state_mut(|m| match kind {
                    ExecKind::Query => {
                        m.ops.rows_loaded = m.ops.rows_loaded.saturating_add(rows);
                        let entry = m.entities.entry(entity.to_string()).or_default();
                        entry.rows_loaded = entry.rows_loaded.saturating_add(rows);
                    }
                    ExecKind::Update | ExecKind::Save | ExecKind::Remove => {
                        m.ops.rows_updated = m.ops.rows_updated.saturating_add(rows);
                        let entry = m.entities.entry(entity.to_string()).or_default();
                        entry.rows_updated = entry.rows_updated.saturating_add(rows);
                    }
                    ExecKind::Count => {}
                });
            }

            MetricsEvent::CountRewrite { entity } => {
                metrics::with_state_mut(|m| {
                    m.ops.count_rewrites = m.ops.count_rewrites.saturating_add(1);
                    let entry = m.entities.entry(entity.to_string()).or_default();
                    entry.count_rewrites = entry.count_rewrites.saturating_add(1);
                });
            }
        }
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

/// Record an event on the given sink, or the global sink when none is set.
pub(crate) fn record(sink: Option<&dyn MetricsSink>, event: MetricsEvent) {
    match sink {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the current metrics state.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all metrics state.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

///
/// Span
/// RAII guard that emits start/finish events for one execution.
/// Finish accounting happens even when the execution returns early.
///

pub(crate) struct Span<'s> {
    sink: Option<&'s dyn MetricsSink>,
    kind: ExecKind,
    entity: &'static str,
    rows: u64,
}

impl<'s> Span<'s> {
    #[must_use]
    pub(crate) fn new(
        sink: Option<&'s dyn MetricsSink>,
        kind: ExecKind,
        entity: &'static str,
    ) -> Self {
        record(sink, MetricsEvent::ExecStart { kind, entity });

        Self {
            sink,
            kind,
            entity,
            rows: 0,
        }
    }

    pub(crate) const fn set_rows(&mut self, rows: u64) {
        self.rows = rows;
    }
}

impl Drop for Span<'_> {
    fn drop(&mut self) {
        record(
            self.sink,
            MetricsEvent::ExecFinish {
                kind: self.kind,
                entity: self.entity,
                rows: self.rows,
            },
        );
    }
}
