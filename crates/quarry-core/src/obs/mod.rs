//! Observability: runtime counters and the metrics sink boundary.
//!
//! Execution code never touches `metrics` state directly; everything
//! flows through `MetricsEvent` and `MetricsSink`.

pub(crate) mod metrics;
pub(crate) mod sink;


// re-exports
pub use metrics::{EntityCounters, EventOps, EventReport, EventState};
pub use sink::{ExecKind, MetricsEvent, MetricsSink, metrics_report, metrics_reset_all};
