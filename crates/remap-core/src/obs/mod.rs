//! Observability boundary for the mapper.
//!
//! Engine code reports through `MetricsEvent` and a `MetricsSink`; the
//! mapper defaults to `NoopSink`.

pub mod sink;

pub use sink::{CounterSink, MetricsEvent, MetricsReport, MetricsSink, NoopSink};
