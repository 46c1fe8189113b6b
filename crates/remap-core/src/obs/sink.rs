//! Metrics sink boundary.
//!
//! All instrumentation flows through `MetricsEvent` and `MetricsSink`.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug)]
pub enum MetricsEvent {
    BindingBuilt {
        source: &'static str,
        target: &'static str,
        bindings: u64,
    },
    MappingCompiled {
        source: &'static str,
        target: &'static str,
        ops: u64,
    },
    MappingExecuted {
        source: &'static str,
        target: &'static str,
        issues: u64,
    },
    MappingFailed {
        source: &'static str,
        target: &'static str,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink: Send + Sync {
    fn record(&self, event: MetricsEvent);
}

///
/// NoopSink
///

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl MetricsSink for NoopSink {
    fn record(&self, _: MetricsEvent) {}
}

///
/// CounterSink
/// Process-local counters, readable as a serializable report.
///

#[derive(Debug, Default)]
pub struct CounterSink {
    bindings_built: AtomicU64,
    mappings_compiled: AtomicU64,
    mappings_executed: AtomicU64,
    mappings_failed: AtomicU64,
    issues: AtomicU64,
}

impl CounterSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn report(&self) -> MetricsReport {
        MetricsReport {
            bindings_built: self.bindings_built.load(Ordering::Relaxed),
            mappings_compiled: self.mappings_compiled.load(Ordering::Relaxed),
            mappings_executed: self.mappings_executed.load(Ordering::Relaxed),
            mappings_failed: self.mappings_failed.load(Ordering::Relaxed),
            issues: self.issues.load(Ordering::Relaxed),
        }
    }
}

impl MetricsSink for CounterSink {
    fn record(&self, event: MetricsEvent) {
        match event {
            MetricsEvent::BindingBuilt { .. } => {
                self.bindings_built.fetch_add(1, Ordering::Relaxed);
            }
            MetricsEvent::MappingCompiled { .. } => {
                self.mappings_compiled.fetch_add(1, Ordering::Relaxed);
            }
            MetricsEvent::MappingExecuted { issues, .. } => {
                self.mappings_executed.fetch_add(1, Ordering::Relaxed);
                self.issues.fetch_add(issues, Ordering::Relaxed);
            }
            MetricsEvent::MappingFailed { .. } => {
                self.mappings_failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

///
/// MetricsReport
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct MetricsReport {
    pub bindings_built: u64,
    pub mappings_compiled: u64,
    pub mappings_executed: u64,
    pub mappings_failed: u64,
    pub issues: u64,
}
