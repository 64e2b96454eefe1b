//! Scalar metrics sinks.
//!
//! The pipelines never reach for a global run context. Whoever drives them
//! hands in a [`MetricsSink`], and every counter the run produces is pushed
//! through it as a `(key, value)` pair.

/// Destination for key/value scalars emitted by a pipeline run.
pub trait MetricsSink {
    /// Record one scalar under `key`.
    fn record(&mut self, key: &str, value: f64);
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl MetricsSink for NoopSink {
    fn record(&mut self, _key: &str, _value: f64) {}
}

/// Forwards every metric to the `log` facade at info level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl MetricsSink for LogSink {
    fn record(&mut self, key: &str, value: f64) {
        log::info!("metric {key}={value}");
    }
}

/// Keeps every recorded metric in memory, in recording order.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    pub entries: Vec<(String, f64)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the most recent value recorded under `key`.
    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| *v)
    }
}

impl MetricsSink for MemorySink {
    fn record(&mut self, key: &str, value: f64) {
        self.entries.push((key.to_string(), value));
    }
}

impl<S: MetricsSink + ?Sized> MetricsSink for &mut S {
    fn record(&mut self, key: &str, value: f64) {
        (**self).record(key, value);
    }
}
