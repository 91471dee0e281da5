//! Pluggable output handlers for level readings.

use crate::error::Result;
use std::sync::{Arc, Mutex};

/// Pluggable output handler for the meter.
/// Pairs with SignalSource for input - this handles the computed levels.
pub trait LevelSink: Send + 'static {
    /// Handle one RMS reading. Called once per buffer.
    fn handle(&mut self, rms: f64) -> Result<()>;

    /// Called on pipeline shutdown. Return a summary line if applicable.
    fn finish(&mut self) -> Option<String> {
        None
    }

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "sink"
    }
}

/// Running min/max/mean over the readings a sink has seen.
#[derive(Debug, Clone, Copy, Default)]
struct LevelStats {
    count: u64,
    min: f64,
    max: f64,
    sum: f64,
}

impl LevelStats {
    fn record(&mut self, rms: f64) {
        if self.count == 0 {
            self.min = rms;
            self.max = rms;
        } else {
            self.min = self.min.min(rms);
            self.max = self.max.max(rms);
        }
        self.count += 1;
        self.sum += rms;
    }

    fn summary(&self) -> Option<String> {
        if self.count == 0 {
            return None;
        }
        Some(format!(
            "buffers={} min={:.3} max={:.3} mean={:.3}",
            self.count,
            self.min,
            self.max,
            self.sum / self.count as f64
        ))
    }
}

/// Prints one `rms: <value>` line per buffer to stdout.
pub struct StdoutSink {
    stats: LevelStats,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self {
            stats: LevelStats::default(),
        }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelSink for StdoutSink {
    fn handle(&mut self, rms: f64) -> Result<()> {
        self.stats.record(rms);
        println!("rms: {}", rms);
        Ok(())
    }

    fn finish(&mut self) -> Option<String> {
        self.stats.summary()
    }

    fn name(&self) -> &'static str {
        "stdout"
    }
}

/// Collects readings behind a shared handle for library use and tests.
pub struct CollectorSink {
    values: Arc<Mutex<Vec<f64>>>,
    stats: LevelStats,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self {
            values: Arc::new(Mutex::new(Vec::new())),
            stats: LevelStats::default(),
        }
    }

    /// Shared handle to the collected readings.
    ///
    /// Clone this before boxing the sink into the pipeline; it stays valid
    /// after the run finishes.
    pub fn values_handle(&self) -> Arc<Mutex<Vec<f64>>> {
        Arc::clone(&self.values)
    }
}

impl Default for CollectorSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelSink for CollectorSink {
    fn handle(&mut self, rms: f64) -> Result<()> {
        self.stats.record(rms);
        if let Ok(mut values) = self.values.lock() {
            values.push(rms);
        }
        Ok(())
    }

    fn finish(&mut self) -> Option<String> {
        self.stats.summary()
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}
