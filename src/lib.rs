//! levelmeter - Streaming RMS level meter for raw PCM audio
//!
//! Buffers flow from a signal source through a callback-driven sample
//! handler that reduces each one to a single RMS reading; a blocking
//! event loop drains the pipeline bus until end-of-stream, error, or
//! cancellation.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod pipeline;

// Core traits (source → handler → sink)
pub use audio::source::SignalSource;
pub use pipeline::handler::{FlowOutcome, SampleHandler};
pub use pipeline::sink::{CollectorSink, LevelSink, StdoutSink};

// Data types
pub use audio::buffer::{AudioFormat, Caps, MapError, SampleBuffer};
pub use audio::rms::calculate_rms;
pub use audio::tone::ToneSource;
pub use audio::wav::WavSource;

// Pipeline
pub use pipeline::bus::{Bus, BusMessage, Completion, PipelineState, run_message_loop};
pub use pipeline::handler::RmsMeter;
pub use pipeline::orchestrator::{CancelToken, Pipeline, PipelineConfig, PipelineHandle};

// Error handling
pub use error::{MeterError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
