//! Push-based metering pipeline.
//!
//! A pump thread drives buffers from a [`crate::audio::SignalSource`]
//! through a [`SampleHandler`]; the caller's thread blocks on the message
//! bus until end-of-stream, error, or cancellation.

pub mod bus;
pub mod handler;
pub mod orchestrator;
pub mod sink;

pub use bus::{Bus, BusMessage, Completion, PipelineState, run_message_loop};
pub use handler::{FlowOutcome, RmsMeter, SampleHandler};
pub use orchestrator::{CancelToken, Pipeline, PipelineConfig, PipelineHandle};
pub use sink::{CollectorSink, LevelSink, StdoutSink};
