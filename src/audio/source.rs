//! Signal source abstraction.

use crate::audio::buffer::{AudioFormat, SampleBuffer};
use crate::error::Result;

/// A producer of raw audio buffers.
///
/// Sources are pulled by the pipeline's pump thread; they declare their
/// format up front so caps negotiation can happen once, before any data
/// flows.
pub trait SignalSource: Send {
    /// Prepares the source for reading. Called once before the first buffer.
    fn start(&mut self) -> Result<()>;

    /// Releases whatever the source holds. Called on every shutdown path.
    fn stop(&mut self) -> Result<()>;

    /// Produces the next buffer, or `None` when the source is exhausted.
    fn next_buffer(&mut self) -> Result<Option<SampleBuffer>>;

    /// The fixed format this source produces.
    fn format(&self) -> AudioFormat;

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "source"
    }
}
