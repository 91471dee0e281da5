//! Audio formats, buffers, and signal sources.

pub mod buffer;
pub mod rms;
pub mod source;
pub mod tone;
pub mod wav;

pub use buffer::{AudioFormat, Caps, MapError, SampleBuffer};
pub use rms::calculate_rms;
pub use source::SignalSource;
pub use tone::ToneSource;
pub use wav::WavSource;
