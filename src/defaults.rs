//! Default configuration constants for levelmeter.
//!
//! Shared between the config layer, the CLI, and the signal sources so the
//! numbers live in exactly one place.

/// Default audio sample rate in Hz.
///
/// 44.1kHz matches what most consumer audio sources produce. The meter
/// itself is rate-agnostic; the rate only determines how much wall-clock
/// time one buffer covers.
pub const SAMPLE_RATE: u32 = 44_100;

/// Number of channels the meter accepts.
///
/// The format is negotiated once at pipeline start and stays fixed for the
/// whole run. Multi-channel sources are mixed down before they reach the
/// meter.
pub const CHANNELS: u16 = 1;

/// Default buffer duration in milliseconds.
///
/// One RMS value is emitted per buffer, so this is also the meter's output
/// rate: 100ms buffers produce ten readings per second.
pub const CHUNK_MS: u32 = 100;

/// Default test tone frequency in Hz (concert pitch A4).
pub const TONE_FREQUENCY_HZ: f64 = 440.0;

/// Default test tone amplitude as a fraction of full scale (0.0 to 1.0).
///
/// 0.8 leaves headroom so the generated samples never clip at i16 range
/// boundaries even with rounding.
pub const TONE_AMPLITUDE: f64 = 0.8;

/// Default test tone run time in milliseconds when no duration is given.
pub const TONE_DURATION_MS: u64 = 2_000;

/// Capacity of the pipeline message bus.
///
/// Terminal messages (end-of-stream, error) arrive at most once per run;
/// the capacity only needs to absorb state-change chatter while the event
/// loop is between polls.
pub const BUS_CAPACITY: usize = 64;

/// Samples per buffer for a given rate and buffer duration.
///
/// Never returns zero; a degenerate configuration is rounded up to a single
/// sample so the pipeline always makes progress.
pub fn chunk_size(sample_rate: u32, chunk_ms: u32) -> usize {
    let samples = (sample_rate as u64 * chunk_ms as u64) / 1000;
    samples.max(1) as usize
}
