//! Synthetic sine test tone source.
//!
//! Stands in for a hardware capture device during development and in
//! tests: a fixed-frequency tone whose RMS is known in closed form
//! (amplitude / sqrt(2)), so meter output can be checked exactly.

use crate::audio::buffer::{AudioFormat, SampleBuffer};
use crate::audio::source::SignalSource;
use crate::defaults;
use crate::error::{MeterError, Result};

/// Generates a mono S16LE sine tone in fixed-size buffers.
///
/// Bounded by `num_buffers` when set; otherwise it produces buffers until
/// the pipeline is cancelled. Phase is carried across buffers so the tone
/// is continuous at chunk boundaries.
pub struct ToneSource {
    sample_rate: u32,
    frequency: f64,
    amplitude: f64,
    chunk_size: usize,
    num_buffers: Option<u64>,
    produced: u64,
    phase: f64,
    started: bool,
}

impl ToneSource {
    /// Creates a tone source.
    ///
    /// # Errors
    /// Returns a setup error for a zero sample rate, a non-positive
    /// frequency, or an amplitude outside `0.0..=1.0`.
    pub fn new(sample_rate: u32, frequency: f64, amplitude: f64) -> Result<Self> {
        if sample_rate == 0 {
            return Err(MeterError::Setup {
                message: "tone sample rate must be non-zero".to_string(),
            });
        }
        if !(frequency > 0.0) {
            return Err(MeterError::Setup {
                message: format!("tone frequency must be positive, got {}", frequency),
            });
        }
        if !(0.0..=1.0).contains(&amplitude) {
            return Err(MeterError::Setup {
                message: format!("tone amplitude must be within 0.0..=1.0, got {}", amplitude),
            });
        }

        Ok(Self {
            sample_rate,
            frequency,
            amplitude,
            chunk_size: defaults::chunk_size(sample_rate, defaults::CHUNK_MS),
            num_buffers: None,
            produced: 0,
            phase: 0.0,
            started: false,
        })
    }

    /// Sets the number of samples per buffer.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Bounds the source to `n` buffers, after which it reports exhaustion.
    pub fn with_num_buffers(mut self, n: u64) -> Self {
        self.num_buffers = Some(n);
        self
    }

    /// Peak sample value for the configured amplitude.
    fn peak(&self) -> f64 {
        self.amplitude * i16::MAX as f64
    }
}

impl SignalSource for ToneSource {
    fn start(&mut self) -> Result<()> {
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.started = false;
        Ok(())
    }

    fn next_buffer(&mut self) -> Result<Option<SampleBuffer>> {
        if !self.started {
            return Err(MeterError::Setup {
                message: "tone source read before start".to_string(),
            });
        }
        if let Some(limit) = self.num_buffers
            && self.produced >= limit
        {
            return Ok(None);
        }

        let step = 2.0 * std::f64::consts::PI * self.frequency / self.sample_rate as f64;
        let peak = self.peak();
        let mut samples = Vec::with_capacity(self.chunk_size);
        for _ in 0..self.chunk_size {
            samples.push((peak * self.phase.sin()).round() as i16);
            self.phase += step;
            if self.phase >= 2.0 * std::f64::consts::PI {
                self.phase -= 2.0 * std::f64::consts::PI;
            }
        }

        self.produced += 1;
        Ok(Some(SampleBuffer::from_samples(&samples, self.format())))
    }

    fn format(&self) -> AudioFormat {
        AudioFormat::mono(self.sample_rate)
    }

    fn name(&self) -> &'static str {
        "tone"
    }
}
