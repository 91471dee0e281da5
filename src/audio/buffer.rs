//! Sample buffers and format negotiation types.
//!
//! A [`SampleBuffer`] carries the raw byte payload a source produced plus
//! the format it was declared with. Decoding the payload into samples is
//! fallible: a payload that is not a whole number of S16LE samples cannot
//! be mapped for reading, and the sample handler turns that into a flow
//! error instead of guessing.

use std::fmt;
use thiserror::Error;

/// Concrete format of a running stream: signed 16-bit little-endian PCM
/// at a fixed rate and channel count. Declared once at pipeline start,
/// never renegotiated during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: u16,
}

impl AudioFormat {
    /// Creates a mono S16LE format at the given rate.
    pub fn mono(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: 1,
        }
    }

    /// Duration in milliseconds covered by `sample_count` samples.
    pub fn duration_ms(&self, sample_count: usize) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        let frames = sample_count as u64 / self.channels.max(1) as u64;
        frames * 1000 / self.sample_rate as u64
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S16LE, {}ch, {}Hz", self.channels, self.sample_rate)
    }
}

/// Capabilities requested from a source, checked once when the pipeline
/// starts. `None` fields accept whatever the source offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caps {
    /// Required channel count, if any.
    pub channels: Option<u16>,
    /// Required sample rate, if any.
    pub sample_rate: Option<u32>,
}

impl Caps {
    /// Caps requiring mono input at any rate — the meter's default.
    pub fn mono() -> Self {
        Self {
            channels: Some(1),
            sample_rate: None,
        }
    }

    /// Caps accepting anything the source offers.
    pub fn any() -> Self {
        Self {
            channels: None,
            sample_rate: None,
        }
    }

    /// Pins the required sample rate.
    pub fn with_sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = Some(rate);
        self
    }

    /// Returns true if a source with the given format satisfies these caps.
    pub fn accepts(&self, format: &AudioFormat) -> bool {
        if let Some(channels) = self.channels
            && channels != format.channels
        {
            return false;
        }
        if let Some(rate) = self.sample_rate
            && rate != format.sample_rate
        {
            return false;
        }
        true
    }
}

impl fmt::Display for Caps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S16LE")?;
        if let Some(channels) = self.channels {
            write!(f, ", {}ch", channels)?;
        }
        if let Some(rate) = self.sample_rate {
            write!(f, ", {}Hz", rate)?;
        }
        Ok(())
    }
}

/// The payload could not be mapped as S16LE samples.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("buffer of {len} bytes is not a whole number of S16LE samples")]
pub struct MapError {
    /// Payload length in bytes.
    pub len: usize,
}

/// One buffer of raw audio as produced by a signal source.
///
/// The handler borrows a buffer only for the duration of its callback;
/// nothing downstream retains a reference past that call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBuffer {
    data: Vec<u8>,
    format: AudioFormat,
}

impl SampleBuffer {
    /// Wraps a raw byte payload in the given format.
    pub fn from_bytes(data: Vec<u8>, format: AudioFormat) -> Self {
        Self { data, format }
    }

    /// Encodes samples as S16LE bytes.
    pub fn from_samples(samples: &[i16], format: AudioFormat) -> Self {
        let mut data = Vec::with_capacity(samples.len() * 2);
        for sample in samples {
            data.extend_from_slice(&sample.to_le_bytes());
        }
        Self { data, format }
    }

    /// The declared format of this buffer.
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Payload length in bytes.
    pub fn len_bytes(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Maps the payload for reading as signed 16-bit samples.
    ///
    /// Fails when the payload length is odd — the buffer exists but its
    /// contents cannot be interpreted in the negotiated format.
    pub fn samples(&self) -> std::result::Result<Vec<i16>, MapError> {
        if self.data.len() % 2 != 0 {
            return Err(MapError {
                len: self.data.len(),
            });
        }
        Ok(self
            .data
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect())
    }
}
