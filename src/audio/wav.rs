//! WAV file signal source for file and pipe mode.

use crate::audio::buffer::{AudioFormat, SampleBuffer};
use crate::audio::source::SignalSource;
use crate::defaults;
use crate::error::{MeterError, Result};
use std::io::Read;
use std::path::Path;

/// Signal source backed by WAV data.
///
/// Multi-channel input is mixed down to mono by averaging; the original
/// sample rate is kept (the meter is rate-agnostic, the rate only affects
/// how much time one buffer covers).
pub struct WavSource {
    samples: Vec<i16>,
    sample_rate: u32,
    position: usize,
    chunk_size: usize,
}

impl WavSource {
    /// Create from any reader (for testing/flexibility).
    pub fn from_reader(reader: Box<dyn Read + Send>) -> Result<Self> {
        let mut wav_reader = hound::WavReader::new(reader).map_err(|e| MeterError::WavRead {
            message: format!("failed to parse WAV header: {}", e),
        })?;

        let spec = wav_reader.spec();
        let source_rate = spec.sample_rate;
        let source_channels = spec.channels as usize;

        if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
            return Err(MeterError::WavRead {
                message: format!(
                    "unsupported WAV format: {}-bit {:?}, expected 16-bit integer",
                    spec.bits_per_sample, spec.sample_format
                ),
            });
        }

        let raw_samples: Vec<i16> = wav_reader
            .samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| MeterError::WavRead {
                message: format!("failed to read WAV samples: {}", e),
            })?;

        // Mix down to mono by averaging interleaved channels
        let samples = if source_channels <= 1 {
            raw_samples
        } else {
            raw_samples
                .chunks_exact(source_channels)
                .map(|frame| {
                    let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                    (sum / source_channels as i32) as i16
                })
                .collect()
        };

        Ok(Self {
            samples,
            sample_rate: source_rate,
            position: 0,
            chunk_size: defaults::chunk_size(source_rate, defaults::CHUNK_MS),
        })
    }

    /// Create from a WAV file on disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(Box::new(std::io::BufReader::new(file)))
    }

    /// Create from stdin.
    pub fn from_stdin() -> Result<Self> {
        use std::io::Cursor;

        // Read all data from stdin into memory first (StdinLock is not Send)
        let mut buffer = Vec::new();
        std::io::stdin().lock().read_to_end(&mut buffer)?;

        Self::from_reader(Box::new(Cursor::new(buffer)))
    }

    /// Sets the number of samples per buffer.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Total number of mono samples in the source.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the source holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl SignalSource for WavSource {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn next_buffer(&mut self) -> Result<Option<SampleBuffer>> {
        if self.position >= self.samples.len() {
            return Ok(None);
        }

        let end = std::cmp::min(self.position + self.chunk_size, self.samples.len());
        let chunk = &self.samples[self.position..end];
        self.position = end;

        Ok(Some(SampleBuffer::from_samples(chunk, self.format())))
    }

    fn format(&self) -> AudioFormat {
        AudioFormat::mono(self.sample_rate)
    }

    fn name(&self) -> &'static str {
        "wav"
    }
}
