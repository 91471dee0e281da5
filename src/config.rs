//! TOML configuration with environment overrides.

use crate::defaults;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub tone: ToneConfig,
}

/// Audio buffering configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate for generated signals, in Hz.
    pub sample_rate: u32,
    /// Buffer duration in milliseconds; one RMS reading per buffer.
    pub chunk_ms: u32,
}

/// Test tone configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToneConfig {
    /// Tone frequency in Hz.
    pub frequency_hz: f64,
    /// Amplitude as a fraction of full scale (0.0 to 1.0).
    pub amplitude: f64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            chunk_ms: defaults::CHUNK_MS,
        }
    }
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            frequency_hz: defaults::TONE_FREQUENCY_HZ,
            amplitude: defaults::TONE_AMPLITUDE,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file is missing or contains invalid TOML.
    /// Missing fields use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only falls back to defaults when the file is missing; invalid TOML
    /// is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(crate::error::MeterError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - LEVELMETER_SAMPLE_RATE → audio.sample_rate
    /// - LEVELMETER_FREQUENCY → tone.frequency_hz
    ///
    /// Unparseable values are ignored with a warning.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(raw) = std::env::var("LEVELMETER_SAMPLE_RATE")
            && !raw.is_empty()
        {
            match raw.parse::<u32>() {
                Ok(rate) => self.audio.sample_rate = rate,
                Err(_) => eprintln!(
                    "levelmeter: ignoring unparseable LEVELMETER_SAMPLE_RATE={:?}",
                    raw
                ),
            }
        }
        if let Ok(raw) = std::env::var("LEVELMETER_FREQUENCY")
            && !raw.is_empty()
        {
            match raw.parse::<f64>() {
                Ok(freq) => self.tone.frequency_hz = freq,
                Err(_) => eprintln!(
                    "levelmeter: ignoring unparseable LEVELMETER_FREQUENCY={:?}",
                    raw
                ),
            }
        }
        self
    }

    /// Samples per buffer for the configured rate and chunk duration.
    pub fn chunk_size(&self) -> usize {
        defaults::chunk_size(self.audio.sample_rate, self.audio.chunk_ms)
    }
}
