//! Error types for levelmeter.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MeterError {
    // Setup errors — surfaced before the event loop starts
    #[error("Pipeline setup failed: {message}")]
    Setup { message: String },

    #[error("Audio format mismatch: requested {requested}, source offers {actual}")]
    FormatMismatch { requested: String, actual: String },

    #[error("Failed to read WAV input: {message}")]
    WavRead { message: String },

    // Stream errors — an error message arrived on the bus during playback
    #[error("Stream error: {message}")]
    Stream { message: String },

    // The bus disconnected without delivering a terminal message. Kept
    // distinct from end-of-stream so an unexpected source closure is not
    // reported as a clean finish.
    #[error("Pipeline bus closed without end-of-stream")]
    BusClosed,

    // Sink errors — emitting a level reading failed
    #[error("Level sink failed: {message}")]
    Sink { message: String },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, MeterError>;
