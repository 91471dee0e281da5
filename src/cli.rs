//! Command-line interface for levelmeter
//!
//! Provides argument parsing using clap derive macros.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Streaming RMS level meter for raw PCM audio
#[derive(Parser, Debug)]
#[command(
    name = "levelmeter",
    version,
    about = "Streaming RMS level meter for raw PCM audio"
)]
pub struct Cli {
    /// WAV file to meter instead of the generated test tone
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Test tone frequency in Hz
    #[arg(short, long, value_name = "HZ")]
    pub frequency: Option<f64>,

    /// How long to run the test tone. Examples: 500ms, 2s, 1m30s
    #[arg(short, long, value_name = "DURATION", value_parser = parse_duration_arg)]
    pub duration: Option<Duration>,

    /// Suppress diagnostic output (RMS values still go to stdout)
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose output (state transitions and a summary line on stderr)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Parse a duration string.
///
/// Supports any format accepted by `humantime`: bare numbers (seconds),
/// single-unit (`500ms`, `2s`), and compound (`1m30s`).
fn parse_duration_arg(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    // Bare number → seconds
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_with_no_args() {
        let cli = Cli::parse_from(["levelmeter"]);
        assert!(cli.input.is_none());
        assert!(cli.frequency.is_none());
        assert!(cli.duration.is_none());
        assert!(!cli.quiet);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn duration_accepts_humantime_and_bare_seconds() {
        assert_eq!(parse_duration_arg("2"), Ok(Duration::from_secs(2)));
        assert_eq!(parse_duration_arg("500ms"), Ok(Duration::from_millis(500)));
        assert_eq!(parse_duration_arg("1m30s"), Ok(Duration::from_secs(90)));
        assert!(parse_duration_arg("soon").is_err());
    }

    #[test]
    fn flags_parse() {
        let cli = Cli::parse_from([
            "levelmeter",
            "--input",
            "take.wav",
            "--frequency",
            "880",
            "--duration",
            "250ms",
            "-q",
            "-vv",
        ]);
        assert_eq!(cli.input.unwrap().to_str().unwrap(), "take.wav");
        assert_eq!(cli.frequency, Some(880.0));
        assert_eq!(cli.duration, Some(Duration::from_millis(250)));
        assert!(cli.quiet);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn cli_debug_assert() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
