use anyhow::Result;
use clap::Parser;
use crossbeam_channel::bounded;
use levelmeter::cli::Cli;
use levelmeter::config::Config;
use levelmeter::pipeline::handler::RmsMeter;
use levelmeter::pipeline::orchestrator::{Pipeline, PipelineConfig};
use levelmeter::pipeline::sink::StdoutSink;
use levelmeter::{Completion, SignalSource, ToneSource, WavSource, defaults};
use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?.with_env_overrides();

    let frequency = cli.frequency.unwrap_or(config.tone.frequency_hz);
    let duration = cli
        .duration
        .unwrap_or(Duration::from_millis(defaults::TONE_DURATION_MS));

    // Pick the source: explicit file, piped stdin, or the test tone.
    let source: Box<dyn SignalSource> = if let Some(ref path) = cli.input {
        let wav = WavSource::from_path(path)?;
        if !cli.quiet {
            eprintln!(
                "levelmeter: metering {} ({}, {} samples)",
                path.display(),
                wav.format(),
                wav.len()
            );
        }
        Box::new(wav)
    } else if !std::io::stdin().is_terminal() {
        // Pipe mode: stdin has WAV data
        let wav = WavSource::from_stdin()?;
        if !cli.quiet {
            eprintln!(
                "levelmeter: metering stdin ({}, {} samples)",
                wav.format(),
                wav.len()
            );
        }
        Box::new(wav)
    } else {
        let num_buffers = buffers_for(duration, config.audio.chunk_ms);
        if !cli.quiet {
            eprintln!(
                "levelmeter: metering {}Hz test tone for {} ({} buffers of {}ms)",
                frequency,
                humantime::format_duration(duration),
                num_buffers,
                config.audio.chunk_ms
            );
        }
        Box::new(
            ToneSource::new(config.audio.sample_rate, frequency, config.tone.amplitude)?
                .with_chunk_size(config.chunk_size())
                .with_num_buffers(num_buffers),
        )
    };

    let (summary_tx, summary_rx) = bounded(1);
    let handler = RmsMeter::new(Box::new(StdoutSink::new())).with_summary_tx(summary_tx);

    let pipeline = Pipeline::new(PipelineConfig {
        verbose: cli.verbose >= 1,
        ..PipelineConfig::default()
    });

    let handle = pipeline.start(source, Box::new(handler))?;
    let completion = handle.wait()?;

    if cli.verbose >= 1 {
        if let Ok(Some(summary)) = summary_rx.recv_timeout(Duration::from_secs(1)) {
            eprintln!("levelmeter: {}", summary);
        }
        if completion == Completion::Cancelled {
            eprintln!("levelmeter: run cancelled before end of stream");
        }
    }

    Ok(())
}

/// Load config: an explicit path must exist, the default path may not.
fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(Path::new("levelmeter.toml"))?,
    };
    Ok(config)
}

/// Number of buffers needed to cover `duration`, rounded up, at least one.
fn buffers_for(duration: Duration, chunk_ms: u32) -> u64 {
    let chunk_ms = chunk_ms.max(1) as u128;
    let total_ms = duration.as_millis();
    (total_ms.div_ceil(chunk_ms) as u64).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffers_for_rounds_up() {
        assert_eq!(buffers_for(Duration::from_millis(2000), 100), 20);
        assert_eq!(buffers_for(Duration::from_millis(250), 100), 3);
        assert_eq!(buffers_for(Duration::from_millis(1), 100), 1);
        assert_eq!(buffers_for(Duration::ZERO, 100), 1);
    }

    #[test]
    fn buffers_for_survives_zero_chunk() {
        assert_eq!(buffers_for(Duration::from_millis(5), 0), 5);
    }
}
