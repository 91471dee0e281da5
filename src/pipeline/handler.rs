//! Sample-arrival callback: the RMS meter itself.

use crate::audio::buffer::SampleBuffer;
use crate::audio::rms::calculate_rms;
use crate::pipeline::sink::LevelSink;

/// Outcome of one sample callback, mirrored onto the bus by the pump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
    /// Buffer processed; keep the stream flowing.
    Ok,
    /// The stream is done; terminate downstream.
    Eos,
    /// Processing failed; abort the flow.
    Error,
}

/// Per-buffer callback invoked by the pump thread as data arrives.
///
/// The buffer is borrowed for the duration of the call only; handlers
/// must not retain it. `None` signals end-of-stream.
pub trait SampleHandler: Send {
    /// Handles one arriving sample buffer, or the end of the stream.
    fn on_sample(&mut self, buffer: Option<&SampleBuffer>) -> FlowOutcome;

    /// Called once after the last `on_sample`, on every shutdown path.
    fn shutdown(&mut self) {}

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "handler"
    }
}

/// Computes one RMS value per buffer and emits it to a [`LevelSink`].
///
/// Stateless across buffers apart from a counter; every reading is an
/// independent reduction of exactly one buffer.
pub struct RmsMeter {
    sink: Box<dyn LevelSink>,
    buffers_seen: u64,
    summary_tx: Option<crossbeam_channel::Sender<Option<String>>>,
}

impl RmsMeter {
    pub fn new(sink: Box<dyn LevelSink>) -> Self {
        Self {
            sink,
            buffers_seen: 0,
            summary_tx: None,
        }
    }

    /// Delivers the sink's summary line through `tx` at shutdown.
    pub fn with_summary_tx(mut self, tx: crossbeam_channel::Sender<Option<String>>) -> Self {
        self.summary_tx = Some(tx);
        self
    }

    /// Number of buffers processed so far.
    pub fn buffers_seen(&self) -> u64 {
        self.buffers_seen
    }
}

impl SampleHandler for RmsMeter {
    fn on_sample(&mut self, buffer: Option<&SampleBuffer>) -> FlowOutcome {
        let Some(buffer) = buffer else {
            return FlowOutcome::Eos;
        };

        let samples = match buffer.samples() {
            Ok(samples) => samples,
            Err(e) => {
                eprintln!("levelmeter: {}", e);
                return FlowOutcome::Error;
            }
        };

        // Empty buffers are valid and meter as silence.
        let rms = calculate_rms(&samples);
        self.buffers_seen += 1;

        match self.sink.handle(rms) {
            Ok(()) => FlowOutcome::Ok,
            Err(e) => {
                eprintln!("levelmeter: sink '{}' failed: {}", self.sink.name(), e);
                FlowOutcome::Error
            }
        }
    }

    fn shutdown(&mut self) {
        let summary = self.sink.finish();
        if let Some(tx) = self.summary_tx.take()
            && tx.send(summary).is_err()
        {
            eprintln!("levelmeter: meter shutdown — summary receiver already dropped");
        }
    }

    fn name(&self) -> &'static str {
        "rms-meter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::buffer::AudioFormat;
    use crate::error::MeterError;
    use crate::pipeline::sink::CollectorSink;

    fn buffer_of(samples: &[i16]) -> SampleBuffer {
        SampleBuffer::from_samples(samples, AudioFormat::mono(44100))
    }

    #[test]
    fn absent_buffer_yields_eos() {
        let mut meter = RmsMeter::new(Box::new(CollectorSink::new()));
        assert_eq!(meter.on_sample(None), FlowOutcome::Eos);
        assert_eq!(meter.buffers_seen(), 0);
    }

    #[test]
    fn unreadable_buffer_yields_error() {
        let mut meter = RmsMeter::new(Box::new(CollectorSink::new()));
        let bad = SampleBuffer::from_bytes(vec![1, 2, 3], AudioFormat::mono(44100));
        assert_eq!(meter.on_sample(Some(&bad)), FlowOutcome::Error);
    }

    #[test]
    fn readable_buffer_reaches_the_sink() {
        let sink = CollectorSink::new();
        let values = sink.values_handle();
        let mut meter = RmsMeter::new(Box::new(sink));

        assert_eq!(meter.on_sample(Some(&buffer_of(&[3, 4]))), FlowOutcome::Ok);
        assert_eq!(meter.on_sample(Some(&buffer_of(&[0, 0]))), FlowOutcome::Ok);

        let collected = values.lock().unwrap();
        assert_eq!(collected.len(), 2);
        assert!((collected[0] - 12.5f64.sqrt()).abs() < 1e-12);
        assert_eq!(collected[1], 0.0);
        drop(collected);
        assert_eq!(meter.buffers_seen(), 2);
    }

    #[test]
    fn empty_buffer_meters_as_silence() {
        let sink = CollectorSink::new();
        let values = sink.values_handle();
        let mut meter = RmsMeter::new(Box::new(sink));

        assert_eq!(meter.on_sample(Some(&buffer_of(&[]))), FlowOutcome::Ok);
        assert_eq!(*values.lock().unwrap(), vec![0.0]);
    }

    struct FailingSink;

    impl LevelSink for FailingSink {
        fn handle(&mut self, _rms: f64) -> crate::error::Result<()> {
            Err(MeterError::Sink {
                message: "refused".to_string(),
            })
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[test]
    fn sink_failure_yields_flow_error() {
        let mut meter = RmsMeter::new(Box::new(FailingSink));
        assert_eq!(
            meter.on_sample(Some(&buffer_of(&[1, 2]))),
            FlowOutcome::Error
        );
    }

    #[test]
    fn shutdown_sends_summary_through_channel() {
        let sink = CollectorSink::new();
        let (tx, rx) = crossbeam_channel::bounded(1);
        let mut meter = RmsMeter::new(Box::new(sink)).with_summary_tx(tx);

        meter.on_sample(Some(&buffer_of(&[10, 10])));
        meter.shutdown();

        let summary = rx.recv().unwrap().unwrap();
        assert!(summary.contains("buffers=1"), "got: {}", summary);
    }

    #[test]
    fn shutdown_without_readings_sends_none() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let mut meter = RmsMeter::new(Box::new(CollectorSink::new())).with_summary_tx(tx);

        meter.shutdown();
        assert_eq!(rx.recv().unwrap(), None);
    }

    #[test]
    fn shutdown_with_dropped_receiver_does_not_panic() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        drop(rx);
        let mut meter = RmsMeter::new(Box::new(CollectorSink::new())).with_summary_tx(tx);
        meter.shutdown();
    }

    /// Handler injected as a narrow interface — no shared mutable state
    /// between the caller and the meter beyond the sink handle.
    #[test]
    fn handler_is_object_safe() {
        let _handler: Box<dyn SampleHandler> = Box::new(RmsMeter::new(Box::new(StubSink)));
    }

    struct StubSink;
    impl LevelSink for StubSink {
        fn handle(&mut self, _rms: f64) -> crate::error::Result<()> {
            Ok(())
        }
    }
}
