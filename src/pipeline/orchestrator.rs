//! Pipeline assembly and lifecycle.
//!
//! The pump thread pulls buffers from the signal source and pushes them
//! through the sample handler, translating flow outcomes into bus
//! messages. The caller's thread runs the blocking event loop via
//! [`PipelineHandle::wait`]. The two sides share nothing but the bus, the
//! cancel channel, and an atomic running flag.

use crate::audio::buffer::Caps;
use crate::audio::source::SignalSource;
use crate::error::{MeterError, Result};
use crate::pipeline::bus::{Bus, BusMessage, Completion, PipelineState, run_message_loop};
use crate::pipeline::handler::{FlowOutcome, SampleHandler};
use crossbeam_channel::{Receiver, Sender, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

/// Configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Format requirements checked against the source once at startup.
    pub caps: Caps,
    /// Bus channel capacity.
    pub bus_capacity: usize,
    /// Log state transitions and shutdown details to stderr.
    pub verbose: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            caps: Caps::mono(),
            bus_capacity: crate::defaults::BUS_CAPACITY,
            verbose: false,
        }
    }
}

/// Cooperative cancellation handle; cloneable and cheap.
#[derive(Clone)]
pub struct CancelToken {
    running: Arc<AtomicBool>,
    tx: Sender<()>,
}

impl CancelToken {
    /// Requests shutdown: stops the pump at its next iteration and wakes
    /// the event loop. Idempotent.
    pub fn cancel(&self) {
        self.running.store(false, Ordering::SeqCst);
        // Full channel just means a cancel is already pending.
        let _ = self.tx.try_send(());
    }
}

/// Handle to a running pipeline.
pub struct PipelineHandle {
    running: Arc<AtomicBool>,
    cancel_tx: Sender<()>,
    cancel_rx: Receiver<()>,
    bus: Bus,
    pump: Option<JoinHandle<()>>,
    verbose: bool,
}

impl PipelineHandle {
    /// Returns a token that can cancel the run from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        CancelToken {
            running: self.running.clone(),
            tx: self.cancel_tx.clone(),
        }
    }

    /// Returns true if the pump has not been told to stop.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// The pipeline's message bus.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Runs the blocking event loop until end-of-stream, error, or
    /// cancellation, then tears the pipeline down.
    ///
    /// Cleanup (stopping the pump, joining its thread) happens on every
    /// exit path, including the error ones.
    pub fn wait(mut self) -> Result<Completion> {
        let outcome = run_message_loop(self.bus.receiver(), &self.cancel_rx);

        // Stop the pump whether the loop ended well or not.
        self.running.store(false, Ordering::SeqCst);
        self.join_pump();

        if self.verbose {
            eprintln!(
                "levelmeter: state {} -> {}",
                PipelineState::Playing,
                PipelineState::Stopped
            );
        }

        outcome
    }

    fn join_pump(&mut self) {
        if let Some(handle) = self.pump.take()
            && let Err(panic_info) = handle.join()
        {
            let msg = panic_info
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| panic_info.downcast_ref::<String>().map(|s| s.as_str()))
                .unwrap_or("unknown panic");
            eprintln!("levelmeter: pump thread panicked: {msg}");
        }
    }
}

/// Audio pipeline: SignalSource → SampleHandler → bus.
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Creates a pipeline with the given configuration.
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Negotiates the format, starts the source and the pump thread, and
    /// transitions the pipeline to playing.
    ///
    /// # Errors
    /// Returns a format mismatch when the source does not satisfy the
    /// configured caps, or a setup error when the source fails to start.
    pub fn start(
        self,
        mut source: Box<dyn SignalSource>,
        handler: Box<dyn SampleHandler>,
    ) -> Result<PipelineHandle> {
        let format = source.format();
        if !self.config.caps.accepts(&format) {
            return Err(MeterError::FormatMismatch {
                requested: self.config.caps.to_string(),
                actual: format.to_string(),
            });
        }

        let (bus_tx, bus_rx) = bounded(self.config.bus_capacity);
        let (cancel_tx, cancel_rx) = bounded(1);
        let running = Arc::new(AtomicBool::new(true));

        source.start()?;

        if self.config.verbose {
            eprintln!(
                "levelmeter: source '{}' negotiated {} — state {} -> {}",
                source.name(),
                format,
                PipelineState::Idle,
                PipelineState::Playing
            );
        }
        // Receiver exists and the bus is empty; this cannot block.
        let _ = bus_tx.send(BusMessage::StateChanged {
            from: PipelineState::Idle,
            to: PipelineState::Playing,
        });

        let pump_running = running.clone();
        let pump = std::thread::spawn(move || {
            pump_loop(source, handler, bus_tx, pump_running);
        });

        Ok(PipelineHandle {
            running,
            cancel_tx,
            cancel_rx,
            bus: Bus::new(bus_rx),
            pump: Some(pump),
            verbose: self.config.verbose,
        })
    }
}

/// Drives the source→handler hand-off until a terminal condition.
fn pump_loop(
    mut source: Box<dyn SignalSource>,
    mut handler: Box<dyn SampleHandler>,
    bus_tx: Sender<BusMessage>,
    running: Arc<AtomicBool>,
) {
    // Send failures mean the event loop side is already gone; nothing
    // useful is left to report to.
    while running.load(Ordering::SeqCst) {
        match source.next_buffer() {
            Ok(Some(buffer)) => match handler.on_sample(Some(&buffer)) {
                FlowOutcome::Ok => {}
                FlowOutcome::Eos => {
                    let _ = bus_tx.send(BusMessage::Eos);
                    break;
                }
                FlowOutcome::Error => {
                    let _ = bus_tx.send(BusMessage::Error {
                        message: format!("handler '{}' aborted the stream", handler.name()),
                    });
                    break;
                }
            },
            Ok(None) => {
                // Source exhausted: deliver the end-of-stream callback,
                // then report whatever the handler decided.
                match handler.on_sample(None) {
                    FlowOutcome::Error => {
                        let _ = bus_tx.send(BusMessage::Error {
                            message: format!(
                                "handler '{}' failed at end of stream",
                                handler.name()
                            ),
                        });
                    }
                    _ => {
                        let _ = bus_tx.send(BusMessage::Eos);
                    }
                }
                break;
            }
            Err(e) => {
                let _ = bus_tx.send(BusMessage::Error {
                    message: e.to_string(),
                });
                break;
            }
        }
    }

    handler.shutdown();
    if let Err(e) = source.stop() {
        eprintln!("levelmeter: source stop failed: {e}");
    }
}
