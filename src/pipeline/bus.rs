//! Pipeline message bus and the blocking event loop that drains it.

use crate::error::{MeterError, Result};
use crossbeam_channel::{Receiver, RecvError, select};
use std::fmt;
use std::time::Duration;

/// Lifecycle states of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Built but not yet producing data.
    Idle,
    /// Pump running, buffers flowing.
    Playing,
    /// Terminal; the run finished one way or the other.
    Stopped,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => write!(f, "idle"),
            PipelineState::Playing => write!(f, "playing"),
            PipelineState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Messages delivered on the pipeline bus.
///
/// Only `Eos` and `Error` are terminal; everything else is informational
/// and discarded by the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusMessage {
    /// The pipeline moved between lifecycle states.
    StateChanged {
        from: PipelineState,
        to: PipelineState,
    },
    /// End of stream; the source is done and all buffers were processed.
    Eos,
    /// A fatal stream error with a human-readable description.
    Error { message: String },
}

/// How a run ended, short of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// End-of-stream was observed.
    Eos,
    /// The run was cancelled before the stream ended.
    Cancelled,
}

/// Receiving half of the pipeline bus.
pub struct Bus {
    rx: Receiver<BusMessage>,
}

impl Bus {
    pub(crate) fn new(rx: Receiver<BusMessage>) -> Self {
        Self { rx }
    }

    /// Pops the next message, blocking forever when `timeout` is `None`.
    ///
    /// Returns `None` on timeout or when the bus has disconnected.
    pub fn pop(&self, timeout: Option<Duration>) -> Option<BusMessage> {
        match timeout {
            Some(limit) => self.rx.recv_timeout(limit).ok(),
            None => self.rx.recv().ok(),
        }
    }

    /// The underlying receiver, for use with `select!`.
    pub fn receiver(&self) -> &Receiver<BusMessage> {
        &self.rx
    }
}

/// Classifies one bus receive result.
///
/// `Ok(Some(_))` ends the loop successfully, `Ok(None)` means keep going,
/// `Err` ends the loop with a failure.
fn dispatch(msg: std::result::Result<BusMessage, RecvError>) -> Result<Option<Completion>> {
    match msg {
        Ok(BusMessage::Eos) => Ok(Some(Completion::Eos)),
        Ok(BusMessage::Error { message }) => Err(MeterError::Stream { message }),
        // Non-terminal messages (state changes) are ignored.
        Ok(_) => Ok(None),
        // Sender gone without a terminal message. Deliberately NOT treated
        // as end-of-stream: an unexpectedly closed source is a failure.
        Err(RecvError) => Err(MeterError::BusClosed),
    }
}

/// Drains the bus until a terminal condition.
///
/// Blocks on `bus` and `cancel` simultaneously: an `Eos` message completes
/// the run, an `Error` message fails it, and a cancellation signal ends it
/// early with [`Completion::Cancelled`]. If the cancel channel disconnects
/// (no caller holds a cancel handle anymore) the loop falls back to
/// blocking on the bus alone.
pub fn run_message_loop(bus: &Receiver<BusMessage>, cancel: &Receiver<()>) -> Result<Completion> {
    loop {
        select! {
            recv(bus) -> msg => {
                if let Some(completion) = dispatch(msg)? {
                    return Ok(completion);
                }
            }
            recv(cancel) -> signal => match signal {
                Ok(()) => return Ok(Completion::Cancelled),
                // Cancel handles all dropped; cancellation can no longer
                // happen, so stop selecting on the dead channel.
                Err(RecvError) => return run_bus_only(bus),
            },
        }
    }
}

fn run_bus_only(bus: &Receiver<BusMessage>) -> Result<Completion> {
    loop {
        if let Some(completion) = dispatch(bus.recv())? {
            return Ok(completion);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{bounded, unbounded};

    fn other() -> BusMessage {
        BusMessage::StateChanged {
            from: PipelineState::Idle,
            to: PipelineState::Playing,
        }
    }

    #[test]
    fn other_messages_are_discarded_until_eos() {
        let (tx, rx) = unbounded();
        let (_cancel_tx, cancel_rx) = bounded::<()>(1);

        tx.send(other()).unwrap();
        tx.send(other()).unwrap();
        tx.send(BusMessage::Eos).unwrap();

        let completion = run_message_loop(&rx, &cancel_rx).unwrap();
        assert_eq!(completion, Completion::Eos);
    }

    #[test]
    fn error_message_terminates_with_its_text() {
        let (tx, rx) = unbounded();
        let (_cancel_tx, cancel_rx) = bounded::<()>(1);

        tx.send(BusMessage::Error {
            message: "device lost".to_string(),
        })
        .unwrap();

        match run_message_loop(&rx, &cancel_rx) {
            Err(MeterError::Stream { message }) => assert_eq!(message, "device lost"),
            other => panic!("expected Stream error, got {:?}", other),
        }
    }

    #[test]
    fn error_wins_even_with_eos_queued_behind_it() {
        let (tx, rx) = unbounded();
        let (_cancel_tx, cancel_rx) = bounded::<()>(1);

        tx.send(BusMessage::Error {
            message: "first".to_string(),
        })
        .unwrap();
        tx.send(BusMessage::Eos).unwrap();

        assert!(matches!(
            run_message_loop(&rx, &cancel_rx),
            Err(MeterError::Stream { .. })
        ));
    }

    #[test]
    fn disconnected_bus_is_not_eos() {
        let (tx, rx) = unbounded::<BusMessage>();
        let (_cancel_tx, cancel_rx) = bounded::<()>(1);
        drop(tx);

        assert!(matches!(
            run_message_loop(&rx, &cancel_rx),
            Err(MeterError::BusClosed)
        ));
    }

    #[test]
    fn cancellation_ends_the_loop_cleanly() {
        let (_tx, rx) = unbounded::<BusMessage>();
        let (cancel_tx, cancel_rx) = bounded(1);

        cancel_tx.send(()).unwrap();

        let completion = run_message_loop(&rx, &cancel_rx).unwrap();
        assert_eq!(completion, Completion::Cancelled);
    }

    #[test]
    fn dropped_cancel_handle_falls_back_to_bus_only() {
        let (tx, rx) = unbounded();
        let (cancel_tx, cancel_rx) = bounded::<()>(1);
        drop(cancel_tx);

        // Loop must keep draining the bus rather than spinning or
        // reporting a phantom cancellation.
        tx.send(other()).unwrap();
        tx.send(BusMessage::Eos).unwrap();

        let completion = run_message_loop(&rx, &cancel_rx).unwrap();
        assert_eq!(completion, Completion::Eos);
    }

    #[test]
    fn pop_with_timeout_returns_none_when_quiet() {
        let (_tx, rx) = unbounded::<BusMessage>();
        let bus = Bus::new(rx);
        assert_eq!(bus.pop(Some(Duration::from_millis(10))), None);
    }

    #[test]
    fn pop_delivers_messages_in_order() {
        let (tx, rx) = unbounded();
        let bus = Bus::new(rx);

        tx.send(other()).unwrap();
        tx.send(BusMessage::Eos).unwrap();

        assert_eq!(bus.pop(None), Some(other()));
        assert_eq!(bus.pop(None), Some(BusMessage::Eos));
    }

    #[test]
    fn pop_on_disconnected_bus_returns_none() {
        let (tx, rx) = unbounded::<BusMessage>();
        drop(tx);
        let bus = Bus::new(rx);
        assert_eq!(bus.pop(None), None);
    }

    #[test]
    fn state_display() {
        assert_eq!(PipelineState::Idle.to_string(), "idle");
        assert_eq!(PipelineState::Playing.to_string(), "playing");
        assert_eq!(PipelineState::Stopped.to_string(), "stopped");
    }
}
