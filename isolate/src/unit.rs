//! The isolate capability: spawn a unit, observe its events, terminate it.

use offload_types::SpawnOptions;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

/// Failure signal raised by a unit outside the harness's own messaging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitFailure {
    pub message: String,
    pub stack: String,
}

impl UnitFailure {
    #[must_use]
    pub fn new(message: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: stack.into(),
        }
    }
}

/// Something observed on a running unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitEvent {
    /// A message posted by the program.
    Message(String),
    /// The unit failed (crash, syntax error, unresolved import, ...).
    Failed(UnitFailure),
    /// The unit's output could not be decoded (e.g. an oversized frame). No
    /// message will follow.
    ProtocolViolation(String),
    /// The unit is gone. Always the last event; carries the exit code if any.
    Exited(Option<i32>),
}

/// Owner's handle on one running unit.
///
/// Dropping the handle terminates the unit.
#[derive(Debug)]
pub struct UnitHandle {
    events: mpsc::Receiver<UnitEvent>,
    terminate: Option<oneshot::Sender<()>>,
}

impl UnitHandle {
    /// Assemble a handle from the backend's event stream and termination
    /// trigger. The backend must stop the unit once `terminate` fires or is
    /// dropped.
    #[must_use]
    pub fn new(events: mpsc::Receiver<UnitEvent>, terminate: oneshot::Sender<()>) -> Self {
        Self {
            events,
            terminate: Some(terminate),
        }
    }

    /// Next event, or `None` once the backend has hung up.
    pub async fn next_event(&mut self) -> Option<UnitEvent> {
        self.events.recv().await
    }

    /// Ask the backend to stop the unit. Idempotent.
    pub fn terminate(&mut self) {
        if let Some(tx) = self.terminate.take() {
            let _ = tx.send(());
        }
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.terminate.is_none()
    }
}

/// Capability: create an isolated execution unit running `program`, with
/// `input` injected as its input data.
///
/// `options` are passed through uninterpreted by callers; each backend maps
/// them onto its host. Implementations that spawn tasks must be called from
/// within a tokio runtime.
pub trait Isolate: Send + Sync {
    fn spawn(
        &self,
        program: &str,
        input: &Value,
        options: &SpawnOptions,
    ) -> anyhow::Result<UnitHandle>;
}
