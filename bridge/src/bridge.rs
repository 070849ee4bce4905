//! Invocation bridge: each call runs in its own unit and settles once.
//!
//! Each invocation moves through `Pending → Synthesizing → Spawned → Settled`.
//! Synthesis and payload failures settle without ever spawning. Once spawned,
//! the first unit event decides the outcome and the unit is terminated right
//! after.

use std::fmt;
use std::sync::Arc;

use offload_isolate::{Isolate, NodeIsolate, UnitEvent, UnitHandle};
use offload_synth::{Program, synthesize};
use offload_types::{Dependency, Envelope, SpawnOptions, WorkerError, WorkerErrorKind, WorkerFn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::OffloadConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Pending,
    Synthesizing,
    Spawned,
    Settled,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Synthesizing => "synthesizing",
            Self::Spawned => "spawned",
            Self::Settled => "settled",
        })
    }
}

/// Per-invocation bookkeeping. Phases only move forward.
struct Invocation<'a> {
    function: &'a str,
    phase: Phase,
}

impl<'a> Invocation<'a> {
    fn new(function: &'a str) -> Self {
        Self {
            function,
            phase: Phase::Pending,
        }
    }

    fn advance(&mut self, next: Phase) {
        debug_assert!(
            (next as u8) > (self.phase as u8),
            "invocation phase went backwards: {} -> {next}",
            self.phase
        );
        tracing::trace!(
            function = self.function,
            from = %self.phase,
            to = %next,
            "invocation phase"
        );
        self.phase = next;
    }
}

/// Outcome of a successful invocation together with the program that produced it.
struct Settled {
    value: Value,
    program: Program,
}

/// Runs worker functions in isolated units.
///
/// Cheap to clone; every call spawns its own unit.
#[derive(Clone)]
pub struct Offload {
    isolate: Arc<dyn Isolate>,
    defaults: SpawnOptions,
}

impl fmt::Debug for Offload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Offload")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl Offload {
    #[must_use]
    pub fn new(isolate: impl Isolate + 'static) -> Self {
        Self {
            isolate: Arc::new(isolate),
            defaults: SpawnOptions::default(),
        }
    }

    /// Node backend with `node` resolved from `PATH`.
    pub fn detect() -> anyhow::Result<Self> {
        Ok(Self::new(NodeIsolate::detect()?))
    }

    /// Node backend and default spawn options from configuration.
    pub fn from_config(config: &OffloadConfig) -> anyhow::Result<Self> {
        let isolate = match &config.node {
            Some(binary) => NodeIsolate::new(binary),
            None => NodeIsolate::detect()?,
        };
        Ok(Self::new(isolate).with_defaults(config.defaults.clone()))
    }

    /// Spawn options used by [`Offload::call`].
    #[must_use]
    pub fn with_defaults(mut self, defaults: SpawnOptions) -> Self {
        self.defaults = defaults;
        self
    }

    #[must_use]
    pub fn defaults(&self) -> &SpawnOptions {
        &self.defaults
    }

    /// Run `function(payload)` in a fresh unit and return its settled value.
    ///
    /// `options` are forwarded to the isolate untouched. There is no built-in
    /// timeout; dropping the returned future terminates the unit.
    pub async fn invoke<P>(
        &self,
        function: &WorkerFn,
        payload: &P,
        dependencies: &[Dependency],
        options: &SpawnOptions,
    ) -> Result<Value, WorkerError>
    where
        P: Serialize + ?Sized,
    {
        execute(self.isolate.as_ref(), function, payload, dependencies, options)
            .await
            .map(|settled| settled.value)
    }

    /// Like [`Offload::invoke`], decoding the value into `R`. A value that
    /// does not fit `R` is a protocol error.
    pub async fn invoke_as<P, R>(
        &self,
        function: &WorkerFn,
        payload: &P,
        dependencies: &[Dependency],
        options: &SpawnOptions,
    ) -> Result<R, WorkerError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let Settled { value, program } =
            execute(self.isolate.as_ref(), function, payload, dependencies, options).await?;
        serde_json::from_value(value).map_err(|e| {
            WorkerError::new(
                WorkerErrorKind::Protocol,
                format!("decoding worker result: {e}"),
                "",
                program.text(),
            )
        })
    }

    /// [`Offload::invoke`] with the configured default spawn options.
    pub async fn call<P>(
        &self,
        function: &WorkerFn,
        payload: &P,
        dependencies: &[Dependency],
    ) -> Result<Value, WorkerError>
    where
        P: Serialize + ?Sized,
    {
        self.invoke(function, payload, dependencies, &self.defaults).await
    }
}

async fn execute<P>(
    isolate: &dyn Isolate,
    function: &WorkerFn,
    payload: &P,
    dependencies: &[Dependency],
    options: &SpawnOptions,
) -> Result<Settled, WorkerError>
where
    P: Serialize + ?Sized,
{
    let mut invocation = Invocation::new(function.name());

    invocation.advance(Phase::Synthesizing);
    let program = synthesize(function, dependencies).map_err(|e| {
        invocation.advance(Phase::Settled);
        tracing::debug!(function = function.name(), "synthesis failed: {e}");
        WorkerError::new(WorkerErrorKind::Synthesis, e.to_string(), "", e.partial())
    })?;

    let input = serde_json::to_value(payload).map_err(|e| {
        invocation.advance(Phase::Settled);
        WorkerError::new(
            WorkerErrorKind::Payload,
            format!("serializing payload: {e}"),
            "",
            program.text(),
        )
    })?;

    let mut unit = isolate.spawn(program.text(), &input, options).map_err(|e| {
        invocation.advance(Phase::Settled);
        tracing::warn!(function = function.name(), "spawning worker failed: {e:#}");
        WorkerError::new(WorkerErrorKind::Spawn, format!("{e:#}"), "", program.text())
    })?;
    invocation.advance(Phase::Spawned);

    let outcome = settle(&mut unit, program.text()).await;
    unit.terminate();
    invocation.advance(Phase::Settled);

    match &outcome {
        Ok(_) => tracing::debug!(function = function.name(), "worker settled"),
        Err(e) => {
            tracing::debug!(function = function.name(), kind = %e.kind(), "worker failed: {e}");
        }
    }
    outcome.map(|value| Settled { value, program })
}

/// The first event decides; anything after it is never read.
async fn settle(unit: &mut UnitHandle, program: &str) -> Result<Value, WorkerError> {
    match unit.next_event().await {
        Some(UnitEvent::Message(message)) => decode(&message, program),
        Some(UnitEvent::Failed(failure)) => Err(WorkerError::new(
            WorkerErrorKind::Spawn,
            failure.message,
            &failure.stack,
            program,
        )),
        Some(UnitEvent::ProtocolViolation(reason)) => {
            tracing::warn!("protocol violation from worker: {reason}");
            Err(WorkerError::new(WorkerErrorKind::Protocol, reason, "", program))
        }
        Some(UnitEvent::Exited(code)) => {
            let status = code.map_or_else(
                || "without an exit code".to_string(),
                |c| format!("with code {c}"),
            );
            Err(WorkerError::new(
                WorkerErrorKind::Spawn,
                format!("worker exited {status} before sending a result"),
                "",
                program,
            ))
        }
        None => Err(WorkerError::new(
            WorkerErrorKind::Spawn,
            "worker hung up before sending a result",
            "",
            program,
        )),
    }
}

fn decode(message: &str, program: &str) -> Result<Value, WorkerError> {
    match Envelope::parse(message) {
        Ok(Envelope::Success(value)) => Ok(value),
        Ok(Envelope::Failure(info)) => Err(WorkerError::new(
            WorkerErrorKind::Application,
            info.message,
            &info.stack,
            program,
        )),
        Err(e) => {
            tracing::warn!("protocol violation from worker: {e}");
            Err(WorkerError::new(WorkerErrorKind::Protocol, e.to_string(), "", program))
        }
    }
}
