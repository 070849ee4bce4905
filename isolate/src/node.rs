//! Node.js backend: one child process per unit.
//!
//! The program runs as an ES module via `--input-type=module --eval`. The
//! input payload is written to stdin once and stdin is closed. Stdout carries
//! prelude frames (see [`crate::codec`]); stderr is forwarded or captured and
//! its tail is kept to explain crashes.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result};
use offload_types::{ResourceLimits, SpawnOptions};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::codec::{Frame, FrameReader, FrameTooLarge};
use crate::crash::parse_crash;
use crate::unit::{Isolate, UnitEvent, UnitFailure, UnitHandle};

/// Channel capacity between the unit's I/O tasks and its handle.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Stderr lines retained for crash reports.
const STDERR_TAIL_LINES: usize = 256;

/// Tracing target for output captured from units.
const UNIT_OUTPUT_TARGET: &str = "offload::unit";

/// Spawns units as `node` child processes.
#[derive(Debug, Clone)]
pub struct NodeIsolate {
    binary: PathBuf,
}

impl NodeIsolate {
    /// Use a specific node executable.
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Resolve `node` from `PATH`.
    pub fn detect() -> Result<Self> {
        let binary = which::which("node").context("node not found in PATH")?;
        Ok(Self::new(binary))
    }

    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn command(&self, program: &str, options: &SpawnOptions) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(limit_flags(&options.resource_limits))
            .args(&options.exec_argv)
            .arg("--input-type=module")
            .arg("--eval")
            .arg(program)
            .arg("--")
            .args(&options.argv);

        if let Some(env) = &options.env {
            cmd.env_clear().envs(env);
        }
        if let Some(cwd) = &options.cwd {
            cmd.current_dir(cwd);
        }

        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl Isolate for NodeIsolate {
    fn spawn(&self, program: &str, input: &Value, options: &SpawnOptions) -> Result<UnitHandle> {
        let input = serde_json::to_vec(input).context("serializing unit input")?;

        let mut child = self
            .command(program, options)
            .spawn()
            .with_context(|| format!("spawning {}", self.binary.display()))?;

        let stdin = child.stdin.take().context("no stdin from unit")?;
        let stdout = child.stdout.take().context("no stdout from unit")?;
        let stderr = child.stderr.take().context("no stderr from unit")?;
        let pid = child.id();
        tracing::debug!(?pid, binary = %self.binary.display(), "spawned node unit");

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (terminate_tx, terminate_rx) = oneshot::channel();

        tokio::spawn(write_input(stdin, input));
        let stdout_task = tokio::spawn(read_frames(stdout, event_tx.clone(), options.stdout));
        let stderr_task = tokio::spawn(read_stderr(stderr, options.stderr));
        tokio::spawn(supervise(
            child,
            terminate_rx,
            stdout_task,
            stderr_task,
            event_tx,
        ));

        Ok(UnitHandle::new(event_rx, terminate_tx))
    }
}

/// V8 flags for the configured limits. Stack size is given to V8 in KiB.
fn limit_flags(limits: &ResourceLimits) -> Vec<String> {
    let mut flags = Vec::new();
    if let Some(mb) = limits.max_old_generation_size_mb {
        flags.push(format!("--max-old-space-size={mb}"));
    }
    if let Some(mb) = limits.max_young_generation_size_mb {
        flags.push(format!("--max-semi-space-size={mb}"));
    }
    if let Some(mb) = limits.stack_size_mb {
        flags.push(format!("--stack-size={}", mb * 1024));
    }
    flags
}

async fn write_input(mut stdin: ChildStdin, input: Vec<u8>) {
    // A unit that dies before reading its input surfaces through its exit
    // status, so a broken pipe here is only worth a debug line.
    if let Err(e) = stdin.write_all(&input).await {
        tracing::debug!("writing unit input failed: {e}");
        return;
    }
    if let Err(e) = stdin.shutdown().await {
        tracing::debug!("closing unit stdin failed: {e}");
    }
}

async fn read_frames(stdout: ChildStdout, event_tx: mpsc::Sender<UnitEvent>, capture: bool) {
    let mut reader = FrameReader::new(stdout);
    let mut forward = tokio::io::stdout();
    loop {
        match reader.read_frame().await {
            Ok(Some(Frame::Message(message))) => {
                if event_tx.send(UnitEvent::Message(message)).await.is_err() {
                    break;
                }
            }
            Ok(Some(Frame::Output(text))) => {
                if capture {
                    tracing::debug!(
                        target: UNIT_OUTPUT_TARGET,
                        stream = "stdout",
                        "{}",
                        text.trim_end()
                    );
                } else if let Err(e) = forward.write_all(text.as_bytes()).await {
                    tracing::debug!("forwarding unit stdout failed: {e}");
                }
            }
            Ok(None) => break,
            Err(e) => {
                let event = if let Some(too_large) = e.downcast_ref::<FrameTooLarge>() {
                    tracing::warn!("unit stdout frame rejected: {too_large}");
                    UnitEvent::ProtocolViolation(too_large.to_string())
                } else {
                    tracing::warn!("unit stdout reader error: {e:#}");
                    UnitEvent::Failed(UnitFailure::new(format!("{e:#}"), ""))
                };
                let _ = event_tx.send(event).await;
                break;
            }
        }
    }
    let _ = forward.flush().await;
}

async fn read_stderr(stderr: ChildStderr, capture: bool) -> String {
    let mut lines = BufReader::new(stderr).lines();
    let mut forward = tokio::io::stderr();
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if capture {
                    tracing::debug!(target: UNIT_OUTPUT_TARGET, stream = "stderr", "{line}");
                } else if let Err(e) = forward.write_all(format!("{line}\n").as_bytes()).await {
                    tracing::debug!("forwarding unit stderr failed: {e}");
                }
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!("unit stderr reader error: {e}");
                break;
            }
        }
    }
    let _ = forward.flush().await;
    Vec::from(tail).join("\n")
}

/// Waits for the unit to exit or be terminated, then reports how it ended.
///
/// Stdout is drained before the exit is reported so a message written just
/// before exiting is always delivered ahead of `Failed`/`Exited`.
async fn supervise(
    mut child: Child,
    mut terminate_rx: oneshot::Receiver<()>,
    stdout_task: JoinHandle<()>,
    stderr_task: JoinHandle<String>,
    event_tx: mpsc::Sender<UnitEvent>,
) {
    let status = tokio::select! {
        status = child.wait() => status,
        _ = &mut terminate_rx => {
            if let Err(e) = child.start_kill() {
                tracing::debug!("killing unit failed: {e}");
            }
            let status = child.wait().await;
            stdout_task.abort();
            stderr_task.abort();
            tracing::debug!(?status, "node unit terminated");
            return;
        }
    };

    let _ = stdout_task.await;
    let stderr_tail = stderr_task.await.unwrap_or_default();

    let code = match status {
        Ok(status) => {
            tracing::debug!(%status, "node unit exited");
            if !status.success() {
                let failure = parse_crash(&stderr_tail, &status.to_string());
                let _ = event_tx.send(UnitEvent::Failed(failure)).await;
            }
            status.code()
        }
        Err(e) => {
            let failure = UnitFailure::new(format!("waiting for unit failed: {e}"), "");
            let _ = event_tx.send(UnitEvent::Failed(failure)).await;
            None
        }
    };
    let _ = event_tx.send(UnitEvent::Exited(code)).await;
}
