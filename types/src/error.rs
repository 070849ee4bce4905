//! The one failure type callers ever see.

use std::fmt;
use std::fmt::Write;

use thiserror::Error;

/// Where along the invocation a failure originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerErrorKind {
    /// The program text could not be built; no unit was spawned.
    Synthesis,
    /// The payload could not be serialized; no unit was spawned.
    Payload,
    /// The unit failed outside the harness: spawn failure, syntax error in the
    /// generated text, unresolved dependency, crash, or a silent exit.
    Spawn,
    /// The worker function threw or its promise rejected.
    Application,
    /// The unit sent something the bridge does not understand.
    Protocol,
}

impl WorkerErrorKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Synthesis => "synthesis",
            Self::Payload => "payload",
            Self::Spawn => "spawn",
            Self::Application => "application",
            Self::Protocol => "protocol",
        }
    }
}

impl fmt::Display for WorkerErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Normalized failure of one invocation.
///
/// Every instance carries a line-numbered listing of the program that was (or
/// was about to be) run, both on its own in `generated_code` and appended to
/// `stack`.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct WorkerError {
    kind: WorkerErrorKind,
    message: String,
    stack: String,
    generated_code: String,
}

impl WorkerError {
    /// Build an error from an originating message and stack, annotated with
    /// `program` (the raw program text, numbered here).
    #[must_use]
    pub fn new(
        kind: WorkerErrorKind,
        message: impl Into<String>,
        origin_stack: &str,
        program: &str,
    ) -> Self {
        let generated_code = render_listing(program);
        let origin_stack = origin_stack.trim_end();
        let stack = if origin_stack.is_empty() {
            format!("Generated code:\n{generated_code}")
        } else {
            format!("{origin_stack}\n\nGenerated code:\n{generated_code}")
        };
        Self {
            kind,
            message: message.into(),
            stack,
            generated_code,
        }
    }

    #[must_use]
    pub fn kind(&self) -> WorkerErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn stack(&self) -> &str {
        &self.stack
    }

    #[must_use]
    pub fn generated_code(&self) -> &str {
        &self.generated_code
    }
}

/// Render `program` with right-aligned 1-based line numbers.
#[must_use]
pub fn render_listing(program: &str) -> String {
    let line_count = program.lines().count();
    let width = line_count.to_string().len();
    let mut out = String::with_capacity(program.len() + line_count * (width + 4));
    for (index, line) in program.lines().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let number = index + 1;
        let _ = write!(out, "{number:>width$} | {line}");
    }
    out
}
