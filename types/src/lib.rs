//! Core domain types for offload.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! The synthesizer, the isolate backends and the invocation bridge all speak in
//! these types.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod dependency;
mod envelope;
mod error;
mod function;
mod options;

pub use dependency::Dependency;
pub use envelope::{Envelope, EnvelopeError, ErrorInfo, FAILURE_TAG, SEPARATOR, SUCCESS_TAG};
pub use error::{WorkerError, WorkerErrorKind, render_listing};
pub use function::{WorkerFn, is_identifier};
pub use options::{ResourceLimits, SpawnOptions};

// ============================================================================
// Unit stdout framing
// ============================================================================

/// Stdout framing shared by the synthesized prelude and the isolate reader.
///
/// Every line the unit writes to its stdout is one frame: a prefix followed by
/// a JSON string literal. Keeping the payload JSON-encoded guarantees a frame
/// never spans lines.
pub mod frame {
    /// A message posted by the harness (carries a result envelope).
    pub const MESSAGE_PREFIX: &str = "msg:";
    /// Console output written by user code to `process.stdout`.
    pub const OUTPUT_PREFIX: &str = "out:";
}
