//! Program synthesis for offloaded worker functions.
//!
//! [`synthesize`] turns a [`WorkerFn`](offload_types::WorkerFn) and its
//! [`Dependency`](offload_types::Dependency) declarations into a self-contained
//! ES module: dependency imports, the unit messaging prelude, the relocated
//! function and the invocation harness.

mod harness;
mod program;
pub mod template;

pub use program::{Program, SynthesisError, SynthesisErrorKind, synthesize};
pub use template::{Template, TemplateError};
