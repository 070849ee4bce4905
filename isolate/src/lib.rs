//! Isolated execution units for offloaded worker programs.
//!
//! [`Isolate`] is the spawning capability the bridge depends on: it runs a
//! program body with injected input data and reports messages, failures and
//! exit through a [`UnitHandle`]. [`NodeIsolate`] is the shipped backend.

pub mod codec;
mod crash;
mod node;
mod unit;

pub use node::NodeIsolate;
pub use unit::{Isolate, UnitEvent, UnitFailure, UnitHandle};
