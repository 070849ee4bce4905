//! Run a single JavaScript function in an isolated worker process and await
//! its result.
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use offload::{Dependency, Offload, SpawnOptions, WorkerFn};
//! use serde_json::json;
//!
//! let offload = Offload::detect()?;
//! let mul = WorkerFn::named("mul", "(p) => p.a * p.b");
//! let product = offload
//!     .invoke(&mul, &json!({"a": 2, "b": 4}), &[], &SpawnOptions::default())
//!     .await?;
//! assert_eq!(product, json!(8));
//!
//! let deps = [Dependency::new("./lib.mjs").named(["join"])];
//! let joined: String = offload
//!     .invoke_as(
//!         &WorkerFn::parse("function pair(p) { return join(p.x, p.y); }"),
//!         &json!({"x": 1, "y": 2}),
//!         &deps,
//!         &SpawnOptions::default().with_cwd("/srv/jobs"),
//!     )
//!     .await?;
//! # let _ = joined;
//! # Ok(())
//! # }
//! ```

mod bridge;
mod config;

pub use bridge::Offload;
pub use config::{ConfigError, OffloadConfig};

pub use offload_isolate::{Isolate, NodeIsolate, UnitEvent, UnitFailure, UnitHandle};
pub use offload_synth::{Program, SynthesisError, SynthesisErrorKind, synthesize};
pub use offload_types::{
    Dependency, ResourceLimits, SpawnOptions, WorkerError, WorkerErrorKind, WorkerFn,
};
