//! Shared fixtures for node-backed tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Once;

use offload::Offload;
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Node-backed runner, or `None` (with a note on stderr) when node is missing.
pub fn node() -> Option<Offload> {
    init_tracing();
    match Offload::detect() {
        Ok(offload) => Some(offload),
        Err(e) => {
            eprintln!("skipping: {e:#}");
            None
        }
    }
}

/// Write an ES module fixture into `dir`.
pub fn write_module(dir: &Path, name: &str, source: &str) {
    std::fs::write(dir.join(name), source).expect("write module fixture");
}
