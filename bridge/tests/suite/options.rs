//! Spawn options reach the unit.

use offload::{OffloadConfig, SpawnOptions, WorkerFn};
use serde_json::json;

use crate::common;

#[tokio::test]
async fn env_replaces_inherited_environment() {
    let Some(offload) = common::node() else { return };
    let f = WorkerFn::named(
        "env",
        "() => ({ mode: process.env.OFFLOAD_MODE, home: process.env.HOME ?? null })",
    );

    let value = offload
        .invoke(
            &f,
            &json!(null),
            &[],
            &SpawnOptions::default().with_env([("OFFLOAD_MODE", "batch")]),
        )
        .await
        .unwrap();
    assert_eq!(value, json!({"mode": "batch", "home": null}));
}

#[tokio::test]
async fn argv_is_visible_to_the_unit() {
    let Some(offload) = common::node() else { return };
    let f = WorkerFn::named("args", "() => process.argv.slice(1)");

    let value = offload
        .invoke(
            &f,
            &json!(null),
            &[],
            &SpawnOptions::default().with_argv(["--mode", "fast"]),
        )
        .await
        .unwrap();
    assert_eq!(value, json!(["--mode", "fast"]));
}

#[tokio::test]
async fn exec_argv_and_limits_reach_the_runtime() {
    let Some(offload) = common::node() else { return };
    let f = WorkerFn::named("flags", "() => process.execArgv.filter((a) => a.startsWith('--max'))");
    let mut options = SpawnOptions::default();
    options.exec_argv = vec!["--no-warnings".into()];
    options.resource_limits.max_old_generation_size_mb = Some(64);

    let value = offload.invoke(&f, &0, &[], &options).await.unwrap();
    assert_eq!(value, json!(["--max-old-space-size=64"]));
}

#[tokio::test]
async fn call_uses_config_defaults() {
    let Some(offload) = common::node() else { return };
    let dir = tempfile::tempdir().unwrap();
    common::write_module(dir.path(), "k.mjs", "export const k = 10;\n");
    let node = offload::NodeIsolate::detect().unwrap();
    let config = OffloadConfig::from_toml_str(&format!(
        "node = {:?}\n[defaults]\ncwd = {:?}\nstderr = true\n",
        node.binary().display().to_string(),
        dir.path().display().to_string(),
    ))
    .unwrap();
    assert!(offload.defaults().cwd.is_none());

    let configured = offload::Offload::from_config(&config).unwrap();
    assert_eq!(configured.defaults(), &config.defaults);
    let deps = [offload::Dependency::new("./k.mjs").named(["k"])];
    let f = WorkerFn::named("plus", "(n) => n + k");
    assert_eq!(configured.call(&f, &5, &deps).await.unwrap(), json!(15));
}
