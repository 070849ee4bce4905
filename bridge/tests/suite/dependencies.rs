//! Dependency declarations resolved by the unit.

use offload::{Dependency, SpawnOptions, WorkerFn};
use serde_json::json;

use crate::common;

#[tokio::test]
async fn relative_module_resolves_against_cwd() {
    let Some(offload) = common::node() else { return };
    let dir = tempfile::tempdir().unwrap();
    common::write_module(
        dir.path(),
        "add.mjs",
        "export const add = (a, b) => a + b;\n",
    );
    let deps = [Dependency::new("./add.mjs").named(["add"])];
    let f = WorkerFn::named("sum", "(p) => add(p.a, p.b)");

    let value = offload
        .invoke(
            &f,
            &json!({"a": 2, "b": 3}),
            &deps,
            &SpawnOptions::default().with_cwd(dir.path()),
        )
        .await
        .unwrap();
    assert_eq!(value, json!(5));
}

#[tokio::test]
async fn named_and_default_bindings_from_one_module() {
    let Some(offload) = common::node() else { return };
    let dir = tempfile::tempdir().unwrap();
    common::write_module(
        dir.path(),
        "lib.mjs",
        "export const join = (a, b) => `${a}~${b}`;\nexport default { flip: (p) => [p.y, p.x] };\n",
    );
    let deps = [Dependency::new("./lib.mjs").named(["join"]).default_as("_")];
    let f = WorkerFn::parse("function pair(p) { return join(..._.flip(p)); }");

    let value: String = offload
        .invoke_as(
            &f,
            &json!({"x": 1, "y": 2}),
            &deps,
            &SpawnOptions::default().with_cwd(dir.path()),
        )
        .await
        .unwrap();
    assert_eq!(value, "2~1");
}

#[tokio::test]
async fn commonjs_exports_bind_by_name_and_default() {
    let Some(offload) = common::node() else { return };
    let dir = tempfile::tempdir().unwrap();
    common::write_module(
        dir.path(),
        "util.cjs",
        "const uniq = (xs) => [...new Set(xs)];\n\
         const join = (xs, sep) => xs.join(sep);\n\
         const _ = { uniq, join };\n\
         module.exports = _;\n",
    );
    let deps = [Dependency::new("./util.cjs").named(["join"]).default_as("_")];
    let f = WorkerFn::named("dedupe", "(p) => join(_.uniq(p), '~')");

    let value = offload
        .invoke(&f, &[2, 1, 2], &deps, &SpawnOptions::default().with_cwd(dir.path()))
        .await
        .unwrap();
    assert_eq!(value, json!("2~1"));
}

#[tokio::test]
async fn aliased_named_export() {
    let Some(offload) = common::node() else { return };
    let dir = tempfile::tempdir().unwrap();
    common::write_module(
        dir.path(),
        "math.mjs",
        "export const sum = (xs) => xs.reduce((a, b) => a + b, 0);\n",
    );
    let deps = [Dependency::new("./math.mjs").named(["sum as total"])];
    let f = WorkerFn::named("run", "(xs) => total(xs)");

    let value = offload
        .invoke(&f, &[1, 2, 3], &deps, &SpawnOptions::default().with_cwd(dir.path()))
        .await
        .unwrap();
    assert_eq!(value, json!(6));
}

#[tokio::test]
async fn absolute_module_path() {
    let Some(offload) = common::node() else { return };
    let dir = tempfile::tempdir().unwrap();
    common::write_module(dir.path(), "twice.mjs", "export default (n) => n * 2;\n");
    let source = dir.path().join("twice.mjs").display().to_string();
    let deps = [Dependency::new(source).default_as("twice")];
    let f = WorkerFn::named("run", "(n) => twice(n)");

    let value = offload
        .invoke(&f, &21, &deps, &SpawnOptions::default())
        .await
        .unwrap();
    assert_eq!(value, json!(42));
}

#[tokio::test]
async fn builtin_module_import() {
    let Some(offload) = common::node() else { return };
    let deps = [Dependency::new("node:path").named(["basename"])];
    let f = WorkerFn::named("base", "(p) => basename(p)");

    let value = offload
        .invoke(&f, &"/srv/jobs/report.csv", &deps, &SpawnOptions::default())
        .await
        .unwrap();
    assert_eq!(value, json!("report.csv"));
}
