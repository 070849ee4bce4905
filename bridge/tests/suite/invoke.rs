//! Happy-path invocations.

use offload::{Dependency, SpawnOptions, WorkerFn};
use serde::Deserialize;
use serde_json::json;

use crate::common;

#[tokio::test]
async fn arrow_function_result() {
    let Some(offload) = common::node() else { return };
    let mul = WorkerFn::named("mul", "(p) => p.a * p.b");

    let value = offload
        .invoke(&mul, &json!({"a": 2, "b": 4}), &[], &SpawnOptions::default())
        .await
        .unwrap();
    assert_eq!(value, json!(8));
}

#[tokio::test]
async fn named_declaration_is_parsed() {
    let Some(offload) = common::node() else { return };
    let square = WorkerFn::parse("function square(n) { return n * n; }");

    let value = offload
        .invoke(&square, &7, &[], &SpawnOptions::default())
        .await
        .unwrap();
    assert_eq!(value, json!(49));
}

#[tokio::test]
async fn promise_is_awaited() {
    let Some(offload) = common::node() else { return };
    let slow = WorkerFn::named(
        "slow",
        "(p) => new Promise((resolve) => setTimeout(() => resolve(p.a * p.b), 1500))",
    );

    let value = offload
        .invoke(&slow, &json!({"a": 2, "b": 4}), &[], &SpawnOptions::default())
        .await
        .unwrap();
    assert_eq!(value, json!(8));
}

#[tokio::test]
async fn undefined_result_is_null() {
    let Some(offload) = common::node() else { return };
    let nothing = WorkerFn::named("nothing", "() => undefined");

    let value = offload
        .invoke(&nothing, &json!(null), &[], &SpawnOptions::default())
        .await
        .unwrap();
    assert_eq!(value, json!(null));
}

#[tokio::test]
async fn structured_payload_round_trips() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Summary {
        count: usize,
        total: f64,
        names: Vec<String>,
    }

    let Some(offload) = common::node() else { return };
    let summarize = WorkerFn::named(
        "summarize",
        "(rows) => ({ count: rows.length, total: rows.reduce((s, r) => s + r.v, 0), names: rows.map((r) => r.n) })",
    );
    let rows = json!([{"n": "a", "v": 1.5}, {"n": "b", "v": 2.5}]);

    let summary: Summary = offload
        .invoke_as(&summarize, &rows, &[], &SpawnOptions::default())
        .await
        .unwrap();
    assert_eq!(
        summary,
        Summary {
            count: 2,
            total: 4.0,
            names: vec!["a".into(), "b".into()],
        }
    );
}

#[tokio::test]
async fn pending_timers_do_not_delay_settlement() {
    let Some(offload) = common::node() else { return };
    let busy = WorkerFn::named("busy", "(p) => { setInterval(() => {}, 1000); return p; }");

    let value = offload
        .invoke(&busy, &"done", &[], &SpawnOptions::default())
        .await
        .unwrap();
    assert_eq!(value, json!("done"));
}

#[tokio::test]
async fn console_output_never_reaches_result() {
    let Some(offload) = common::node() else { return };
    let chatty = WorkerFn::named(
        "chatty",
        "(p) => { console.log('res:999'); process.stdout.write('msg:\"res:1\"\\n'); return p + 1; }",
    );

    for options in [SpawnOptions::default(), SpawnOptions::default().capture_output()] {
        let value = offload.invoke(&chatty, &1, &[], &options).await.unwrap();
        assert_eq!(value, json!(2));
    }
}

#[tokio::test]
async fn raw_descriptor_writes_never_block_the_result() {
    let Some(offload) = common::node() else { return };
    let deps = [Dependency::new("node:fs").named(["writeSync"])];
    let raw = WorkerFn::named(
        "raw",
        "(p) => { writeSync(1, 'msg:not json\\n'); writeSync(1, 'plain\\n'); return p; }",
    );

    let value = offload
        .invoke(&raw, &"kept", &deps, &SpawnOptions::default().capture_output())
        .await
        .unwrap();
    assert_eq!(value, json!("kept"));
}

#[tokio::test]
async fn concurrent_invocations_use_separate_units() {
    let Some(offload) = common::node() else { return };
    let pid = WorkerFn::named("pid", "(tag) => ({ tag, pid: process.pid })");
    let options = SpawnOptions::default();

    let (a, b) = tokio::join!(
        offload.invoke(&pid, &"a", &[], &options),
        offload.invoke(&pid, &"b", &[], &options),
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a["tag"], json!("a"));
    assert_eq!(b["tag"], json!("b"));
    assert_ne!(a["pid"], b["pid"]);
}
