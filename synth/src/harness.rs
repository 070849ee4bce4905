//! Fixed JavaScript embedded into every synthesized program.
//!
//! Identifiers introduced here share the `__offload` prefix; worker functions
//! may not use it.

pub(crate) const RESERVED_PREFIX: &str = "__offload";

/// Messaging primitives for the unit.
///
/// `__offloadReceive` reads the injected payload (stdin, written once at spawn
/// and then closed). `__offloadPost` sends one frame on stdout. User writes to
/// `process.stdout` are re-framed as output so they can never be mistaken for
/// a posted message.
pub(crate) const PRELUDE: &str = r#"import __offloadProcess from "node:process";
const __offloadWrite = __offloadProcess.stdout.write.bind(__offloadProcess.stdout);
const __offloadPost = (message) =>
  __offloadWrite("{{message_prefix}}" + JSON.stringify(String(message)) + "\n");
__offloadProcess.stdout.write = (chunk, encoding, callback) => {
  const text = typeof chunk === "string" ? chunk : Buffer.from(chunk).toString("utf8");
  const done = typeof encoding === "function" ? encoding : callback;
  return __offloadWrite("{{output_prefix}}" + JSON.stringify(text) + "\n", done);
};
const __offloadReceive = async () => {
  const chunks = [];
  for await (const chunk of __offloadProcess.stdin) {
    chunks.push(chunk);
  }
  return JSON.parse(Buffer.concat(chunks).toString("utf8"));
};
"#;

/// Invocation harness. `function` receives the reconstructed function
/// statement, `name` the identifier to call.
pub(crate) const HARNESS: &str = r#"{{function}}

const __offloadRun = async () => {
  try {
    const __offloadInput = await __offloadReceive();
    const __offloadValue = await {{name}}(__offloadInput);
    const __offloadBody = JSON.stringify(__offloadValue);
    __offloadPost("res:" + (__offloadBody === undefined ? "null" : __offloadBody));
  } catch (__offloadError) {
    const __offloadFailure = __offloadError instanceof Error
      ? { message: String(__offloadError.message), stack: String(__offloadError.stack ?? "") }
      : { message: String(__offloadError), stack: "" };
    __offloadPost("err:" + JSON.stringify(__offloadFailure));
  }
};
"#;

pub(crate) const INVOKE: &str = "__offloadRun();\n";
