//! Program synthesis: dependency imports, prelude, relocated function, harness.

use std::fmt;

use offload_types::{Dependency, WorkerFn, frame, is_identifier, render_listing};
use thiserror::Error;

use crate::harness::{HARNESS, INVOKE, PRELUDE, RESERVED_PREFIX};
use crate::template::{Template, TemplateError};

/// A self-contained program ready to run inside an isolated unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    text: String,
}

impl Program {
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }

    /// Line-numbered rendering, as attached to worker errors.
    #[must_use]
    pub fn listing(&self) -> String {
        render_listing(&self.text)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisErrorKind {
    #[error("worker function has no name; use a named declaration or `WorkerFn::named`")]
    AnonymousFunction,
    #[error("`{0}` is not a valid function name")]
    InvalidName(String),
    #[error("function name `{0}` uses the reserved `__offload` prefix")]
    ReservedName(String),
    #[error("worker function `{0}` has an empty body")]
    EmptySource(String),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Synthesis failure, carrying whatever text was produced before it.
#[derive(Debug, Clone, Error)]
#[error("{kind}")]
pub struct SynthesisError {
    kind: SynthesisErrorKind,
    partial: String,
}

impl SynthesisError {
    fn new(kind: impl Into<SynthesisErrorKind>, partial: String) -> Self {
        Self {
            kind: kind.into(),
            partial,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &SynthesisErrorKind {
        &self.kind
    }

    /// Program text emitted before the failure.
    #[must_use]
    pub fn partial(&self) -> &str {
        &self.partial
    }
}

/// Build the program that runs `function` in a unit.
///
/// Pure and deterministic: identical inputs yield identical text.
pub fn synthesize(
    function: &WorkerFn,
    dependencies: &[Dependency],
) -> Result<Program, SynthesisError> {
    let mut text = String::new();

    for (index, dependency) in dependencies.iter().enumerate() {
        push_imports(&mut text, index, dependency);
    }

    match render_prelude() {
        Ok(prelude) => text.push_str(&prelude),
        Err(e) => return Err(SynthesisError::new(e, text)),
    }

    let declaration = match relocate(function) {
        Ok(declaration) => declaration,
        Err(kind) => return Err(SynthesisError::new(kind, text)),
    };

    let harness = Template::parse(HARNESS)
        .and_then(|template| {
            template.render(&[("function", declaration.as_str()), ("name", function.name())])
        })
        .map_err(|e| SynthesisError::new(e, text.clone()))?;
    text.push_str(&harness);
    text.push_str(INVOKE);

    tracing::trace!(
        function = function.name(),
        dependencies = dependencies.len(),
        bytes = text.len(),
        "synthesized worker program"
    );

    Ok(Program { text })
}

/// Bind one declaration through a namespace import.
///
/// Named exports are read from the namespace, falling back to the default
/// export, so CommonJS modules whose `module.exports` node cannot analyse
/// statically still resolve. Named bindings come first, then the default.
fn push_imports(text: &mut String, index: usize, dependency: &Dependency) {
    if dependency.is_empty() {
        return;
    }
    let namespace = format!("{RESERVED_PREFIX}Dep{index}");
    text.push_str(&format!(
        "import * as {namespace} from {};\n",
        quote(&dependency.source)
    ));
    if !dependency.named_exports.is_empty() {
        let bindings: Vec<String> = dependency
            .named_exports
            .iter()
            .map(String::as_str)
            .map(destructure)
            .collect();
        text.push_str(&format!(
            "const {{ {} }} = {{ ...{namespace}.default, ...{namespace} }};\n",
            bindings.join(", ")
        ));
    }
    if let Some(binding) = &dependency.default_binding {
        text.push_str(&format!("const {binding} = {namespace}.default;\n"));
    }
}

/// `name as alias` becomes the destructuring form `name: alias`.
fn destructure(entry: &str) -> String {
    let parts: Vec<&str> = entry.split_whitespace().collect();
    match parts.as_slice() {
        [name, "as", alias] => format!("{name}: {alias}"),
        _ => entry.trim().to_string(),
    }
}

/// JSON string literals are valid JavaScript string literals.
fn quote(source: &str) -> String {
    serde_json::Value::from(source).to_string()
}

fn render_prelude() -> Result<String, TemplateError> {
    Template::parse(PRELUDE)?.render(&[
        ("message_prefix", frame::MESSAGE_PREFIX),
        ("output_prefix", frame::OUTPUT_PREFIX),
    ])
}

fn relocate(function: &WorkerFn) -> Result<String, SynthesisErrorKind> {
    let name = function.name();
    if name.is_empty() {
        return Err(SynthesisErrorKind::AnonymousFunction);
    }
    if !is_identifier(name) {
        return Err(SynthesisErrorKind::InvalidName(name.to_string()));
    }
    if name.starts_with(RESERVED_PREFIX) {
        return Err(SynthesisErrorKind::ReservedName(name.to_string()));
    }
    let body = function.source().trim().trim_end_matches(';').trim_end();
    if body.is_empty() {
        return Err(SynthesisErrorKind::EmptySource(name.to_string()));
    }
    Ok(format!("const {name} = {body};"))
}
