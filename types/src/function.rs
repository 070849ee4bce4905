//! Worker functions as relocatable source text.
//!
//! A live closure cannot cross into another execution context, so callers
//! register the function by its JavaScript source. The source must not capture
//! anything beyond its parameter, built-ins and declared dependencies.

use serde::{Deserialize, Serialize};

/// A named single-parameter function, held as source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerFn {
    name: String,
    source: String,
}

impl WorkerFn {
    /// Take the name from a `function name(...)` or `async function name(...)`
    /// declaration. Anything else (arrow functions, anonymous function
    /// expressions) yields an empty name, which synthesis rejects.
    #[must_use]
    pub fn parse(source: impl Into<String>) -> Self {
        let source = source.into();
        let name = declared_name(&source).unwrap_or_default().to_string();
        Self { name, source }
    }

    /// Pair an explicit name with a function expression, typically an arrow.
    #[must_use]
    pub fn named(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }
}

fn declared_name(source: &str) -> Option<&str> {
    let mut rest = source.trim_start();
    if let Some(after) = rest.strip_prefix("async")
        && after.starts_with(char::is_whitespace)
    {
        rest = after.trim_start();
    }
    let after = rest.strip_prefix("function")?;
    if !after.starts_with(|c: char| c.is_whitespace() || c == '*' || c == '(') {
        return None;
    }
    let after = after.trim_start();
    let after = after.strip_prefix('*').unwrap_or(after).trim_start();
    let end = after
        .find(|c: char| !is_identifier_char(c))
        .unwrap_or(after.len());
    let name = &after[..end];
    is_identifier(name).then_some(name)
}

fn is_identifier_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

fn is_identifier_char(c: char) -> bool {
    is_identifier_start(c) || c.is_alphanumeric()
}

const RESERVED_WORDS: &[&str] = &[
    "await",
    "break",
    "case",
    "catch",
    "class",
    "const",
    "continue",
    "debugger",
    "default",
    "delete",
    "do",
    "else",
    "enum",
    "export",
    "extends",
    "false",
    "finally",
    "for",
    "function",
    "if",
    "import",
    "in",
    "instanceof",
    "let",
    "new",
    "null",
    "return",
    "static",
    "super",
    "switch",
    "this",
    "throw",
    "true",
    "try",
    "typeof",
    "var",
    "void",
    "while",
    "with",
    "yield",
];

/// True when `name` can be bound with `const name = ...` in a module.
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    is_identifier_start(first) && chars.all(is_identifier_char) && !RESERVED_WORDS.contains(&name)
}
