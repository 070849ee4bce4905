//! Dependency declarations injected into a synthesized program.

use serde::{Deserialize, Serialize};

/// One external binding the synthesized program imports.
///
/// `source` is opaque: it is handed to the unit's module resolver exactly as
/// given. A declaration with neither named exports nor a default binding is a
/// no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub source: String,
    /// Identifiers bound individually from the resolved module, in order.
    /// `"join as lodashJoin"` binds the export under an alias.
    #[serde(default, rename = "namedExports", alias = "named_exports")]
    pub named_exports: Vec<String>,
    /// Identifier bound to the resolved module's default export.
    #[serde(
        default,
        rename = "default",
        alias = "default_binding",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_binding: Option<String>,
}

impl Dependency {
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            named_exports: Vec::new(),
            default_binding: None,
        }
    }

    /// Append named exports to bind from this source.
    #[must_use]
    pub fn named<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.named_exports.extend(names.into_iter().map(Into::into));
        self
    }

    /// Bind the default export to `name`.
    #[must_use]
    pub fn default_as(mut self, name: impl Into<String>) -> Self {
        self.default_binding = Some(name.into());
        self
    }

    /// True when the declaration contributes no binding statements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.named_exports.is_empty() && self.default_binding.is_none()
    }
}
