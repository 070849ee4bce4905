//! Slot templates for the fixed parts of a synthesized program.
//!
//! A template is plain text with `{{slot}}` markers. Rendering is strict:
//! every slot must be filled and every supplied value must name a slot.
//! Values are inserted verbatim and never re-scanned for markers.

use std::collections::BTreeSet;

use thiserror::Error;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template slot opened at byte {offset} is never closed")]
    Unterminated { offset: usize },
    #[error("`{0}` is not a valid slot name")]
    InvalidSlot(String),
    #[error("template slot `{0}` was not filled")]
    UnfilledSlot(String),
    #[error("template has no slot named `{0}`")]
    UnknownSlot(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    Slot(&'a str),
}

/// A parsed template borrowing its source text.
#[derive(Debug, Clone)]
pub struct Template<'a> {
    segments: Vec<Segment<'a>>,
}

impl<'a> Template<'a> {
    pub fn parse(source: &'a str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(start) = rest.find(OPEN) {
            if start > 0 {
                segments.push(Segment::Text(&rest[..start]));
            }
            let after_open = &rest[start + OPEN.len()..];
            let Some(end) = after_open.find(CLOSE) else {
                return Err(TemplateError::Unterminated {
                    offset: offset + start,
                });
            };
            let name = after_open[..end].trim();
            if !is_slot_name(name) {
                return Err(TemplateError::InvalidSlot(name.to_string()));
            }
            segments.push(Segment::Slot(name));

            let consumed = start + OPEN.len() + end + CLOSE.len();
            offset += consumed;
            rest = &rest[consumed..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Text(rest));
        }

        Ok(Self { segments })
    }

    /// Distinct slot names, sorted.
    #[must_use]
    pub fn slots(&self) -> BTreeSet<&'a str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Slot(name) => Some(*name),
                Segment::Text(_) => None,
            })
            .collect()
    }

    fn has_slot(&self, name: &str) -> bool {
        self.segments
            .iter()
            .any(|segment| matches!(segment, Segment::Slot(slot) if *slot == name))
    }

    /// Fill every slot from `values`, given as `(slot, value)` pairs.
    pub fn render(&self, values: &[(&str, &str)]) -> Result<String, TemplateError> {
        if let Some((unknown, _)) = values.iter().find(|(name, _)| !self.has_slot(name)) {
            return Err(TemplateError::UnknownSlot((*unknown).to_string()));
        }

        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Slot(name) => {
                    let value = values
                        .iter()
                        .find(|(candidate, _)| candidate == name)
                        .map(|(_, value)| *value)
                        .ok_or_else(|| TemplateError::UnfilledSlot((*name).to_string()))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

fn is_slot_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
