//! Templated selectors.
//!
//! A template is selector text with `${key}` placeholders, e.g. `.${theme} a`.
//! It is split into segments once and resolved against a [`State`] on every
//! `process` call.

use std::fmt;

use focss_core::logging::targets;

use crate::state::State;

/// One piece of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text copied as-is.
    Literal(String),
    /// A `${key}` placeholder; the key is trimmed.
    Placeholder(String),
}

/// The outcome of resolving a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// A literal selector (list) ready for matching.
    Selector(String),
    /// The rule matches nothing under the current state.
    NoMatch,
}

impl Resolved {
    /// The resolved text, if any.
    pub fn as_selector(&self) -> Option<&str> {
        match self {
            Resolved::Selector(text) => Some(text),
            Resolved::NoMatch => None,
        }
    }
}

/// A selector template, parsed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorTemplate {
    source: String,
    /// `None` when the text is malformed.
    segments: Option<Vec<Segment>>,
}

impl SelectorTemplate {
    /// Split `source` into literal and placeholder segments.
    ///
    /// Never fails: an unterminated `${` or an empty `${}` makes the template
    /// resolve to [`Resolved::NoMatch`] under every state.
    pub fn parse(source: impl Into<String>) -> Self {
        let source = source.into();
        let segments = split_segments(&source);
        if segments.is_none() {
            tracing::debug!(target: targets::TEMPLATE, %source, "malformed selector template");
        }
        Self { source, segments }
    }

    /// The original template text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the template text was well-formed.
    pub fn is_well_formed(&self) -> bool {
        self.segments.is_some()
    }

    /// The parsed segments, or `None` for malformed text.
    pub fn segments(&self) -> Option<&[Segment]> {
        self.segments.as_deref()
    }

    /// Placeholder keys in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments
            .iter()
            .flatten()
            .filter_map(|segment| match segment {
                Segment::Placeholder(key) => Some(key.as_str()),
                Segment::Literal(_) => None,
            })
    }

    /// Whether the template has no placeholders.
    pub fn is_static(&self) -> bool {
        self.placeholders().next().is_none()
    }

    /// Substitute placeholders from `state`.
    ///
    /// Without a state (before the first `process`) every template resolves
    /// to [`Resolved::NoMatch`], static ones included. A placeholder whose key
    /// is missing or `Null` makes the whole template [`Resolved::NoMatch`].
    pub fn resolve(&self, state: Option<&State>) -> Resolved {
        let (Some(segments), Some(state)) = (&self.segments, state) else {
            return Resolved::NoMatch;
        };

        let mut text = String::with_capacity(self.source.len());
        for segment in segments {
            match segment {
                Segment::Literal(literal) => text.push_str(literal),
                Segment::Placeholder(key) => match state.render(key) {
                    Some(value) => text.push_str(&value),
                    None => {
                        tracing::debug!(
                            target: targets::TEMPLATE,
                            template = %self.source,
                            key = %key,
                            "placeholder has no value"
                        );
                        return Resolved::NoMatch;
                    }
                },
            }
        }
        Resolved::Selector(text)
    }
}

impl fmt::Display for SelectorTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn split_segments(source: &str) -> Option<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut rest = source;

    while let Some(start) = rest.find("${") {
        if start > 0 {
            segments.push(Segment::Literal(rest[..start].to_string()));
        }
        let after = &rest[start + 2..];
        let end = after.find('}')?;
        let key = after[..end].trim();
        if key.is_empty() {
            return None;
        }
        segments.push(Segment::Placeholder(key.to_string()));
        rest = &after[end + 1..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Literal(rest.to_string()));
    }

    Some(segments)
}
