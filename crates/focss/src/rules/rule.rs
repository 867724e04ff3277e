//! Single rule definition.

use focss_core::logging::targets;
use focss_core::{Document, ElementId};
use slotmap::new_key_type;

use crate::selector::specificity::{calculate_single, split_selector_list};
use crate::selector::{Selector, SelectorMatcher, Specificity, SpecificityWithOrder, parse_selector};
use crate::state::State;
use crate::template::{Resolved, SelectorTemplate};

new_key_type! {
    /// Identifies a rule registered with a [`RuleEngine`](crate::RuleEngine).
    pub struct RuleHandle;
}

/// One `property <- state key` mapping of a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyBinding {
    /// Dash-case property name, e.g. `max-width`.
    pub property: String,
    /// Internal (camel-case) key, e.g. `maxWidth`.
    pub key: String,
    /// State key the value is read from.
    pub state_key: String,
}

impl PropertyBinding {
    /// Create a binding.
    pub fn new(
        property: impl Into<String>,
        key: impl Into<String>,
        state_key: impl Into<String>,
    ) -> Self {
        Self {
            property: property.into(),
            key: key.into(),
            state_key: state_key.into(),
        }
    }
}

/// One entry of a resolved selector list.
#[derive(Debug, Clone)]
pub struct Alternative {
    /// The parsed selector.
    pub selector: Selector,
    /// Its specificity.
    pub specificity: Specificity,
}

/// A template resolved against the current state.
#[derive(Debug, Clone)]
pub struct ResolvedRule {
    /// The literal selector list.
    pub text: String,
    /// Entries that parsed; entries that did not can never match.
    pub alternatives: Vec<Alternative>,
}

impl ResolvedRule {
    /// Parse every entry of a selector list.
    pub fn parse(text: impl Into<String>) -> Self {
        let text = text.into();
        let alternatives = split_selector_list(&text)
            .into_iter()
            .filter(|entry| !entry.is_empty())
            .filter_map(|entry| match parse_selector(entry) {
                Ok(selector) => Some(Alternative {
                    selector,
                    specificity: calculate_single(entry).specificity,
                }),
                Err(err) => {
                    tracing::debug!(target: targets::SELECTOR, %err, "selector never matches");
                    None
                }
            })
            .collect();
        Self { text, alternatives }
    }

    /// The highest specificity among alternatives matching `element`.
    pub fn match_specificity(&self, document: &Document, element: ElementId) -> Option<Specificity> {
        self.alternatives
            .iter()
            .filter(|alt| SelectorMatcher::matches(document, &alt.selector, element))
            .map(|alt| alt.specificity)
            .max()
    }
}

/// A rule mapping a templated selector to properties.
///
/// Each rule has:
/// - A selector template, resolved on every `process`
/// - Property bindings reading values from the state
/// - Insertion order for tie-breaking
#[derive(Debug, Clone)]
pub struct Rule {
    template: SelectorTemplate,
    properties: Vec<PropertyBinding>,
    order: u32,
    resolved: Option<ResolvedRule>,
}

impl Rule {
    /// Create an unresolved rule.
    pub fn new(template: SelectorTemplate, properties: Vec<PropertyBinding>, order: u32) -> Self {
        Self {
            template,
            properties,
            order,
            resolved: None,
        }
    }

    /// The selector template.
    pub fn template(&self) -> &SelectorTemplate {
        &self.template
    }

    /// Property bindings in insertion order.
    pub fn properties(&self) -> &[PropertyBinding] {
        &self.properties
    }

    /// Insertion order (higher = inserted later).
    pub fn order(&self) -> u32 {
        self.order
    }

    /// The selector as resolved by the last [`resolve`](Self::resolve).
    pub fn resolved(&self) -> Option<&ResolvedRule> {
        self.resolved.as_ref()
    }

    /// Re-resolve the template against `state`.
    ///
    /// The parsed selector list is reused when the resolved text is unchanged.
    pub fn resolve(&mut self, state: Option<&State>) {
        match self.template.resolve(state) {
            Resolved::Selector(text) => {
                if self.resolved.as_ref().is_some_and(|r| r.text == text) {
                    return;
                }
                tracing::trace!(
                    target: targets::TEMPLATE,
                    template = %self.template,
                    resolved = %text,
                    "resolved selector"
                );
                self.resolved = Some(ResolvedRule::parse(text));
            }
            Resolved::NoMatch => self.resolved = None,
        }
    }

    /// The specificity this rule applies with to `element`, if it matches.
    pub fn match_specificity(&self, document: &Document, element: ElementId) -> Option<Specificity> {
        self.resolved
            .as_ref()
            .and_then(|resolved| resolved.match_specificity(document, element))
    }

    /// Get the specificity with insertion order for comparison.
    pub fn specificity_with_order(&self, specificity: Specificity) -> SpecificityWithOrder {
        specificity.with_order(self.order)
    }
}
