//! The ordered set of live rules.

use focss_core::{Document, ElementId};
use slotmap::SlotMap;

use super::{PropertyBinding, Rule, RuleHandle};
use crate::selector::SpecificityWithOrder;
use crate::state::State;
use crate::template::SelectorTemplate;

/// Rules keyed by handle, each stamped with an insertion order.
#[derive(Debug, Default)]
pub struct RuleRegistry {
    rules: SlotMap<RuleHandle, Rule>,
    next_order: u32,
}

impl RuleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule with the next insertion order.
    pub fn insert(&mut self, template: SelectorTemplate, properties: Vec<PropertyBinding>) -> RuleHandle {
        let order = self.next_order;
        self.next_order += 1;
        self.rules.insert(Rule::new(template, properties, order))
    }

    /// Unregister a rule.
    pub fn remove(&mut self, handle: RuleHandle) -> Option<Rule> {
        self.rules.remove(handle)
    }

    /// Look up a rule.
    pub fn get(&self, handle: RuleHandle) -> Option<&Rule> {
        self.rules.get(handle)
    }

    /// Mutable lookup.
    pub fn get_mut(&mut self, handle: RuleHandle) -> Option<&mut Rule> {
        self.rules.get_mut(handle)
    }

    /// Check if a handle is registered.
    pub fn contains(&self, handle: RuleHandle) -> bool {
        self.rules.contains_key(handle)
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if no rule is registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate over all rules.
    pub fn iter(&self) -> impl Iterator<Item = (RuleHandle, &Rule)> {
        self.rules.iter()
    }

    /// Remove every rule. Insertion order keeps counting.
    pub fn clear(&mut self) {
        self.rules.clear();
    }

    /// Re-resolve every template.
    pub fn resolve_all(&mut self, state: Option<&State>) {
        for rule in self.rules.values_mut() {
            rule.resolve(state);
        }
    }

    /// Rules matching `element`, in cascade order (lowest priority first).
    pub fn matching(&self, document: &Document, element: ElementId) -> Vec<(RuleHandle, SpecificityWithOrder)> {
        let mut matched: Vec<_> = self
            .rules
            .iter()
            .filter_map(|(handle, rule)| {
                rule.match_specificity(document, element)
                    .map(|specificity| (handle, rule.specificity_with_order(specificity)))
            })
            .collect();

        // Sort by specificity (lower specificity first, so later ones override)
        matched.sort_by_key(|(_, spec)| *spec);
        matched
    }
}
