//! Per-element engine bookkeeping.

use crate::operator::PropertyMap;
use crate::rules::RuleHandle;

/// What the engine last did to one element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementBinding {
    /// Exactly what was last written to the element's style surface.
    pub applied: PropertyMap,
    /// Matching rules in cascade order (lowest priority first).
    pub matched: Vec<RuleHandle>,
}

impl ElementBinding {
    /// A binding with nothing applied and nothing matched can be dropped.
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty() && self.matched.is_empty()
    }
}
