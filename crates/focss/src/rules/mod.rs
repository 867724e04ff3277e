//! Rules and the rule registry.

mod registry;
mod rule;

pub use registry::RuleRegistry;
pub use rule::{Alternative, PropertyBinding, ResolvedRule, Rule, RuleHandle};
