//! The reactive rule engine.

mod binding;
mod cascade;
mod rule_engine;

pub use binding::ElementBinding;
pub use cascade::{cascade_properties, format_value};
pub use rule_engine::{EngineStatus, RuleEngine};
