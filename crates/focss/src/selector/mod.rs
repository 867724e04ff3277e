//! CSS selector types, parsing, matching and specificity.

mod matcher;
mod parser;
pub mod specificity;
mod types;

pub use matcher::{ElementMatchContext, SelectorMatcher, SiblingInfo};
pub use parser::parse_selector;
pub use specificity::{
    Specificity, SpecificityCategory, SpecificityPart, SpecificityResult, SpecificityWithOrder,
};
pub use types::*;
