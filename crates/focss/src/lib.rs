//! Reactive CSS cascade for templated selectors.
//!
//! This crate applies CSS-like rules whose selectors contain `${key}`
//! placeholders, featuring:
//!
//! - **Templates**: Selectors resolved against a flat state mapping
//! - **Specificity**: Text-level (a, b, c) scanning of any selector
//! - **Cascading**: Specificity-based resolution with insertion order tie-break
//! - **Diffing**: Only properties the engine manages are ever written
//! - **Reactivity**: Document mutations re-match affected elements each frame
//!
//! # Example
//!
//! ```
//! use focss::prelude::*;
//! use focss_core::{FrameScheduler, SharedDocument, StyleSurface};
//!
//! let document = SharedDocument::new();
//! let scheduler = FrameScheduler::new();
//! let engine = RuleEngine::new(document.clone(), scheduler.clone())?;
//!
//! engine.insert(".${theme} .title", [("font-size", "size"), ("color", "ink")])?;
//! engine.process(State::new().with("theme", "dark").with("size", 18).with("ink", "white"))?;
//!
//! let title = document.with_write(|doc| -> focss_core::DomResult<_> {
//!     let root = doc.root();
//!     let section = doc.append_element(root, "section")?;
//!     doc.add_class(section, "dark")?;
//!     let title = doc.append_element(section, "h1")?;
//!     doc.add_class(title, "title")?;
//!     Ok(title)
//! })?;
//!
//! scheduler.run_frame();
//! document.with_read(|doc| {
//!     let style = doc.style(title).unwrap();
//!     assert_eq!(style.get_property_value("font-size"), "18px");
//!     assert_eq!(style.get_property_value("color"), "white");
//! });
//! # Ok::<(), focss::Error>(())
//! ```

pub mod config;
pub mod engine;
pub mod operator;
pub mod rules;
pub mod selector;
pub mod state;
pub mod template;

mod error;

pub use config::{DestroyPolicy, EngineConfig};
pub use engine::{EngineStatus, RuleEngine};
pub use error::{Error, Result};
pub use selector::specificity;
pub use state::{Scalar, State};

/// Prelude module with commonly used types.
pub mod prelude {
    pub use crate::config::{DestroyPolicy, EngineConfig};
    pub use crate::engine::{ElementBinding, EngineStatus, RuleEngine};
    pub use crate::operator::{InlineStyleOperator, PropertyKeyCache, PropertyMap, StyleOperator};
    pub use crate::rules::RuleHandle;
    pub use crate::selector::{Specificity, SpecificityResult};
    pub use crate::state::{Scalar, State};
    pub use crate::template::{Resolved, SelectorTemplate};
    pub use crate::{Error, Result};
}
