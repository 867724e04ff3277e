//! Host capabilities for focss.
//!
//! This crate provides the collaborators a focss rule engine is wired to:
//!
//! - **Document**: An element tree with attributes, classes and stable IDs
//! - **Style surface**: Per-element inline declarations addressed by dash-case name
//! - **Mutation observation**: Batched queues of tree and attribute changes
//! - **Frame scheduling**: One-shot callbacks coalesced into host frames
//!
//! # Example
//!
//! ```
//! use focss_core::{Document, StyleSurface};
//!
//! let mut doc = Document::new();
//! let root = doc.root();
//! let div = doc.append_element(root, "div").unwrap();
//! doc.add_class(div, "bar").unwrap();
//!
//! let observer = doc.observe(root, || {}).unwrap();
//! doc.remove_class(div, "bar").unwrap();
//! assert_eq!(observer.take_records().len(), 1);
//!
//! doc.style_mut(div).unwrap().set_property("max-width", "100px");
//! assert_eq!(doc.style(div).unwrap().get_property_value("max-width"), "100px");
//! ```

pub mod document;
pub mod error;
pub mod frame;
pub mod logging;
pub mod mutation;
pub mod style;

pub use document::{Document, ElementId, SharedDocument};
pub use error::{DomError, DomResult};
pub use frame::{FrameRequestId, FrameScheduler};
pub use mutation::{MutationKind, MutationObserver, MutationRecord};
pub use style::{InlineStyle, StyleSurface};
