//! Error types for focss host capabilities.

use std::fmt;

use crate::document::ElementId;

/// Errors that can occur while manipulating a [`Document`](crate::Document).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    /// The element ID is invalid or the element has been destroyed.
    InvalidElement(ElementId),
    /// Attempted to insert an element into its own subtree.
    CircularInsertion,
    /// The element is not a child of the given parent.
    NotAChild {
        /// The parent that was expected to own the child.
        parent: ElementId,
        /// The element that was not found among its children.
        child: ElementId,
    },
    /// The document root cannot be detached or destroyed.
    RootImmutable,
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidElement(id) => write!(f, "Invalid or destroyed element {id:?}"),
            Self::CircularInsertion => {
                write!(f, "Cannot insert an element into its own subtree")
            }
            Self::NotAChild { parent, child } => {
                write!(f, "Element {child:?} is not a child of {parent:?}")
            }
            Self::RootImmutable => write!(f, "The document root cannot be detached or destroyed"),
        }
    }
}

impl std::error::Error for DomError {}

/// Result type for document operations.
pub type DomResult<T> = std::result::Result<T, DomError>;
