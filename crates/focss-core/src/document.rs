//! Document model for focss hosts.
//!
//! Provides an in-memory element tree with:
//! - Stable element identifiers via arena-based storage
//! - Parent-child relationships with subtree destruction
//! - Attributes, with `id` and `class` given their usual meaning
//! - A per-element [`InlineStyle`] surface
//! - Mutation observation for subtrees
//!
//! # Key Types
//!
//! - [`ElementId`] - Unique stable identifier for each element
//! - [`Document`] - The tree itself
//! - [`SharedDocument`] - Thread-safe handle shared between a host and engines

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use slotmap::{SlotMap, new_key_type};

use crate::error::{DomError, DomResult};
use crate::logging::targets;
use crate::mutation::{MutationKind, MutationObserver, MutationRecord, ObserverQueue};
use crate::style::InlineStyle;

new_key_type! {
    /// A unique identifier for an element in a [`Document`].
    ///
    /// `ElementId`s stay valid while the element is moved around the tree and
    /// become invalid when it is destroyed.
    pub struct ElementId;
}

/// Internal data stored for each element.
#[derive(Debug)]
struct ElementData {
    tag: String,
    attributes: Vec<(String, String)>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    style: InlineStyle,
}

impl ElementData {
    fn new(tag: String) -> Self {
        Self {
            tag,
            attributes: Vec::new(),
            parent: None,
            children: Vec::new(),
            style: InlineStyle::new(),
        }
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// An element tree with inline styles and mutation observation.
pub struct Document {
    elements: SlotMap<ElementId, ElementData>,
    root: ElementId,
    observers: Vec<Arc<ObserverQueue>>,
}

impl Document {
    /// Create a document containing only an `html` root element.
    pub fn new() -> Self {
        let mut elements = SlotMap::with_key();
        let root = elements.insert(ElementData::new("html".to_string()));
        Self {
            elements,
            root,
            observers: Vec::new(),
        }
    }

    /// The root element.
    pub fn root(&self) -> ElementId {
        self.root
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: impl Into<String>) -> ElementId {
        let tag = tag.into().to_ascii_lowercase();
        let id = self.elements.insert(ElementData::new(tag));
        tracing::trace!(target: targets::DOCUMENT, ?id, "created element");
        id
    }

    /// Check if an element exists.
    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(id)
    }

    /// Number of live elements, detached ones included.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// A document always holds at least its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    fn data(&self, id: ElementId) -> DomResult<&ElementData> {
        self.elements.get(id).ok_or(DomError::InvalidElement(id))
    }

    fn data_mut(&mut self, id: ElementId) -> DomResult<&mut ElementData> {
        self.elements.get_mut(id).ok_or(DomError::InvalidElement(id))
    }

    /// The lower-cased tag name.
    pub fn tag(&self, id: ElementId) -> DomResult<&str> {
        self.data(id).map(|d| d.tag.as_str())
    }

    /// The parent element, if attached.
    pub fn parent(&self, id: ElementId) -> DomResult<Option<ElementId>> {
        self.data(id).map(|d| d.parent)
    }

    /// Children in document order.
    pub fn children(&self, id: ElementId) -> DomResult<&[ElementId]> {
        self.data(id).map(|d| d.children.as_slice())
    }

    /// Zero-based position among siblings and the sibling count.
    pub fn sibling_position(&self, id: ElementId) -> DomResult<Option<(usize, usize)>> {
        let Some(parent) = self.parent(id)? else {
            return Ok(None);
        };
        let siblings = self.children(parent)?;
        Ok(siblings
            .iter()
            .position(|&c| c == id)
            .map(|index| (index, siblings.len())))
    }

    /// Preceding siblings, nearest first.
    pub fn previous_siblings(&self, id: ElementId) -> DomResult<Vec<ElementId>> {
        let Some(parent) = self.parent(id)? else {
            return Ok(Vec::new());
        };
        let siblings = self.children(parent)?;
        let index = siblings.iter().position(|&c| c == id).unwrap_or(0);
        Ok(siblings[..index].iter().rev().copied().collect())
    }

    /// Following siblings in document order.
    pub fn next_siblings(&self, id: ElementId) -> DomResult<Vec<ElementId>> {
        let Some(parent) = self.parent(id)? else {
            return Ok(Vec::new());
        };
        let siblings = self.children(parent)?;
        let index = siblings
            .iter()
            .position(|&c| c == id)
            .map_or(siblings.len(), |i| i + 1);
        Ok(siblings[index..].to_vec())
    }

    /// Ancestors from parent to the top of the element's tree.
    pub fn ancestors(&self, id: ElementId) -> DomResult<Vec<ElementId>> {
        let mut result = Vec::new();
        let mut current = self.parent(id)?;
        while let Some(ancestor) = current {
            result.push(ancestor);
            current = self.parent(ancestor)?;
        }
        Ok(result)
    }

    /// Check if `ancestor` is `id` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: ElementId, id: ElementId) -> bool {
        let mut current = Some(id);
        while let Some(current_id) = current {
            if current_id == ancestor {
                return true;
            }
            current = self.elements.get(current_id).and_then(|d| d.parent);
        }
        false
    }

    /// Whether the element is attached under the document root.
    pub fn is_connected(&self, id: ElementId) -> bool {
        self.is_inclusive_ancestor(self.root, id)
    }

    /// The element and all its descendants, in pre-order.
    pub fn subtree(&self, id: ElementId) -> DomResult<Vec<ElementId>> {
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let data = self.data(current)?;
            result.push(current);
            stack.extend(data.children.iter().rev().copied());
        }
        Ok(result)
    }

    /// All attributes in insertion order.
    pub fn attributes(&self, id: ElementId) -> DomResult<&[(String, String)]> {
        self.data(id).map(|d| d.attributes.as_slice())
    }

    /// A single attribute value.
    pub fn attribute(&self, id: ElementId, name: &str) -> DomResult<Option<&str>> {
        self.data(id).map(|d| d.attribute(name))
    }

    /// The `id` attribute.
    pub fn element_name(&self, id: ElementId) -> DomResult<Option<&str>> {
        self.attribute(id, "id")
    }

    /// The whitespace-separated tokens of the `class` attribute.
    pub fn class_list(&self, id: ElementId) -> DomResult<Vec<&str>> {
        Ok(self
            .attribute(id, "class")?
            .map(|c| c.split_ascii_whitespace().collect())
            .unwrap_or_default())
    }

    /// Check for a class token.
    pub fn has_class(&self, id: ElementId, class: &str) -> DomResult<bool> {
        Ok(self.class_list(id)?.contains(&class))
    }

    /// Set an attribute, reporting a mutation if the value changed.
    pub fn set_attribute(
        &mut self,
        id: ElementId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> DomResult<()> {
        let name = name.into().to_ascii_lowercase();
        let value = value.into();
        let data = self.data_mut(id)?;
        match data.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) if *existing == value => return Ok(()),
            Some((_, existing)) => *existing = value,
            None => data.attributes.push((name.clone(), value)),
        }
        self.notify(MutationRecord {
            target: id,
            kind: MutationKind::Attribute { name },
        });
        Ok(())
    }

    /// Remove an attribute, reporting a mutation if it was present.
    pub fn remove_attribute(&mut self, id: ElementId, name: &str) -> DomResult<()> {
        let name = name.to_ascii_lowercase();
        let data = self.data_mut(id)?;
        let before = data.attributes.len();
        data.attributes.retain(|(n, _)| *n != name);
        if data.attributes.len() != before {
            self.notify(MutationRecord {
                target: id,
                kind: MutationKind::Attribute { name },
            });
        }
        Ok(())
    }

    /// Add a class token if missing.
    pub fn add_class(&mut self, id: ElementId, class: &str) -> DomResult<()> {
        let mut classes: Vec<String> = self
            .class_list(id)?
            .into_iter()
            .map(str::to_string)
            .collect();
        if classes.iter().any(|c| c == class) {
            return Ok(());
        }
        classes.push(class.to_string());
        self.set_attribute(id, "class", classes.join(" "))
    }

    /// Remove a class token if present.
    pub fn remove_class(&mut self, id: ElementId, class: &str) -> DomResult<()> {
        let classes: Vec<&str> = self.class_list(id)?;
        if !classes.contains(&class) {
            return Ok(());
        }
        let remaining = classes
            .into_iter()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attribute(id, "class", remaining)
    }

    /// Append `child` to `parent`, detaching it from any previous parent first.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) -> DomResult<()> {
        self.data(parent)?;
        self.data(child)?;
        if child == self.root {
            return Err(DomError::RootImmutable);
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::CircularInsertion);
        }

        if let Some(old_parent) = self.data(child)?.parent {
            self.remove_child(old_parent, child)?;
        }

        self.data_mut(child)?.parent = Some(parent);
        self.data_mut(parent)?.children.push(child);
        tracing::trace!(target: targets::DOCUMENT, ?parent, ?child, "appended child");
        self.notify(MutationRecord {
            target: child,
            kind: MutationKind::Added { parent },
        });
        Ok(())
    }

    /// Create an element and append it to `parent` in one step.
    pub fn append_element(
        &mut self,
        parent: ElementId,
        tag: impl Into<String>,
    ) -> DomResult<ElementId> {
        self.data(parent)?;
        let id = self.create_element(tag);
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Detach `child` from `parent`. The element keeps its subtree and style.
    pub fn remove_child(&mut self, parent: ElementId, child: ElementId) -> DomResult<()> {
        if self.data(child)?.parent != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        // The record must be scoped while the parent still links the child.
        self.notify(MutationRecord {
            target: child,
            kind: MutationKind::Removed { parent },
        });
        self.data_mut(parent)?.children.retain(|&c| c != child);
        self.data_mut(child)?.parent = None;
        tracing::trace!(target: targets::DOCUMENT, ?parent, ?child, "removed child");
        Ok(())
    }

    /// Destroy an element and its whole subtree.
    #[tracing::instrument(skip(self), target = "focss_core::document", level = "trace")]
    pub fn destroy(&mut self, id: ElementId) -> DomResult<()> {
        if id == self.root {
            return Err(DomError::RootImmutable);
        }
        let subtree = self.subtree(id)?;
        if let Some(parent) = self.data(id)?.parent {
            self.remove_child(parent, id)?;
        }
        for element in subtree {
            self.elements.remove(element);
        }
        Ok(())
    }

    /// The element's inline style.
    pub fn style(&self, id: ElementId) -> DomResult<&InlineStyle> {
        self.data(id).map(|d| &d.style)
    }

    /// Mutable access to the element's inline style.
    ///
    /// Style writes are not reported to observers.
    pub fn style_mut(&mut self, id: ElementId) -> DomResult<&mut InlineStyle> {
        self.data_mut(id).map(|d| &mut d.style)
    }

    /// Observe the subtree rooted at `root`.
    ///
    /// `waker` is invoked after every queued record, while the document is
    /// still borrowed; it must not touch the document.
    pub fn observe<W>(&mut self, root: ElementId, waker: W) -> DomResult<MutationObserver>
    where
        W: Fn() + Send + Sync + 'static,
    {
        self.data(root)?;
        let (observer, queue) = MutationObserver::new(root, Box::new(waker));
        self.observers.push(queue);
        tracing::debug!(target: targets::MUTATION, ?root, "observer registered");
        Ok(observer)
    }

    fn notify(&mut self, record: MutationRecord) {
        self.observers.retain(|queue| queue.is_connected());
        let scope = record.scope();
        for queue in &self.observers {
            if self.is_inclusive_ancestor(queue.root(), scope) {
                queue.push(record.clone());
            }
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("root", &self.root)
            .field("elements", &self.elements.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// A cloneable, thread-safe handle to a [`Document`].
///
/// Provides concurrent read access with exclusive write access via `RwLock`.
#[derive(Clone, Default)]
pub struct SharedDocument {
    inner: Arc<RwLock<Document>>,
}

impl SharedDocument {
    /// Wrap a new empty document.
    pub fn new() -> Self {
        Self::from_document(Document::new())
    }

    /// Wrap an existing document.
    pub fn from_document(document: Document) -> Self {
        Self {
            inner: Arc::new(RwLock::new(document)),
        }
    }

    /// Acquire a read guard.
    pub fn read(&self) -> RwLockReadGuard<'_, Document> {
        self.inner.read()
    }

    /// Acquire a write guard.
    pub fn write(&self) -> RwLockWriteGuard<'_, Document> {
        self.inner.write()
    }

    /// Execute a closure with read access to the document.
    pub fn with_read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Document) -> R,
    {
        f(&self.inner.read())
    }

    /// Execute a closure with write access to the document.
    pub fn with_write<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Document) -> R,
    {
        f(&mut self.inner.write())
    }
}

impl std::fmt::Debug for SharedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&*self.inner.read(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StyleSurface;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn build_tree() {
        let mut doc = Document::new();
        let root = doc.root();
        let div = doc.append_element(root, "DIV").unwrap();
        let span = doc.append_element(div, "span").unwrap();

        assert_eq!(doc.tag(div).unwrap(), "div");
        assert_eq!(doc.parent(span).unwrap(), Some(div));
        assert_eq!(doc.children(root).unwrap(), &[div]);
        assert!(doc.is_connected(span));
        assert_eq!(doc.subtree(root).unwrap(), vec![root, div, span]);
        assert_eq!(doc.ancestors(span).unwrap(), vec![div, root]);
    }

    #[test]
    fn classes_and_attributes() {
        let mut doc = Document::new();
        let div = doc.create_element("div");

        doc.add_class(div, "bar").unwrap();
        doc.add_class(div, "baz").unwrap();
        doc.add_class(div, "bar").unwrap();
        assert_eq!(doc.class_list(div).unwrap(), vec!["bar", "baz"]);

        doc.remove_class(div, "bar").unwrap();
        assert!(!doc.has_class(div, "bar").unwrap());
        assert!(doc.has_class(div, "baz").unwrap());

        doc.set_attribute(div, "id", "main").unwrap();
        assert_eq!(doc.element_name(div).unwrap(), Some("main"));
        doc.remove_attribute(div, "id").unwrap();
        assert_eq!(doc.element_name(div).unwrap(), None);
    }

    #[test]
    fn attribute_names_are_case_insensitive() {
        let mut doc = Document::new();
        let root = doc.root();
        let div = doc.append_element(root, "div").unwrap();
        let observer = doc.observe(root, || {}).unwrap();

        doc.set_attribute(div, "ID", "main").unwrap();
        assert_eq!(doc.attribute(div, "id").unwrap(), Some("main"));

        doc.remove_attribute(div, "Id").unwrap();
        assert_eq!(doc.element_name(div).unwrap(), None);

        let names: Vec<_> = observer
            .take_records()
            .into_iter()
            .map(|record| record.kind)
            .collect();
        let id = MutationKind::Attribute {
            name: "id".to_string(),
        };
        assert_eq!(names, vec![id.clone(), id]);
    }

    #[test]
    fn circular_insertion_rejected() {
        let mut doc = Document::new();
        let root = doc.root();
        let outer = doc.append_element(root, "div").unwrap();
        let inner = doc.append_element(outer, "div").unwrap();

        assert_eq!(doc.append_child(inner, outer), Err(DomError::CircularInsertion));
        assert_eq!(doc.append_child(inner, root), Err(DomError::RootImmutable));
    }

    #[test]
    fn siblings() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.append_element(root, "a").unwrap();
        let b = doc.append_element(root, "b").unwrap();
        let c = doc.append_element(root, "c").unwrap();

        assert_eq!(doc.sibling_position(b).unwrap(), Some((1, 3)));
        assert_eq!(doc.previous_siblings(c).unwrap(), vec![b, a]);
        assert_eq!(doc.next_siblings(a).unwrap(), vec![b, c]);
        assert_eq!(doc.sibling_position(root).unwrap(), None);
    }

    #[test]
    fn destroy_removes_subtree() {
        let mut doc = Document::new();
        let root = doc.root();
        let div = doc.append_element(root, "div").unwrap();
        let span = doc.append_element(div, "span").unwrap();

        doc.destroy(div).unwrap();
        assert!(!doc.contains(div));
        assert!(!doc.contains(span));
        assert!(doc.children(root).unwrap().is_empty());
        assert_eq!(doc.tag(span), Err(DomError::InvalidElement(span)));
        assert_eq!(doc.destroy(root), Err(DomError::RootImmutable));
    }

    #[test]
    fn observer_receives_scoped_records() {
        let mut doc = Document::new();
        let root = doc.root();
        let watched = doc.append_element(root, "section").unwrap();
        let other = doc.append_element(root, "aside").unwrap();

        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&wakes);
        let observer = doc
            .observe(watched, move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        let child = doc.append_element(watched, "div").unwrap();
        doc.add_class(child, "bar").unwrap();
        doc.add_class(other, "ignored").unwrap();
        doc.remove_child(watched, child).unwrap();

        let records = observer.take_records();
        assert_eq!(
            records,
            vec![
                MutationRecord {
                    target: child,
                    kind: MutationKind::Added { parent: watched },
                },
                MutationRecord {
                    target: child,
                    kind: MutationKind::Attribute {
                        name: "class".to_string(),
                    },
                },
                MutationRecord {
                    target: child,
                    kind: MutationKind::Removed { parent: watched },
                },
            ]
        );
        assert_eq!(wakes.load(Ordering::SeqCst), 3);
        assert!(observer.take_records().is_empty());
    }

    #[test]
    fn disconnected_observer_is_silent() {
        let mut doc = Document::new();
        let root = doc.root();
        let observer = doc.observe(root, || {}).unwrap();

        doc.append_element(root, "div").unwrap();
        assert_eq!(observer.pending(), 1);

        observer.disconnect();
        assert_eq!(observer.pending(), 0);
        doc.append_element(root, "div").unwrap();
        assert_eq!(observer.pending(), 0);
        assert!(!observer.is_connected());
    }

    #[test]
    fn style_writes_are_not_observed() {
        let mut doc = Document::new();
        let root = doc.root();
        let div = doc.append_element(root, "div").unwrap();
        let observer = doc.observe(root, || {}).unwrap();

        doc.style_mut(div).unwrap().set_property("color", "red");
        assert_eq!(doc.style(div).unwrap().get_property_value("color"), "red");
        assert_eq!(observer.pending(), 0);
    }

    #[test]
    fn shared_document_access() {
        let shared = SharedDocument::new();
        let div = shared.with_write(|doc| {
            let root = doc.root();
            doc.append_element(root, "div")
        });
        let div = div.unwrap();
        assert!(shared.read().is_connected(div));
        let clone = shared.clone();
        assert_eq!(clone.with_read(|doc| doc.len()), 2);
    }
}
