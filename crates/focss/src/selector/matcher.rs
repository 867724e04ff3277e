//! Matching parsed selectors against document elements.

use focss_core::{Document, DomResult, ElementId};

use super::{Combinator, PseudoClass, Selector, SelectorPart, TypeSelector};

/// Element state for selector matching.
#[derive(Debug, Clone, Default)]
pub struct ElementMatchContext<'a> {
    /// Lower-cased tag name (e.g., "div", "li").
    pub tag: &'a str,
    /// The `id` attribute (for #id selectors).
    pub element_name: Option<&'a str>,
    /// The element's class tokens.
    pub classes: Vec<&'a str>,
    /// All attributes, `id` and `class` included.
    pub attributes: &'a [(String, String)],
    /// Position among siblings; `None` for parentless elements.
    pub sibling_info: Option<SiblingInfo>,
    /// Child element count, for `:empty`.
    pub child_count: usize,
    /// Whether this is the document root (for :root).
    pub is_root: bool,
}

impl<'a> ElementMatchContext<'a> {
    /// Snapshot an element of `document`.
    pub fn from_document(document: &'a Document, id: ElementId) -> DomResult<Self> {
        Ok(Self {
            tag: document.tag(id)?,
            element_name: document.element_name(id)?,
            classes: document.class_list(id)?,
            attributes: document.attributes(id)?,
            sibling_info: document
                .sibling_position(id)?
                .map(|(index, count)| SiblingInfo { index, count }),
            child_count: document.children(id)?.len(),
            is_root: document.root() == id,
        })
    }

    fn attribute(&self, name: &str) -> Option<&'a str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Where an element sits among its parent's children.
#[derive(Debug, Clone, Copy)]
pub struct SiblingInfo {
    /// 0-based position.
    pub index: usize,
    /// Number of children of the parent.
    pub count: usize,
}

impl SiblingInfo {
    /// `:first-child`
    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    /// `:last-child`
    pub fn is_last(&self) -> bool {
        self.index + 1 == self.count
    }

    /// `:only-child`
    pub fn is_only(&self) -> bool {
        self.count == 1
    }

    /// Zero-based index counted from the last sibling.
    pub fn index_from_end(&self) -> usize {
        self.count - self.index - 1
    }
}

/// Right-to-left selector matching with backtracking.
pub struct SelectorMatcher;

impl SelectorMatcher {
    /// Check if a full selector matches `element`, considering combinators.
    ///
    /// Walks the selector from right to left. Descendant and general-sibling
    /// combinators backtrack, so `a b c` finds a match whenever any chain of
    /// ancestors fits.
    pub fn matches(document: &Document, selector: &Selector, element: ElementId) -> bool {
        match selector.parts.len().checked_sub(1) {
            Some(subject) => Self::matches_from(document, selector, subject, element),
            None => false,
        }
    }

    fn matches_from(
        document: &Document,
        selector: &Selector,
        index: usize,
        element: ElementId,
    ) -> bool {
        if !Self::element_matches(document, &selector.parts[index], element) {
            return false;
        }
        if index == 0 {
            return true;
        }

        let next = index - 1;
        let candidates = match selector.combinators[next] {
            Combinator::Descendant => document.ancestors(element).unwrap_or_default(),
            Combinator::Child => document
                .parent(element)
                .ok()
                .flatten()
                .into_iter()
                .collect(),
            Combinator::AdjacentSibling => document
                .previous_siblings(element)
                .unwrap_or_default()
                .into_iter()
                .take(1)
                .collect(),
            Combinator::GeneralSibling => document.previous_siblings(element).unwrap_or_default(),
        };

        candidates
            .into_iter()
            .any(|candidate| Self::matches_from(document, selector, next, candidate))
    }

    /// Check a compound part against an element of `document`.
    pub fn element_matches(document: &Document, part: &SelectorPart, element: ElementId) -> bool {
        ElementMatchContext::from_document(document, element)
            .is_ok_and(|context| Self::part_matches(part, &context))
    }

    /// Check if a selector part matches the element.
    pub fn part_matches(part: &SelectorPart, context: &ElementMatchContext<'_>) -> bool {
        // Check type selector
        if let Some(TypeSelector::Type(name)) = &part.type_selector {
            if name != context.tag {
                return false;
            }
        }

        // Check ID selector
        if let Some(id) = &part.id {
            match context.element_name {
                Some(name) if name == id => {}
                _ => return false,
            }
        }

        if !part.classes.iter().all(|class| context.classes.contains(&class.as_str())) {
            return false;
        }

        for attribute in &part.attributes {
            if !attribute.matches(context.attribute(&attribute.name)) {
                return false;
            }
        }

        part.pseudo_classes
            .iter()
            .all(|pseudo| Self::pseudo_matches(pseudo, context))
    }

    fn pseudo_matches(pseudo: &PseudoClass, context: &ElementMatchContext<'_>) -> bool {
        match pseudo {
            PseudoClass::Root => context.is_root,
            PseudoClass::FirstChild => context.sibling_info.is_some_and(|s| s.is_first()),
            PseudoClass::LastChild => context.sibling_info.is_some_and(|s| s.is_last()),
            PseudoClass::OnlyChild => context.sibling_info.is_some_and(|s| s.is_only()),
            PseudoClass::NthChild(expr) => {
                context.sibling_info.is_some_and(|s| expr.matches(s.index))
            }
            PseudoClass::NthLastChild(expr) => context
                .sibling_info
                .is_some_and(|s| expr.matches(s.index_from_end())),
            PseudoClass::Empty => context.child_count == 0,
            PseudoClass::Not(inner) => !Self::part_matches(inner, context),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::{AttrOperator, AttributeSelector, NthExpr, parse_selector};

    fn matches(doc: &Document, selector: &str, element: ElementId) -> bool {
        SelectorMatcher::matches(doc, &parse_selector(selector).unwrap(), element)
    }

    #[test]
    fn compound_parts() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.append_element(root, "a").unwrap();
        doc.set_attribute(a, "id", "home").unwrap();
        doc.set_attribute(a, "href", "https://example.com").unwrap();
        doc.add_class(a, "nav").unwrap();
        doc.add_class(a, "active").unwrap();

        let context = ElementMatchContext::from_document(&doc, a).unwrap();
        assert!(SelectorMatcher::part_matches(&SelectorPart::type_only("a"), &context));
        assert!(SelectorMatcher::part_matches(&SelectorPart::universal(), &context));
        assert!(!SelectorMatcher::part_matches(&SelectorPart::type_only("b"), &context));

        let part = SelectorPart::type_only("a")
            .with_id("home")
            .with_class("nav")
            .with_class("active")
            .with_attribute(AttributeSelector::with_value("href", AttrOperator::Prefix, "https:"));
        assert!(SelectorMatcher::part_matches(&part, &context));

        let part = SelectorPart::new().with_class("nav").with_class("missing");
        assert!(!SelectorMatcher::part_matches(&part, &context));

        let part = SelectorPart::id_only("other");
        assert!(!SelectorMatcher::part_matches(&part, &context));
    }

    #[test]
    fn structural_pseudo_classes() {
        let mut doc = Document::new();
        let root = doc.root();
        let list = doc.append_element(root, "ul").unwrap();
        let items: Vec<_> = (0..4)
            .map(|_| doc.append_element(list, "li").unwrap())
            .collect();

        assert!(matches(&doc, "li:first-child", items[0]));
        assert!(!matches(&doc, "li:first-child", items[1]));
        assert!(matches(&doc, "li:last-child", items[3]));
        assert!(matches(&doc, "li:nth-child(even)", items[1]));
        assert!(!matches(&doc, "li:nth-child(even)", items[2]));
        assert!(matches(&doc, "li:nth-last-child(1)", items[3]));
        assert!(matches(&doc, "li:empty", items[0]));
        assert!(!matches(&doc, "ul:empty", list));
        assert!(matches(&doc, ":root", root));
        assert!(matches(&doc, "ul:only-child", list));

        let context = ElementMatchContext::from_document(&doc, items[2]).unwrap();
        let part = SelectorPart::new().with_pseudo(PseudoClass::NthChild(NthExpr::odd()));
        assert!(SelectorMatcher::part_matches(&part, &context));
    }

    #[test]
    fn negation() {
        let mut doc = Document::new();
        let root = doc.root();
        let p = doc.append_element(root, "p").unwrap();

        assert!(matches(&doc, "p:not(.intro)", p));
        doc.add_class(p, "intro").unwrap();
        assert!(!matches(&doc, "p:not(.intro)", p));
    }

    #[test]
    fn combinators() {
        let mut doc = Document::new();
        let root = doc.root();
        let nav = doc.append_element(root, "nav").unwrap();
        doc.add_class(nav, "menu").unwrap();
        let list = doc.append_element(nav, "ul").unwrap();
        let first = doc.append_element(list, "li").unwrap();
        let second = doc.append_element(list, "li").unwrap();
        let third = doc.append_element(list, "li").unwrap();
        let link = doc.append_element(second, "a").unwrap();

        assert!(matches(&doc, ".menu a", link));
        assert!(matches(&doc, "nav ul > li > a", link));
        assert!(!matches(&doc, "nav > li", second));
        assert!(matches(&doc, "li + li", second));
        assert!(!matches(&doc, "li + li", first));
        assert!(matches(&doc, "li:first-child ~ li", third));
        assert!(!matches(&doc, "li:first-child + li", third));
        assert!(matches(&doc, "html nav li:first-child + li a", link));
    }

    #[test]
    fn descendant_backtracks() {
        let mut doc = Document::new();
        let root = doc.root();
        let outer = doc.append_element(root, "div").unwrap();
        doc.add_class(outer, "x").unwrap();
        let middle = doc.append_element(outer, "div").unwrap();
        let inner = doc.append_element(middle, "div").unwrap();
        let span = doc.append_element(inner, "span").unwrap();

        // The nearest `div` ancestor has no `.x` parent; `middle` does.
        assert!(matches(&doc, ".x > div span", span));
        assert!(!matches(&doc, ".x > span", span));
        assert!(!matches(&doc, ".x > div > span", span));
    }

    #[test]
    fn detached_and_destroyed_elements() {
        let mut doc = Document::new();
        let detached = doc.create_element("div");
        assert!(matches(&doc, "div", detached));
        assert!(!matches(&doc, "html div", detached));

        doc.destroy(detached).unwrap();
        assert!(!matches(&doc, "div", detached));
    }
}
