//! Parsed selector representation used by the matcher.
//!
//! Only what a document tree can decide is representable: tags, ids,
//! classes, attributes and structural pseudo-classes.

use std::fmt::{self, Write};

/// A chain of compounds joined by combinators, e.g. `ul.menu > li a[href]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector {
    /// Compounds in source order; the last one is the subject.
    pub parts: Vec<SelectorPart>,
    /// `combinators[i]` sits between `parts[i]` and `parts[i + 1]`.
    pub combinators: Vec<Combinator>,
}

impl Selector {
    /// A selector made of one compound.
    pub fn compound(part: SelectorPart) -> Self {
        Self {
            parts: vec![part],
            combinators: Vec::new(),
        }
    }

    /// Extend the chain to the right.
    pub fn combine(mut self, combinator: Combinator, part: SelectorPart) -> Self {
        if !self.parts.is_empty() {
            self.combinators.push(combinator);
        }
        self.parts.push(part);
        self
    }

    /// The compound an element must satisfy itself.
    pub fn subject(&self) -> Option<&SelectorPart> {
        self.parts.last()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = self.parts.iter();
        if let Some(first) = parts.next() {
            write!(f, "{first}")?;
        }
        for (combinator, part) in self.combinators.iter().zip(parts) {
            f.write_str(combinator.as_str())?;
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

/// One compound, e.g. `a.external[href]:first-child`.
///
/// Every present constraint must hold for an element to match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SelectorPart {
    /// `div` or `*`.
    pub type_selector: Option<TypeSelector>,
    /// `#id`
    pub id: Option<String>,
    /// `.class`, in source order.
    pub classes: Vec<String>,
    /// `[name]`, `[name=value]` and friends.
    pub attributes: Vec<AttributeSelector>,
    /// `:first-child`, `:not(..)` and friends.
    pub pseudo_classes: Vec<PseudoClass>,
}

impl SelectorPart {
    /// A compound with no constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// `tag`
    pub fn type_only(tag: impl Into<String>) -> Self {
        Self {
            type_selector: Some(TypeSelector::Type(tag.into())),
            ..Self::default()
        }
    }

    /// `*`
    pub fn universal() -> Self {
        Self {
            type_selector: Some(TypeSelector::Universal),
            ..Self::default()
        }
    }

    /// `.class`
    pub fn class_only(class: impl Into<String>) -> Self {
        Self::new().with_class(class)
    }

    /// `#id`
    pub fn id_only(id: impl Into<String>) -> Self {
        Self::new().with_id(id)
    }

    /// Require an id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Require one more class.
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Require one more attribute condition.
    pub fn with_attribute(mut self, attribute: AttributeSelector) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Require one more pseudo-class.
    pub fn with_pseudo(mut self, pseudo: PseudoClass) -> Self {
        self.pseudo_classes.push(pseudo);
        self
    }

    /// True when the compound constrains nothing.
    pub fn is_empty(&self) -> bool {
        self.type_selector.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attributes.is_empty()
            && self.pseudo_classes.is_empty()
    }
}

impl fmt::Display for SelectorPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ty) = &self.type_selector {
            f.write_str(ty.name())?;
        }
        if let Some(id) = &self.id {
            f.write_char('#')?;
            f.write_str(id)?;
        }
        for class in &self.classes {
            f.write_char('.')?;
            f.write_str(class)?;
        }
        self.attributes.iter().try_for_each(|attr| write!(f, "{attr}"))?;
        self.pseudo_classes
            .iter()
            .try_for_each(|pseudo| write!(f, ":{pseudo}"))
    }
}

/// The tag constraint of a compound.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSelector {
    /// `*`
    Universal,
    /// A lower-cased tag name.
    Type(String),
}

impl TypeSelector {
    fn name(&self) -> &str {
        match self {
            TypeSelector::Universal => "*",
            TypeSelector::Type(tag) => tag,
        }
    }
}

/// How two neighboring compounds relate in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// Whitespace: some ancestor.
    Descendant,
    /// `>`: the parent.
    Child,
    /// `+`: the previous sibling.
    AdjacentSibling,
    /// `~`: any previous sibling.
    GeneralSibling,
}

impl Combinator {
    fn as_str(self) -> &'static str {
        match self {
            Combinator::Descendant => " ",
            Combinator::Child => " > ",
            Combinator::AdjacentSibling => " + ",
            Combinator::GeneralSibling => " ~ ",
        }
    }
}

/// Attribute value operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrOperator {
    /// `[a=v]` - exact value.
    Equals,
    /// `[a~=v]` - whitespace-separated list contains `v`.
    Includes,
    /// `[a|=v]` - exactly `v` or starts with `v-`.
    DashMatch,
    /// `[a^=v]` - starts with `v`.
    Prefix,
    /// `[a$=v]` - ends with `v`.
    Suffix,
    /// `[a*=v]` - contains `v`.
    Substring,
}

impl AttrOperator {
    fn as_str(self) -> &'static str {
        match self {
            AttrOperator::Equals => "=",
            AttrOperator::Includes => "~=",
            AttrOperator::DashMatch => "|=",
            AttrOperator::Prefix => "^=",
            AttrOperator::Suffix => "$=",
            AttrOperator::Substring => "*=",
        }
    }
}

/// An attribute selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeSelector {
    /// Lower-cased attribute name.
    pub name: String,
    /// Operator and expected value; `None` only tests presence.
    pub value: Option<(AttrOperator, String)>,
    /// The `i` flag: compare values ASCII case-insensitively.
    pub case_insensitive: bool,
}

impl AttributeSelector {
    /// `[name]`
    pub fn exists(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            case_insensitive: false,
        }
    }

    /// `[name<op>value]`
    pub fn with_value(name: impl Into<String>, op: AttrOperator, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some((op, value.into())),
            case_insensitive: false,
        }
    }

    /// Set the case-insensitivity flag.
    pub fn ignore_case(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    /// Check an actual attribute value (`None` = attribute absent).
    pub fn matches(&self, actual: Option<&str>) -> bool {
        let Some(actual) = actual else {
            return false;
        };
        let Some((op, expected)) = &self.value else {
            return true;
        };

        let (actual, expected) = if self.case_insensitive {
            (actual.to_ascii_lowercase(), expected.to_ascii_lowercase())
        } else {
            (actual.to_string(), expected.clone())
        };

        match op {
            AttrOperator::Equals => actual == expected,
            AttrOperator::Includes => {
                !expected.is_empty()
                    && !expected.contains(char::is_whitespace)
                    && actual.split_ascii_whitespace().any(|token| token == expected)
            }
            AttrOperator::DashMatch => {
                actual == expected
                    || actual
                        .strip_prefix(expected.as_str())
                        .is_some_and(|rest| rest.starts_with('-'))
            }
            AttrOperator::Prefix => !expected.is_empty() && actual.starts_with(&expected),
            AttrOperator::Suffix => !expected.is_empty() && actual.ends_with(&expected),
            AttrOperator::Substring => !expected.is_empty() && actual.contains(&expected),
        }
    }
}

impl fmt::Display for AttributeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            None => write!(f, "[{}]", self.name),
            Some((op, value)) => {
                write!(f, "[{}{}{:?}", self.name, op.as_str(), value)?;
                if self.case_insensitive {
                    write!(f, " i")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Pseudo-classes decidable from tree structure alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PseudoClass {
    /// `:root`
    Root,
    /// `:first-child`
    FirstChild,
    /// `:last-child`
    LastChild,
    /// `:only-child`
    OnlyChild,
    /// `:nth-child(An+B)`, counting from the first sibling.
    NthChild(NthExpr),
    /// `:nth-last-child(An+B)`, counting from the last sibling.
    NthLastChild(NthExpr),
    /// `:empty`, no child elements.
    Empty,
    /// `:not(compound)`
    Not(Box<SelectorPart>),
}

impl PseudoClass {
    /// Look up an argument-less pseudo-class by name.
    pub fn from_css(name: &str) -> Option<Self> {
        let pseudo = match name.to_ascii_lowercase().as_str() {
            "root" => Self::Root,
            "first-child" => Self::FirstChild,
            "last-child" => Self::LastChild,
            "only-child" => Self::OnlyChild,
            "empty" => Self::Empty,
            _ => return None,
        };
        Some(pseudo)
    }

    /// The name as written after the colon.
    pub fn name(&self) -> &'static str {
        match self {
            PseudoClass::Root => "root",
            PseudoClass::FirstChild => "first-child",
            PseudoClass::LastChild => "last-child",
            PseudoClass::OnlyChild => "only-child",
            PseudoClass::NthChild(_) => "nth-child",
            PseudoClass::NthLastChild(_) => "nth-last-child",
            PseudoClass::Empty => "empty",
            PseudoClass::Not(_) => "not",
        }
    }
}

impl fmt::Display for PseudoClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())?;
        match self {
            PseudoClass::NthChild(expr) | PseudoClass::NthLastChild(expr) => write!(f, "({expr})"),
            PseudoClass::Not(inner) => write!(f, "({inner})"),
            _ => Ok(()),
        }
    }
}

/// An `An+B` position pattern; positions are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NthExpr {
    /// Step.
    pub a: i32,
    /// Offset.
    pub b: i32,
}

impl NthExpr {
    /// `An+B`
    pub fn new(a: i32, b: i32) -> Self {
        Self { a, b }
    }

    /// `2n+1`
    pub fn odd() -> Self {
        Self::new(2, 1)
    }

    /// `2n`
    pub fn even() -> Self {
        Self::new(2, 0)
    }

    /// Whether the sibling at 0-based `index` is selected.
    ///
    /// True when some `n >= 0` gives `A*n + B == index + 1`.
    pub fn matches(&self, index: usize) -> bool {
        let position = index as i64 + 1;
        let (a, b) = (i64::from(self.a), i64::from(self.b));
        let offset = position - b;
        match a {
            0 => offset == 0,
            _ => offset % a == 0 && offset / a >= 0,
        }
    }
}

impl fmt::Display for NthExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.a, self.b) {
            (0, b) => write!(f, "{b}"),
            (a, 0) => write!(f, "{a}n"),
            (a, b) => write!(f, "{a}n{b:+}"),
        }
    }
}
