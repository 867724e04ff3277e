//! Inline style storage and the style surface capability.
//!
//! A [`StyleSurface`] is the live, per-element declaration block that an engine
//! writes into. Property names on the surface are dash-case (`max-width`), and
//! the empty string is the "unset" sentinel: writing it removes the declaration
//! and reading an undeclared property yields it.

/// Live per-element style declarations addressed by dash-case property name.
pub trait StyleSurface {
    /// Number of declared properties.
    fn len(&self) -> usize;

    /// Returns `true` when nothing is declared.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the declared property at `index`, in declaration order.
    fn item(&self, index: usize) -> Option<&str>;

    /// Value of a property, or `""` if it is not declared.
    fn get_property_value(&self, name: &str) -> &str;

    /// Set a property. An empty value removes the declaration.
    fn set_property(&mut self, name: &str, value: &str);
}

/// An ordered inline declaration block.
///
/// Setting an already declared property keeps its position; new properties
/// are appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    declarations: Vec<(String, String)>,
}

impl InlineStyle {
    /// Create an empty declaration block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterate over `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.declarations
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Remove every declaration.
    pub fn clear(&mut self) {
        self.declarations.clear();
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.declarations.iter().position(|(n, _)| n == name)
    }
}

impl StyleSurface for InlineStyle {
    fn len(&self) -> usize {
        self.declarations.len()
    }

    fn item(&self, index: usize) -> Option<&str> {
        self.declarations.get(index).map(|(name, _)| name.as_str())
    }

    fn get_property_value(&self, name: &str) -> &str {
        self.position(name)
            .map(|i| self.declarations[i].1.as_str())
            .unwrap_or("")
    }

    fn set_property(&mut self, name: &str, value: &str) {
        match (self.position(name), value.is_empty()) {
            (Some(i), true) => {
                self.declarations.remove(i);
            }
            (Some(i), false) => self.declarations[i].1 = value.to_string(),
            (None, true) => {}
            (None, false) => self
                .declarations
                .push((name.to_string(), value.to_string())),
        }
    }
}

impl std::fmt::Display for InlineStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (name, value)) in self.declarations.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{name}: {value};")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let mut style = InlineStyle::new();
        assert_eq!(style.get_property_value("color"), "");

        style.set_property("color", "red");
        style.set_property("max-width", "10px");
        assert_eq!(style.len(), 2);
        assert_eq!(style.get_property_value("color"), "red");
        assert_eq!(style.item(1), Some("max-width"));
    }

    #[test]
    fn overwrite_keeps_position() {
        let mut style = InlineStyle::new();
        style.set_property("color", "red");
        style.set_property("width", "1px");
        style.set_property("color", "blue");

        assert_eq!(style.item(0), Some("color"));
        assert_eq!(style.get_property_value("color"), "blue");
        assert_eq!(style.to_string(), "color: blue; width: 1px;");
    }

    #[test]
    fn empty_value_unsets() {
        let mut style = InlineStyle::new();
        style.set_property("color", "red");
        style.set_property("color", "");
        assert!(style.is_empty());

        // Unsetting an undeclared property is a no-op.
        style.set_property("width", "");
        assert!(style.is_empty());
    }
}
