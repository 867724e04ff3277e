//! Specificity of selector text.
//!
//! Specificity is computed by scanning selector text rather than a parsed
//! selector, so it is available for any text, including selectors the matcher
//! cannot parse. Simple selectors are found category by category; every match
//! is blanked out with spaces of equal length so later categories cannot match
//! it again and offsets stay valid.
//!
//! See <http://www.w3.org/TR/css3-selectors/#specificity>.

use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// A specificity triple.
///
/// - a: ID selectors
/// - b: classes, attributes and pseudo-classes
/// - c: types and pseudo-elements
///
/// Ordering is lexicographic, so `(1,0,0) > (0,99,99)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Specificity(pub u32, pub u32, pub u32);

impl Specificity {
    /// `*` and the empty selector.
    pub const ZERO: Self = Self(0, 0, 0);

    /// The `a` component.
    pub fn ids(&self) -> u32 {
        self.0
    }

    /// Get the class/attribute/pseudo-class count.
    pub fn classes(&self) -> u32 {
        self.1
    }

    /// Get the type/pseudo-element count.
    pub fn types(&self) -> u32 {
        self.2
    }

    /// Combine with insertion order for complete ordering.
    pub fn with_order(self, order: u32) -> SpecificityWithOrder {
        SpecificityWithOrder {
            specificity: self,
            order,
        }
    }

    /// The digit-concatenation form, e.g. `"110"` for `#a.b`.
    ///
    /// Ambiguous once any count reaches 10: `(0,11,0)` and `(0,1,10)` both
    /// produce `"0110"`. Use the tuple for ordering.
    pub fn legacy_string(&self) -> String {
        format!("{}{}{}", self.0, self.1, self.2)
    }
}

impl fmt::Display for Specificity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.0, self.1, self.2)
    }
}

/// Specificity combined with insertion order for tie-breaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SpecificityWithOrder {
    /// Weight of the matching selector.
    pub specificity: Specificity,
    /// Insertion order for tie-breaking (higher = inserted later).
    pub order: u32,
}

/// Which specificity count a simple selector contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecificityCategory {
    /// IDs (a).
    Id,
    /// Classes, attributes and pseudo-classes (b).
    Class,
    /// Types and pseudo-elements (c).
    Type,
}

/// One simple selector found in the scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecificityPart {
    /// The matched text.
    pub text: String,
    /// The count it contributes to.
    pub category: SpecificityCategory,
    /// Byte offset in the scanned selector.
    pub index: usize,
    /// Byte length of the match.
    pub length: usize,
}

/// The specificity breakdown of one selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecificityResult {
    /// The input selector, as given.
    pub selector: String,
    /// The (a, b, c) counts.
    pub specificity: Specificity,
    /// Counted simple selectors, ordered by offset.
    pub parts: Vec<SpecificityPart>,
}

impl SpecificityResult {
    /// See [`Specificity::legacy_string`].
    pub fn legacy_string(&self) -> String {
        self.specificity.legacy_string()
    }
}

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($re).expect("specificity pattern is valid"));
    };
}

// Each pattern assumes that everything matched by the patterns before it has
// already been blanked out.
pattern!(NEGATION, r":not\(([^)]*)\)");
pattern!(RULE_BODY, r"(?s)\{.*");
pattern!(ATTRIBUTE, r"\[[^\]]+\]");
pattern!(ID, r"#[^\s+>~.\[:]+");
pattern!(CLASS, r"\.[^\s+>~.\[:]+");
pattern!(
    PSEUDO_ELEMENT,
    r"(?i)::[^\s+>~.\[:]+|:first-line|:first-letter|:before|:after"
);
pattern!(PSEUDO_CLASS_WITH_ARGUMENT, r"(?i):[\w-]+\([^)]*\)");
pattern!(PSEUDO_CLASS, r":[^\s+>~.\[:]+");
pattern!(SEPARATOR, r"[*\s+>~]");
pattern!(STRAY_MARKER, r"[#.]");
pattern!(ELEMENT, r"[^\s+>~.\[:]+");

/// Calculate the specificity of every selector in a comma-separated list.
///
/// Empty list entries are skipped.
pub fn calculate(input: &str) -> Vec<SpecificityResult> {
    split_selector_list(input)
        .into_iter()
        .filter(|selector| !selector.is_empty())
        .map(calculate_single)
        .collect()
}

/// Calculate the specificity of a single selector.
///
/// Never fails: text that fits no category is ignored.
pub fn calculate_single(input: &str) -> SpecificityResult {
    let mut scanner = Scanner::new(input);

    // The :not() wrapper counts for nothing, its argument counts as usual.
    scanner.text = NEGATION
        .replace_all(&scanner.text, |caps: &Captures<'_>| {
            format!("     {} ", &caps[1])
        })
        .into_owned();

    // Tolerate a pasted rule, not just a selector.
    scanner.blank_all(&RULE_BODY);

    scanner.collect(&ATTRIBUTE, SpecificityCategory::Class);
    scanner.collect(&ID, SpecificityCategory::Id);
    scanner.collect(&CLASS, SpecificityCategory::Class);
    scanner.collect(&PSEUDO_ELEMENT, SpecificityCategory::Type);
    scanner.collect(&PSEUDO_CLASS_WITH_ARGUMENT, SpecificityCategory::Class);
    scanner.collect(&PSEUDO_CLASS, SpecificityCategory::Class);

    scanner.blank_all(&SEPARATOR);
    // Stray markers show up while a selector is being typed.
    scanner.blank_all(&STRAY_MARKER);

    scanner.collect(&ELEMENT, SpecificityCategory::Type);

    scanner.finish()
}

/// Split a selector list on commas that are not nested in brackets,
/// parentheses or quotes. Entries are trimmed.
pub fn split_selector_list(input: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                entries.push(input[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    entries.push(input[start..].trim());
    entries
}

struct Scanner<'a> {
    input: &'a str,
    text: String,
    counts: [u32; 3],
    parts: Vec<SpecificityPart>,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            text: input.to_string(),
            counts: [0; 3],
            parts: Vec::new(),
        }
    }

    fn ranges(&self, regex: &Regex) -> Vec<(usize, usize)> {
        regex
            .find_iter(&self.text)
            .map(|m| (m.start(), m.end()))
            .collect()
    }

    fn blank(&mut self, start: usize, end: usize) {
        self.text.replace_range(start..end, &" ".repeat(end - start));
    }

    fn blank_all(&mut self, regex: &Regex) {
        for (start, end) in self.ranges(regex) {
            self.blank(start, end);
        }
    }

    fn collect(&mut self, regex: &Regex, category: SpecificityCategory) {
        for (start, end) in self.ranges(regex) {
            self.counts[category as usize] += 1;
            self.parts.push(SpecificityPart {
                text: self.text[start..end].to_string(),
                category,
                index: start,
                length: end - start,
            });
            self.blank(start, end);
        }
    }

    fn finish(mut self) -> SpecificityResult {
        self.parts.sort_by_key(|part| part.index);
        let [a, b, c] = self.counts;
        SpecificityResult {
            selector: self.input.to_string(),
            specificity: Specificity(a, b, c),
            parts: self.parts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(selector: &str) -> Specificity {
        calculate_single(selector).specificity
    }

    #[test]
    fn simple_selectors() {
        assert_eq!(counts("*"), Specificity(0, 0, 0));
        assert_eq!(counts("div"), Specificity(0, 0, 1));
        assert_eq!(counts(".primary"), Specificity(0, 1, 0));
        assert_eq!(counts("#submit"), Specificity(1, 0, 0));
        assert_eq!(counts("[type=text]"), Specificity(0, 1, 0));
        assert_eq!(counts(":hover"), Specificity(0, 1, 0));
        assert_eq!(counts("::before"), Specificity(0, 0, 1));
    }

    #[test]
    fn compound_selectors() {
        assert_eq!(counts("#a.b"), Specificity(1, 1, 0));
        assert_eq!(counts("div::before"), Specificity(0, 0, 2));
        assert_eq!(counts("ul li:nth-child(2n+1) > a.active"), Specificity(0, 2, 3));
        assert_eq!(counts("a[href$=\".pdf\"]:hover"), Specificity(0, 2, 1));
        assert_eq!(counts("body #main .item span"), Specificity(1, 1, 2));
    }

    #[test]
    fn legacy_pseudo_elements() {
        assert_eq!(counts("p:first-line"), Specificity(0, 0, 2));
        assert_eq!(counts("p:AFTER"), Specificity(0, 0, 2));
        assert_eq!(counts("p:first-child"), Specificity(0, 1, 1));
    }

    #[test]
    fn negation_counts_its_argument() {
        assert_eq!(counts(":not(.foo)"), counts(".foo"));
        assert_eq!(counts("div:not(#x)"), Specificity(1, 0, 1));

        let result = calculate_single(":not(.foo)");
        assert_eq!(result.parts.len(), 1);
        assert_eq!(result.parts[0].text, ".foo");
        assert_eq!(result.parts[0].index, 5);
    }

    #[test]
    fn parts_are_ordered_by_offset() {
        let result = calculate_single("a.b#c[d]");
        let texts: Vec<_> = result.parts.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["a", ".b", "#c", "[d]"]);

        let offsets: Vec<_> = result.parts.iter().map(|p| (p.index, p.length)).collect();
        assert_eq!(offsets, vec![(0, 1), (1, 2), (3, 2), (5, 3)]);
    }

    #[test]
    fn parts_do_not_overlap_and_reconstruct() {
        for selector in [
            "div.a > span#b + em ~ i[x='1']::after",
            "#a.b.c:hover:nth-child(3) p",
            ":not(.x) .y { color: red }",
            "a..b ## c",
        ] {
            let result = calculate_single(selector);
            let mut end = 0;
            for part in &result.parts {
                assert!(part.index >= end, "overlap in {selector}");
                end = part.index + part.length;
            }

            let cleaned = NEGATION.replace_all(selector, |caps: &Captures<'_>| {
                format!("     {} ", &caps[1])
            });
            for part in &result.parts {
                assert_eq!(&cleaned[part.index..part.index + part.length], part.text);
            }

            let total = result.specificity.0 + result.specificity.1 + result.specificity.2;
            assert_eq!(total as usize, result.parts.len());
        }
    }

    #[test]
    fn rule_body_is_ignored() {
        assert_eq!(counts(".a { color: red; }"), Specificity(0, 1, 0));
        assert_eq!(counts("div{#not-an-id}"), Specificity(0, 0, 1));
    }

    #[test]
    fn malformed_input_fails_soft() {
        assert_eq!(counts("[unclosed"), Specificity(0, 0, 1));
        assert_eq!(counts("a:nth-child(2"), Specificity(0, 1, 1));
        assert_eq!(counts("div . #"), Specificity(0, 0, 1));
        assert_eq!(counts(""), Specificity::ZERO);
    }

    #[test]
    fn list_is_split_and_empty_entries_skipped() {
        let results = calculate("a, .b,, #c");
        let specs: Vec<_> = results.iter().map(|r| r.specificity).collect();
        assert_eq!(
            specs,
            vec![Specificity(0, 0, 1), Specificity(0, 1, 0), Specificity(1, 0, 0)]
        );
        assert_eq!(results[1].selector, ".b");
    }

    #[test]
    fn list_split_respects_nesting() {
        assert_eq!(
            split_selector_list("a[title=\"x,y\"], :is(b, c)"),
            vec!["a[title=\"x,y\"]", ":is(b, c)"]
        );
    }

    #[test]
    fn legacy_string_collides() {
        let many_classes = counts(".a.b.c.d.e.f.g.h.i.j.k");
        assert_eq!(many_classes, Specificity(0, 11, 0));
        assert_eq!(many_classes.legacy_string(), "0110");
        let many_types = counts(".x a b c d e f g h i j");
        assert_eq!(many_types, Specificity(0, 1, 10));
        assert_eq!(many_types.legacy_string(), many_classes.legacy_string());
        assert!(many_classes > many_types);
    }

    #[test]
    fn specificity_comparison() {
        assert!(Specificity(1, 0, 0) > Specificity(0, 99, 99));
        assert!(Specificity(0, 1, 0) > Specificity(0, 0, 99));
        assert!(Specificity(0, 2, 0) > Specificity(0, 1, 0));
    }

    #[test]
    fn specificity_with_order() {
        let s1 = Specificity(0, 1, 0).with_order(1);
        let s2 = Specificity(0, 1, 0).with_order(2);
        let s3 = Specificity(0, 2, 0).with_order(0);

        assert!(s3 > s1);
        assert!(s3 > s2);
        assert!(s2 > s1);
    }
}
