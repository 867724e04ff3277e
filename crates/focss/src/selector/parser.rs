//! Literal selector parsing using the `cssparser` crate.
//!
//! Resolved templates are parsed one comma-separated entry at a time into a
//! [`Selector`] the matcher can evaluate. Anything that cannot match an
//! element (pseudo-elements, interaction pseudo-classes, namespaces) is
//! rejected here, so the engine treats it as matching nothing.

use cssparser::{ParseError as CssParseError, ParseErrorKind, Parser, ParserInput, Token};

use super::{
    AttrOperator, AttributeSelector, Combinator, NthExpr, PseudoClass, Selector, SelectorPart,
    TypeSelector,
};
use crate::{Error, Result};

type ParseResult<'i, T> = std::result::Result<T, CssParseError<'i, &'static str>>;

/// Parse a single complex selector (no top-level commas).
///
/// # Example
///
/// ```
/// use focss::selector::parse_selector;
///
/// let selector = parse_selector("ul > li.active a[href]").unwrap();
/// assert_eq!(selector.parts.len(), 3);
/// assert_eq!(selector.to_string(), "ul > li.active a[href]");
/// ```
pub fn parse_selector(text: &str) -> Result<Selector> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    parse_complex(&mut parser).map_err(|err| Error::invalid_selector(text, describe(&err)))
}

fn describe(err: &CssParseError<'_, &'static str>) -> String {
    match &err.kind {
        ParseErrorKind::Custom(message) => (*message).to_string(),
        ParseErrorKind::Basic(kind) => format!("{:?}", kind),
    }
}

fn parse_complex<'i>(parser: &mut Parser<'i, '_>) -> ParseResult<'i, Selector> {
    let mut parts = vec![];
    let mut combinators = vec![];
    let mut current = SelectorPart::default();
    let mut pending: Option<Combinator> = None;
    let mut saw_whitespace = false;

    parser.skip_whitespace();

    loop {
        let token = match parser.next_including_whitespace() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        let combinator = match token {
            Token::WhiteSpace(_) => {
                saw_whitespace = true;
                continue;
            }
            Token::Delim('>') => Some(Combinator::Child),
            Token::Delim('+') => Some(Combinator::AdjacentSibling),
            Token::Delim('~') => Some(Combinator::GeneralSibling),
            _ => None,
        };

        if let Some(combinator) = combinator {
            if current.is_empty() || pending.is_some() {
                return Err(parser.new_custom_error("combinator without a left-hand selector"));
            }
            pending = Some(combinator);
            saw_whitespace = false;
            continue;
        }

        // Whitespace between two compounds is itself a combinator.
        if saw_whitespace && pending.is_none() && !current.is_empty() {
            pending = Some(Combinator::Descendant);
        }
        saw_whitespace = false;

        if let Some(combinator) = pending.take() {
            parts.push(std::mem::take(&mut current));
            combinators.push(combinator);
        }

        parse_component(parser, token, &mut current)?;
    }

    if pending.is_some() {
        return Err(parser.new_custom_error("combinator without a right-hand selector"));
    }
    if current.is_empty() {
        return Err(parser.new_custom_error("empty selector"));
    }
    parts.push(current);

    Ok(Selector { parts, combinators })
}

/// Parse a compound selector (for :not() argument).
fn parse_compound<'i>(parser: &mut Parser<'i, '_>) -> ParseResult<'i, SelectorPart> {
    let mut part = SelectorPart::default();

    parser.skip_whitespace();

    while let Ok(token) = parser.next_including_whitespace() {
        let token = token.clone();
        if let Token::WhiteSpace(_) = token {
            parser.expect_exhausted()?;
            break;
        }
        parse_component(parser, token, &mut part)?;
    }

    if part.is_empty() {
        return Err(parser.new_custom_error("empty :not() argument"));
    }
    Ok(part)
}

/// Apply one simple selector, starting at `token`, to `part`.
fn parse_component<'i>(
    parser: &mut Parser<'i, '_>,
    token: Token<'i>,
    part: &mut SelectorPart,
) -> ParseResult<'i, ()> {
    match token {
        Token::Ident(name) => {
            if !part.is_empty() {
                return Err(parser.new_custom_error("type selector must come first"));
            }
            part.type_selector = Some(TypeSelector::Type(name.to_ascii_lowercase()));
        }

        Token::Delim('*') => {
            if !part.is_empty() {
                return Err(parser.new_custom_error("universal selector must come first"));
            }
            part.type_selector = Some(TypeSelector::Universal);
        }

        Token::Delim('.') => match parser.next_including_whitespace()?.clone() {
            Token::Ident(class) => part.classes.push(class.to_string()),
            _ => return Err(parser.new_custom_error("expected class name after '.'")),
        },

        Token::IDHash(id) => {
            if part.id.as_deref().is_some_and(|existing| existing != &*id) {
                return Err(parser.new_custom_error("conflicting ID selectors"));
            }
            part.id = Some(id.to_string());
        }

        Token::SquareBracketBlock => {
            let attribute = parser.parse_nested_block(|p| parse_attribute(p))?;
            part.attributes.push(attribute);
        }

        Token::Colon => {
            let pseudo = match parser.next_including_whitespace()?.clone() {
                Token::Ident(name) => match PseudoClass::from_css(&name) {
                    Some(pseudo) => pseudo,
                    None => return Err(parser.new_custom_error("unsupported pseudo-class")),
                },
                Token::Function(name) => parse_functional_pseudo(parser, &name)?,
                Token::Colon => {
                    return Err(parser.new_custom_error("pseudo-elements never match elements"));
                }
                _ => return Err(parser.new_custom_error("expected pseudo-class name after ':'")),
            };
            part.pseudo_classes.push(pseudo);
        }

        other => return Err(parser.new_unexpected_token_error(other)),
    }

    Ok(())
}

fn parse_functional_pseudo<'i>(
    parser: &mut Parser<'i, '_>,
    name: &str,
) -> ParseResult<'i, PseudoClass> {
    match name.to_ascii_lowercase().as_str() {
        "nth-child" => Ok(PseudoClass::NthChild(
            parser.parse_nested_block(|p| parse_nth_argument(p))?,
        )),
        "nth-last-child" => Ok(PseudoClass::NthLastChild(
            parser.parse_nested_block(|p| parse_nth_argument(p))?,
        )),
        "not" => {
            let inner = parser.parse_nested_block(|p| parse_compound(p))?;
            Ok(PseudoClass::Not(Box::new(inner)))
        }
        _ => Err(parser.new_custom_error("unsupported functional pseudo-class")),
    }
}

/// Parse an An+B argument (e.g., "odd", "even", "3", "2n+1", "-n + 3").
fn parse_nth_argument<'i>(parser: &mut Parser<'i, '_>) -> ParseResult<'i, NthExpr> {
    parser.skip_whitespace();
    let (a, b) = cssparser::parse_nth(parser)?;
    parser.expect_exhausted()?;
    Ok(NthExpr::new(a, b))
}

/// Parse the inside of `[...]`.
fn parse_attribute<'i>(parser: &mut Parser<'i, '_>) -> ParseResult<'i, AttributeSelector> {
    let name = parser.expect_ident()?.to_ascii_lowercase();
    if parser.is_exhausted() {
        return Ok(AttributeSelector::exists(name));
    }

    let op = match parser.next()?.clone() {
        Token::Delim('=') => AttrOperator::Equals,
        Token::IncludeMatch => AttrOperator::Includes,
        Token::DashMatch => AttrOperator::DashMatch,
        Token::PrefixMatch => AttrOperator::Prefix,
        Token::SuffixMatch => AttrOperator::Suffix,
        Token::SubstringMatch => AttrOperator::Substring,
        _ => return Err(parser.new_custom_error("expected attribute operator")),
    };
    let value = parser.expect_ident_or_string()?.to_string();

    let mut attribute = AttributeSelector::with_value(name, op, value);
    if !parser.is_exhausted() {
        let flag = parser.expect_ident()?.clone();
        if flag.eq_ignore_ascii_case("i") {
            attribute = attribute.ignore_case();
        } else if !flag.eq_ignore_ascii_case("s") {
            return Err(parser.new_custom_error("unknown attribute flag"));
        }
    }
    parser.expect_exhausted()?;

    Ok(attribute)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_selectors() {
        let sel = parse_selector("div").unwrap();
        assert_eq!(sel.parts[0].type_selector, Some(TypeSelector::Type("div".into())));

        let sel = parse_selector(".bar").unwrap();
        assert_eq!(sel.parts[0].classes, vec!["bar".to_string()]);

        let sel = parse_selector("#main").unwrap();
        assert_eq!(sel.parts[0].id.as_deref(), Some("main"));

        let sel = parse_selector("*").unwrap();
        assert!(matches!(sel.parts[0].type_selector, Some(TypeSelector::Universal)));
    }

    #[test]
    fn parse_compound_selector() {
        let sel = parse_selector("DIV#main.a.b[data-x='1' i]:first-child").unwrap();
        assert_eq!(sel.parts.len(), 1);
        let part = &sel.parts[0];
        assert_eq!(part.type_selector, Some(TypeSelector::Type("div".into())));
        assert_eq!(part.id.as_deref(), Some("main"));
        assert_eq!(part.classes, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(
            part.attributes,
            vec![AttributeSelector::with_value("data-x", AttrOperator::Equals, "1").ignore_case()]
        );
        assert_eq!(part.pseudo_classes, vec![PseudoClass::FirstChild]);
    }

    #[test]
    fn parse_combinators() {
        let sel = parse_selector("ul  li>a + span~em").unwrap();
        assert_eq!(sel.parts.len(), 5);
        assert_eq!(
            sel.combinators,
            vec![
                Combinator::Descendant,
                Combinator::Child,
                Combinator::AdjacentSibling,
                Combinator::GeneralSibling,
            ]
        );
        assert_eq!(sel.to_string(), "ul li > a + span ~ em");
    }

    #[test]
    fn descendant_of_class() {
        let sel = parse_selector(".menu .item").unwrap();
        assert_eq!(sel.parts.len(), 2);
        assert_eq!(sel.combinators, vec![Combinator::Descendant]);
    }

    #[test]
    fn parse_functional_pseudo_classes() {
        let sel = parse_selector("li:nth-child(2n+1)").unwrap();
        assert_eq!(sel.parts[0].pseudo_classes, vec![PseudoClass::NthChild(NthExpr::new(2, 1))]);

        let sel = parse_selector("li:nth-last-child(odd)").unwrap();
        assert_eq!(sel.parts[0].pseudo_classes, vec![PseudoClass::NthLastChild(NthExpr::odd())]);

        let sel = parse_selector("p:not(.intro)").unwrap();
        assert_eq!(
            sel.parts[0].pseudo_classes,
            vec![PseudoClass::Not(Box::new(SelectorPart::class_only("intro")))]
        );
    }

    #[test]
    fn attribute_variants() {
        let sel = parse_selector("[hidden]").unwrap();
        assert_eq!(sel.parts[0].attributes, vec![AttributeSelector::exists("hidden")]);

        for (text, op) in [
            ("[a~=v]", AttrOperator::Includes),
            ("[a|=v]", AttrOperator::DashMatch),
            ("[a^=v]", AttrOperator::Prefix),
            ("[a$=v]", AttrOperator::Suffix),
            ("[a*=\"v\"]", AttrOperator::Substring),
        ] {
            let sel = parse_selector(text).unwrap();
            assert_eq!(sel.parts[0].attributes[0].value, Some((op, "v".to_string())), "{text}");
        }
    }

    #[test]
    fn rejects_unmatchable_selectors() {
        for text in [
            "",
            "   ",
            "div::before",
            "a:hover",
            "> a",
            "a >",
            "a > > b",
            ".",
            "div span.",
            "[=x]",
            "#a#b",
            "a, b",
            "p:not()",
            "p:not(a b)",
            "li:nth-child(x)",
        ] {
            assert!(parse_selector(text).is_err(), "{text:?} should not parse");
        }
    }

    #[test]
    fn error_carries_selector_text() {
        let err = parse_selector("a:hover").unwrap_err();
        match err {
            Error::InvalidSelector { selector, message } => {
                assert_eq!(selector, "a:hover");
                assert_eq!(message, "unsupported pseudo-class");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
