//! Selector grammar: simple selector sequences, combinators, attribute,
//! pseudo, and negation selectors, and the ancestor-reference `&`.

use std::collections::HashSet;

use lazy_static::lazy_static;
use nesta_shared::byte_stream::Location;
use nesta_shared::errors::CssResult;

use crate::node::{
    AncestorSelector, AttrMatchOp, AttrValue, AttributeSelector, ClassSelector, Combinator,
    CssString, HeadSelector, IdSelector, IdentNode, NegationArg, NegationSelector, PseudoBody,
    PseudoClassSelector, PseudoElementSelector, Selector, SelectorPart, SimpleSelectorSequence,
    TailSelector, TypeSelector, UniversalSelector,
};
use crate::tokenizer::TokenType;
use crate::Ncss;

lazy_static! {
    /// Pseudo-elements that are legal with single-colon syntax for CSS 2.1
    /// compatibility
    static ref LEGACY_PSEUDO_ELEMENTS: HashSet<&'static str> =
        ["first-line", "first-letter", "before", "after"].into_iter().collect();
}

fn head_location(head: &HeadSelector) -> Location {
    match head {
        HeadSelector::Type(s) => s.location,
        HeadSelector::Universal(s) => s.location,
        HeadSelector::Ancestor(s) => s.location,
    }
}

fn tail_location(tail: &TailSelector) -> Location {
    match tail {
        TailSelector::Id(s) => s.location,
        TailSelector::Class(s) => s.location,
        TailSelector::Attribute(s) => s.location,
        TailSelector::PseudoClass(s) => s.location,
        TailSelector::PseudoElement(s) => s.location,
        TailSelector::Negation(s) => s.location,
    }
}

impl Ncss<'_> {
    /// `selector := simple_selector_sequence (combinator simple_selector_sequence)*`
    pub(crate) fn parse_selector(&mut self) -> CssResult<Option<Selector>> {
        log::trace!("parse_selector");

        let Some(seq) = self.parse_simple_selector_sequence()? else {
            return Ok(None);
        };
        let mut selector = Selector::new(seq);

        loop {
            // a whitespace run directly before '{' or ',' ends the selector
            // rather than acting as a descendant combinator
            let mut n = 0;
            while self.peek(n).is_whitespace() {
                n += 1;
            }
            if n > 0
                && matches!(
                    self.peek(n).token_type,
                    TokenType::LBrace | TokenType::Comma
                )
            {
                self.skip_ws();
                break;
            }

            let Some(combinator) = self.parse_combinator() else {
                break;
            };
            let Some(seq) = self.parse_simple_selector_sequence()? else {
                return Err(self.syntax_error("Expected simple selector sequence."));
            };
            selector.add_sequence(combinator, seq);
        }

        Ok(Some(selector))
    }

    /// `combinator := '+' S* | '>' S* | '~' S* | S+`
    fn parse_combinator(&mut self) -> Option<Combinator> {
        let ws = self.skip_ws();

        if self.try_simple(&TokenType::Plus) {
            self.skip_ws();
            return Some(Combinator::AdjacentSibling);
        }
        if self.try_simple(&TokenType::GreaterThan) {
            self.skip_ws();
            return Some(Combinator::Child);
        }
        if self.try_simple(&TokenType::Tilde) {
            self.skip_ws();
            return Some(Combinator::GeneralSibling);
        }
        if ws {
            return Some(Combinator::Descendant);
        }
        None
    }

    fn parse_simple_selector_sequence(&mut self) -> CssResult<Option<SimpleSelectorSequence>> {
        let head = self.parse_selector_head()?;
        let tail = self.parse_selector_tail()?;

        if head.is_none() && tail.is_empty() {
            return Ok(None);
        }

        let location = match &head {
            Some(head) => head_location(head),
            None => tail_location(&tail[0]),
        };
        Ok(Some(SimpleSelectorSequence::new(head, tail, location)))
    }

    /// `head := type_selector | '*' | '&'`
    ///
    /// The `&` head is only legal inside a nested ruleset scope.
    fn parse_selector_head(&mut self) -> CssResult<Option<HeadSelector>> {
        let t = self.peek(0);
        match t.token_type {
            TokenType::Ident(raw) => {
                self.next_token();
                Ok(Some(HeadSelector::Type(TypeSelector::from_raw(
                    &raw, t.location,
                ))))
            }
            TokenType::Star => {
                self.next_token();
                Ok(Some(HeadSelector::Universal(UniversalSelector {
                    location: t.location,
                })))
            }
            TokenType::Ampersand => {
                self.next_token();
                if !self.is_nested_scope() {
                    return Err(self.syntax_error_at(
                        "The '&' selector is only allowed within nested ruleset scopes.",
                        &t,
                    ));
                }
                Ok(Some(HeadSelector::Ancestor(AncestorSelector {
                    location: t.location,
                })))
            }
            _ => Ok(None),
        }
    }

    /// `tail := (id | class | attribute | pseudo | negation)*`
    fn parse_selector_tail(&mut self) -> CssResult<Vec<TailSelector>> {
        let mut tail = Vec::new();

        loop {
            let t = self.peek(0);
            let node = match t.token_type {
                TokenType::Hash(raw) => {
                    self.next_token();
                    TailSelector::Id(IdSelector::from_raw(&raw, t.location))
                }
                TokenType::Dot => TailSelector::Class(self.parse_class_selector()?),
                TokenType::LBracket => TailSelector::Attribute(self.parse_attribute_selector()?),
                TokenType::Colon => self.parse_pseudo_selector()?,
                TokenType::Not => TailSelector::Negation(self.parse_negation_selector()?),
                _ => break,
            };
            tail.push(node);
        }

        Ok(tail)
    }

    /// `class := '.' IDENT`
    fn parse_class_selector(&mut self) -> CssResult<ClassSelector> {
        log::trace!("parse_class_selector");

        let t = self.next_token();
        debug_assert_eq!(t.token_type, TokenType::Dot);

        let ident = self.peek(0);
        let TokenType::Ident(raw) = ident.token_type else {
            return Err(self.syntax_error("Expected identifier."));
        };
        self.next_token();

        Ok(ClassSelector::from_raw(&raw, t.location))
    }

    /// `attribute := '[' S* IDENT S* (match_op S* (IDENT|STRING) S*)? ']'`
    fn parse_attribute_selector(&mut self) -> CssResult<AttributeSelector> {
        log::trace!("parse_attribute_selector");

        let t = self.next_token();
        debug_assert_eq!(t.token_type, TokenType::LBracket);
        self.skip_ws();

        let ident = self.peek(0);
        let TokenType::Ident(raw_attr) = ident.token_type else {
            return Err(self.syntax_error("Expected identifier."));
        };
        self.next_token();
        self.skip_ws();

        let op = match self.peek(0).token_type {
            TokenType::Equal => Some(AttrMatchOp::Exact),
            TokenType::Includes => Some(AttrMatchOp::Includes),
            TokenType::DashMatch => Some(AttrMatchOp::DashMatch),
            TokenType::PrefixMatch => Some(AttrMatchOp::Prefix),
            TokenType::SuffixMatch => Some(AttrMatchOp::Suffix),
            TokenType::SubstringMatch => Some(AttrMatchOp::Substring),
            _ => None,
        };

        let value = if op.is_some() {
            self.next_token();
            self.skip_ws();
            let v = self.peek(0);
            let value = match v.token_type {
                TokenType::Ident(raw) => AttrValue::Ident(IdentNode::from_raw(&raw, v.location)),
                TokenType::QuotedString(raw) => {
                    AttrValue::Str(CssString::from_quoted(&raw, v.location))
                }
                _ => return Err(self.syntax_error("Expected identifier or string.")),
            };
            self.next_token();
            self.skip_ws();
            Some(value)
        } else {
            None
        };

        if !self.try_simple(&TokenType::RBracket) {
            return Err(self.syntax_error("Expected right square bracket: ']'."));
        }

        Ok(AttributeSelector::from_raw(&raw_attr, op, value, t.location))
    }

    /// `pseudo := ':' ':'? (IDENT | function)`
    ///
    /// Double-colon syntax marks a pseudo-element; so does a single colon
    /// with one of the legacy element names.
    fn parse_pseudo_selector(&mut self) -> CssResult<TailSelector> {
        log::trace!("parse_pseudo_selector");

        let t = self.next_token();
        debug_assert_eq!(t.token_type, TokenType::Colon);
        let mut pseudo_element = self.try_simple(&TokenType::Colon);

        let body_tok = self.peek(0);
        let body = match body_tok.token_type {
            TokenType::Ident(raw) => {
                self.next_token();
                let node = IdentNode::from_raw(&raw, body_tok.location);
                if LEGACY_PSEUDO_ELEMENTS.contains(node.name.to_ascii_lowercase().as_str()) {
                    pseudo_element = true;
                }
                PseudoBody::Ident(node)
            }
            TokenType::Function(_) => PseudoBody::Function(self.parse_function_call()?),
            _ => {
                return Err(
                    self.syntax_error("Expected identifier or function in pseudo-selector.")
                );
            }
        };

        if pseudo_element {
            Ok(TailSelector::PseudoElement(PseudoElementSelector::new(
                body, t.location,
            )))
        } else {
            Ok(TailSelector::PseudoClass(PseudoClassSelector::new(
                body, t.location,
            )))
        }
    }

    /// `negation := NOT S* negation_arg S* ')'`
    fn parse_negation_selector(&mut self) -> CssResult<NegationSelector> {
        log::trace!("parse_negation_selector");

        let t = self.next_token();
        debug_assert_eq!(t.token_type, TokenType::Not);
        self.skip_ws();

        let arg_tok = self.peek(0);
        let arg = match arg_tok.token_type {
            TokenType::Ident(raw) => {
                self.next_token();
                NegationArg::Type(TypeSelector::from_raw(&raw, arg_tok.location))
            }
            TokenType::Star => {
                self.next_token();
                NegationArg::Universal(UniversalSelector {
                    location: arg_tok.location,
                })
            }
            TokenType::Hash(raw) => {
                self.next_token();
                NegationArg::Id(IdSelector::from_raw(&raw, arg_tok.location))
            }
            TokenType::Dot => NegationArg::Class(self.parse_class_selector()?),
            TokenType::LBracket => NegationArg::Attribute(self.parse_attribute_selector()?),
            TokenType::Colon => match self.parse_pseudo_selector()? {
                TailSelector::PseudoClass(p) => NegationArg::PseudoClass(p),
                TailSelector::PseudoElement(p) => NegationArg::PseudoElement(p),
                _ => return Err(self.syntax_error("Unrecognized not() argument.")),
            },
            _ => return Err(self.syntax_error("Unrecognized not() argument.")),
        };
        self.skip_ws();

        if !self.try_simple(&TokenType::RParen) {
            return Err(self.syntax_error("Expected right parenthesis."));
        }

        Ok(NegationSelector::new(arg, t.location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Ncss;
    use nesta_shared::byte_stream::ByteStream;
    use nesta_shared::errors::CssError;

    fn selector(source: &str) -> Selector {
        let mut stream = ByteStream::new();
        stream.read_from_str(source);
        stream.close();
        let mut parser = Ncss::new(&mut stream, "test.css");
        parser
            .parse_selector()
            .unwrap_or_else(|err| panic!("parse failed for {source:?}: {err}"))
            .unwrap_or_else(|| panic!("no selector in {source:?}"))
    }

    fn only_sequence(selector: &Selector) -> &SimpleSelectorSequence {
        assert_eq!(selector.parts.len(), 1, "{:?}", selector.parts);
        let SelectorPart::Sequence(seq) = &selector.parts[0] else {
            panic!("expected sequence");
        };
        seq
    }

    #[test]
    fn heads() {
        let sel = selector("div");
        assert!(matches!(
            only_sequence(&sel).head,
            Some(HeadSelector::Type(ref t)) if t.name == "div"
        ));

        let sel = selector("*");
        assert!(matches!(
            only_sequence(&sel).head,
            Some(HeadSelector::Universal(_))
        ));
    }

    #[test]
    fn headless_sequences() {
        let sel = selector(".cls");
        let seq = only_sequence(&sel);
        assert!(seq.head.is_none());
        assert!(matches!(&seq.tail[0], TailSelector::Class(c) if c.name == "cls"));
    }

    #[test]
    fn full_sequence_in_order() {
        let sel = selector("a#id.cls[href]:hover");
        let seq = only_sequence(&sel);
        assert_eq!(seq.tail.len(), 4);
        assert!(matches!(&seq.tail[0], TailSelector::Id(_)));
        assert!(matches!(&seq.tail[1], TailSelector::Class(_)));
        assert!(matches!(&seq.tail[2], TailSelector::Attribute(_)));
        assert!(matches!(&seq.tail[3], TailSelector::PseudoClass(_)));
    }

    #[test]
    fn all_combinators() {
        let sel = selector("a b > c + d ~ e");
        let combinators: Vec<Combinator> = sel
            .parts
            .iter()
            .filter_map(|part| match part {
                SelectorPart::Combinator(c) => Some(*c),
                SelectorPart::Sequence(_) => None,
            })
            .collect();
        assert_eq!(
            combinators,
            vec![
                Combinator::Descendant,
                Combinator::Child,
                Combinator::AdjacentSibling,
                Combinator::GeneralSibling,
            ]
        );
    }

    #[test]
    fn attribute_match_operators() {
        for (source, op) in [
            ("[a=b]", AttrMatchOp::Exact),
            ("[a~=b]", AttrMatchOp::Includes),
            ("[a|=b]", AttrMatchOp::DashMatch),
            ("[a^=b]", AttrMatchOp::Prefix),
            ("[a$=b]", AttrMatchOp::Suffix),
            ("[a*=b]", AttrMatchOp::Substring),
        ] {
            let sel = selector(source);
            let TailSelector::Attribute(attr) = &only_sequence(&sel).tail[0] else {
                panic!("expected attribute selector for {source:?}");
            };
            assert_eq!(attr.op, Some(op), "{source}");
            assert!(matches!(&attr.value, Some(AttrValue::Ident(i)) if i.name == "b"));
        }
    }

    #[test]
    fn attribute_with_string_value_and_spaces() {
        let sel = selector("[ title = \"hello world\" ]");
        let TailSelector::Attribute(attr) = &only_sequence(&sel).tail[0] else {
            panic!("expected attribute selector");
        };
        assert_eq!(attr.attr, "title");
        assert!(matches!(&attr.value, Some(AttrValue::Str(s)) if s.value == "hello world"));
    }

    #[test]
    fn bare_attribute_has_no_operator() {
        let sel = selector("[checked]");
        let TailSelector::Attribute(attr) = &only_sequence(&sel).tail[0] else {
            panic!("expected attribute selector");
        };
        assert!(attr.op.is_none());
        assert!(attr.value.is_none());
    }

    #[test]
    fn pseudo_classes_and_elements() {
        let sel = selector("a:hover");
        assert!(matches!(
            &only_sequence(&sel).tail[0],
            TailSelector::PseudoClass(_)
        ));

        let sel = selector("a::after");
        assert!(matches!(
            &only_sequence(&sel).tail[0],
            TailSelector::PseudoElement(_)
        ));
    }

    #[test]
    fn legacy_pseudo_elements_accept_single_colon() {
        for name in ["first-line", "first-letter", "before", "after"] {
            let sel = selector(&format!("p:{name}"));
            assert!(
                matches!(&only_sequence(&sel).tail[0], TailSelector::PseudoElement(_)),
                "{name}"
            );
        }
    }

    #[test]
    fn functional_pseudo_class() {
        let sel = selector("li:nth-child(2n)");
        let TailSelector::PseudoClass(pseudo) = &only_sequence(&sel).tail[0] else {
            panic!("expected pseudo class");
        };
        assert!(matches!(&pseudo.body, PseudoBody::Function(call) if call.name == "nth-child"));
    }

    #[test]
    fn negation_arguments() {
        for (source, check) in [
            ("a:not(b)", true),
            ("a:not(*)", true),
            ("a:not(#id)", true),
            ("a:not(.cls)", true),
            ("a:not([href])", true),
            ("a:not(:hover)", true),
        ] {
            let sel = selector(source);
            let is_negation = matches!(
                &only_sequence(&sel).tail[0],
                TailSelector::Negation(_)
            );
            assert_eq!(is_negation, check, "{source}");
        }
    }

    #[test]
    fn negation_case_insensitive_opener() {
        let sel = selector("a:NOT(b)");
        assert!(matches!(
            &only_sequence(&sel).tail[0],
            TailSelector::Negation(_)
        ));
    }

    #[test]
    fn escaped_identifiers_unescape() {
        let sel = selector(".cl\\{ass");
        let TailSelector::Class(class) = &only_sequence(&sel).tail[0] else {
            panic!("expected class selector");
        };
        assert_eq!(class.name, "cl{ass");
    }

    #[test]
    fn ancestor_reference_requires_nesting() {
        let err = Ncss::parse_str("& {}", "test.css").unwrap_err();
        let CssError::Syntax(err) = err else {
            panic!("expected syntax error");
        };
        assert!(err.message.contains("nested"), "{}", err.message);

        // inside a ruleset body it parses fine
        Ncss::parse_str("a { & {} }", "test.css").unwrap();
    }

    #[test]
    fn trailing_whitespace_before_brace_is_not_a_combinator() {
        let sheet = Ncss::parse_str("a   {}", "test.css").unwrap();
        let crate::node::Statement::RuleSet(ruleset) = &sheet.statements[0] else {
            panic!("expected ruleset");
        };
        assert_eq!(ruleset.selectors[0].parts.len(), 1);
    }

    #[test]
    fn whitespace_before_comma_is_not_a_combinator() {
        let sheet = Ncss::parse_str("a , b {}", "test.css").unwrap();
        let crate::node::Statement::RuleSet(ruleset) = &sheet.statements[0] else {
            panic!("expected ruleset");
        };
        assert_eq!(ruleset.selectors.len(), 2);
        assert_eq!(ruleset.selectors[0].parts.len(), 1);
    }
}
