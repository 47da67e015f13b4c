//! Declarations and properties.
//!
//! Parsing is speculative: a declaration and a ruleset can both begin
//! `IDENT ':' ...`, so the parser marks the cursor, tries the declaration,
//! and rewinds when it cannot be one. A declaration becomes committed once
//! whitespace follows the colon, once `!important` appears, or once the
//! expression completes and `;` or `}` follows.

use nesta_shared::errors::CssResult;

use crate::node::{Declaration, Property};
use crate::tokenizer::TokenType;
use crate::Ncss;

impl Ncss<'_> {
    /// `declaration := property ':' S* comma_expr prio?`
    pub(crate) fn parse_declaration(&mut self) -> CssResult<Option<Declaration>> {
        log::trace!("parse_declaration");

        let mark = self.mark();
        let mut must_be_declaration = false;

        let Some(property) = self.parse_property()? else {
            self.reset(mark);
            return Ok(None);
        };

        if !self.try_simple(&TokenType::Colon) {
            self.reset(mark);
            return Ok(None);
        }

        // whitespace after the colon rules out a selector
        if self.skip_ws() {
            must_be_declaration = true;
        }

        let expr = match self.parse_comma_expr()? {
            Some(expr) => expr,
            None => {
                if must_be_declaration {
                    return Err(self.syntax_error("Expected expression."));
                }
                self.reset(mark);
                return Ok(None);
            }
        };

        let mut important = false;
        if matches!(self.peek(0).token_type, TokenType::ImportantSym(_)) {
            self.next_token();
            important = true;
            must_be_declaration = true;
        }
        self.skip_ws();

        if !matches!(
            self.peek(0).token_type,
            TokenType::Semicolon | TokenType::RBrace
        ) {
            if must_be_declaration {
                return Err(self.syntax_error("Expected ';' or '}'."));
            }
            self.reset(mark);
            return Ok(None);
        }

        Ok(Some(Declaration::new(property, expr, important)))
    }

    /// `property := IDENT S*`
    pub(crate) fn parse_property(&mut self) -> CssResult<Option<Property>> {
        let t = self.peek(0);
        let TokenType::Ident(raw) = t.token_type else {
            return Ok(None);
        };
        self.next_token();
        self.skip_ws();
        Ok(Some(Property::from_raw(&raw, t.location)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Expr, NaryOp};
    use crate::Ncss;
    use nesta_shared::byte_stream::ByteStream;
    use nesta_shared::errors::CssError;

    fn with_parser<T>(source: &str, f: impl FnOnce(&mut Ncss) -> T) -> T {
        let mut stream = ByteStream::new();
        stream.read_from_str(source);
        stream.close();
        let mut parser = Ncss::new(&mut stream, "test.css");
        f(&mut parser)
    }

    fn declaration(source: &str) -> Option<Declaration> {
        with_parser(source, |p| p.parse_declaration()).unwrap()
    }

    #[test]
    fn simple_declaration() {
        let decl = declaration("color: red;").unwrap();
        assert_eq!(decl.property.name, "color");
        assert!(!decl.important);
        assert!(matches!(decl.expr, Expr::Ident(_)));
    }

    #[test]
    fn no_space_after_the_colon() {
        let decl = declaration("color:red;").unwrap();
        assert_eq!(decl.property.name, "color");
    }

    #[test]
    fn important_flag() {
        let decl = declaration("x: 1 !important;").unwrap();
        assert!(decl.important);

        let decl = declaration("x: 1 ! IMPORTANT ;").unwrap();
        assert!(decl.important);
    }

    #[test]
    fn multi_value_shorthand() {
        let decl = declaration("margin: 0 auto;").unwrap();
        let Expr::Nary(nary) = &decl.expr else {
            panic!("expected whitespace join, got {:?}", decl.expr);
        };
        assert_eq!(nary.op, NaryOp::Whitespace);
        assert_eq!(nary.operands.len(), 2);
    }

    #[test]
    fn a_selector_prefix_is_not_a_declaration() {
        // both begin IDENT ':' ...; the rewind leaves the cursor untouched
        let result = with_parser("a:hover {}", |p| {
            let decl = p.parse_declaration();
            (decl, p.mark())
        });
        let (decl, mark) = result;
        assert!(decl.unwrap().is_none());
        assert_eq!(mark, 0);
    }

    #[test]
    fn nested_selector_with_pseudo_and_descendant_is_not_a_declaration() {
        let decl = declaration("b:c d {}");
        assert!(decl.is_none());
    }

    #[test]
    fn whitespace_after_colon_commits() {
        // `a: hover {` can no longer be a selector; the missing terminator
        // is a hard error rather than a rewind
        let err = with_parser("a: hover {}", |p| p.parse_declaration()).unwrap_err();
        let CssError::Syntax(err) = err else {
            panic!("expected syntax error");
        };
        assert_eq!(err.message, "Expected ';' or '}'.");
    }

    #[test]
    fn missing_expression_after_committed_colon() {
        let err = with_parser("x: ;", |p| p.parse_declaration()).unwrap_err();
        let CssError::Syntax(err) = err else {
            panic!("expected syntax error");
        };
        assert_eq!(err.message, "Expected expression.");
    }

    #[test]
    fn important_commits_the_declaration() {
        let err = with_parser("x:1 !important garbage", |p| p.parse_declaration()).unwrap_err();
        assert!(matches!(err, CssError::Syntax(_)));
    }

    #[test]
    fn declaration_ends_at_closing_brace() {
        let decl = declaration("x: 1 }").unwrap();
        assert_eq!(decl.property.name, "x");
    }

    #[test]
    fn properties_compare_case_insensitively() {
        let a = declaration("COLOR: red;").unwrap();
        let b = declaration("color: red;").unwrap();
        assert_eq!(a, b);
    }
}
