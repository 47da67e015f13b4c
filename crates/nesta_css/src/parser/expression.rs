//! Expression parsing.
//!
//! Both entry points run an explicit operator-precedence shunt over an
//! operand stack and an operator stack. `comma_expr` accepts the separator
//! operators (comma, whitespace-join) and slash-as-separator; `math_expr`
//! accepts arithmetic operators only, and a slash there is always division.

use nesta_shared::errors::CssResult;

use crate::node::{
    BinaryOp, BinaryOpExpr, CssString, DimensionNode, Expr, FunctionCall, HexColorNode, IdentNode,
    NaryOp, NaryOpExpr, NumberNode, PercentageNode, UnaryOp, UnaryOpExpr, UriNode, ValueNode,
    VarRef,
};
use crate::tokenizer::TokenType;
use crate::Ncss;

/// Operators as they appear at a shunt position
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ExprOp {
    Comma,
    Ws,
    FwdSlash,
    Division,
    Add,
    Subtract,
    Multiply,
}

impl ExprOp {
    fn precedence(self) -> u8 {
        match self {
            ExprOp::Comma => 1,
            ExprOp::Ws => 2,
            ExprOp::Add | ExprOp::Subtract => 3,
            ExprOp::FwdSlash | ExprOp::Division | ExprOp::Multiply => 4,
        }
    }

    fn is_nary(self) -> bool {
        matches!(self, ExprOp::Comma | ExprOp::Ws)
    }
}

/// True when the expression is arithmetic-shaped: a binary expression or a
/// variable reference, possibly reached through a chain of unary operators.
fn arithmetic_shaped(mut expr: &Expr) -> bool {
    loop {
        match expr {
            Expr::Binary(_) | Expr::VarRef(_) => return true,
            Expr::Unary(unary) => expr = &unary.operand,
            _ => return false,
        }
    }
}

/// Decides whether a slash can still be a value separator. It cannot when
/// either operand is arithmetic-shaped.
fn check_fwdslash(lhs: &Expr, rhs: &Expr) -> BinaryOp {
    if arithmetic_shaped(lhs) || arithmetic_shaped(rhs) {
        BinaryOp::Division
    } else {
        BinaryOp::FwdSlash
    }
}

/// A separator slash nested under another operator cannot separate values
/// anymore; promote it to a division.
fn promote_separator(expr: &mut Expr) {
    if let Expr::Binary(binary) = expr {
        if binary.op == BinaryOp::FwdSlash {
            binary.op = BinaryOp::Division;
        }
    }
}

/// Pops two operands and pushes the combined expression. N-ary operators
/// coalesce with a same-operator left-hand side.
fn reduce(nodes: &mut Vec<Expr>, op: ExprOp) {
    let (Some(rhs), Some(lhs)) = (nodes.pop(), nodes.pop()) else {
        debug_assert!(false, "shunt underflow");
        return;
    };

    if op.is_nary() {
        let nary_op = if op == ExprOp::Comma {
            NaryOp::Comma
        } else {
            NaryOp::Whitespace
        };
        match lhs {
            Expr::Nary(mut nary) if nary.op == nary_op => {
                nary.operands.push(rhs);
                nodes.push(Expr::Nary(nary));
            }
            other => {
                let location = other.location();
                nodes.push(Expr::Nary(NaryOpExpr::new(nary_op, vec![other, rhs], location)));
            }
        }
        return;
    }

    let mut lhs = lhs;
    let mut rhs = rhs;
    promote_separator(&mut lhs);
    promote_separator(&mut rhs);

    let bin_op = match op {
        ExprOp::Add => BinaryOp::Add,
        ExprOp::Subtract => BinaryOp::Subtract,
        ExprOp::Multiply => BinaryOp::Multiply,
        ExprOp::Division => BinaryOp::Division,
        ExprOp::FwdSlash => check_fwdslash(&lhs, &rhs),
        ExprOp::Comma | ExprOp::Ws => BinaryOp::Add, // handled above
    };
    let location = lhs.location();
    nodes.push(Expr::Binary(BinaryOpExpr::new(bin_op, lhs, rhs, location)));
}

impl Ncss<'_> {
    /// `comma_expr := term (comma_expr_operator? term)* S*`
    pub(crate) fn parse_comma_expr(&mut self) -> CssResult<Option<Expr>> {
        log::trace!("parse_comma_expr");

        let Some(term) = self.parse_term()? else {
            return Ok(None);
        };
        let mut nodes = vec![term];
        let mut ops: Vec<ExprOp> = Vec::new();

        loop {
            let op = self.comma_expr_operator();
            let term = self.parse_term()?;
            match (op, term) {
                (Some(op), None) => {
                    if op == ExprOp::Ws {
                        break;
                    }
                    return Err(self.syntax_error("Expected term."));
                }
                (None, None) => break,
                (None, Some(_)) => return Err(self.syntax_error("Expected operator.")),
                (Some(op), Some(term)) => {
                    while let Some(&top) = ops.last() {
                        if op.precedence() <= top.precedence() {
                            ops.pop();
                            reduce(&mut nodes, top);
                        } else {
                            break;
                        }
                    }
                    nodes.push(term);
                    ops.push(op);
                }
            }
        }

        while let Some(op) = ops.pop() {
            reduce(&mut nodes, op);
        }

        self.skip_ws();
        debug_assert_eq!(nodes.len(), 1);
        Ok(nodes.pop())
    }

    /// `math_expr := term (math_expr_operator? term)* S*`
    pub(crate) fn parse_math_expr(&mut self) -> CssResult<Option<Expr>> {
        log::trace!("parse_math_expr");

        let Some(term) = self.parse_term()? else {
            return Ok(None);
        };
        let mut nodes = vec![term];
        let mut ops: Vec<ExprOp> = Vec::new();

        loop {
            let op = self.math_expr_operator();
            let term = self.parse_term()?;
            match (op, term) {
                (Some(_), None) => return Err(self.syntax_error("Expected term.")),
                (None, None) => break,
                (None, Some(_)) => return Err(self.syntax_error("Expected operator.")),
                (Some(op), Some(term)) => {
                    while let Some(&top) = ops.last() {
                        if op.precedence() <= top.precedence() {
                            ops.pop();
                            reduce(&mut nodes, top);
                        } else {
                            break;
                        }
                    }
                    nodes.push(term);
                    ops.push(op);
                }
            }
        }

        while let Some(op) = ops.pop() {
            reduce(&mut nodes, op);
        }

        self.skip_ws();
        debug_assert_eq!(nodes.len(), 1);
        Ok(nodes.pop())
    }

    /// Separator-level operators. `/` starts out as a separator here and is
    /// rewritten to a division by the shunt when an operand is
    /// arithmetic-shaped. A sign or star followed directly by whitespace is
    /// a binary operator; preceded by whitespace and attached to the next
    /// term it belongs to that term instead (`margin: 0 -2px`).
    fn comma_expr_operator(&mut self) -> Option<ExprOp> {
        let ws = self.skip_ws();

        match self.peek(0).token_type {
            TokenType::FwdSlash => {
                self.next_token();
                self.skip_ws();
                return Some(ExprOp::FwdSlash);
            }
            TokenType::Comma => {
                self.next_token();
                self.skip_ws();
                return Some(ExprOp::Comma);
            }
            TokenType::Plus | TokenType::Minus | TokenType::Star => {
                let op = match self.peek(0).token_type {
                    TokenType::Plus => ExprOp::Add,
                    TokenType::Minus => ExprOp::Subtract,
                    _ => ExprOp::Multiply,
                };
                let followed_by_ws = self.peek(1).is_whitespace();
                if followed_by_ws {
                    self.next_token();
                    self.skip_ws();
                    return Some(op);
                }
                if !ws {
                    self.next_token();
                    return Some(op);
                }
            }
            _ => {}
        }

        if ws {
            Some(ExprOp::Ws)
        } else {
            None
        }
    }

    /// Arithmetic operators, whitespace on either side allowed. A slash is
    /// always division here.
    fn math_expr_operator(&mut self) -> Option<ExprOp> {
        let mut n = 0;
        while self.peek(n).is_whitespace() {
            n += 1;
        }

        let op = match self.peek(n).token_type {
            TokenType::FwdSlash => ExprOp::Division,
            TokenType::Star => ExprOp::Multiply,
            TokenType::Plus => ExprOp::Add,
            TokenType::Minus => ExprOp::Subtract,
            _ => return None,
        };

        for _ in 0..=n {
            self.next_token();
        }
        self.skip_ws();
        Some(op)
    }

    /// `term := unary_operator? (value | IDENT | VARNAME | function | paren_expr)`
    pub(crate) fn parse_term(&mut self) -> CssResult<Option<Expr>> {
        let mark = self.mark();

        let unary_tok = self.peek(0);
        let unary = match unary_tok.token_type {
            TokenType::Minus => {
                self.next_token();
                Some(UnaryOp::Minus)
            }
            TokenType::Plus => {
                self.next_token();
                Some(UnaryOp::Plus)
            }
            _ => None,
        };

        let t = self.peek(0);
        let operand: Option<Expr> = match t.token_type.clone() {
            TokenType::Number(raw) => {
                self.next_token();
                Some(Expr::Value(ValueNode::Number(NumberNode::from_raw(
                    &raw, t.location,
                ))))
            }
            TokenType::Percentage(raw) => {
                self.next_token();
                Some(Expr::Value(ValueNode::Percentage(PercentageNode::from_raw(
                    &raw, t.location,
                ))))
            }
            TokenType::Dimension { value, unit } => {
                self.next_token();
                Some(Expr::Value(ValueNode::Dimension(DimensionNode::from_raw(
                    &value, &unit, t.location,
                ))))
            }
            TokenType::QuotedString(raw) => {
                self.next_token();
                Some(Expr::Value(ValueNode::Str(CssString::from_quoted(
                    &raw, t.location,
                ))))
            }
            TokenType::Ident(raw) => {
                self.next_token();
                Some(Expr::Ident(IdentNode::from_raw(&raw, t.location)))
            }
            TokenType::Uri(raw) => {
                self.next_token();
                Some(Expr::Value(ValueNode::Uri(UriNode::from_raw(
                    &raw, t.location,
                ))))
            }
            TokenType::VarName(raw) => {
                self.next_token();
                Some(Expr::VarRef(VarRef::from_raw(&raw, t.location)))
            }
            TokenType::Function(_) => Some(Expr::Function(self.parse_function_call()?)),
            TokenType::Hash(raw) => {
                // only a valid hex color is a term; anything else means this
                // is not an expression after all
                if (raw.len() == 3 || raw.len() == 6)
                    && raw.chars().all(|c| c.is_ascii_hexdigit())
                {
                    self.next_token();
                    Some(Expr::Value(ValueNode::HexColor(HexColorNode::from_raw(
                        &raw, t.location,
                    ))))
                } else {
                    None
                }
            }
            TokenType::LParen => self.parse_paren_expr()?,
            _ => None,
        };

        match operand {
            Some(expr) => {
                let expr = match unary {
                    Some(op) => Expr::Unary(UnaryOpExpr::new(op, expr, unary_tok.location)),
                    None => expr,
                };
                Ok(Some(expr))
            }
            None => {
                self.reset(mark);
                Ok(None)
            }
        }
    }

    /// `function := FUNCTION S* comma_expr? ')'`
    pub(crate) fn parse_function_call(&mut self) -> CssResult<FunctionCall> {
        log::trace!("parse_function_call");

        let t = self.next_token();
        let TokenType::Function(raw) = &t.token_type else {
            return Err(self.syntax_error_at("Expected function.", &t));
        };
        let raw = raw.clone();
        self.skip_ws();

        let arg = self.parse_comma_expr()?;

        if !self.try_simple(&TokenType::RParen) {
            return Err(self.syntax_error("Expected ')' after function."));
        }

        Ok(FunctionCall::new(&raw, arg, t.location))
    }

    /// `paren_expr := '(' S* math_expr S* ')'`
    ///
    /// The parentheses exist only in the source; the emitter re-creates them
    /// from operator precedence.
    fn parse_paren_expr(&mut self) -> CssResult<Option<Expr>> {
        self.next_token(); // '('
        self.skip_ws();
        let expr = self.parse_math_expr()?;
        self.skip_ws();
        if !self.try_simple(&TokenType::RParen) {
            return Err(self.syntax_error("Expected closing parenthesis."));
        }
        Ok(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Ncss;
    use nesta_shared::byte_stream::ByteStream;

    fn with_parser<T>(source: &str, f: impl FnOnce(&mut Ncss) -> T) -> T {
        let mut stream = ByteStream::new();
        stream.read_from_str(source);
        stream.close();
        let mut parser = Ncss::new(&mut stream, "test.css");
        f(&mut parser)
    }

    fn comma_expr(source: &str) -> Option<Expr> {
        with_parser(source, |p| p.parse_comma_expr()).unwrap()
    }

    fn math_expr(source: &str) -> Option<Expr> {
        with_parser(source, |p| p.parse_math_expr()).unwrap()
    }

    fn var(name: &str) -> Expr {
        Expr::VarRef(VarRef::from_raw(name, Default::default()))
    }

    fn num(text: &str) -> Expr {
        Expr::Value(ValueNode::Number(NumberNode::from_raw(
            text,
            Default::default(),
        )))
    }

    fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary(BinaryOpExpr::new(op, lhs, rhs, Default::default()))
    }

    fn nary(op: NaryOp, operands: Vec<Expr>) -> Expr {
        Expr::Nary(NaryOpExpr::new(op, operands, Default::default()))
    }

    #[test]
    fn empty_input_is_no_expression() {
        assert_eq!(comma_expr(""), None);
        assert_eq!(math_expr(""), None);
    }

    #[test]
    fn single_terms() {
        assert_eq!(
            comma_expr("abc "),
            Some(Expr::Ident(IdentNode::from_raw("abc", Default::default())))
        );
        assert_eq!(
            comma_expr("#aabbcc "),
            Some(Expr::Value(ValueNode::HexColor(HexColorNode::from_raw(
                "aabbcc",
                Default::default()
            ))))
        );
        assert_eq!(comma_expr("$a"), Some(var("a")));
    }

    #[test]
    fn addition_with_and_without_spaces() {
        let expected = binary(BinaryOp::Add, var("a"), var("b"));
        assert_eq!(comma_expr("$a+$b"), Some(expected.clone()));
        assert_eq!(comma_expr("$a + $b"), Some(expected.clone()));
        assert_eq!(comma_expr("($a + $b)"), Some(expected));
    }

    #[test]
    fn sign_attached_to_a_term_is_unary() {
        let expected = nary(
            NaryOp::Whitespace,
            vec![
                var("a"),
                Expr::Unary(UnaryOpExpr::new(
                    UnaryOp::Minus,
                    var("b"),
                    Default::default(),
                )),
            ],
        );
        assert_eq!(comma_expr("$a -$b"), Some(expected));
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(
            comma_expr("$a+$b*$c"),
            Some(binary(
                BinaryOp::Add,
                var("a"),
                binary(BinaryOp::Multiply, var("b"), var("c"))
            ))
        );
        assert_eq!(
            comma_expr("$a*$b+$c"),
            Some(binary(
                BinaryOp::Add,
                binary(BinaryOp::Multiply, var("a"), var("b")),
                var("c")
            ))
        );
    }

    #[test]
    fn slash_between_bare_values_separates() {
        assert_eq!(
            comma_expr("1/2"),
            Some(binary(BinaryOp::FwdSlash, num("1"), num("2")))
        );
    }

    #[test]
    fn slash_with_a_variable_divides() {
        assert_eq!(
            comma_expr("$a/2"),
            Some(binary(BinaryOp::Division, var("a"), num("2")))
        );
    }

    #[test]
    fn slash_in_parentheses_divides() {
        assert_eq!(
            comma_expr("(1/2)"),
            Some(binary(BinaryOp::Division, num("1"), num("2")))
        );
    }

    #[test]
    fn chained_slashes_become_division() {
        // nesting a separator under another operator promotes it
        assert_eq!(
            comma_expr("1/2/3"),
            Some(binary(
                BinaryOp::Division,
                binary(BinaryOp::Division, num("1"), num("2")),
                num("3")
            ))
        );
    }

    #[test]
    fn separator_slash_under_addition_divides() {
        assert_eq!(
            comma_expr("8/4+1"),
            Some(binary(
                BinaryOp::Add,
                binary(BinaryOp::Division, num("8"), num("4")),
                num("1")
            ))
        );
    }

    #[test]
    fn whitespace_join_coalesces() {
        assert_eq!(
            comma_expr("a b c"),
            Some(nary(
                NaryOp::Whitespace,
                vec![
                    Expr::Ident(IdentNode::from_raw("a", Default::default())),
                    Expr::Ident(IdentNode::from_raw("b", Default::default())),
                    Expr::Ident(IdentNode::from_raw("c", Default::default())),
                ]
            ))
        );
    }

    #[test]
    fn comma_list_coalesces() {
        assert_eq!(
            comma_expr("1, 2, 3"),
            Some(nary(NaryOp::Comma, vec![num("1"), num("2"), num("3")]))
        );
    }

    #[test]
    fn comma_binds_weaker_than_whitespace() {
        assert_eq!(
            comma_expr("1 2, 3"),
            Some(nary(
                NaryOp::Comma,
                vec![nary(NaryOp::Whitespace, vec![num("1"), num("2")]), num("3")]
            ))
        );
    }

    #[test]
    fn function_calls() {
        let Some(Expr::Function(call)) = comma_expr("foo()") else {
            panic!("expected function");
        };
        assert_eq!(call.name, "foo");
        assert!(call.arg.is_none());

        let Some(Expr::Function(call)) = comma_expr("rgb(1, 2, 3)") else {
            panic!("expected function");
        };
        assert_eq!(call.name, "rgb");
        assert!(matches!(call.arg.as_deref(), Some(Expr::Nary(n)) if n.operands.len() == 3));
    }

    #[test]
    fn uri_and_string_terms() {
        assert_eq!(
            comma_expr("url(x.png) no-repeat"),
            Some(nary(
                NaryOp::Whitespace,
                vec![
                    Expr::Value(ValueNode::Uri(UriNode::from_raw(
                        "url(x.png)",
                        Default::default()
                    ))),
                    Expr::Ident(IdentNode::from_raw("no-repeat", Default::default())),
                ]
            ))
        );
        assert!(matches!(
            comma_expr("\"text\""),
            Some(Expr::Value(ValueNode::Str(_)))
        ));
    }

    #[test]
    fn math_expr_accepts_spaced_operators() {
        assert_eq!(
            math_expr("1 - 2"),
            Some(binary(BinaryOp::Subtract, num("1"), num("2")))
        );
        assert_eq!(
            math_expr("6 / 3"),
            Some(binary(BinaryOp::Division, num("6"), num("3")))
        );
    }

    #[test]
    fn math_expr_rejects_commas() {
        // the comma is not a math operator; parsing stops before it
        let result = with_parser("1, 2", |p| {
            let expr = p.parse_math_expr();
            (expr, p.peek(0).token_type.clone())
        });
        let (expr, next) = result;
        assert_eq!(expr.unwrap(), Some(num("1")));
        assert_eq!(next, TokenType::Comma);
    }

    #[test]
    fn dangling_comma_is_an_error() {
        let err = with_parser("1, ;", |p| p.parse_comma_expr()).unwrap_err();
        let nesta_shared::errors::CssError::Syntax(err) = err else {
            panic!("expected syntax error");
        };
        assert_eq!(err.message, "Expected term.");
    }

    #[test]
    fn important_is_not_part_of_the_expression() {
        let result = with_parser("1 !important;", |p| {
            let expr = p.parse_comma_expr();
            (expr, p.peek(0).token_type.clone())
        });
        let (expr, next) = result;
        assert_eq!(expr.unwrap(), Some(num("1")));
        assert!(matches!(next, TokenType::ImportantSym(_)));
    }

    #[test]
    fn term_locations_are_recorded() {
        let Some(expr) = comma_expr("1+$width") else {
            panic!("expected expression");
        };
        let Expr::Binary(binary) = expr else {
            panic!("expected binary expression");
        };
        let location = binary.rhs.location();
        assert_eq!(location.line, 1);
        assert_eq!(location.column, 3);
    }
}
