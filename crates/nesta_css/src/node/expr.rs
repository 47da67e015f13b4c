//! Expression tree nodes and their operators.

use nesta_shared::byte_stream::Location;

use crate::escape;
use crate::node::value::ValueNode;

pub const PRECEDENCE_UNARY: u8 = 6;
pub const PRECEDENCE_BINMUL: u8 = 4;
pub const PRECEDENCE_BINADD: u8 = 3;
pub const PRECEDENCE_WS: u8 = 2;
pub const PRECEDENCE_COMMA: u8 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

impl UnaryOp {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    /// A slash known to mean division
    Division,
    /// A slash parsed as a value separator. Never folded; rewritten to
    /// `Division` when an operand turns out to be arithmetic-shaped.
    FwdSlash,
}

impl BinaryOp {
    #[must_use]
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Subtract => PRECEDENCE_BINADD,
            BinaryOp::Multiply | BinaryOp::Division | BinaryOp::FwdSlash => PRECEDENCE_BINMUL,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Division | BinaryOp::FwdSlash => "/",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NaryOp {
    Comma,
    Whitespace,
}

impl NaryOp {
    #[must_use]
    pub fn precedence(self) -> u8 {
        match self {
            NaryOp::Comma => PRECEDENCE_COMMA,
            NaryOp::Whitespace => PRECEDENCE_WS,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NaryOp::Comma => ", ",
            NaryOp::Whitespace => " ",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Unary(UnaryOpExpr),
    Binary(BinaryOpExpr),
    Nary(NaryOpExpr),
    Function(FunctionCall),
    VarRef(VarRef),
    Ident(IdentNode),
    Value(ValueNode),
}

impl Expr {
    #[must_use]
    pub fn location(&self) -> Location {
        match self {
            Expr::Unary(e) => e.location,
            Expr::Binary(e) => e.location,
            Expr::Nary(e) => e.location,
            Expr::Function(e) => e.location,
            Expr::VarRef(e) => e.location,
            Expr::Ident(e) => e.location,
            Expr::Value(v) => v.location(),
        }
    }

    /// Operator precedence for parenthesization; leaves have none
    #[must_use]
    pub fn precedence(&self) -> Option<u8> {
        match self {
            Expr::Unary(_) => Some(PRECEDENCE_UNARY),
            Expr::Binary(e) => Some(e.op.precedence()),
            Expr::Nary(e) => Some(e.op.precedence()),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct UnaryOpExpr {
    pub op: UnaryOp,
    pub operand: Box<Expr>,
    pub location: Location,
}

impl UnaryOpExpr {
    #[must_use]
    pub fn new(op: UnaryOp, operand: Expr, location: Location) -> Self {
        Self {
            op,
            operand: Box::new(operand),
            location,
        }
    }
}

impl PartialEq for UnaryOpExpr {
    fn eq(&self, other: &Self) -> bool {
        self.op == other.op && self.operand == other.operand
    }
}

#[derive(Clone, Debug)]
pub struct BinaryOpExpr {
    pub op: BinaryOp,
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
    pub location: Location,
}

impl BinaryOpExpr {
    #[must_use]
    pub fn new(op: BinaryOp, lhs: Expr, rhs: Expr, location: Location) -> Self {
        Self {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            location,
        }
    }
}

impl PartialEq for BinaryOpExpr {
    fn eq(&self, other: &Self) -> bool {
        self.op == other.op && self.lhs == other.lhs && self.rhs == other.rhs
    }
}

/// An associative separator expression, kept flat so emission reproduces the
/// original structure.
#[derive(Clone, Debug)]
pub struct NaryOpExpr {
    pub op: NaryOp,
    pub operands: Vec<Expr>,
    pub location: Location,
}

impl NaryOpExpr {
    #[must_use]
    pub fn new(op: NaryOp, operands: Vec<Expr>, location: Location) -> Self {
        debug_assert!(operands.len() >= 2);
        Self {
            op,
            operands,
            location,
        }
    }
}

impl PartialEq for NaryOpExpr {
    fn eq(&self, other: &Self) -> bool {
        self.op == other.op && self.operands == other.operands
    }
}

#[derive(Clone, Debug)]
pub struct FunctionCall {
    pub name: String,
    /// The argument expression (a comma expression), absent for `name()`
    pub arg: Option<Box<Expr>>,
    pub location: Location,
}

impl FunctionCall {
    #[must_use]
    pub fn new(raw_name: &str, arg: Option<Expr>, location: Location) -> Self {
        Self {
            name: escape::unescape_identifier(raw_name),
            arg: arg.map(Box::new),
            location,
        }
    }
}

impl PartialEq for FunctionCall {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name) && self.arg == other.arg
    }
}

/// A `$name` reference; removed by the solver
#[derive(Clone, Debug)]
pub struct VarRef {
    pub name: String,
    pub location: Location,
}

impl VarRef {
    /// Builds from the token payload (already stripped of the `$` marker)
    #[must_use]
    pub fn from_raw(raw: &str, location: Location) -> Self {
        Self {
            name: escape::unescape_identifier(raw),
            location,
        }
    }
}

impl PartialEq for VarRef {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }
}

/// An identifier used as a value (e.g. `bold`, `sans-serif`)
#[derive(Clone, Debug)]
pub struct IdentNode {
    pub name: String,
    pub location: Location,
}

impl IdentNode {
    #[must_use]
    pub fn from_raw(raw: &str, location: Location) -> Self {
        Self {
            name: escape::unescape_identifier(raw),
            location,
        }
    }
}

impl PartialEq for IdentNode {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }
}
