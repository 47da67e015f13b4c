//! The solver pass: resolves variable references, folds constant
//! expressions, and strips variable definitions from the tree.
//!
//! Scoping is lexical. A namespace is pushed at each stylesheet boundary
//! (the top level and every inlined import); a scope is pushed at each
//! ruleset. Lookup walks the scope stack of the current namespace only,
//! innermost first. When an inlined import finishes, its top-level bindings
//! merge into the containing namespace for names not already bound there.

use std::collections::HashMap;

use nesta_shared::byte_stream::Location;
use nesta_shared::errors::{CssError, CssResult};

use crate::functions::FunctionRegistry;
use crate::node::{
    BinaryOp, BinaryOpExpr, Expr, FunctionCall, ImportItem, NaryOp, NaryOpExpr, Statement,
    Stylesheet, UnaryOp, UnaryOpExpr, ValueNode,
};
use crate::values::{self, NumericOp, Value};

/// The result of folding a subexpression: either a computed value, or a
/// tree that stays symbolic (separators, identifiers, pass-through calls).
#[derive(Clone, Debug)]
enum Folded {
    Value(Value),
    Node(Expr),
}

struct Namespace {
    scopes: Vec<HashMap<String, Folded>>,
}

impl Namespace {
    fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
        }
    }

    fn get(&self, name: &str) -> Option<&Folded> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }
}

pub struct Solver<'reg> {
    registry: &'reg FunctionRegistry,
    namespaces: Vec<Namespace>,
}

/// A leaf (possibly under unary operators) as an algebra value
fn expr_as_value(expr: &Expr) -> Option<Value> {
    match expr {
        Expr::Value(v) => v.to_value(),
        Expr::Unary(unary) => {
            let inner = expr_as_value(&unary.operand)?;
            match unary.op {
                UnaryOp::Minus => inner.negate(unary.location).ok(),
                UnaryOp::Plus => Some(inner),
            }
        }
        _ => None,
    }
}

/// Re-encodes a value as an expression node. Negative values come back as a
/// unary minus over the positive literal, so the emitter never writes a bare
/// negative number.
fn value_to_node(value: Value, location: Location) -> Expr {
    if value.is_negative() {
        // negation of a negative scalar cannot fail
        let positive = value
            .negate(location)
            .unwrap_or(Value::Number(0.0));
        return Expr::Unary(UnaryOpExpr::new(
            UnaryOp::Minus,
            Expr::Value(ValueNode::from_value(&positive, location)),
            location,
        ));
    }
    Expr::Value(ValueNode::from_value(&value, location))
}

fn folded_to_node(folded: Folded, location: Location) -> Expr {
    match folded {
        Folded::Value(value) => value_to_node(value, location),
        Folded::Node(expr) => expr,
    }
}

impl<'reg> Solver<'reg> {
    #[must_use]
    pub fn new(registry: &'reg FunctionRegistry) -> Self {
        Self {
            registry,
            namespaces: Vec::new(),
        }
    }

    /// Runs the pass over a whole stylesheet, imports included
    pub fn solve_stylesheet(&mut self, sheet: &mut Stylesheet) -> CssResult<()> {
        self.namespaces.push(Namespace::new());
        let result = self
            .solve_imports(&mut sheet.imports)
            .and_then(|()| self.solve_statements(&mut sheet.statements));
        self.namespaces.pop();
        debug_assert!(self.namespaces.is_empty());
        result
    }

    fn solve_imports(&mut self, imports: &mut Vec<ImportItem>) -> CssResult<()> {
        for item in imports {
            let ImportItem::Inlined(imported) = item else {
                continue;
            };
            self.namespaces.push(Namespace::new());
            let result = self
                .solve_imports(&mut imported.imports)
                .and_then(|()| self.solve_statements(&mut imported.statements));
            self.merge_child_namespace();
            result?;
        }
        Ok(())
    }

    /// Pops the finished import namespace and copies its top-level bindings
    /// into the containing namespace, without shadowing existing names.
    fn merge_child_namespace(&mut self) {
        let Some(mut child) = self.namespaces.pop() else {
            return;
        };
        debug_assert_eq!(child.scopes.len(), 1);
        let Some(parent) = self.namespaces.last_mut() else {
            return;
        };
        let Some(child_scope) = child.scopes.pop() else {
            return;
        };
        let Some(parent_scope) = parent.scopes.last_mut() else {
            return;
        };
        for (name, binding) in child_scope {
            parent_scope.entry(name).or_insert(binding);
        }
    }

    fn push_scope(&mut self) {
        if let Some(namespace) = self.namespaces.last_mut() {
            namespace.scopes.push(HashMap::new());
        }
    }

    fn pop_scope(&mut self) {
        if let Some(namespace) = self.namespaces.last_mut() {
            namespace.scopes.pop();
        }
    }

    fn assign_variable(&mut self, name: &str, binding: Folded) {
        if let Some(namespace) = self.namespaces.last_mut() {
            if let Some(scope) = namespace.scopes.last_mut() {
                scope.insert(name.to_ascii_lowercase(), binding);
            }
        }
    }

    fn retrieve_variable(&self, name: &str) -> Option<Folded> {
        self.namespaces
            .last()
            .and_then(|namespace| namespace.get(&name.to_ascii_lowercase()))
            .cloned()
    }

    fn solve_statements(&mut self, statements: &mut Vec<Statement>) -> CssResult<()> {
        let old = std::mem::take(statements);
        for stmt in old {
            match stmt {
                Statement::VarDef(vardef) => {
                    // the definition binds and disappears from the tree
                    let binding = self.solve_folded(vardef.expr)?;
                    self.assign_variable(&vardef.name, binding);
                }
                Statement::Declaration(mut declaration) => {
                    let location = declaration.expr.location();
                    let folded = self.solve_folded(declaration.expr)?;
                    declaration.expr = folded_to_node(folded, location);
                    statements.push(Statement::Declaration(declaration));
                }
                Statement::RuleSet(mut ruleset) => {
                    self.push_scope();
                    let result = self.solve_statements(&mut ruleset.statements);
                    self.pop_scope();
                    result?;
                    statements.push(Statement::RuleSet(ruleset));
                }
                Statement::AtRule(at_rule) => statements.push(Statement::AtRule(at_rule)),
            }
        }
        Ok(())
    }

    fn solve_folded(&mut self, expr: Expr) -> CssResult<Folded> {
        match expr {
            Expr::Value(_) | Expr::Ident(_) => Ok(Folded::Node(expr)),

            Expr::VarRef(var) => match self.retrieve_variable(&var.name) {
                Some(binding) => Ok(binding),
                None => Err(CssError::VarName {
                    name: var.name,
                    location: var.location,
                }),
            },

            Expr::Unary(unary) => {
                let location = unary.location;
                let operand = self.solve_folded(*unary.operand)?;
                let value = self.folded_to_value(operand, location)?;
                let value = match unary.op {
                    UnaryOp::Minus => value.negate(location)?,
                    UnaryOp::Plus => value.unary_plus(location)?,
                };
                Ok(Folded::Value(value))
            }

            Expr::Binary(binary) => {
                let location = binary.location;
                let op = binary.op;
                let lhs = self.solve_folded(*binary.lhs)?;
                let rhs = self.solve_folded(*binary.rhs)?;

                if op == BinaryOp::FwdSlash {
                    // a separator slash survives folding untouched
                    let lhs = folded_to_node(lhs, location);
                    let rhs = folded_to_node(rhs, location);
                    return Ok(Folded::Node(Expr::Binary(BinaryOpExpr::new(
                        op, lhs, rhs, location,
                    ))));
                }

                let numeric_op = match op {
                    BinaryOp::Add => NumericOp::Add,
                    BinaryOp::Subtract => NumericOp::Sub,
                    BinaryOp::Multiply => NumericOp::Mul,
                    BinaryOp::Division | BinaryOp::FwdSlash => NumericOp::Div,
                };
                let lhs = self.folded_to_value(lhs, location)?;
                let rhs = self.folded_to_value(rhs, location)?;
                Ok(Folded::Value(values::apply(numeric_op, &lhs, &rhs, location)?))
            }

            Expr::Nary(nary) => {
                let mut operands = Vec::with_capacity(nary.operands.len());
                for operand in nary.operands {
                    let location = operand.location();
                    let folded = self.solve_folded(operand)?;
                    operands.push(folded_to_node(folded, location));
                }
                Ok(Folded::Node(Expr::Nary(NaryOpExpr::new(
                    nary.op,
                    operands,
                    nary.location,
                ))))
            }

            Expr::Function(call) => self.solve_function(call),
        }
    }

    /// Dispatches registered functions by name and arity; unregistered names
    /// pass through with their arguments solved.
    fn solve_function(&mut self, call: FunctionCall) -> CssResult<Folded> {
        let location = call.location;
        let arg = match call.arg {
            Some(arg) => {
                let arg_location = arg.location();
                let folded = self.solve_folded(*arg)?;
                Some(folded_to_node(folded, arg_location))
            }
            None => None,
        };

        if !self.registry.contains_name(&call.name) {
            return Ok(Folded::Node(Expr::Function(FunctionCall {
                name: call.name,
                arg: arg.map(Box::new),
                location,
            })));
        }

        let arg_nodes: Vec<&Expr> = match &arg {
            None => Vec::new(),
            Some(Expr::Nary(nary)) if nary.op == NaryOp::Comma => nary.operands.iter().collect(),
            Some(other) => vec![other],
        };

        let mut arg_values = Vec::with_capacity(arg_nodes.len());
        for node in &arg_nodes {
            match expr_as_value(node) {
                Some(value) => arg_values.push(value),
                None => {
                    return Err(CssError::Value {
                        message: format!("invalid argument to {}()", call.name),
                        location,
                    });
                }
            }
        }

        let Some(func) = self.registry.lookup(&call.name, arg_values.len()) else {
            return Err(CssError::FunctionNotFound {
                name: call.name,
                arity: arg_values.len(),
            });
        };

        Ok(Folded::Value(func(&arg_values, location)?))
    }

    fn folded_to_value(&self, folded: Folded, location: Location) -> CssResult<Value> {
        match folded {
            Folded::Value(value) => Ok(value),
            Folded::Node(expr) => expr_as_value(&expr).ok_or_else(|| CssError::Type {
                message: format!("unsupported operand: {}", describe_expr(&expr)),
                location,
            }),
        }
    }
}

fn describe_expr(expr: &Expr) -> &'static str {
    match expr {
        Expr::Ident(_) => "identifier",
        Expr::Function(_) => "function call",
        Expr::Nary(_) => "value list",
        Expr::Binary(_) => "expression",
        Expr::Unary(_) => "expression",
        Expr::VarRef(_) => "variable",
        Expr::Value(ValueNode::Str(_)) => "string",
        Expr::Value(ValueNode::Uri(_)) => "uri",
        Expr::Value(_) => "value",
    }
}
