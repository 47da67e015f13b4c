//! The emitter: formats an AST back into CSS text.
//!
//! Output is pretty-printed with four-space indents. Since the flattener has
//! run by the time real stylesheets get here, nesting is two-level: selector
//! groups and their declarations. Selector groups are joined with `, ` and
//! carry one soft-break candidate; when a write pushes the current line past
//! the configured width the candidate becomes a real newline.

use crate::escape;
use crate::node::{
    AttrValue, BinaryOpExpr, Charset, Declaration, Expr, FunctionCall, HeadSelector, ImportItem,
    ImportUri, NegationArg, PseudoBody, RuleSet, Selector, SelectorPart, SimpleSelectorSequence,
    Statement, Stylesheet, TailSelector, UnaryOpExpr, ValueNode, VarDef,
};
use crate::node::Combinator;

/// Preferred output format for colors; `Any` keeps each color's own
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ColorFormatPref {
    #[default]
    Any,
    Hex,
    Rgb,
    Hsl,
}

pub struct Emitter {
    indent_str: String,
    indent_level: usize,
    line_width: usize,
    color_format: ColorFormatPref,
    cache: String,
    last_optional_newline: usize,
    out: String,
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Emitter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            indent_str: " ".repeat(4),
            indent_level: 0,
            line_width: 80,
            color_format: ColorFormatPref::Any,
            cache: String::new(),
            last_optional_newline: 0,
            out: String::new(),
        }
    }

    #[must_use]
    pub fn with_line_width(mut self, line_width: usize) -> Self {
        self.line_width = line_width;
        self
    }

    #[must_use]
    pub fn with_color_format(mut self, color_format: ColorFormatPref) -> Self {
        self.color_format = color_format;
        self
    }

    /// Formats a whole stylesheet: the charset rule, imports in place, then
    /// the statements.
    pub fn emit_stylesheet(&mut self, sheet: &Stylesheet) -> String {
        if let Some(charset) = &sheet.charset {
            self.emit_charset(charset);
            self.newline();
        }
        self.emit_import_items(&sheet.imports);
        for stmt in &sheet.statements {
            self.emit_statement(stmt);
            self.newline();
        }
        self.flush();
        std::mem::take(&mut self.out)
    }

    fn emit_import_items(&mut self, imports: &[ImportItem]) {
        for item in imports {
            match item {
                ImportItem::Plain(import) => {
                    self.write("@import ");
                    match &import.uri {
                        ImportUri::Str(s) => self.write(&escape::quote_string(&s.value)),
                        ImportUri::Uri(u) => {
                            self.write("url(");
                            self.write(&escape::quote_string(&u.uri));
                            self.write(")");
                        }
                    }
                    self.write(";");
                    self.newline();
                }
                ImportItem::Inlined(imported) => {
                    // the imported file's content, substituted in place
                    self.emit_import_items(&imported.imports);
                    for stmt in &imported.statements {
                        self.emit_statement(stmt);
                        self.newline();
                    }
                }
            }
        }
    }

    fn emit_charset(&mut self, charset: &Charset) {
        self.write("@charset ");
        self.write(&escape::quote_string(&charset.name));
        self.write(";");
    }

    fn emit_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::RuleSet(ruleset) => self.emit_ruleset(ruleset),
            Statement::Declaration(declaration) => self.emit_declaration(declaration),
            Statement::VarDef(vardef) => self.emit_vardef(vardef),
            Statement::AtRule(at_rule) => self.write(&at_rule.text),
        }
    }

    fn emit_ruleset(&mut self, ruleset: &RuleSet) {
        if let Some((last, rest)) = ruleset.selectors.split_last() {
            for selector in rest {
                self.emit_selector(selector);
                self.write(", ");
                self.optional_newline();
            }
            self.emit_selector(last);
        }

        if ruleset.statements.is_empty() {
            self.write(" {}");
            return;
        }

        self.write(" {");
        self.push_indent();
        self.newline();

        if let Some((last, rest)) = ruleset.statements.split_last() {
            for stmt in rest {
                self.emit_statement(stmt);
                self.newline();
            }
            self.emit_statement(last);
        }

        self.pop_indent();
        self.newline();
        self.write("}");
    }

    fn emit_declaration(&mut self, declaration: &Declaration) {
        self.write(&escape::escape_identifier(&declaration.property.name));
        self.write(": ");
        self.emit_expr(&declaration.expr);
        if declaration.important {
            self.write(" !important");
        }
        self.write(";");
    }

    fn emit_vardef(&mut self, vardef: &VarDef) {
        self.write("$");
        self.write(&escape::escape_identifier(&vardef.name));
        self.write(": ");
        self.emit_expr(&vardef.expr);
        self.write(";");
    }

    fn emit_selector(&mut self, selector: &Selector) {
        for part in &selector.parts {
            match part {
                SelectorPart::Sequence(seq) => self.emit_sequence(seq),
                SelectorPart::Combinator(Combinator::Descendant) => self.write(" "),
                SelectorPart::Combinator(Combinator::Child) => self.write(" > "),
                SelectorPart::Combinator(Combinator::AdjacentSibling) => self.write(" + "),
                SelectorPart::Combinator(Combinator::GeneralSibling) => self.write(" ~ "),
            }
        }
    }

    fn emit_sequence(&mut self, seq: &SimpleSelectorSequence) {
        match &seq.head {
            Some(HeadSelector::Type(t)) => self.write(&escape::escape_identifier(&t.name)),
            Some(HeadSelector::Universal(_)) => self.write("*"),
            Some(HeadSelector::Ancestor(_)) => self.write("&"),
            None => {}
        }
        for tail in &seq.tail {
            self.emit_tail(tail);
        }
    }

    fn emit_tail(&mut self, tail: &TailSelector) {
        match tail {
            TailSelector::Id(id) => {
                self.write("#");
                self.write(&escape::escape_name(&id.name));
            }
            TailSelector::Class(class) => {
                self.write(".");
                self.write(&escape::escape_identifier(&class.name));
            }
            TailSelector::Attribute(attr) => {
                self.write("[");
                self.write(&escape::escape_identifier(&attr.attr));
                if let (Some(op), Some(value)) = (&attr.op, &attr.value) {
                    self.write(op.as_str());
                    match value {
                        AttrValue::Ident(ident) => {
                            self.write(&escape::escape_identifier(&ident.name));
                        }
                        AttrValue::Str(s) => self.write(&escape::quote_string(&s.value)),
                    }
                }
                self.write("]");
            }
            TailSelector::PseudoClass(pseudo) => {
                self.write(":");
                self.emit_pseudo_body(&pseudo.body);
            }
            TailSelector::PseudoElement(pseudo) => {
                self.write("::");
                self.emit_pseudo_body(&pseudo.body);
            }
            TailSelector::Negation(negation) => {
                self.write(":not(");
                self.emit_negation_arg(&negation.arg);
                self.write(")");
            }
        }
    }

    fn emit_pseudo_body(&mut self, body: &PseudoBody) {
        match body {
            PseudoBody::Ident(ident) => self.write(&escape::escape_identifier(&ident.name)),
            PseudoBody::Function(call) => self.emit_function(call),
        }
    }

    fn emit_negation_arg(&mut self, arg: &NegationArg) {
        match arg {
            NegationArg::Type(t) => self.write(&escape::escape_identifier(&t.name)),
            NegationArg::Universal(_) => self.write("*"),
            NegationArg::Id(id) => {
                self.write("#");
                self.write(&escape::escape_name(&id.name));
            }
            NegationArg::Class(class) => {
                self.write(".");
                self.write(&escape::escape_identifier(&class.name));
            }
            NegationArg::Attribute(attr) => {
                self.emit_tail(&TailSelector::Attribute(attr.clone()));
            }
            NegationArg::PseudoClass(pseudo) => {
                self.emit_tail(&TailSelector::PseudoClass(pseudo.clone()));
            }
            NegationArg::PseudoElement(pseudo) => {
                self.emit_tail(&TailSelector::PseudoElement(pseudo.clone()));
            }
        }
    }

    fn emit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Unary(unary) => self.emit_unary(unary),
            Expr::Binary(binary) => self.emit_binary(binary),
            Expr::Nary(nary) => {
                if let Some((first, rest)) = nary.operands.split_first() {
                    self.emit_expr(first);
                    for operand in rest {
                        self.write(nary.op.as_str());
                        self.emit_expr(operand);
                    }
                }
            }
            Expr::Function(call) => self.emit_function(call),
            Expr::VarRef(var) => {
                self.write("$");
                self.write(&escape::escape_identifier(&var.name));
            }
            Expr::Ident(ident) => self.write(&escape::escape_identifier(&ident.name)),
            Expr::Value(value) => self.emit_value(value),
        }
    }

    fn emit_unary(&mut self, unary: &UnaryOpExpr) {
        self.write(unary.op.as_str());
        if unary.operand.precedence().is_some() {
            self.write("(");
            self.emit_expr(&unary.operand);
            self.write(")");
        } else {
            self.emit_expr(&unary.operand);
        }
    }

    /// The LHS is parenthesized when its precedence is strictly lower than
    /// the operator's; the RHS when lower or equal, preserving the
    /// left-associative reading.
    fn emit_binary(&mut self, binary: &BinaryOpExpr) {
        let prec = binary.op.precedence();

        let lhs_parens = binary.lhs.precedence().is_some_and(|p| p < prec);
        if lhs_parens {
            self.write("(");
        }
        self.emit_expr(&binary.lhs);
        if lhs_parens {
            self.write(")");
        }

        self.write(binary.op.as_str());

        let rhs_parens = binary.rhs.precedence().is_some_and(|p| p <= prec);
        if rhs_parens {
            self.write("(");
        }
        self.emit_expr(&binary.rhs);
        if rhs_parens {
            self.write(")");
        }
    }

    fn emit_function(&mut self, call: &FunctionCall) {
        self.write(&escape::escape_identifier(&call.name));
        self.write("(");
        if let Some(arg) = &call.arg {
            self.emit_expr(arg);
        }
        self.write(")");
    }

    fn emit_value(&mut self, value: &ValueNode) {
        match value {
            ValueNode::Number(n) => self.write(&n.number),
            ValueNode::Percentage(p) => {
                self.write(&p.pct);
                self.write("%");
            }
            ValueNode::Dimension(d) => {
                self.write(&d.number);
                self.write(&escape::escape_identifier(&d.unit));
            }
            ValueNode::Str(s) => self.write(&escape::quote_string(&s.value)),
            ValueNode::Uri(u) => {
                self.write("url(");
                self.write(&escape::quote_string(&u.uri));
                self.write(")");
            }
            ValueNode::HexColor(hex) => match self.color_format {
                ColorFormatPref::Any | ColorFormatPref::Hex => {
                    self.write("#");
                    self.write(&hex.hex);
                }
                ColorFormatPref::Rgb => self.write(&hex.to_value().rgb_string()),
                ColorFormatPref::Hsl => self.write(&hex.to_value().hsl_string()),
            },
            ValueNode::RgbColor(rgb) => match self.color_format {
                ColorFormatPref::Any | ColorFormatPref::Rgb => {
                    self.write(&rgb.color.rgb_string());
                }
                ColorFormatPref::Hex => {
                    self.write("#");
                    self.write(&rgb.color.hex_string());
                }
                ColorFormatPref::Hsl => self.write(&rgb.color.hsl_string()),
            },
            ValueNode::HslColor(hsl) => match self.color_format {
                ColorFormatPref::Any | ColorFormatPref::Hsl => {
                    self.write(&hsl.color.hsl_string());
                }
                ColorFormatPref::Hex => {
                    self.write("#");
                    self.write(&hsl.color.hex_string());
                }
                ColorFormatPref::Rgb => self.write(&hsl.color.rgb_string()),
            },
        }
    }

    fn push_indent(&mut self) {
        self.indent_level += 1;
    }

    fn pop_indent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    fn write(&mut self, data: &str) {
        self.cache.push_str(data);
        if self.last_optional_newline > 0 && self.cache.len() > self.line_width {
            // convert the pending soft break into a real newline
            let tail = self.cache.split_off(self.last_optional_newline);
            self.newline();
            self.cache = tail;
        }
    }

    fn newline(&mut self) {
        self.cache.push('\n');
        self.flush();
        let indent = self.indent_str.repeat(self.indent_level);
        self.cache.push_str(&indent);
    }

    /// Marks the current position as a break candidate; breaks immediately
    /// when the line is already over the limit.
    fn optional_newline(&mut self) {
        if self.cache.len() > self.line_width {
            self.newline();
        } else {
            self.last_optional_newline = self.cache.len();
        }
    }

    fn flush(&mut self) {
        self.out.push_str(&self.cache);
        self.cache.clear();
        self.last_optional_newline = 0;
    }
}
