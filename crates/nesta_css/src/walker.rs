//! Debug dump of the AST: one node per line, indented by depth. Useful when
//! tracing what the parser or a pass produced.

use std::fmt::Write;

use crate::node::{
    AttrValue, Expr, HeadSelector, ImportItem, ImportUri, NegationArg, PseudoBody, Selector,
    SelectorPart, Statement, Stylesheet, TailSelector, ValueNode,
};

pub struct Walker<'a> {
    root: &'a Stylesheet,
}

impl<'a> Walker<'a> {
    #[must_use]
    pub fn new(root: &'a Stylesheet) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn walk_to_string(&self) -> String {
        let mut out = String::new();
        walk_stylesheet(self.root, 0, &mut out);
        out
    }
}

fn pad(depth: usize, f: &mut String) {
    for _ in 0..depth {
        f.push_str("  ");
    }
}

fn line(depth: usize, f: &mut String, text: &str) {
    pad(depth, f);
    f.push_str(text);
    f.push('\n');
}

fn walk_stylesheet(sheet: &Stylesheet, depth: usize, f: &mut String) {
    line(depth, f, &format!("[Stylesheet ({})]", sheet.statements.len()));
    if let Some(charset) = &sheet.charset {
        line(depth + 1, f, &format!("[Charset] {}", charset.name));
    }
    walk_imports(&sheet.imports, depth + 1, f);
    for stmt in &sheet.statements {
        walk_statement(stmt, depth + 1, f);
    }
}

fn walk_imports(imports: &[ImportItem], depth: usize, f: &mut String) {
    for item in imports {
        match item {
            ImportItem::Plain(import) => match &import.uri {
                ImportUri::Str(s) => line(depth, f, &format!("[Import] \"{}\"", s.value)),
                ImportUri::Uri(u) => line(depth, f, &format!("[Import] url({})", u.uri)),
            },
            ImportItem::Inlined(imported) => {
                line(depth, f, &format!("[ImportedStylesheet ({})]", imported.statements.len()));
                walk_imports(&imported.imports, depth + 1, f);
                for stmt in &imported.statements {
                    walk_statement(stmt, depth + 1, f);
                }
            }
        }
    }
}

fn walk_statement(stmt: &Statement, depth: usize, f: &mut String) {
    match stmt {
        Statement::RuleSet(ruleset) => {
            line(depth, f, "[RuleSet]");
            for selector in &ruleset.selectors {
                walk_selector(selector, depth + 1, f);
            }
            for stmt in &ruleset.statements {
                walk_statement(stmt, depth + 1, f);
            }
        }
        Statement::Declaration(declaration) => {
            line(
                depth,
                f,
                &format!(
                    "[Declaration] property: {} important: {}",
                    declaration.property.name, declaration.important
                ),
            );
            walk_expr(&declaration.expr, depth + 1, f);
        }
        Statement::VarDef(vardef) => {
            line(depth, f, &format!("[VarDef] ${}", vardef.name));
            walk_expr(&vardef.expr, depth + 1, f);
        }
        Statement::AtRule(at_rule) => {
            line(depth, f, &format!("[AtRule] name: {}", at_rule.name));
        }
    }
}

fn walk_selector(selector: &Selector, depth: usize, f: &mut String) {
    line(depth, f, "[Selector]");
    for part in &selector.parts {
        match part {
            SelectorPart::Combinator(combinator) => {
                line(depth + 1, f, &format!("[Combinator] {combinator:?}"));
            }
            SelectorPart::Sequence(seq) => {
                line(depth + 1, f, "[SimpleSelectorSequence]");
                match &seq.head {
                    Some(HeadSelector::Type(t)) => {
                        line(depth + 2, f, &format!("[TypeSelector] {}", t.name));
                    }
                    Some(HeadSelector::Universal(_)) => line(depth + 2, f, "[UniversalSelector]"),
                    Some(HeadSelector::Ancestor(_)) => line(depth + 2, f, "[AncestorSelector]"),
                    None => {}
                }
                for tail in &seq.tail {
                    walk_tail(tail, depth + 2, f);
                }
            }
        }
    }
}

fn walk_tail(tail: &TailSelector, depth: usize, f: &mut String) {
    match tail {
        TailSelector::Id(id) => line(depth, f, &format!("[IdSelector] #{}", id.name)),
        TailSelector::Class(class) => line(depth, f, &format!("[ClassSelector] .{}", class.name)),
        TailSelector::Attribute(attr) => {
            let mut text = format!("[AttributeSelector] {}", attr.attr);
            if let (Some(op), Some(value)) = (&attr.op, &attr.value) {
                let value = match value {
                    AttrValue::Ident(ident) => ident.name.clone(),
                    AttrValue::Str(s) => format!("{:?}", s.value),
                };
                let _ = write!(text, " {} {}", op.as_str(), value);
            }
            line(depth, f, &text);
        }
        TailSelector::PseudoClass(pseudo) => {
            line(depth, f, "[PseudoClassSelector]");
            walk_pseudo_body(&pseudo.body, depth + 1, f);
        }
        TailSelector::PseudoElement(pseudo) => {
            line(depth, f, "[PseudoElementSelector]");
            walk_pseudo_body(&pseudo.body, depth + 1, f);
        }
        TailSelector::Negation(negation) => {
            line(depth, f, "[NegationSelector]");
            match &*negation.arg {
                NegationArg::Type(t) => line(depth + 1, f, &format!("[TypeSelector] {}", t.name)),
                NegationArg::Universal(_) => line(depth + 1, f, "[UniversalSelector]"),
                NegationArg::Id(id) => line(depth + 1, f, &format!("[IdSelector] #{}", id.name)),
                NegationArg::Class(class) => {
                    line(depth + 1, f, &format!("[ClassSelector] .{}", class.name));
                }
                NegationArg::Attribute(attr) => {
                    walk_tail(&TailSelector::Attribute(attr.clone()), depth + 1, f);
                }
                NegationArg::PseudoClass(pseudo) => {
                    walk_tail(&TailSelector::PseudoClass(pseudo.clone()), depth + 1, f);
                }
                NegationArg::PseudoElement(pseudo) => {
                    walk_tail(&TailSelector::PseudoElement(pseudo.clone()), depth + 1, f);
                }
            }
        }
    }
}

fn walk_pseudo_body(body: &PseudoBody, depth: usize, f: &mut String) {
    match body {
        PseudoBody::Ident(ident) => line(depth, f, &format!("[Ident] {}", ident.name)),
        PseudoBody::Function(call) => {
            line(depth, f, &format!("[Function] {}", call.name));
            if let Some(arg) = &call.arg {
                walk_expr(arg, depth + 1, f);
            }
        }
    }
}

fn walk_expr(expr: &Expr, depth: usize, f: &mut String) {
    match expr {
        Expr::Unary(unary) => {
            line(depth, f, &format!("[UnaryOp] {}", unary.op.as_str()));
            walk_expr(&unary.operand, depth + 1, f);
        }
        Expr::Binary(binary) => {
            line(depth, f, &format!("[BinaryOp] {:?}", binary.op));
            walk_expr(&binary.lhs, depth + 1, f);
            walk_expr(&binary.rhs, depth + 1, f);
        }
        Expr::Nary(nary) => {
            line(depth, f, &format!("[NaryOp] {:?} ({})", nary.op, nary.operands.len()));
            for operand in &nary.operands {
                walk_expr(operand, depth + 1, f);
            }
        }
        Expr::Function(call) => {
            line(depth, f, &format!("[Function] {}", call.name));
            if let Some(arg) = &call.arg {
                walk_expr(arg, depth + 1, f);
            }
        }
        Expr::VarRef(var) => line(depth, f, &format!("[VarRef] ${}", var.name)),
        Expr::Ident(ident) => line(depth, f, &format!("[Ident] {}", ident.name)),
        Expr::Value(value) => walk_value(value, depth, f),
    }
}

fn walk_value(value: &ValueNode, depth: usize, f: &mut String) {
    match value {
        ValueNode::Number(n) => line(depth, f, &format!("[Number] {}", n.number)),
        ValueNode::Percentage(p) => line(depth, f, &format!("[Percentage] {}%", p.pct)),
        ValueNode::Dimension(d) => {
            line(depth, f, &format!("[Dimension] {}{}", d.number, d.unit));
        }
        ValueNode::Str(s) => line(depth, f, &format!("[String] {:?}", s.value)),
        ValueNode::Uri(u) => line(depth, f, &format!("[Uri] url({})", u.uri)),
        ValueNode::HexColor(hex) => line(depth, f, &format!("[HexColor] #{}", hex.hex)),
        ValueNode::RgbColor(rgb) => {
            line(depth, f, &format!("[RgbColor] {}", rgb.color.rgb_string()));
        }
        ValueNode::HslColor(hsl) => {
            line(depth, f, &format!("[HslColor] {}", hsl.color.hsl_string()));
        }
    }
}
