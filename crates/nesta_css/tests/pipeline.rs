//! Pipeline laws: formatting round trips, pass idempotence, and the
//! structural invariants the passes guarantee.

use nesta_css::emitter::Emitter;
use nesta_css::flattener::flatten_stylesheet;
use nesta_css::functions::FunctionRegistry;
use nesta_css::node::{Expr, ImportItem, PseudoBody, Statement, Stylesheet, TailSelector};
use nesta_css::solver::Solver;
use nesta_css::Ncss;

const CORPUS: &[&str] = &[
    "",
    "a {}",
    "a { x: 1; }",
    "a, b.cls, #id {}",
    "a > b + c ~ d e {}",
    "*[href^=\"http\"] {}",
    "[disabled] {}",
    "a:hover::after {}",
    "a:not(.hidden) {}",
    "li:nth-child(2n) {}",
    "a { x: 1+2*3; y: (1+2)*3; }",
    "a { f: 12px/30px sans-serif, monospace; }",
    "a { m: 1px 2px 3px 4px; }",
    "a { x: -5px; y: 0 -2px; }",
    "a { c: #fff; d: #a1b2c3; }",
    "a { s: \"double\"; t: 'single'; }",
    "a { u: url(image.png); }",
    "a { c: rgb(1, 2, 3); d: hsl(120, 50%, 50%); }",
    "a { x: 1 ! important; }",
    "$w: 10px; a { width: $w; }",
    "a { $inner: 1; p: $inner; b { q: $inner; } }",
    "outer { inner { rule: value; } }",
    "a { &.fused {} & .child {} }",
    "@media screen { a { x: 1; } }",
    "@charset \"utf-8\";\na {}",
    "@import url(\"remote.css\");\na {}",
];

fn parse(source: &str) -> Stylesheet {
    Ncss::parse_str(source, "corpus.css")
        .unwrap_or_else(|err| panic!("parse failed for {source:?}: {err}"))
}

fn emit(sheet: &Stylesheet) -> String {
    Emitter::new().emit_stylesheet(sheet)
}

fn solve(sheet: &mut Stylesheet) {
    let registry = FunctionRegistry::with_builtins();
    Solver::new(&registry)
        .solve_stylesheet(sheet)
        .unwrap_or_else(|err| panic!("solve failed: {err}"));
}

#[test]
fn formatting_preserves_the_parse() {
    for source in CORPUS {
        let first = parse(source);
        let formatted = emit(&first);
        let second = parse(&formatted);
        assert_eq!(first, second, "round trip changed the tree for {source:?}\nformatted: {formatted:?}");
    }
}

#[test]
fn formatting_is_a_fixed_point_after_one_pass() {
    for source in CORPUS {
        let formatted = emit(&parse(source));
        let again = emit(&parse(&formatted));
        assert_eq!(formatted, again, "for {source:?}");
    }
}

#[test]
fn solving_twice_changes_nothing() {
    for source in CORPUS {
        let mut sheet = parse(source);
        solve(&mut sheet);
        let once = sheet.clone();
        solve(&mut sheet);
        assert_eq!(once, sheet, "for {source:?}");
    }
}

#[test]
fn flattening_twice_changes_nothing() {
    for source in CORPUS {
        let mut sheet = parse(source);
        solve(&mut sheet);
        flatten_stylesheet(&mut sheet).unwrap();
        let once = sheet.clone();
        flatten_stylesheet(&mut sheet).unwrap();
        assert_eq!(once, sheet, "for {source:?}");
    }
}

#[test]
fn flatten_after_solve_never_fails() {
    for source in CORPUS {
        let mut sheet = parse(source);
        solve(&mut sheet);
        flatten_stylesheet(&mut sheet)
            .unwrap_or_else(|err| panic!("flatten failed for {source:?}: {err}"));
    }
}

fn statements_of(sheet: &Stylesheet) -> Vec<&Statement> {
    fn collect<'a>(items: &'a [ImportItem], statements: &'a [Statement], out: &mut Vec<&'a Statement>) {
        for item in items {
            if let ImportItem::Inlined(imported) = item {
                collect(&imported.imports, &imported.statements, out);
            }
        }
        fn walk<'a>(statements: &'a [Statement], out: &mut Vec<&'a Statement>) {
            for stmt in statements {
                out.push(stmt);
                if let Statement::RuleSet(ruleset) = stmt {
                    walk(&ruleset.statements, out);
                }
            }
        }
        walk(statements, out);
    }
    let mut out = Vec::new();
    collect(&sheet.imports, &sheet.statements, &mut out);
    out
}

fn expr_has_var_ref(expr: &Expr) -> bool {
    match expr {
        Expr::VarRef(_) => true,
        Expr::Unary(unary) => expr_has_var_ref(&unary.operand),
        Expr::Binary(binary) => {
            expr_has_var_ref(&binary.lhs) || expr_has_var_ref(&binary.rhs)
        }
        Expr::Nary(nary) => nary.operands.iter().any(expr_has_var_ref),
        Expr::Function(call) => call.arg.as_deref().is_some_and(expr_has_var_ref),
        Expr::Ident(_) | Expr::Value(_) => false,
    }
}

#[test]
fn flattened_rulesets_contain_no_nesting_and_no_bindings() {
    for source in CORPUS {
        let mut sheet = parse(source);
        solve(&mut sheet);
        flatten_stylesheet(&mut sheet).unwrap();

        for stmt in statements_of(&sheet) {
            match stmt {
                Statement::VarDef(_) => panic!("vardef survived the solver for {source:?}"),
                Statement::RuleSet(ruleset) => {
                    assert!(
                        !ruleset
                            .statements
                            .iter()
                            .any(|s| matches!(s, Statement::RuleSet(_) | Statement::VarDef(_))),
                        "nested statement survived flattening for {source:?}"
                    );
                    for selector in &ruleset.selectors {
                        assert!(
                            !selector.has_ancestor_reference(),
                            "'&' survived flattening for {source:?}"
                        );
                    }
                }
                Statement::Declaration(declaration) => {
                    assert!(
                        !expr_has_var_ref(&declaration.expr),
                        "variable reference survived the solver for {source:?}"
                    );
                }
                Statement::AtRule(_) => {}
            }
        }
    }
}

#[test]
fn pseudo_function_arguments_round_trip() {
    let sheet = parse("li:nth-child(2n) {}");
    let Statement::RuleSet(ruleset) = &sheet.statements[0] else {
        panic!("expected ruleset");
    };
    let nesta_css::node::SelectorPart::Sequence(seq) = &ruleset.selectors[0].parts[0] else {
        panic!("expected sequence");
    };
    let TailSelector::PseudoClass(pseudo) = &seq.tail[0] else {
        panic!("expected pseudo class, got {:?}", seq.tail);
    };
    assert!(matches!(&pseudo.body, PseudoBody::Function(call) if call.name == "nth-child"));
}
