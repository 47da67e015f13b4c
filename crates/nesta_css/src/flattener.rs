//! The flattener pass: rewrites nested rulesets into a flat stylesheet.
//!
//! Each ruleset yields a chain per nesting path. A chain holds the ordered
//! list of selector sequences from the outermost ruleset to the leaf and the
//! non-ruleset statements at that leaf. Resolving a chain composes its
//! selectors innermost-first: an `&` head splices the ancestors in at its
//! position (fusing its tail onto the last ancestor sequence); otherwise a
//! descendant combinator joins them.
//!
//! The solver must have run: a surviving variable definition here is a
//! pass-ordering bug, not a user error.

use itertools::iproduct;
use nesta_shared::errors::{CssError, CssResult};

use crate::node::{
    Combinator, HeadSelector, ImportItem, RuleSet, Selector, SelectorPart, SimpleSelectorSequence,
    Statement, Stylesheet,
};

struct RulesetChain {
    /// One entry per output selector: the ruleset selectors along the path
    selector_seqs: Vec<Vec<Selector>>,
    statements: Vec<Statement>,
}

impl RulesetChain {
    fn new(selectors: &[Selector], statements: Vec<Statement>) -> Self {
        Self {
            selector_seqs: selectors.iter().map(|s| vec![s.clone()]).collect(),
            statements,
        }
    }

    /// Prepends a parent selector group; a group of `n` selectors expands a
    /// chain carrying `k` sequences into `n * k`.
    fn prepend_selectors(&mut self, selectors: &[Selector]) {
        match selectors {
            [] => {}
            [single] => {
                for seq in &mut self.selector_seqs {
                    seq.insert(0, single.clone());
                }
            }
            _ => {
                let expanded: Vec<Vec<Selector>> =
                    iproduct!(self.selector_seqs.iter(), selectors.iter())
                        .map(|(seq, selector)| {
                            let mut new_seq = Vec::with_capacity(seq.len() + 1);
                            new_seq.push(selector.clone());
                            new_seq.extend(seq.iter().cloned());
                            new_seq
                        })
                        .collect();
                self.selector_seqs = expanded;
            }
        }
    }

    fn resolve_selectors(&self) -> Vec<Selector> {
        self.selector_seqs
            .iter()
            .map(|seq| {
                let mut ancestors: Vec<SelectorPart> = Vec::new();
                for selector in seq {
                    ancestors = resolve_selector(ancestors, selector);
                }
                Selector::from_parts(ancestors)
            })
            .collect()
    }
}

/// Combines the accumulated ancestor parts with one more selector
fn resolve_selector(mut ancestors: Vec<SelectorPart>, selector: &Selector) -> Vec<SelectorPart> {
    if ancestors.is_empty() {
        return selector.parts.clone();
    }

    let ancestor_pos = selector.parts.iter().position(|part| {
        matches!(
            part,
            SelectorPart::Sequence(SimpleSelectorSequence {
                head: Some(HeadSelector::Ancestor(_)),
                ..
            })
        )
    });

    let Some(pos) = ancestor_pos else {
        ancestors.push(SelectorPart::Combinator(Combinator::Descendant));
        ancestors.extend(selector.parts.iter().cloned());
        return ancestors;
    };

    // splice the ancestors in at the `&` position; a non-empty tail on the
    // `&` sequence fuses onto the last ancestor sequence
    let mut new_parts = selector.parts.clone();
    if let SelectorPart::Sequence(amp_seq) = &new_parts[pos] {
        if !amp_seq.tail.is_empty() {
            if let Some(SelectorPart::Sequence(last)) = ancestors.last_mut() {
                last.tail.extend(amp_seq.tail.iter().cloned());
            }
        }
    }
    new_parts.splice(pos..=pos, ancestors);
    new_parts
}

/// Flattens every ruleset in the stylesheet, inlined imports included
pub fn flatten_stylesheet(sheet: &mut Stylesheet) -> CssResult<()> {
    flatten_imports(&mut sheet.imports)?;
    flatten_statements(&mut sheet.statements)
}

fn flatten_imports(imports: &mut Vec<ImportItem>) -> CssResult<()> {
    for item in imports {
        if let ImportItem::Inlined(imported) = item {
            flatten_imports(&mut imported.imports)?;
            flatten_statements(&mut imported.statements)?;
        }
    }
    Ok(())
}

fn flatten_statements(statements: &mut Vec<Statement>) -> CssResult<()> {
    let old = std::mem::take(statements);
    for stmt in old {
        match stmt {
            Statement::RuleSet(ruleset) => {
                for chain in flatten_ruleset(ruleset)? {
                    let selectors = chain.resolve_selectors();
                    statements.push(Statement::RuleSet(RuleSet::new(selectors, chain.statements)));
                }
            }
            Statement::VarDef(_) => {
                return Err(CssError::Runtime(
                    "cannot flatten rulesets containing variable definitions".to_string(),
                ));
            }
            other => statements.push(other),
        }
    }
    Ok(())
}

/// Splits a ruleset into chains, in source order: the ruleset's own chain
/// first, then the chains of its nested rulesets with this ruleset's
/// selector group prepended.
fn flatten_ruleset(ruleset: RuleSet) -> CssResult<Vec<RulesetChain>> {
    let mut child_rulesets = Vec::new();
    let mut child_statements = Vec::new();

    for stmt in ruleset.statements {
        match stmt {
            Statement::RuleSet(nested) => child_rulesets.push(nested),
            Statement::VarDef(_) => {
                return Err(CssError::Runtime(
                    "cannot flatten rulesets containing variable definitions".to_string(),
                ));
            }
            other => child_statements.push(other),
        }
    }

    let mut chains = Vec::new();
    for nested in child_rulesets {
        chains.extend(flatten_ruleset(nested)?);
    }
    for chain in &mut chains {
        chain.prepend_selectors(&ruleset.selectors);
    }
    chains.insert(0, RulesetChain::new(&ruleset.selectors, child_statements));

    Ok(chains)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::FunctionRegistry;
    use crate::solver::Solver;
    use crate::Ncss;

    fn parse(source: &str) -> Stylesheet {
        Ncss::parse_str(source, "test.css").unwrap()
    }

    fn solve_and_flatten(source: &str) -> Stylesheet {
        let mut sheet = parse(source);
        let registry = FunctionRegistry::with_builtins();
        Solver::new(&registry).solve_stylesheet(&mut sheet).unwrap();
        flatten_stylesheet(&mut sheet).unwrap();
        sheet
    }

    fn ruleset(sheet: &Stylesheet, index: usize) -> &RuleSet {
        match &sheet.statements[index] {
            Statement::RuleSet(rs) => rs,
            other => panic!("expected ruleset, got {other:?}"),
        }
    }

    fn no_nested_rulesets(statements: &[Statement]) -> bool {
        statements.iter().all(|stmt| match stmt {
            Statement::RuleSet(rs) => rs
                .statements
                .iter()
                .all(|s| !matches!(s, Statement::RuleSet(_) | Statement::VarDef(_))),
            _ => true,
        })
    }

    #[test]
    fn nested_ruleset_becomes_sibling() {
        let sheet = solve_and_flatten("outer { inner { rule: value; } }");

        assert_eq!(sheet.statements.len(), 2);
        assert!(no_nested_rulesets(&sheet.statements));

        let outer = ruleset(&sheet, 0);
        assert!(outer.statements.is_empty());
        assert_eq!(outer.selectors.len(), 1);
        assert_eq!(outer.selectors[0].parts.len(), 1);

        let inner = ruleset(&sheet, 1);
        assert_eq!(inner.statements.len(), 1);
        // outer <descendant> inner
        assert_eq!(inner.selectors[0].parts.len(), 3);
        assert!(matches!(
            inner.selectors[0].parts[1],
            SelectorPart::Combinator(Combinator::Descendant)
        ));
    }

    #[test]
    fn declarations_stay_with_their_ruleset() {
        let sheet = solve_and_flatten("a { p: 1; b { q: 2; } r: 3; }");

        let a = ruleset(&sheet, 0);
        assert_eq!(a.statements.len(), 2);
        let ab = ruleset(&sheet, 1);
        assert_eq!(ab.statements.len(), 1);
    }

    #[test]
    fn selector_groups_multiply() {
        let sheet = solve_and_flatten("a, b { c, d {} }");

        assert_eq!(sheet.statements.len(), 2);
        let nested = ruleset(&sheet, 1);
        // 2 parents x 2 children
        assert_eq!(nested.selectors.len(), 4);
    }

    #[test]
    fn ancestor_reference_fuses_tails() {
        let sheet = solve_and_flatten("a { &.b:c {} }");

        assert_eq!(sheet.statements.len(), 2);
        let fused = ruleset(&sheet, 1);
        assert_eq!(fused.selectors.len(), 1);
        // a single fused sequence: a.b:c
        assert_eq!(fused.selectors[0].parts.len(), 1);
        let SelectorPart::Sequence(seq) = &fused.selectors[0].parts[0] else {
            panic!("expected sequence");
        };
        assert!(matches!(seq.head, Some(HeadSelector::Type(_))));
        assert_eq!(seq.tail.len(), 2);
    }

    #[test]
    fn ancestor_reference_in_the_middle() {
        let sheet = solve_and_flatten("a { b & {} }");

        let resolved = ruleset(&sheet, 1);
        // b <descendant> a
        assert_eq!(resolved.selectors[0].parts.len(), 3);
        let SelectorPart::Sequence(first) = &resolved.selectors[0].parts[0] else {
            panic!("expected sequence");
        };
        let Some(HeadSelector::Type(t)) = &first.head else {
            panic!("expected type selector");
        };
        assert_eq!(t.name, "b");
    }

    #[test]
    fn no_ancestor_heads_survive() {
        let sheet = solve_and_flatten("a { & {} &.x {} b & b {} c { & {} } }");
        for stmt in &sheet.statements {
            if let Statement::RuleSet(rs) = stmt {
                for selector in &rs.selectors {
                    assert!(!selector.has_ancestor_reference());
                }
            }
        }
    }

    #[test]
    fn flatten_with_vardefs_is_a_runtime_error() {
        let mut sheet = parse("a { $x: 1; }");
        let err = flatten_stylesheet(&mut sheet).unwrap_err();
        assert!(matches!(err, CssError::Runtime(_)));
    }

    #[test]
    fn flatten_after_solve_never_errors() {
        for source in [
            "a { $x: 1; p: $x; b { q: $x; } }",
            "$y: 2; a { b { c { p: $y; } } }",
        ] {
            solve_and_flatten(source);
        }
    }

    #[test]
    fn flattener_is_idempotent() {
        let mut sheet = parse("a { p: 1; b { q: 2; c, d { r: 3; } } }");
        let registry = FunctionRegistry::with_builtins();
        Solver::new(&registry).solve_stylesheet(&mut sheet).unwrap();
        flatten_stylesheet(&mut sheet).unwrap();
        let once = sheet.clone();
        flatten_stylesheet(&mut sheet).unwrap();
        assert_eq!(once, sheet);
    }

    #[test]
    fn deep_nesting_emits_in_source_order() {
        let sheet = solve_and_flatten("a { b { c {} } d {} }");
        let selector_texts: Vec<usize> = sheet
            .statements
            .iter()
            .map(|stmt| match stmt {
                Statement::RuleSet(rs) => rs.selectors[0].parts.len(),
                other => panic!("expected ruleset, got {other:?}"),
            })
            .collect();
        // a; a b; a b c; a d
        assert_eq!(selector_texts, vec![1, 3, 5, 3]);
    }
}

