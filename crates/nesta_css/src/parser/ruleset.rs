//! Rulesets, their bodies, and variable definitions.

use nesta_shared::errors::CssResult;

use crate::node::{RuleSet, Selector, Statement, VarDef};
use crate::tokenizer::TokenType;
use crate::Ncss;

impl Ncss<'_> {
    /// `ruleset := selector_group '{' S* ruleset_body '}' S*`
    pub(crate) fn parse_ruleset(&mut self) -> CssResult<Option<RuleSet>> {
        log::trace!("parse_ruleset");

        let selectors = self.parse_selector_group()?;
        if selectors.is_empty() {
            return Ok(None);
        }

        self.skip_ws();
        if !self.try_simple(&TokenType::LBrace) {
            return Err(self.syntax_error("Expected left brace: '{'."));
        }
        self.skip_ws();

        if self.try_simple(&TokenType::RBrace) {
            self.skip_ws();
            return Ok(Some(RuleSet::new(selectors, Vec::new())));
        }

        let statements = self.parse_ruleset_body()?;

        if !self.try_simple(&TokenType::RBrace) {
            return Err(self.syntax_error("Expected right brace: '}'."));
        }
        self.skip_ws();

        Ok(Some(RuleSet::new(selectors, statements)))
    }

    /// `selector_group := selector (',' S* selector)*`
    fn parse_selector_group(&mut self) -> CssResult<Vec<Selector>> {
        let Some(selector) = self.parse_selector()? else {
            return Ok(Vec::new());
        };
        let mut selectors = vec![selector];

        while self.try_simple(&TokenType::Comma) {
            self.skip_ws();
            let Some(selector) = self.parse_selector()? else {
                return Err(self.syntax_error("Expected selector."));
            };
            selectors.push(selector);
        }

        Ok(selectors)
    }

    /// Semicolons are required after declarations and vardefs unless they end
    /// the body; after a nested ruleset they are optional.
    fn parse_ruleset_body(&mut self) -> CssResult<Vec<Statement>> {
        self.enter_nested_scope();
        let result = self.parse_ruleset_body_inner();
        self.exit_nested_scope();
        result
    }

    fn parse_ruleset_body_inner(&mut self) -> CssResult<Vec<Statement>> {
        let mut statements = Vec::new();

        let stmt = self.parse_inner_statement()?;
        let mut last_was_ruleset = matches!(stmt, Some(Statement::RuleSet(_)));
        if let Some(stmt) = stmt {
            statements.push(stmt);
        }

        loop {
            if !(last_was_ruleset || self.try_simple(&TokenType::Semicolon)) {
                break;
            }
            self.skip_ws();
            let stmt = self.parse_inner_statement()?;
            last_was_ruleset = matches!(stmt, Some(Statement::RuleSet(_)));
            if let Some(stmt) = stmt {
                statements.push(stmt);
            }
        }

        Ok(statements)
    }

    /// `inner_statement := declaration | ruleset | vardef`
    ///
    /// A declaration and a ruleset can both begin `IDENT ':' ...`; the
    /// declaration is tried first and rewinds on failure.
    fn parse_inner_statement(&mut self) -> CssResult<Option<Statement>> {
        if let Some(declaration) = self.parse_declaration()? {
            return Ok(Some(Statement::Declaration(declaration)));
        }
        if let Some(ruleset) = self.parse_ruleset()? {
            return Ok(Some(Statement::RuleSet(ruleset)));
        }
        if let Some(vardef) = self.parse_vardef()? {
            return Ok(Some(Statement::VarDef(vardef)));
        }
        Ok(None)
    }

    /// `vardef := VARNAME S* ':' S* math_expr`
    pub(crate) fn parse_vardef(&mut self) -> CssResult<Option<VarDef>> {
        log::trace!("parse_vardef");

        let t = self.peek(0);
        let TokenType::VarName(raw) = t.token_type else {
            return Ok(None);
        };
        self.next_token();
        self.skip_ws();

        if !self.try_simple(&TokenType::Colon) {
            return Err(self.syntax_error("Expected ':'."));
        }
        self.skip_ws();

        let Some(expr) = self.parse_math_expr()? else {
            return Err(self.syntax_error("Expected expression."));
        };

        Ok(Some(VarDef::from_raw(&raw, expr, t.location)))
    }
}
