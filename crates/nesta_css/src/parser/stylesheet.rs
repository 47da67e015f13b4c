//! Top-level grammar: stylesheet structure, `@charset`, `@import`, and the
//! opaque at-rule carrier.

use nesta_shared::errors::CssResult;

use crate::escape;
use crate::node::{AtRule, Charset, Import, ImportItem, ImportUri, Statement, Stylesheet};
use crate::node::{CssString, UriNode};
use crate::tokenizer::TokenType;
use crate::Ncss;

impl Ncss<'_> {
    /// `stylesheet := charset? (S|CDO|CDC)* import* toplevel_statement*`
    pub(crate) fn parse_stylesheet(&mut self) -> CssResult<Stylesheet> {
        log::trace!("parse_stylesheet");

        let charset = self.parse_charset()?;

        loop {
            if self.try_simple(&TokenType::Cdo) || self.try_simple(&TokenType::Cdc) {
                continue;
            }
            if !self.skip_ws() {
                break;
            }
        }

        let mut imports = Vec::new();
        while let Some(import) = self.parse_import()? {
            imports.push(ImportItem::Plain(import));
        }

        let mut statements = Vec::new();
        while !self.peek(0).is_eof() {
            match self.parse_toplevel_statement()? {
                Some(stmt) => statements.push(stmt),
                None => break,
            }
            while self.try_simple(&TokenType::Cdo) || self.try_simple(&TokenType::Cdc) {
                self.skip_ws();
            }
        }

        if !self.peek(0).is_eof() {
            return Err(self.syntax_error("Expected end-of-file."));
        }

        Ok(Stylesheet {
            charset,
            imports,
            statements,
        })
    }

    /// `charset := CHARSET_SYM STRING ';'`
    fn parse_charset(&mut self) -> CssResult<Option<Charset>> {
        let t = self.peek(0);
        if t.token_type != TokenType::CharsetSym {
            return Ok(None);
        }
        self.next_token();

        let string = self.peek(0);
        let TokenType::QuotedString(raw) = string.token_type else {
            return Err(self.syntax_error("Bad @charset rule."));
        };
        self.next_token();
        let charset = Charset::from_quoted(&raw, t.location);

        if !self.try_simple(&TokenType::Semicolon) {
            return Err(self.syntax_error("Bad @charset rule."));
        }

        Ok(Some(charset))
    }

    /// `import := IMPORT_SYM S* (STRING | URI) S* ';' S*`
    fn parse_import(&mut self) -> CssResult<Option<Import>> {
        let t = self.peek(0);
        if t.token_type != TokenType::ImportSym {
            return Ok(None);
        }
        self.next_token();
        self.skip_ws();

        let target = self.peek(0);
        let uri = match target.token_type {
            TokenType::QuotedString(raw) => {
                self.next_token();
                ImportUri::Str(CssString::from_quoted(&raw, target.location))
            }
            TokenType::Uri(raw) => {
                self.next_token();
                ImportUri::Uri(UriNode::from_raw(&raw, target.location))
            }
            _ => {
                return Err(self.syntax_error("Expected string or uri in @import statement."));
            }
        };
        self.skip_ws();

        if !self.try_simple(&TokenType::Semicolon) {
            return Err(self.syntax_error("Bad @import statement, semicolon required."));
        }
        self.skip_ws();

        Ok(Some(Import {
            uri,
            location: t.location,
        }))
    }

    /// `toplevel_statement := vardef ';' | opaque_at_rule | ruleset`
    fn parse_toplevel_statement(&mut self) -> CssResult<Option<Statement>> {
        log::trace!("parse_toplevel_statement");

        match self.peek(0).token_type {
            TokenType::VarName(_) => {
                let Some(vardef) = self.parse_vardef()? else {
                    return Err(self.syntax_error("Expected variable definition."));
                };
                if !self.try_simple(&TokenType::Semicolon) {
                    // the semicolon is only optional at end-of-file
                    let mut n = 0;
                    while self.peek(n).is_whitespace() {
                        n += 1;
                    }
                    if !self.peek(n).is_eof() {
                        return Err(
                            self.syntax_error("Variable definitions must end with a semicolon.")
                        );
                    }
                }
                self.skip_ws();
                Ok(Some(Statement::VarDef(vardef)))
            }
            TokenType::MediaSym(_) | TokenType::PageSym(_) | TokenType::AtKeyword(_) => {
                Ok(Some(self.parse_at_rule()?))
            }
            _ => Ok(self.parse_ruleset()?.map(Statement::RuleSet)),
        }
    }

    /// Captures an at-rule verbatim: the prelude plus either a terminating
    /// semicolon or a balanced `{...}` block. The rule is not interpreted.
    fn parse_at_rule(&mut self) -> CssResult<Statement> {
        log::trace!("parse_at_rule");

        let start = self.tokenizer.tell();
        let at = self.next_token();
        let name = match &at.token_type {
            TokenType::MediaSym(_) => "media".to_string(),
            TokenType::PageSym(_) => "page".to_string(),
            TokenType::AtKeyword(raw) => escape::unescape_identifier(raw),
            _ => return Err(self.syntax_error_at("Expected at-keyword.", &at)),
        };

        let mut depth = 0usize;
        loop {
            let t = self.next_token();
            match t.token_type {
                TokenType::Semicolon if depth == 0 => break,
                TokenType::LBrace => depth += 1,
                TokenType::RBrace => match depth {
                    0 => return Err(self.syntax_error_at("Unexpected '}' in at-rule.", &t)),
                    1 => break,
                    _ => depth -= 1,
                },
                TokenType::Eof => {
                    return Err(self.syntax_error("Unexpected end-of-file in at-rule."));
                }
                _ => {}
            }
        }

        let end = self.tokenizer.tell();
        let text = self.tokenizer.slice(start, end);
        self.skip_ws();

        Ok(Statement::AtRule(AtRule::new(&name, &text, at.location)))
    }
}
