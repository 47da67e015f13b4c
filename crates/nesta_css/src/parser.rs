//! Parser plumbing shared by the grammar rule modules.

use nesta_shared::errors::{CssError, SyntaxError};

use crate::tokenizer::{Token, TokenType};
use crate::Ncss;

mod declaration;
mod expression;
mod ruleset;
mod selector;
mod stylesheet;

impl Ncss<'_> {
    /// Looks at the token `offset` positions ahead without consuming it
    pub(crate) fn peek(&mut self, offset: usize) -> Token {
        self.tokenizer.lookahead(offset)
    }

    /// Consumes and returns the next token
    pub(crate) fn next_token(&mut self) -> Token {
        self.tokenizer.consume()
    }

    /// Consumes the next token when it equals the given kind. Only usable
    /// for kinds without a payload.
    pub(crate) fn try_simple(&mut self, token_type: &TokenType) -> bool {
        if self.peek(0).token_type == *token_type {
            self.next_token();
            return true;
        }
        false
    }

    /// Consumes a run of whitespace tokens; true when any was consumed
    pub(crate) fn skip_ws(&mut self) -> bool {
        let mut skipped = false;
        while self.peek(0).is_whitespace() {
            self.next_token();
            skipped = true;
        }
        skipped
    }

    /// Cursor position for a later [`Ncss::reset`]; speculative rules mark
    /// before consuming and reset on the not-accepted path
    pub(crate) fn mark(&self) -> usize {
        self.tokenizer.tell()
    }

    pub(crate) fn reset(&mut self, mark: usize) {
        self.tokenizer.seek(mark);
    }

    /// A syntax error at the next unconsumed token
    pub(crate) fn syntax_error(&mut self, message: &str) -> CssError {
        let token = self.peek(0);
        self.syntax_error_at(message, &token)
    }

    pub(crate) fn syntax_error_at(&mut self, message: &str, token: &Token) -> CssError {
        CssError::Syntax(SyntaxError::new(
            message,
            &self.filename,
            token.location,
            token.token_type.name(),
            &token.to_string(),
        ))
    }

    pub(crate) fn is_nested_scope(&self) -> bool {
        self.nested_level > 0
    }

    pub(crate) fn enter_nested_scope(&mut self) {
        self.nested_level += 1;
    }

    pub(crate) fn exit_nested_scope(&mut self) {
        self.nested_level -= 1;
    }
}
