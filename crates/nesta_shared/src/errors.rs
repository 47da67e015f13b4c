use std::fmt;

use thiserror::Error;

use crate::byte_stream::Location;

/// A tokenization or parse failure, carrying the source position and the
/// offending token so the reporter can print a precise diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub filename: String,
    pub location: Location,
    /// Token kind name, e.g. `IDENT`
    pub token_kind: String,
    /// Verbatim token text
    pub token_value: String,
}

impl SyntaxError {
    #[must_use]
    pub fn new(
        message: &str,
        filename: &str,
        location: Location,
        token_kind: &str,
        token_value: &str,
    ) -> Self {
        Self {
            message: message.to_string(),
            filename: filename.to_string(),
            location,
            token_kind: token_kind.to_string(),
            token_value: token_value.to_string(),
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, line {}, col {}) (token {}: {:?})",
            self.message,
            self.filename,
            self.location.line,
            self.location.column,
            self.token_kind,
            self.token_value
        )
    }
}

impl std::error::Error for SyntaxError {}

/// All error kinds a compile can surface. Each pass reports the first error
/// it encounters; there is no recovery within a pass.
#[derive(Debug, Error)]
pub enum CssError {
    #[error("{0}")]
    Syntax(#[from] SyntaxError),

    #[error("unable to import stylesheet, file not found: '{0}'")]
    ImportNotFound(String),

    #[error("stylesheet directly or indirectly imported itself: '{0}'")]
    CircularImport(String),

    #[error("unknown encoding: '{0}'")]
    EncodingNotFound(String),

    #[error("type error: {message} ({location})")]
    Type { message: String, location: Location },

    #[error("undefined variable '${name}' ({location})")]
    VarName { name: String, location: Location },

    #[error("invalid function argument: {message} ({location})")]
    Value { message: String, location: Location },

    #[error("no function '{name}' taking {arity} argument(s)")]
    FunctionNotFound { name: String, arity: usize },

    #[error("runtime error: {0}")]
    Runtime(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type CssResult<T> = Result<T, CssError>;
