//! The abstract syntax tree.
//!
//! Nodes are grouped by family: top-level structure and statements here,
//! selectors, expressions, and value leaves in their own modules. Every node
//! carries a source location; equality is structural and ignores locations,
//! and identifier comparisons are case-insensitive per CSS.

pub mod expr;
pub mod selector;
pub mod value;

pub use expr::*;
pub use selector::*;
pub use value::*;

use nesta_shared::byte_stream::Location;

use crate::escape;

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Stylesheet {
    pub charset: Option<Charset>,
    pub imports: Vec<ImportItem>,
    pub statements: Vec<Statement>,
}

/// The spliced-in content of an imported file: a stylesheet minus the charset
#[derive(Clone, Debug)]
pub struct ImportedStylesheet {
    pub imports: Vec<ImportItem>,
    pub statements: Vec<Statement>,
    pub location: Location,
}

impl PartialEq for ImportedStylesheet {
    fn eq(&self, other: &Self) -> bool {
        self.imports == other.imports && self.statements == other.statements
    }
}

/// An entry in a stylesheet's import list: the `@import` rule as parsed, or
/// the imported content after the inliner replaced it.
#[derive(Clone, Debug, PartialEq)]
pub enum ImportItem {
    Plain(Import),
    Inlined(ImportedStylesheet),
}

#[derive(Clone, Debug)]
pub struct Import {
    pub uri: ImportUri,
    pub location: Location,
}

impl PartialEq for Import {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ImportUri {
    /// A quoted string target; the only form the inliner resolves
    Str(CssString),
    /// A `url(...)` target; passed through untouched
    Uri(UriNode),
}

/// The `@charset` rule, already unescaped
#[derive(Clone, Debug)]
pub struct Charset {
    pub name: String,
    pub location: Location,
}

impl Charset {
    /// Builds from the verbatim string token (with quotes)
    #[must_use]
    pub fn from_quoted(raw: &str, location: Location) -> Self {
        Self {
            name: escape::unquote_string(raw),
            location,
        }
    }
}

impl PartialEq for Charset {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    RuleSet(RuleSet),
    Declaration(Declaration),
    /// Exists only before the solver pass
    VarDef(VarDef),
    /// Opaque at-rule carrier (`@media`, `@page`, unknown at-keywords)
    AtRule(AtRule),
}

#[derive(Clone, Debug)]
pub struct RuleSet {
    pub selectors: Vec<Selector>,
    pub statements: Vec<Statement>,
    pub location: Location,
}

impl RuleSet {
    #[must_use]
    pub fn new(selectors: Vec<Selector>, statements: Vec<Statement>) -> Self {
        debug_assert!(!selectors.is_empty());
        let location = selectors.first().map_or_else(Location::default, |s| s.location);
        Self {
            selectors,
            statements,
            location,
        }
    }
}

impl PartialEq for RuleSet {
    fn eq(&self, other: &Self) -> bool {
        self.selectors == other.selectors && self.statements == other.statements
    }
}

#[derive(Clone, Debug)]
pub struct Declaration {
    pub property: Property,
    pub expr: Expr,
    pub important: bool,
    pub location: Location,
}

impl Declaration {
    #[must_use]
    pub fn new(property: Property, expr: Expr, important: bool) -> Self {
        let location = property.location;
        Self {
            property,
            expr,
            important,
            location,
        }
    }
}

impl PartialEq for Declaration {
    fn eq(&self, other: &Self) -> bool {
        self.property == other.property
            && self.expr == other.expr
            && self.important == other.important
    }
}

/// A `$name: expr` binding; stripped from the tree by the solver
#[derive(Clone, Debug)]
pub struct VarDef {
    pub name: String,
    pub expr: Expr,
    pub location: Location,
}

impl VarDef {
    /// Builds from the token payload (already stripped of the `$` marker)
    #[must_use]
    pub fn from_raw(raw_name: &str, expr: Expr, location: Location) -> Self {
        Self {
            name: escape::unescape_identifier(raw_name),
            expr,
            location,
        }
    }
}

impl PartialEq for VarDef {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name) && self.expr == other.expr
    }
}

#[derive(Clone, Debug)]
pub struct Property {
    pub name: String,
    pub location: Location,
}

impl Property {
    #[must_use]
    pub fn from_raw(raw: &str, location: Location) -> Self {
        Self {
            name: escape::unescape_identifier(raw),
            location,
        }
    }
}

impl PartialEq for Property {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }
}

/// An at-rule the compiler passes through without interpretation. The text
/// holds the rule verbatim, including the at-keyword and its block.
#[derive(Clone, Debug)]
pub struct AtRule {
    pub name: String,
    pub text: String,
    pub location: Location,
}

impl AtRule {
    #[must_use]
    pub fn new(name: &str, text: &str, location: Location) -> Self {
        Self {
            name: name.to_string(),
            text: text.to_string(),
            location,
        }
    }
}

impl PartialEq for AtRule {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name) && self.text == other.text
    }
}
