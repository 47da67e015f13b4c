//! Selector tree nodes.
//!
//! A selector is an alternating list that starts with a simple selector
//! sequence and continues with (combinator, sequence) pairs. The flattener
//! rewrites ancestor-reference heads (`&`) out of existence.

use nesta_shared::byte_stream::Location;

use crate::escape;
use crate::node::expr::FunctionCall;
use crate::node::expr::IdentNode;
use crate::node::value::CssString;

#[derive(Clone, Debug, PartialEq)]
pub struct Selector {
    pub parts: Vec<SelectorPart>,
    pub location: Location,
}

impl Selector {
    #[must_use]
    pub fn new(seq: SimpleSelectorSequence) -> Self {
        let location = seq.location;
        Self {
            parts: vec![SelectorPart::Sequence(seq)],
            location,
        }
    }

    #[must_use]
    pub fn from_parts(parts: Vec<SelectorPart>) -> Self {
        debug_assert!(!parts.is_empty());
        let location = match parts.first() {
            Some(SelectorPart::Sequence(seq)) => seq.location,
            _ => Location::default(),
        };
        Self { parts, location }
    }

    pub fn add_sequence(&mut self, combinator: Combinator, seq: SimpleSelectorSequence) {
        self.parts.push(SelectorPart::Combinator(combinator));
        self.parts.push(SelectorPart::Sequence(seq));
    }

    /// True when any sequence in this selector has an `&` head
    #[must_use]
    pub fn has_ancestor_reference(&self) -> bool {
        self.parts.iter().any(|part| {
            matches!(
                part,
                SelectorPart::Sequence(SimpleSelectorSequence {
                    head: Some(HeadSelector::Ancestor(_)),
                    ..
                })
            )
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SelectorPart {
    Sequence(SimpleSelectorSequence),
    Combinator(Combinator),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combinator {
    /// Whitespace between sequences
    Descendant,
    /// `>`
    Child,
    /// `+`
    AdjacentSibling,
    /// `~`
    GeneralSibling,
}

#[derive(Clone, Debug)]
pub struct SimpleSelectorSequence {
    pub head: Option<HeadSelector>,
    pub tail: Vec<TailSelector>,
    pub location: Location,
}

impl SimpleSelectorSequence {
    #[must_use]
    pub fn new(head: Option<HeadSelector>, tail: Vec<TailSelector>, location: Location) -> Self {
        Self { head, tail, location }
    }
}

impl PartialEq for SimpleSelectorSequence {
    fn eq(&self, other: &Self) -> bool {
        self.head == other.head && self.tail == other.tail
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum HeadSelector {
    Type(TypeSelector),
    Universal(UniversalSelector),
    /// The ancestor-reference `&`; only legal inside nested rulesets
    Ancestor(AncestorSelector),
}

#[derive(Clone, Debug)]
pub struct TypeSelector {
    pub name: String,
    pub location: Location,
}

impl TypeSelector {
    #[must_use]
    pub fn from_raw(raw: &str, location: Location) -> Self {
        Self {
            name: escape::unescape_identifier(raw),
            location,
        }
    }
}

impl PartialEq for TypeSelector {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

#[derive(Clone, Debug)]
pub struct UniversalSelector {
    pub location: Location,
}

impl PartialEq for UniversalSelector {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

#[derive(Clone, Debug)]
pub struct AncestorSelector {
    pub location: Location,
}

impl PartialEq for AncestorSelector {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TailSelector {
    Id(IdSelector),
    Class(ClassSelector),
    Attribute(AttributeSelector),
    PseudoClass(PseudoClassSelector),
    PseudoElement(PseudoElementSelector),
    Negation(NegationSelector),
}

#[derive(Clone, Debug)]
pub struct IdSelector {
    pub name: String,
    pub location: Location,
}

impl IdSelector {
    /// Builds from the hash token payload (already stripped of the `#`)
    #[must_use]
    pub fn from_raw(raw: &str, location: Location) -> Self {
        Self {
            name: escape::unescape_name(raw),
            location,
        }
    }
}

impl PartialEq for IdSelector {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

#[derive(Clone, Debug)]
pub struct ClassSelector {
    pub name: String,
    pub location: Location,
}

impl ClassSelector {
    #[must_use]
    pub fn from_raw(raw: &str, location: Location) -> Self {
        Self {
            name: escape::unescape_identifier(raw),
            location,
        }
    }
}

impl PartialEq for ClassSelector {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttrMatchOp {
    /// `=`
    Exact,
    /// `~=`
    Includes,
    /// `|=`
    DashMatch,
    /// `^=`
    Prefix,
    /// `$=`
    Suffix,
    /// `*=`
    Substring,
}

impl AttrMatchOp {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AttrMatchOp::Exact => "=",
            AttrMatchOp::Includes => "~=",
            AttrMatchOp::DashMatch => "|=",
            AttrMatchOp::Prefix => "^=",
            AttrMatchOp::Suffix => "$=",
            AttrMatchOp::Substring => "*=",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    Ident(IdentNode),
    Str(CssString),
}

#[derive(Clone, Debug)]
pub struct AttributeSelector {
    pub attr: String,
    pub op: Option<AttrMatchOp>,
    pub value: Option<AttrValue>,
    pub location: Location,
}

impl AttributeSelector {
    #[must_use]
    pub fn from_raw(
        raw_attr: &str,
        op: Option<AttrMatchOp>,
        value: Option<AttrValue>,
        location: Location,
    ) -> Self {
        debug_assert_eq!(op.is_some(), value.is_some());
        Self {
            attr: escape::unescape_identifier(raw_attr),
            op,
            value,
            location,
        }
    }
}

impl PartialEq for AttributeSelector {
    fn eq(&self, other: &Self) -> bool {
        self.attr == other.attr && self.op == other.op && self.value == other.value
    }
}

/// The body of a pseudo selector: an identifier or a functional form
#[derive(Clone, Debug, PartialEq)]
pub enum PseudoBody {
    Ident(IdentNode),
    Function(FunctionCall),
}

#[derive(Clone, Debug)]
pub struct PseudoClassSelector {
    pub body: PseudoBody,
    pub location: Location,
}

impl PseudoClassSelector {
    #[must_use]
    pub fn new(body: PseudoBody, location: Location) -> Self {
        Self { body, location }
    }
}

impl PartialEq for PseudoClassSelector {
    fn eq(&self, other: &Self) -> bool {
        self.body == other.body
    }
}

#[derive(Clone, Debug)]
pub struct PseudoElementSelector {
    pub body: PseudoBody,
    pub location: Location,
}

impl PseudoElementSelector {
    #[must_use]
    pub fn new(body: PseudoBody, location: Location) -> Self {
        Self { body, location }
    }
}

impl PartialEq for PseudoElementSelector {
    fn eq(&self, other: &Self) -> bool {
        self.body == other.body
    }
}

/// The single simple selector a `:not(...)` takes
#[derive(Clone, Debug, PartialEq)]
pub enum NegationArg {
    Type(TypeSelector),
    Universal(UniversalSelector),
    Id(IdSelector),
    Class(ClassSelector),
    Attribute(AttributeSelector),
    PseudoClass(PseudoClassSelector),
    PseudoElement(PseudoElementSelector),
}

#[derive(Clone, Debug)]
pub struct NegationSelector {
    pub arg: Box<NegationArg>,
    pub location: Location,
}

impl NegationSelector {
    #[must_use]
    pub fn new(arg: NegationArg, location: Location) -> Self {
        Self {
            arg: Box::new(arg),
            location,
        }
    }
}

impl PartialEq for NegationSelector {
    fn eq(&self, other: &Self) -> bool {
        self.arg == other.arg
    }
}
