//! Value leaves of the expression tree.
//!
//! Numeric leaves keep their lexical text so emission preserves the source
//! spelling; equality compares the parsed values. Conversion to and from the
//! value algebra happens through `to_value`/`from_value`.

use nesta_shared::byte_stream::Location;

use crate::colors::{Color, ColorFormat};
use crate::escape;
use crate::values::{Dimension, Value};

/// Removes trailing zeros after the decimal point, and the point itself when
/// nothing follows it.
#[must_use]
pub(crate) fn strip_trailing_zeros(s: &str) -> String {
    if !s.contains('.') {
        return s.to_string();
    }
    let s = s.trim_end_matches('0');
    let s = s.strip_suffix('.').unwrap_or(s);
    if s.is_empty() {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn format_scalar(v: f64, precision: usize) -> String {
    strip_trailing_zeros(&format!("{v:.precision$}"))
}

#[derive(Clone, Debug)]
pub enum ValueNode {
    Number(NumberNode),
    Percentage(PercentageNode),
    Dimension(DimensionNode),
    Str(CssString),
    Uri(UriNode),
    HexColor(HexColorNode),
    RgbColor(RgbColorNode),
    HslColor(HslColorNode),
}

impl ValueNode {
    #[must_use]
    pub fn location(&self) -> Location {
        match self {
            ValueNode::Number(n) => n.location,
            ValueNode::Percentage(n) => n.location,
            ValueNode::Dimension(n) => n.location,
            ValueNode::Str(n) => n.location,
            ValueNode::Uri(n) => n.location,
            ValueNode::HexColor(n) => n.location,
            ValueNode::RgbColor(n) => n.location,
            ValueNode::HslColor(n) => n.location,
        }
    }

    /// The algebra value this leaf denotes, when it denotes one. Strings,
    /// URIs, and identifiers do not take part in arithmetic.
    #[must_use]
    pub fn to_value(&self) -> Option<Value> {
        match self {
            ValueNode::Number(n) => Some(Value::Number(n.to_value())),
            ValueNode::Percentage(n) => Some(Value::Percentage(n.to_value())),
            ValueNode::Dimension(n) => Some(Value::Dimension(n.to_value())),
            ValueNode::HexColor(n) => Some(Value::Color(n.to_value())),
            ValueNode::RgbColor(n) => Some(Value::Color(n.color)),
            ValueNode::HslColor(n) => Some(Value::Color(n.color)),
            ValueNode::Str(_) | ValueNode::Uri(_) => None,
        }
    }

    /// Re-encodes an algebra value as a leaf. The value must not be negative;
    /// the solver wraps negatives in a unary minus first.
    #[must_use]
    pub fn from_value(value: &Value, location: Location) -> ValueNode {
        debug_assert!(!value.is_negative());
        match value {
            Value::Number(n) => ValueNode::Number(NumberNode::from_value(*n, location)),
            Value::Percentage(p) => ValueNode::Percentage(PercentageNode::from_value(*p, location)),
            Value::Dimension(d) => ValueNode::Dimension(DimensionNode::from_value(d, location)),
            Value::Color(c) => match c.format {
                ColorFormat::Hex => ValueNode::HexColor(HexColorNode::from_color(*c, location)),
                ColorFormat::Rgb => ValueNode::RgbColor(RgbColorNode::new(*c, location)),
                ColorFormat::Hsl => ValueNode::HslColor(HslColorNode::new(*c, location)),
            },
        }
    }
}

impl PartialEq for ValueNode {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ValueNode::Number(a), ValueNode::Number(b)) => a == b,
            (ValueNode::Percentage(a), ValueNode::Percentage(b)) => a == b,
            (ValueNode::Dimension(a), ValueNode::Dimension(b)) => a == b,
            (ValueNode::Str(a), ValueNode::Str(b)) => a == b,
            (ValueNode::Uri(a), ValueNode::Uri(b)) => a == b,
            (ValueNode::HexColor(a), ValueNode::HexColor(b)) => a == b,
            (ValueNode::RgbColor(a), ValueNode::RgbColor(b)) => a == b,
            (ValueNode::HslColor(a), ValueNode::HslColor(b)) => a == b,
            _ => false,
        }
    }
}

/// A bare number, stored as written
#[derive(Clone, Debug)]
pub struct NumberNode {
    pub number: String,
    pub location: Location,
}

impl NumberNode {
    const PRECISION: usize = 3;

    #[must_use]
    pub fn from_raw(number: &str, location: Location) -> Self {
        Self {
            number: number.to_string(),
            location,
        }
    }

    #[must_use]
    pub fn from_value(value: f64, location: Location) -> Self {
        Self {
            number: format_scalar(value, Self::PRECISION),
            location,
        }
    }

    #[must_use]
    pub fn to_value(&self) -> f64 {
        self.number.parse().unwrap_or(0.0)
    }
}

impl PartialEq for NumberNode {
    fn eq(&self, other: &Self) -> bool {
        // string comparison would fail on e.g. 7 == 7.0
        self.to_value() == other.to_value()
    }
}

/// A percentage, stored as its face-value text without the `%`
#[derive(Clone, Debug)]
pub struct PercentageNode {
    pub pct: String,
    pub location: Location,
}

impl PercentageNode {
    const PRECISION: usize = 1;

    #[must_use]
    pub fn from_raw(pct: &str, location: Location) -> Self {
        Self {
            pct: pct.to_string(),
            location,
        }
    }

    #[must_use]
    pub fn from_value(value: f64, location: Location) -> Self {
        Self {
            pct: format_scalar(value, Self::PRECISION),
            location,
        }
    }

    #[must_use]
    pub fn to_value(&self) -> f64 {
        self.pct.parse().unwrap_or(0.0)
    }
}

impl PartialEq for PercentageNode {
    fn eq(&self, other: &Self) -> bool {
        self.to_value() == other.to_value()
    }
}

/// A number with a unit, both stored as written (the unit is unescaped)
#[derive(Clone, Debug)]
pub struct DimensionNode {
    pub number: String,
    pub unit: String,
    pub location: Location,
}

impl DimensionNode {
    const PRECISION: usize = 3;

    #[must_use]
    pub fn from_raw(number: &str, unit: &str, location: Location) -> Self {
        Self {
            number: number.to_string(),
            unit: escape::unescape_identifier(unit),
            location,
        }
    }

    #[must_use]
    pub fn from_value(value: &Dimension, location: Location) -> Self {
        Self {
            number: format_scalar(value.n, Self::PRECISION),
            unit: value.unit.clone(),
            location,
        }
    }

    #[must_use]
    pub fn to_value(&self) -> Dimension {
        Dimension::new(self.number.parse().unwrap_or(0.0), &self.unit)
    }
}

impl PartialEq for DimensionNode {
    fn eq(&self, other: &Self) -> bool {
        // compares canonical values when the units are convertible
        self.to_value() == other.to_value()
    }
}

/// A quoted string, stored unescaped and unquoted
#[derive(Clone, Debug)]
pub struct CssString {
    pub value: String,
    pub location: Location,
}

impl CssString {
    /// Builds from the verbatim token text including its quotes
    #[must_use]
    pub fn from_quoted(raw: &str, location: Location) -> Self {
        Self {
            value: escape::unquote_string(raw),
            location,
        }
    }

    #[must_use]
    pub fn new(value: &str, location: Location) -> Self {
        Self {
            value: value.to_string(),
            location,
        }
    }
}

impl PartialEq for CssString {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// A `url(...)` reference, stored as the unescaped target
#[derive(Clone, Debug)]
pub struct UriNode {
    pub uri: String,
    pub location: Location,
}

impl UriNode {
    /// Parses the verbatim `url(...)` token text. The content may be quoted
    /// or bare; surrounding whitespace inside the parentheses is ignored.
    #[must_use]
    pub fn from_raw(raw: &str, location: Location) -> Self {
        let open = raw.find('(').map_or(0, |i| i + 1);
        let close = raw.rfind(')').unwrap_or(raw.len());
        let inner = raw[open..close].trim_matches([' ', '\t', '\r', '\n', '\x0c']);
        let uri = if inner.starts_with('"') || inner.starts_with('\'') {
            escape::unquote_string(inner)
        } else {
            escape::unescape_name(inner)
        };
        Self { uri, location }
    }
}

impl PartialEq for UriNode {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
    }
}

/// A hex color literal, stored as its 3 or 6 hex digits without the `#`
#[derive(Clone, Debug)]
pub struct HexColorNode {
    pub hex: String,
    pub location: Location,
}

impl HexColorNode {
    #[must_use]
    pub fn from_raw(hex: &str, location: Location) -> Self {
        debug_assert!(hex.len() == 3 || hex.len() == 6);
        Self {
            hex: hex.to_string(),
            location,
        }
    }

    #[must_use]
    pub fn from_color(color: Color, location: Location) -> Self {
        Self {
            hex: color.hex_string(),
            location,
        }
    }

    /// Lowercase (r, g, b) digit pairs with the short form expanded
    #[must_use]
    pub fn normalized_hex(&self) -> (String, String, String) {
        let h = self.hex.to_ascii_lowercase();
        if h.len() == 6 {
            (h[0..2].to_string(), h[2..4].to_string(), h[4..6].to_string())
        } else {
            let expand = |i: usize| h[i..=i].repeat(2);
            (expand(0), expand(1), expand(2))
        }
    }

    #[must_use]
    pub fn to_value(&self) -> Color {
        let (r, g, b) = self.normalized_hex();
        let parse = |s: &str| f64::from(u8::from_str_radix(s, 16).unwrap_or(0));
        Color::from_rgb(parse(&r), parse(&g), parse(&b), ColorFormat::Hex)
    }
}

impl PartialEq for HexColorNode {
    fn eq(&self, other: &Self) -> bool {
        self.normalized_hex() == other.normalized_hex()
    }
}

/// A color produced by folding an `rgb(...)` call
#[derive(Clone, Debug)]
pub struct RgbColorNode {
    pub color: Color,
    pub location: Location,
}

impl RgbColorNode {
    #[must_use]
    pub fn new(color: Color, location: Location) -> Self {
        Self { color, location }
    }
}

impl PartialEq for RgbColorNode {
    fn eq(&self, other: &Self) -> bool {
        self.color == other.color
    }
}

/// A color produced by folding an `hsl(...)` call
#[derive(Clone, Debug)]
pub struct HslColorNode {
    pub color: Color,
    pub location: Location,
}

impl HslColorNode {
    #[must_use]
    pub fn new(color: Color, location: Location) -> Self {
        Self { color, location }
    }
}

impl PartialEq for HslColorNode {
    fn eq(&self, other: &Self) -> bool {
        self.color == other.color
    }
}
