//! The value algebra the solver computes with.
//!
//! Only the CSS-meaningful operand combinations are defined; everything else
//! is a type error. Dimension arithmetic converts through the canonical base
//! unit of the operands' shared unit set and converts back to the left-hand
//! side's unit.

use cow_utils::CowUtils;
use nesta_shared::byte_stream::Location;
use nesta_shared::errors::{CssError, CssResult};

use crate::colors::Color;
use crate::units;

/// Arithmetic operators the algebra understands
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumericOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl NumericOp {
    fn verb(self) -> &'static str {
        match self {
            NumericOp::Add => "add",
            NumericOp::Sub => "subtract",
            NumericOp::Mul => "multiply",
            NumericOp::Div => "divide",
        }
    }

    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            NumericOp::Add => a + b,
            NumericOp::Sub => a - b,
            NumericOp::Mul => a * b,
            NumericOp::Div => a / b,
        }
    }
}

/// A number with a unit. The unit is stored lowercase and is never empty.
#[derive(Clone, Debug)]
pub struct Dimension {
    pub n: f64,
    pub unit: String,
}

impl Dimension {
    #[must_use]
    pub fn new(n: f64, unit: &str) -> Self {
        debug_assert!(!unit.is_empty());
        Self {
            n,
            unit: unit.cow_to_ascii_lowercase().into_owned(),
        }
    }

    /// Converts to another unit in the same unit set
    #[must_use]
    pub fn convert_to(&self, unit: &str) -> Option<Dimension> {
        let unit = unit.cow_to_ascii_lowercase().into_owned();
        let set = units::unit_set(&self.unit)?;
        let canonical = set.to_canonical(&self.unit, self.n)?;
        let n = set.from_canonical(&unit, canonical)?;
        Some(Dimension { n, unit })
    }
}

impl PartialEq for Dimension {
    fn eq(&self, other: &Self) -> bool {
        if self.unit == other.unit {
            return self.n == other.n;
        }
        match other.convert_to(&self.unit) {
            Some(converted) => self.n == converted.n,
            None => false,
        }
    }
}

/// A computed value: the leaves of the expression tree after folding
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    /// Face value: `Percentage(25.0)` is "25%"
    Percentage(f64),
    Dimension(Dimension),
    Color(Color),
}

impl Value {
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Percentage(_) => "percentage",
            Value::Dimension(_) => "dimension",
            Value::Color(_) => "color",
        }
    }

    #[must_use]
    pub fn is_negative(&self) -> bool {
        match self {
            Value::Number(n) | Value::Percentage(n) => *n < 0.0,
            Value::Dimension(d) => d.n < 0.0,
            Value::Color(_) => false,
        }
    }

    /// Unary minus
    pub fn negate(self, location: Location) -> CssResult<Value> {
        match self {
            Value::Number(n) => Ok(Value::Number(-n)),
            Value::Percentage(p) => Ok(Value::Percentage(-p)),
            Value::Dimension(d) => Ok(Value::Dimension(Dimension { n: -d.n, unit: d.unit })),
            Value::Color(_) => Err(CssError::Type {
                message: "bad operand type for unary '-': color".to_string(),
                location,
            }),
        }
    }

    /// Unary plus is the identity on anything negatable
    pub fn unary_plus(self, location: Location) -> CssResult<Value> {
        match self {
            Value::Color(_) => Err(CssError::Type {
                message: "bad operand type for unary '+': color".to_string(),
                location,
            }),
            other => Ok(other),
        }
    }
}

fn dimension_pair_op(
    op: NumericOp,
    lhs: &Dimension,
    rhs: &Dimension,
    location: Location,
) -> CssResult<Value> {
    if lhs.unit == rhs.unit {
        return Ok(Value::Dimension(Dimension {
            n: op.apply(lhs.n, rhs.n),
            unit: lhs.unit.clone(),
        }));
    }

    let incompatible = || CssError::Type {
        message: format!(
            "incompatible units, cannot {} quantities with '{}' and '{}' units",
            op.verb(),
            lhs.unit,
            rhs.unit
        ),
        location,
    };

    let set = units::unit_set(&lhs.unit).ok_or_else(incompatible)?;
    if !set.contains(&rhs.unit) {
        return Err(incompatible());
    }
    let a = set.to_canonical(&lhs.unit, lhs.n).ok_or_else(incompatible)?;
    let b = set.to_canonical(&rhs.unit, rhs.n).ok_or_else(incompatible)?;
    let n = set
        .from_canonical(&lhs.unit, op.apply(a, b))
        .ok_or_else(incompatible)?;
    Ok(Value::Dimension(Dimension {
        n,
        unit: lhs.unit.clone(),
    }))
}

/// Applies a binary arithmetic operator to two values, per the operator
/// table. Combinations outside the table are type errors.
pub fn apply(op: NumericOp, lhs: &Value, rhs: &Value, location: Location) -> CssResult<Value> {
    use NumericOp::{Add, Div, Mul, Sub};
    use Value::{Dimension as Dim, Number, Percentage};

    match (op, lhs, rhs) {
        (_, Number(a), Number(b)) => Ok(Number(op.apply(*a, *b))),

        (Add | Sub, Percentage(a), Percentage(b))
        | (Add | Sub, Number(a), Percentage(b))
        | (Add | Sub, Percentage(a), Number(b)) => Ok(Percentage(op.apply(*a, *b))),

        (Add | Sub, Dim(a), Dim(b)) => dimension_pair_op(op, a, b, location),

        (Add | Sub, Dim(a), Number(b)) => Ok(Dim(Dimension {
            n: op.apply(a.n, *b),
            unit: a.unit.clone(),
        })),
        (Add | Sub, Number(a), Dim(b)) => Ok(Dim(Dimension {
            n: op.apply(*a, b.n),
            unit: b.unit.clone(),
        })),

        (Mul | Div, Dim(a), Number(b)) => Ok(Dim(Dimension {
            n: op.apply(a.n, *b),
            unit: a.unit.clone(),
        })),
        (Mul | Div, Number(a), Dim(b)) => Ok(Dim(Dimension {
            n: op.apply(*a, b.n),
            unit: b.unit.clone(),
        })),

        _ => Err(CssError::Type {
            message: format!(
                "cannot {} {} and {}",
                op.verb(),
                lhs.type_name(),
                rhs.type_name()
            ),
            location,
        }),
    }
}
