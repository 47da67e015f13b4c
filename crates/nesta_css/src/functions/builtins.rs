//! The built-in color functions.

use nesta_shared::byte_stream::Location;
use nesta_shared::errors::{CssError, CssResult};

use crate::colors::{Color, ColorFormat};
use crate::values::Value;

fn rgb_component(value: &Value, location: Location) -> CssResult<f64> {
    match value {
        Value::Number(n) => Ok(*n),
        // percentages map onto the 0..255 scale
        Value::Percentage(p) => Ok(255.0 * p / 100.0),
        other => Err(CssError::Value {
            message: format!("rgb() expects numbers or percentages, got {}", other.type_name()),
            location,
        }),
    }
}

/// `rgb(r, g, b)` with each component a Number in 0..255 or a Percentage
pub(crate) fn rgb(args: &[Value], location: Location) -> CssResult<Value> {
    debug_assert_eq!(args.len(), 3);
    let r = rgb_component(&args[0], location)?;
    let g = rgb_component(&args[1], location)?;
    let b = rgb_component(&args[2], location)?;
    Ok(Value::Color(Color::from_rgb(r, g, b, ColorFormat::Rgb)))
}

/// `hsl(h, s, l)` with a Number hue (reduced modulo 360) and Percentage
/// saturation and lightness
pub(crate) fn hsl(args: &[Value], location: Location) -> CssResult<Value> {
    debug_assert_eq!(args.len(), 3);

    let Value::Number(h) = &args[0] else {
        return Err(CssError::Value {
            message: format!("hsl() expects a number hue, got {}", args[0].type_name()),
            location,
        });
    };
    let h = ((h % 360.0) + 360.0) % 360.0;

    let (Value::Percentage(s), Value::Percentage(l)) = (&args[1], &args[2]) else {
        return Err(CssError::Value {
            message: "hsl() expects percentage saturation and lightness".to_string(),
            location,
        });
    };

    Ok(Value::Color(Color::from_hsl(h, s / 100.0, l / 100.0)))
}
