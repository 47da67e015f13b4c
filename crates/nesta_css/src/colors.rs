//! RGBA colors with a preferred display format.
//!
//! Canonical storage is always RGBA; HSL input is converted at construction
//! and the HSL view is recomputed on demand.

use colors_transform::Color as _;
use colors_transform::{Hsl, Rgb};

/// The display format a color prefers when emitted
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorFormat {
    Hex,
    Rgb,
    Hsl,
}

/// A color as a 4-tuple of RGBA components, alpha defaulting to solid
#[derive(Clone, Copy, Debug)]
pub struct Color {
    pub rgba: [u8; 4],
    pub format: ColorFormat,
}

impl PartialEq for Color {
    fn eq(&self, other: &Self) -> bool {
        // the preferred format is presentation only
        self.rgba == other.rgba
    }
}

fn clamp_component(v: f64) -> u8 {
    if v <= 0.0 {
        0
    } else if v >= 255.0 {
        255
    } else {
        v.round() as u8
    }
}

impl Color {
    #[must_use]
    pub fn from_rgb(r: f64, g: f64, b: f64, format: ColorFormat) -> Self {
        Self {
            rgba: [clamp_component(r), clamp_component(g), clamp_component(b), 255],
            format,
        }
    }

    /// Builds a color from hue (degrees, already reduced modulo 360) and
    /// saturation/lightness fractions in 0..1.
    #[must_use]
    pub fn from_hsl(h: f64, s: f64, l: f64) -> Self {
        let hsl = Hsl::from(h as f32, (s * 100.0) as f32, (l * 100.0) as f32);
        let rgb = hsl.to_rgb();
        Self {
            rgba: [
                clamp_component(f64::from(rgb.get_red())),
                clamp_component(f64::from(rgb.get_green())),
                clamp_component(f64::from(rgb.get_blue())),
                255,
            ],
            format: ColorFormat::Hsl,
        }
    }

    #[must_use]
    pub fn r(&self) -> u8 {
        self.rgba[0]
    }

    #[must_use]
    pub fn g(&self) -> u8 {
        self.rgba[1]
    }

    #[must_use]
    pub fn b(&self) -> u8 {
        self.rgba[2]
    }

    #[must_use]
    pub fn a(&self) -> u8 {
        self.rgba[3]
    }

    /// The HSL view: hue in degrees, saturation and lightness as percentages
    #[must_use]
    pub fn to_hsl(&self) -> (f64, f64, f64) {
        let rgb = Rgb::from(
            f32::from(self.r()),
            f32::from(self.g()),
            f32::from(self.b()),
        );
        let hsl = rgb.to_hsl();
        (
            f64::from(hsl.get_hue()),
            f64::from(hsl.get_saturation()),
            f64::from(hsl.get_lightness()),
        )
    }

    /// Hex digits without the `#` marker, shortened to the three-digit form
    /// when each component has repeated digits.
    #[must_use]
    pub fn hex_string(&self) -> String {
        let r = format!("{:02X}", self.r());
        let g = format!("{:02X}", self.g());
        let b = format!("{:02X}", self.b());
        let rb = r.as_bytes();
        let gb = g.as_bytes();
        let bb = b.as_bytes();
        if rb[0] == rb[1] && gb[0] == gb[1] && bb[0] == bb[1] {
            format!("{}{}{}", &r[..1], &g[..1], &b[..1])
        } else {
            format!("{r}{g}{b}")
        }
    }

    #[must_use]
    pub fn rgb_string(&self) -> String {
        format!("rgb({},{},{})", self.r(), self.g(), self.b())
    }

    #[must_use]
    pub fn hsl_string(&self) -> String {
        let (h, s, l) = self.to_hsl();
        format!(
            "hsl({},{}%,{}%)",
            format_hsl_component(h),
            format_hsl_component(s),
            format_hsl_component(l)
        )
    }
}

fn format_hsl_component(v: f64) -> String {
    let rounded = (v * 10.0).round() / 10.0;
    if (rounded - rounded.trunc()).abs() < f64::EPSILON {
        format!("{}", rounded.trunc() as i64)
    } else {
        format!("{rounded:.1}")
    }
}
