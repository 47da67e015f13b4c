//! Unit sets for dimension arithmetic.
//!
//! Each set groups units convertible among each other through a canonical
//! base unit; sets are mutually disjoint. Font-relative and viewport-relative
//! units form singleton sets, so they only combine with themselves.

use std::collections::HashMap;
use std::f64::consts::PI;

use lazy_static::lazy_static;

/// A family of convertible units. Every entry carries the factor that takes
/// one of its units to the canonical base unit.
pub struct UnitSet {
    pub name: &'static str,
    pub canonical_unit: &'static str,
    entries: HashMap<&'static str, f64>,
}

impl UnitSet {
    fn new(name: &'static str, canonical_unit: &'static str, entries: &[(&'static str, f64)]) -> Self {
        Self {
            name,
            canonical_unit,
            entries: entries.iter().copied().collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, unit: &str) -> bool {
        self.entries.contains_key(unit)
    }

    /// Converts a scalar in the given unit to the canonical base unit
    #[must_use]
    pub fn to_canonical(&self, unit: &str, value: f64) -> Option<f64> {
        self.entries.get(unit).map(|factor| value * factor)
    }

    /// Converts a scalar in the canonical base unit to the given unit
    #[must_use]
    pub fn from_canonical(&self, unit: &str, value: f64) -> Option<f64> {
        self.entries.get(unit).map(|factor| value / factor)
    }
}

const CM_PER_PX: f64 = 37.79527559; // 1cm in px at 96dpi

lazy_static! {
    pub static ref UNIT_SETS: Vec<UnitSet> = vec![
        UnitSet::new(
            "lengths",
            "px",
            &[
                ("px", 1.0),
                ("cm", CM_PER_PX),
                ("mm", CM_PER_PX / 10.0),
                ("in", 96.0),
                ("pt", 4.0 / 3.0),
                ("pc", 16.0),
            ],
        ),
        UnitSet::new(
            "angles",
            "rad",
            &[
                ("rad", 1.0),
                ("deg", (2.0 * PI) / 360.0),
                ("grad", (2.0 * PI) / 400.0),
                ("turn", 2.0 * PI),
            ],
        ),
        UnitSet::new("times", "s", &[("s", 1.0), ("ms", 1.0 / 1000.0)]),
        UnitSet::new("freqs", "hz", &[("hz", 1.0), ("khz", 1000.0)]),
        UnitSet::new(
            "resolutions",
            "dppx",
            &[("dppx", 1.0), ("dpcm", 1.0 / CM_PER_PX), ("dpi", 1.0 / 96.0)],
        ),
        UnitSet::new("ems", "em", &[("em", 1.0)]),
        UnitSet::new("exs", "ex", &[("ex", 1.0)]),
        UnitSet::new("chs", "ch", &[("ch", 1.0)]),
        UnitSet::new("rems", "rem", &[("rem", 1.0)]),
        UnitSet::new("vws", "vw", &[("vw", 1.0)]),
        UnitSet::new("vhs", "vh", &[("vh", 1.0)]),
        UnitSet::new("vmins", "vmin", &[("vmin", 1.0)]),
    ];
    static ref UNIT_LOOKUP: HashMap<&'static str, &'static UnitSet> = {
        let mut lookup = HashMap::new();
        for set in UNIT_SETS.iter() {
            for unit in set.entries.keys() {
                lookup.insert(*unit, set);
            }
        }
        lookup
    };
}

/// Looks up the unit set a (lowercase) unit belongs to
#[must_use]
pub fn unit_set(unit: &str) -> Option<&'static UnitSet> {
    UNIT_LOOKUP.get(unit).copied()
}

/// True when two (lowercase) units belong to the same unit set
#[must_use]
pub fn convertible(a: &str, b: &str) -> bool {
    match unit_set(a) {
        Some(set) => set.contains(b),
        None => false,
    }
}
