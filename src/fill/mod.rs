//! Fill classifier: maps a cell to its display color.
//!
//! Every scheme is a pure function of a `Location` and the configured
//! `FillLimits`. Schemes are registered in a static catalog and selected by
//! name; switching schemes never touches the grid shape.

mod ramp;

use serde::{Deserialize, Serialize};

use crate::types::{Color, Location};

pub use ramp::{Ramp, BLUES, GREENS, ORANGES, PURPLES, RAMP_LEN};

/// Fill for any occupied cell under the default scheme.
pub const OCCUPIED: Color = Color::hex(0xff0000);

/// Fill for unoccupied cells under schemes that only describe computers.
pub const NEUTRAL: Color = Color::hex(0x696969);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FillScheme {
    #[default]
    Default,
    FreeResources,
    BoundResources,
    MemorySize,
    Processors,
}

impl FillScheme {
    /// Catalog order, as offered to the user.
    pub const ALL: [FillScheme; 5] = [
        FillScheme::Default,
        FillScheme::FreeResources,
        FillScheme::BoundResources,
        FillScheme::MemorySize,
        FillScheme::Processors,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            FillScheme::Default => "default",
            FillScheme::FreeResources => "free-resources",
            FillScheme::BoundResources => "bound-resources",
            FillScheme::MemorySize => "memory-size",
            FillScheme::Processors => "processors",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// The next scheme in catalog order, wrapping around.
    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub const fn ramp(self) -> &'static Ramp {
        match self {
            FillScheme::Default | FillScheme::FreeResources => &BLUES,
            FillScheme::BoundResources => &GREENS,
            FillScheme::MemorySize => &PURPLES,
            FillScheme::Processors => &ORANGES,
        }
    }

    pub fn classify(self, location: &Location, limits: &FillLimits) -> Color {
        match self {
            FillScheme::Default => match location.computer {
                Some(_) => OCCUPIED,
                None => BLUES.pick(location.free_resources as f64, limits.free_resources),
            },
            FillScheme::FreeResources => {
                BLUES.pick(location.free_resources as f64, limits.free_resources)
            }
            FillScheme::BoundResources => location.computer.map_or(NEUTRAL, |c| {
                GREENS.pick(c.bound_resources as f64, limits.bound_resources)
            }),
            FillScheme::MemorySize => location.computer.map_or(NEUTRAL, |c| {
                PURPLES.pick(c.memory_size as f64, limits.memory_size)
            }),
            FillScheme::Processors => location.computer.map_or(NEUTRAL, |c| {
                ORANGES.pick(c.processors as f64, limits.processors)
            }),
        }
    }
}

/// Upper bounds of each bucketed scale; values at or above clamp to the top bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillLimits {
    pub free_resources: f64,
    pub bound_resources: f64,
    pub memory_size: f64,
    pub processors: f64,
}

impl Default for FillLimits {
    fn default() -> Self {
        FillLimits {
            free_resources: 500.0,
            bound_resources: 500.0,
            memory_size: 300.0,
            processors: 10.0,
        }
    }
}

impl FillLimits {
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("free_resources", self.free_resources),
            ("bound_resources", self.bound_resources),
            ("memory_size", self.memory_size),
            ("processors", self.processors),
        ];
        for (name, max) in fields {
            if !max.is_finite() || max <= 0.0 {
                return Err(format!("fill limit {name} must be positive, got {max}"));
            }
        }
        Ok(())
    }
}

/// Equal-width bucket index of `value` on `[0, max)` split into `buckets`.
///
/// Values at or above `max` land in the last bucket; NaN and negatives in the first.
pub fn bucket(value: f64, max: f64, buckets: usize) -> usize {
    let last = buckets.saturating_sub(1);
    if buckets == 0 || !(value > 0.0) {
        return 0;
    }
    if !(max > 0.0) || value >= max {
        return last;
    }
    let width = max / buckets as f64;
    ((value / width).floor() as usize).min(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Computer;

    const COMPUTER: Computer = Computer {
        memory_size: 3,
        processors: 5,
        bound_resources: 10,
    };

    #[test]
    fn bucket_edges() {
        assert_eq!(bucket(0.0, 500.0, 9), 0);
        assert_eq!(bucket(55.0, 500.0, 9), 0);
        assert_eq!(bucket(56.0, 500.0, 9), 1);
        assert_eq!(bucket(499.0, 500.0, 9), 8);
        assert_eq!(bucket(500.0, 500.0, 9), 8);
        assert_eq!(bucket(5000.0, 500.0, 9), 8);
        assert_eq!(bucket(f64::NAN, 500.0, 9), 0);
        assert_eq!(bucket(-3.0, 500.0, 9), 0);
    }

    #[test]
    fn default_scheme_ramps_light_to_dark() {
        let limits = FillLimits::default();
        let lightest = FillScheme::Default.classify(&Location::empty(0), &limits);
        let darkest = FillScheme::Default.classify(&Location::empty(10_000), &limits);
        assert_eq!(lightest, BLUES.colors[0]);
        assert_eq!(darkest, BLUES.colors[RAMP_LEN - 1]);
    }

    #[test]
    fn occupied_cells_ignore_free_resources() {
        let limits = FillLimits::default();
        for free in [0, 1, 250, 499, 500, 10_000, u64::MAX] {
            let color = FillScheme::Default.classify(&Location::occupied(free, COMPUTER), &limits);
            assert_eq!(color, OCCUPIED, "free={free}");
        }
    }

    #[test]
    fn occupant_schemes_are_neutral_on_empty_cells() {
        let limits = FillLimits::default();
        let empty = Location::empty(123);
        for scheme in [
            FillScheme::BoundResources,
            FillScheme::MemorySize,
            FillScheme::Processors,
        ] {
            assert_eq!(scheme.classify(&empty, &limits), NEUTRAL, "{}", scheme.name());
        }
    }

    #[test]
    fn processors_scheme_buckets_occupant() {
        let limits = FillLimits::default();
        let loc = Location::occupied(0, COMPUTER);
        // 5 of 10 processors, 9 buckets of width 10/9.
        assert_eq!(FillScheme::Processors.classify(&loc, &limits), ORANGES.colors[4]);
    }

    #[test]
    fn free_resources_scheme_colors_occupied_cells_by_resources() {
        let limits = FillLimits::default();
        let loc = Location::occupied(0, COMPUTER);
        assert_eq!(FillScheme::FreeResources.classify(&loc, &limits), BLUES.colors[0]);
    }

    #[test]
    fn catalog_names_round_trip() {
        for scheme in FillScheme::ALL {
            assert_eq!(FillScheme::from_name(scheme.name()), Some(scheme));
        }
        assert_eq!(FillScheme::from_name("rainbow"), None);
        assert_eq!(FillScheme::Processors.next(), FillScheme::Default);
    }

    #[test]
    fn limits_must_be_positive() {
        assert!(FillLimits::default().validate().is_ok());
        let bad = FillLimits {
            processors: 0.0,
            ..FillLimits::default()
        };
        assert!(bad.validate().unwrap_err().contains("processors"));
    }
}
