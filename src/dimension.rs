//! Relative dimensions.
//!
//! A component declares its size relative to its parent:
//!
//! ```
//! use perch::{ComponentSize, RelativeDimension};
//!
//! let size = ComponentSize {
//!     width: RelativeDimension::Percent(0.5),
//!     max_width: RelativeDimension::Points(200.),
//!     min_height: RelativeDimension::Percent(0.75),
//!     ..ComponentSize::default()
//! };
//! # let _ = size;
//! ```
//!
//! This is half the parent’s width up to 200 points, and at least three quarters of the parent’s
//! height. Anything left `Auto` is decided by layout.

use crate::error::Error;
use crate::geometry::{Size, SizeRange};
use cgmath::Vector2;
use core::fmt;
use core::str::FromStr;
use std::f64;

/// A length that is either absolute, a fraction of the parent, or automatic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RelativeDimension {
    Auto,
    Points(f64),
    /// A fraction of the parent’s size; `0.5` is half.
    Percent(f64),
}

impl Default for RelativeDimension {
    fn default() -> RelativeDimension {
        RelativeDimension::Auto
    }
}

impl RelativeDimension {
    /// Resolves against the parent’s length.
    ///
    /// Percentages of a parent length that isn’t finite resolve like `Auto`.
    pub fn resolve(self, auto: f64, parent: f64) -> f64 {
        match self {
            RelativeDimension::Auto => auto,
            RelativeDimension::Points(points) => points,
            RelativeDimension::Percent(fraction) if parent.is_finite() => fraction * parent,
            RelativeDimension::Percent(_) => auto,
        }
    }
}

impl From<f64> for RelativeDimension {
    fn from(points: f64) -> RelativeDimension {
        RelativeDimension::Points(points)
    }
}

impl FromStr for RelativeDimension {
    type Err = Error;

    /// Parses `auto`, `12`, `12pt` or `50%`.
    fn from_str(s: &str) -> Result<RelativeDimension, Error> {
        let s = s.trim();
        let invalid = || Error::InvalidDimension(s.to_string());
        if s.eq_ignore_ascii_case("auto") {
            return Ok(RelativeDimension::Auto);
        }
        let (number, percent) = if let Some(number) = s.strip_suffix('%') {
            (number, true)
        } else if let Some(number) = s.strip_suffix("pt") {
            (number, false)
        } else {
            (s, false)
        };
        let value: f64 = number.trim().parse().map_err(|_| invalid())?;
        if !value.is_finite() || value < 0. {
            return Err(invalid());
        }
        Ok(if percent {
            RelativeDimension::Percent(value / 100.)
        } else {
            RelativeDimension::Points(value)
        })
    }
}

impl fmt::Display for RelativeDimension {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RelativeDimension::Auto => write!(f, "auto"),
            RelativeDimension::Points(points) => write!(f, "{}pt", points),
            RelativeDimension::Percent(fraction) => write!(f, "{}%", fraction * 100.),
        }
    }
}

/// A component’s desired size relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ComponentSize {
    pub width: RelativeDimension,
    pub height: RelativeDimension,
    pub min_width: RelativeDimension,
    pub min_height: RelativeDimension,
    pub max_width: RelativeDimension,
    pub max_height: RelativeDimension,
}

impl ComponentSize {
    /// An exact size in points.
    pub fn fixed(width: f64, height: f64) -> ComponentSize {
        ComponentSize {
            width: RelativeDimension::Points(width),
            height: RelativeDimension::Points(height),
            ..ComponentSize::default()
        }
    }

    /// Resolves against the parent’s size into a size range.
    ///
    /// Like CSS, `min` overrides `max`, which overrides the exact size.
    pub fn resolve(&self, parent: Size) -> SizeRange {
        let (min_x, max_x) = constrain(
            self.min_width.resolve(0., parent.x),
            self.width.resolve(f64::NAN, parent.x),
            self.max_width.resolve(f64::INFINITY, parent.x),
        );
        let (min_y, max_y) = constrain(
            self.min_height.resolve(0., parent.y),
            self.height.resolve(f64::NAN, parent.y),
            self.max_height.resolve(f64::INFINITY, parent.y),
        );
        SizeRange::new(Vector2::new(min_x, min_y), Vector2::new(max_x, max_y))
    }
}

fn constrain(min: f64, exact: f64, max: f64) -> (f64, f64) {
    if max <= min {
        // exact is irrelevant
        return (min, min);
    }
    if exact.is_nan() {
        return (min, max);
    }
    if exact > max {
        (max, max)
    } else if exact < min {
        (min, min)
    } else {
        (exact, exact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn percent_of_parent() {
        let size = ComponentSize {
            width: RelativeDimension::Percent(0.5),
            max_width: RelativeDimension::Points(200.),
            min_height: RelativeDimension::Percent(0.75),
            ..ComponentSize::default()
        };
        let range = size.resolve(Vector2::new(300., 100.));
        assert_eq!(range.min, Vector2::new(150., 75.));
        assert_eq!(range.max, Vector2::new(150., f64::INFINITY));

        let range = size.resolve(Vector2::new(1000., 100.));
        assert_eq!(range.min.x, 200., "max width clips the exact width");
        assert_eq!(range.max.x, 200.);
    }

    #[test]
    fn unspecified_defers() {
        let range = ComponentSize::default().resolve(Vector2::new(300., 100.));
        assert_eq!(range, SizeRange::unconstrained());
    }

    #[test]
    fn percent_of_unknown_parent_is_auto() {
        let size = ComponentSize {
            width: RelativeDimension::Percent(0.5),
            ..ComponentSize::default()
        };
        let range = size.resolve(Vector2::new(f64::NAN, f64::INFINITY));
        assert_eq!(range, SizeRange::unconstrained());
    }

    #[test]
    fn min_overrides_max() {
        let size = ComponentSize {
            min_width: RelativeDimension::Points(50.),
            max_width: RelativeDimension::Points(20.),
            width: RelativeDimension::Points(30.),
            ..ComponentSize::default()
        };
        let range = size.resolve(Vector2::new(100., 100.));
        assert_eq!((range.min.x, range.max.x), (50., 50.));
    }

    #[test]
    fn parse_dimensions() {
        assert_eq!("auto".parse::<RelativeDimension>().unwrap(), RelativeDimension::Auto);
        assert_eq!("12".parse::<RelativeDimension>().unwrap(), RelativeDimension::Points(12.));
        assert_eq!("12pt".parse::<RelativeDimension>().unwrap(), RelativeDimension::Points(12.));
        assert_eq!("50%".parse::<RelativeDimension>().unwrap(), RelativeDimension::Percent(0.5));
        assert!("-3".parse::<RelativeDimension>().is_err());
        assert!("wide".parse::<RelativeDimension>().is_err());
    }

    proptest! {
        #[test]
        fn resolved_range_is_ordered(
            min in proptest::option::of(0f64..500.),
            exact in proptest::option::of(0f64..500.),
            max in proptest::option::of(0f64..500.),
            parent in 0f64..1000.,
        ) {
            let dim = |v: Option<f64>| v.map_or(RelativeDimension::Auto, RelativeDimension::Points);
            let size = ComponentSize {
                width: dim(exact),
                min_width: dim(min),
                max_width: dim(max),
                ..ComponentSize::default()
            };
            let range = size.resolve(Vector2::new(parent, parent));
            prop_assert!(range.min.x <= range.max.x);
            if let Some(min) = min {
                prop_assert!(range.min.x >= min);
            }
        }
    }
}
