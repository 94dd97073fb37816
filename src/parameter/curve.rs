use std::{fmt::Debug, rc::Rc, str::FromStr};

use crate::utils::{db_to_linear, linear_to_db};

// -------------------------------------------------------------------------------------------------

/// Non linear response of controls: maps between display positions, as shown by sliders and
/// knobs, and the parameter's linear normalized values. Both sides are in range `0.0..=1.0`.
pub trait ParameterCurve: Debug {
    /// Convert a display position to a linear normalized value.
    fn display_to_normalized(&self, value: f64) -> f64;

    /// Convert a linear normalized value to a display position.
    fn normalized_to_display(&self, value: f64) -> f64;

    /// Apply a relative edit: `start..end` is a previously dragged interval and `linear` the new
    /// display position. The interval's delta gets measured and applied in the curve's value
    /// space, so relative edits stay proportional on non linear curves.
    fn relative_value(&self, start: f64, end: f64, linear: f64) -> f64 {
        let delta = self.display_to_normalized(end) - self.display_to_normalized(start);
        let value = (self.display_to_normalized(linear) + delta).clamp(0.0, 1.0);
        self.normalized_to_display(value).clamp(0.0, 1.0)
    }

    /// Name under which the curve can be created via [`create_curve`].
    fn kind(&self) -> Option<CurveKind> {
        None
    }
}

// -------------------------------------------------------------------------------------------------

/// Names of the built-in curves.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CurveKind {
    Linear,
    Concave,
    Convex,
    Exponential,
    Logarithmic,
    Decibel,
}

/// Create a built-in curve by name. Range mapped curves get created with the default ranges
/// of their [`Scaling`]: see [`Scaling::from_kind`].
pub fn create_curve(name: &str) -> Option<Rc<dyn ParameterCurve>> {
    let kind = CurveKind::from_str(name).ok()?;
    let curve: Rc<dyn ParameterCurve> = match kind {
        CurveKind::Concave => Rc::new(ConcaveCurve),
        CurveKind::Convex => Rc::new(ConvexCurve),
        other => Rc::new(InterpolatorCurve::new(Rc::new(Scaling::from_kind(other)?))),
    };
    Some(curve)
}

// -------------------------------------------------------------------------------------------------

/// Quadratic curve: fine control at the low end of the range.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConcaveCurve;

impl ParameterCurve for ConcaveCurve {
    fn display_to_normalized(&self, value: f64) -> f64 {
        value * value
    }

    fn normalized_to_display(&self, value: f64) -> f64 {
        value.max(0.0).sqrt()
    }

    fn kind(&self) -> Option<CurveKind> {
        Some(CurveKind::Concave)
    }
}

/// Concave curve mirrored around 1: fine control at the high end of the range.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConvexCurve;

impl ParameterCurve for ConvexCurve {
    fn display_to_normalized(&self, value: f64) -> f64 {
        let inverse = 1.0 - value;
        1.0 - inverse * inverse
    }

    fn normalized_to_display(&self, value: f64) -> f64 {
        1.0 - (1.0 - value).max(0.0).sqrt()
    }

    fn kind(&self) -> Option<CurveKind> {
        Some(CurveKind::Convex)
    }
}

// -------------------------------------------------------------------------------------------------

/// A monotonic mapping from `0.0..=1.0` to some native value range, e.g. frequencies.
pub trait RangeFunction: Debug {
    fn normalized_to_range(&self, value: f64) -> f64;
    fn range_to_normalized(&self, value: f64) -> f64;

    fn min_range(&self) -> f64;
    fn max_range(&self) -> f64;

    fn mid_range(&self) -> f64 {
        self.normalized_to_range(0.5)
    }

    fn kind(&self) -> Option<CurveKind> {
        None
    }
}

// -------------------------------------------------------------------------------------------------

/// Built-in range functions.
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub enum Scaling {
    /// Linear scaling: `y = x` (no transformation applied)
    #[default]
    Linear,

    /// Exponential scaling: `y = x^factor`
    /// Factor must be > 0.0.
    ///
    /// Values > 1.0 create a curve that rises slowly at first then quickly.
    /// Values < 1.0 create a curve that rises quickly at first then slowly.
    Exponential(f64),

    /// Logarithmic frequency like scaling between `min` and `max`: `y = min * (max/min)^x`.
    /// Both bounds must be > 0.0 and `max` > `min`.
    Logarithmic(f64, f64),

    /// Decibel scaling: maps normalized values to the dB range `(min_db, max_db)`, and
    /// dB values to linear gains. The native range is `db_to_lin(min_db)..=db_to_lin(max_db)`.
    Decibel(f64, f64),

    /// Sigmoid (S-curve) scaling: `y = 1 / (1 + e^(-steepness * (x - 0.5)))`, normalized to
    /// map \[0,1\] -> \[0,1\]. Steepness must be > 0.0.
    Sigmoid(f64),
}

impl Scaling {
    /// Scaling with default ranges for the given curve kind. `None` for curves which are not
    /// range mapped.
    pub fn from_kind(kind: CurveKind) -> Option<Self> {
        match kind {
            CurveKind::Linear => Some(Scaling::Linear),
            CurveKind::Exponential => Some(Scaling::Exponential(2.0)),
            CurveKind::Logarithmic => Some(Scaling::Logarithmic(20.0, 20000.0)),
            CurveKind::Decibel => Some(Scaling::Decibel(-60.0, 0.0)),
            CurveKind::Concave | CurveKind::Convex => None,
        }
    }

    /// Check if the scaling's arguments are in their valid ranges.
    pub fn is_valid(&self) -> bool {
        match *self {
            Scaling::Linear => true,
            Scaling::Exponential(factor) => factor > 0.0,
            Scaling::Logarithmic(min, max) => min > 0.0 && max > min,
            Scaling::Decibel(min_db, max_db) => min_db < max_db,
            Scaling::Sigmoid(steepness) => steepness > 0.0,
        }
    }

    fn sigmoid(steepness: f64, x: f64) -> f64 {
        1.0 / (1.0 + (-steepness * (x - 0.5)).exp())
    }
}

impl RangeFunction for Scaling {
    fn normalized_to_range(&self, value: f64) -> f64 {
        let value = value.clamp(0.0, 1.0);
        match *self {
            Scaling::Linear => value,
            Scaling::Exponential(factor) => value.powf(factor.max(0.001)),
            Scaling::Logarithmic(min, max) => min * (max / min).powf(value),
            Scaling::Decibel(min_db, max_db) => db_to_linear(min_db + value * (max_db - min_db)),
            Scaling::Sigmoid(steepness) => {
                let y_min = Self::sigmoid(steepness, 0.0);
                let y_max = Self::sigmoid(steepness, 1.0);
                (Self::sigmoid(steepness, value) - y_min) / (y_max - y_min)
            }
        }
    }

    fn range_to_normalized(&self, value: f64) -> f64 {
        let value = value.clamp(self.min_range(), self.max_range());
        let normalized = match *self {
            Scaling::Linear => value,
            Scaling::Exponential(factor) => value.powf(1.0 / factor.max(0.001)),
            Scaling::Logarithmic(min, max) => (value / min).ln() / (max / min).ln(),
            Scaling::Decibel(min_db, max_db) => (linear_to_db(value) - min_db) / (max_db - min_db),
            Scaling::Sigmoid(steepness) => {
                let y_min = Self::sigmoid(steepness, 0.0);
                let y_max = Self::sigmoid(steepness, 1.0);
                let y = (value * (y_max - y_min) + y_min).clamp(0.0001, 0.9999); // avoid log(0)
                0.5 - ((1.0 / y) - 1.0).ln() / steepness
            }
        };
        normalized.clamp(0.0, 1.0)
    }

    fn min_range(&self) -> f64 {
        match *self {
            Scaling::Logarithmic(min, _) => min,
            Scaling::Decibel(min_db, _) => db_to_linear(min_db),
            _ => 0.0,
        }
    }

    fn max_range(&self) -> f64 {
        match *self {
            Scaling::Logarithmic(_, max) => max,
            Scaling::Decibel(_, max_db) => db_to_linear(max_db),
            _ => 1.0,
        }
    }

    fn kind(&self) -> Option<CurveKind> {
        match self {
            Scaling::Linear => Some(CurveKind::Linear),
            Scaling::Exponential(_) => Some(CurveKind::Exponential),
            Scaling::Logarithmic(_, _) => Some(CurveKind::Logarithmic),
            Scaling::Decibel(_, _) => Some(CurveKind::Decibel),
            Scaling::Sigmoid(_) => None,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Curve which displays a linear parameter range through a [`RangeFunction`].
///
/// Display positions are converted to the function's native range, and then linearly
/// normalized within `min_range..=max_range` to get the parameter's normalized value.
#[derive(Debug, Clone)]
pub struct InterpolatorCurve {
    function: Rc<dyn RangeFunction>,
}

impl InterpolatorCurve {
    pub fn new(function: Rc<dyn RangeFunction>) -> Self {
        debug_assert!(
            function.max_range() > function.min_range(),
            "Invalid range function bounds"
        );
        Self { function }
    }

    pub fn function(&self) -> &Rc<dyn RangeFunction> {
        &self.function
    }

    fn normalize(&self, range_value: f64) -> f64 {
        let min = self.function.min_range();
        let range = self.function.max_range() - min;
        if range > 0.0 {
            ((range_value - min) / range).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    fn denormalize(&self, normalized: f64) -> f64 {
        let min = self.function.min_range();
        min + normalized.clamp(0.0, 1.0) * (self.function.max_range() - min)
    }
}

impl ParameterCurve for InterpolatorCurve {
    fn display_to_normalized(&self, value: f64) -> f64 {
        self.normalize(self.function.normalized_to_range(value))
    }

    fn normalized_to_display(&self, value: f64) -> f64 {
        self.function.range_to_normalized(self.denormalize(value))
    }

    /// Relative edits get applied in the function's native range.
    fn relative_value(&self, start: f64, end: f64, linear: f64) -> f64 {
        let delta = self.function.normalized_to_range(end) - self.function.normalized_to_range(start);
        let range_value = (self.function.normalized_to_range(linear) + delta)
            .clamp(self.function.min_range(), self.function.max_range());
        self.function.range_to_normalized(range_value)
    }

    fn kind(&self) -> Option<CurveKind> {
        self.function.kind()
    }
}

// -------------------------------------------------------------------------------------------------
