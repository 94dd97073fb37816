use super::{Parameter, ParameterState};

// -------------------------------------------------------------------------------------------------

/// View of a parameter's normalized value as it's displayed in controls: with the parameter's
/// curve applied, and honoring the bipolar and reverse states.
pub struct NormalizedValue<'a> {
    param: &'a dyn Parameter,
}

impl<'a> NormalizedValue<'a> {
    pub fn new(param: &'a dyn Parameter) -> Self {
        Self { param }
    }

    /// Display position of the parameter's current value.
    pub fn get(&self) -> f64 {
        self.param_to_display(self.param.normalized())
    }

    /// Set the parameter's value from a display position.
    pub fn set(&self, display: f64, update: bool) {
        self.param
            .set_normalized(self.display_to_param(display), update);
    }

    /// Convert a linear normalized value to a display position.
    pub fn param_to_display(&self, value: f64) -> f64 {
        let curve = self.param.curve();
        let reverse = self.param.state(ParameterState::Reverse);
        if self.param.state(ParameterState::Bipolar) {
            let bipolar = (value - 0.5) * 2.0;
            let sign = if bipolar < 0.0 { -1.0 } else { 1.0 };
            let mut magnitude = bipolar.abs();
            if let Some(curve) = curve {
                magnitude = curve.normalized_to_display(magnitude);
            }
            let mut bipolar = magnitude * sign;
            if reverse {
                bipolar = -bipolar;
            }
            bipolar * 0.5 + 0.5
        } else {
            let mut value = value;
            if let Some(curve) = curve {
                value = curve.normalized_to_display(value);
            }
            if reverse {
                1.0 - value
            } else {
                value
            }
        }
    }

    /// Convert a display position to a linear normalized value.
    pub fn display_to_param(&self, value: f64) -> f64 {
        let curve = self.param.curve();
        let reverse = self.param.state(ParameterState::Reverse);
        if self.param.state(ParameterState::Bipolar) {
            let mut bipolar = value * 2.0 - 1.0;
            if reverse {
                bipolar = -bipolar;
            }
            let sign = if bipolar < 0.0 { -1.0 } else { 1.0 };
            let mut magnitude = bipolar.abs();
            if let Some(curve) = curve {
                magnitude = curve.display_to_normalized(magnitude);
            }
            magnitude * sign * 0.5 + 0.5
        } else {
            let mut value = if reverse { 1.0 - value } else { value };
            if let Some(curve) = curve {
                value = curve.display_to_normalized(value);
            }
            value
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Step a parameter's display position by `sign / precision`.
///
/// Steps get rounded to multiples of `1 / precision` to avoid accumulating float errors. When
/// a curve snaps the result back to the old position, a doubled step is tried. At the range
/// bounds, the value wraps around when the parameter has the wrap around state set.
pub fn inc_dec_normalized(param: &dyn Parameter, sign: i32) {
    debug_assert!(sign != 0, "Expecting a non zero step direction");
    let precision = param.precision();
    debug_assert!(precision != 0, "Expecting a non zero precision");
    if sign == 0 || precision <= 0 {
        return;
    }

    let normalized = NormalizedValue::new(param);
    let old_value = normalized.get();

    if (sign > 0 && old_value >= 1.0) || (sign < 0 && old_value <= 0.0) {
        if param.state(ParameterState::WrapAround) {
            normalized.set(if sign > 0 { 0.0 } else { 1.0 }, true);
        }
        return;
    }

    let max_step_value = precision as f64;
    let delta = sign as f64 / max_step_value;
    for i in 1..=2 {
        let new_value = (old_value + i as f64 * delta).clamp(0.0, 1.0);
        let step_value = (new_value * max_step_value).round();
        normalized.set(step_value / max_step_value, true);
        if normalized.get() != old_value {
            break;
        }
    }
}

// -------------------------------------------------------------------------------------------------
