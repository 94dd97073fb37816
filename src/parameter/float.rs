use std::{any::Any, cell::Cell, rc::Rc};

use super::{formatted_string, Parameter, ParameterCore, ParameterRef, ParameterType};
use crate::value::Value;

// -------------------------------------------------------------------------------------------------

/// A continuous (float) parameter.
#[derive(Debug)]
pub struct FloatParam {
    core: ParameterCore,
    min: Cell<f64>,
    max: Cell<f64>,
    value: Cell<f64>,
    precision: Cell<i32>,
}

impl FloatParam {
    /// Number of increment steps of new float parameters.
    pub const DEFAULT_PRECISION: i32 = 100;

    /// Create a new float parameter with the given range, set to `min`.
    pub fn new(min: f64, max: f64, name: &str) -> Self {
        let core = ParameterCore::new(name);
        core.set_default_value(Value::Float(min));
        Self {
            core,
            min: Cell::new(min),
            max: Cell::new(max),
            value: Cell::new(min),
            precision: Cell::new(Self::DEFAULT_PRECISION),
        }
    }

    /// Set the initial and default value.
    pub fn with_default(self, value: f64) -> Self {
        let value = self.bound(value);
        self.core.set_default_value(Value::Float(value));
        self.value.set(value);
        self
    }

    /// Set the number of increment steps.
    pub fn with_precision(self, precision: i32) -> Self {
        self.set_precision(precision);
        self
    }

    pub fn float_value(&self) -> f64 {
        self.value.get()
    }

    /// Set a new range, bounding the current value.
    pub fn set_range(&self, min: f64, max: f64) {
        self.set_min(Value::Float(min));
        self.set_max(Value::Float(max));
    }

    fn bound(&self, value: f64) -> f64 {
        let (min, max) = (self.min.get(), self.max.get());
        if value.is_nan() {
            return min;
        }
        let mut value = value;
        if value > max {
            value = max;
        }
        if value < min {
            value = min;
        }
        value
    }
}

impl Parameter for FloatParam {
    fn core(&self) -> &ParameterCore {
        &self.core
    }

    fn as_parameter(&self) -> &dyn Parameter {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }

    fn parameter_type(&self) -> ParameterType {
        ParameterType::Float
    }

    fn value(&self) -> Value {
        Value::Float(self.value.get())
    }

    fn set_value(&self, value: Value, update: bool) {
        let value = self.bound(value.as_float());
        let changed = value != self.value.get();
        self.core
            .commit(self, changed, update, || self.value.set(value));
    }

    fn min(&self) -> Value {
        Value::Float(self.min.get())
    }

    fn max(&self) -> Value {
        Value::Float(self.max.get())
    }

    fn set_min(&self, min: Value) {
        let min = min.as_float();
        if min != self.min.get() {
            self.min.set(min);
            if self.value.get() < min {
                self.set_value(Value::Float(self.value.get()), false);
            } else {
                self.defer_changed();
            }
        }
    }

    fn set_max(&self, max: Value) {
        let max = max.as_float();
        if max != self.max.get() {
            self.max.set(max);
            if self.value.get() > max {
                self.set_value(Value::Float(max), false);
            } else {
                self.defer_changed();
            }
        }
    }

    fn clone_parameter(&self) -> ParameterRef {
        Self {
            core: self.core.duplicate(),
            min: self.min.clone(),
            max: self.max.clone(),
            value: self.value.clone(),
            precision: self.precision.clone(),
        }
        .into_shared()
    }

    fn bound_value(&self, value: Value) -> Value {
        Value::Float(self.bound(value.as_float()))
    }

    fn precision(&self) -> i32 {
        self.precision.get()
    }

    fn set_precision(&self, precision: i32) -> bool {
        debug_assert!(precision > 0, "Expecting a positive precision");
        if precision <= 0 {
            log::warn!(
                "Ignoring invalid precision {} for float parameter '{}'",
                precision,
                self.name()
            );
            return false;
        }
        self.precision.set(precision);
        true
    }

    fn string_for(&self, value: &Value) -> String {
        formatted_string(self, value).unwrap_or_else(|| format!("{:.2}", value.as_float()))
    }
}

impl Drop for FloatParam {
    fn drop(&mut self) {
        self.core.destroyed(&*self);
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        parameter::{FloatFormatter, PercentFormatter},
        testing::RecordingController,
    };

    #[test]
    fn bounds_and_normalization() {
        let param = FloatParam::new(-60.0, 12.0, "gain").into_shared();
        param.set_value(Value::Float(20.0), false);
        assert_eq!(param.float_value(), 12.0);
        param.set_value(Value::Float(f64::NAN), false);
        assert_eq!(param.float_value(), -60.0);
        param.set_value(Value::Int(-24), false);
        assert_eq!(param.normalized(), 0.5);
        param.set_normalized(0.25, false);
        assert_eq!(param.float_value(), -42.0);
        param.set_normalized(1.5, false);
        assert_eq!(param.float_value(), 12.0);

        for normalized in [0.0, 0.13, 0.5, 0.77, 1.0] {
            param.set_normalized(normalized, false);
            let before = param.float_value();
            param.set_normalized(param.normalized(), false);
            assert!((param.float_value() - before).abs() < 1e-9);
        }
    }

    #[test]
    fn precision() {
        let param = FloatParam::new(0.0, 1.0, "mix").with_precision(4).into_shared();
        assert_eq!(param.precision(), 4);
        param.increment();
        assert_eq!(param.float_value(), 0.25);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "Expecting a positive precision")]
    fn zero_precision_asserts() {
        let param = FloatParam::new(0.0, 1.0, "amount").into_shared();
        param.set_precision(0);
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn zero_precision_is_rejected() {
        let param = FloatParam::new(0.0, 1.0, "amount").with_precision(4).into_shared();
        assert!(!param.set_precision(0));
        assert_eq!(param.precision(), 4);
    }

    #[test]
    fn increment_notifies_controller() {
        let controller = RecordingController::new();
        let param = FloatParam::new(0.0, 10.0, "time").into_shared();
        param.connect(controller.weak(), 12);
        param.increment();
        assert_eq!(*controller.changed.borrow(), vec![(12, Value::Float(0.1))]);
    }

    #[test]
    fn strings() {
        let param = FloatParam::new(0.0, 1.0, "amount").with_default(0.5).into_shared();
        assert_eq!(param.value_string(), "0.50");
        param.set_formatter(Some(Rc::new(PercentFormatter::default())));
        assert_eq!(param.value_string(), "50%");
        param.set_string("20%", false);
        assert!((param.float_value() - 0.2).abs() < 1e-9);

        let freq = FloatParam::new(20.0, 20000.0, "cutoff").into_shared();
        freq.set_formatter(Some(Rc::new(FloatFormatter::new(0).with_unit("Hz"))));
        freq.set_string("440 Hz", false);
        assert_eq!(freq.value_string(), "440 Hz");
        freq.set_string("50000", false);
        assert_eq!(freq.float_value(), 20000.0);
    }
}
