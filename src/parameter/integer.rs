use std::{any::Any, cell::Cell, rc::Rc};

use super::{formatted_string, Parameter, ParameterCore, ParameterRef, ParameterType};
use crate::value::Value;

// -------------------------------------------------------------------------------------------------

/// Integer value and range, shared by integer, list and scroll parameters.
#[derive(Debug, Clone)]
pub(crate) struct IntRange {
    min: Cell<i64>,
    max: Cell<i64>,
    value: Cell<i64>,
}

impl IntRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self {
            min: Cell::new(min),
            max: Cell::new(max),
            value: Cell::new(min),
        }
    }

    pub fn min(&self) -> i64 {
        self.min.get()
    }

    pub fn max(&self) -> i64 {
        self.max.get()
    }

    pub fn value(&self) -> i64 {
        self.value.get()
    }

    pub fn set_min_raw(&self, min: i64) {
        self.min.set(min);
    }

    pub fn set_max_raw(&self, max: i64) {
        self.max.set(max);
    }

    pub fn set_value_raw(&self, value: i64) {
        self.value.set(value);
    }

    /// Clamp into `min..=max`. With an empty range (max < min), the result is `min`.
    pub fn bound(&self, value: i64) -> i64 {
        let mut value = value;
        if value > self.max() {
            value = self.max();
        }
        if value < self.min() {
            value = self.min();
        }
        value
    }

    /// Width of the range. Computed in `i128`, so full `i64` ranges don't overflow.
    pub fn span(&self) -> i128 {
        (self.max() as i128 - self.min() as i128).max(0)
    }

    pub fn normalize(&self, value: i64) -> f64 {
        let span = self.span();
        if span == 0 {
            return 0.0;
        }
        ((value as i128 - self.min() as i128) as f64 / span as f64).clamp(0.0, 1.0)
    }

    pub fn denormalize(&self, normalized: f64) -> i64 {
        let offset = (normalized.clamp(0.0, 1.0) * self.span() as f64).round() as i128;
        (self.min() as i128 + offset).clamp(self.min() as i128, i64::MAX as i128) as i64
    }

    pub fn precision(&self) -> i32 {
        self.span().clamp(1, i32::MAX as i128) as i32
    }
}

/// Apply a new minimum to an integer range: values below get bounded, everything else just
/// gets a change notification.
pub(crate) fn apply_int_min(param: &dyn Parameter, range: &IntRange, min: i64) {
    if min != range.min() {
        range.set_min_raw(min);
        if range.value() < min {
            param.set_value(Value::Int(range.value()), false);
        } else {
            param.defer_changed();
        }
    }
}

/// Apply a new maximum to an integer range: values above get bounded, everything else just
/// gets a change notification.
pub(crate) fn apply_int_max(param: &dyn Parameter, range: &IntRange, max: i64) {
    if max != range.max() {
        range.set_max_raw(max);
        if range.value() > max {
            param.set_value(Value::Int(max), false);
        } else {
            param.defer_changed();
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// A discrete integer parameter. Increments step by one.
#[derive(Debug)]
pub struct IntParam {
    core: ParameterCore,
    range: IntRange,
}

impl IntParam {
    /// Create a new integer parameter with the given range, set to `min`.
    pub fn new(min: i64, max: i64, name: &str) -> Self {
        let core = ParameterCore::new(name);
        core.set_default_value(Value::Int(min));
        Self {
            core,
            range: IntRange::new(min, max),
        }
    }

    /// Set the initial and default value.
    pub fn with_default(self, value: i64) -> Self {
        let value = self.range.bound(value);
        self.core.set_default_value(Value::Int(value));
        self.range.set_value_raw(value);
        self
    }

    pub fn int_value(&self) -> i64 {
        self.range.value()
    }

    /// Set a new range, bounding the current value.
    pub fn set_range(&self, min: i64, max: i64) {
        self.set_min(Value::Int(min));
        self.set_max(Value::Int(max));
    }
}

impl Parameter for IntParam {
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
        ParameterType::Integer
    }

    fn value(&self) -> Value {
        Value::Int(self.range.value())
    }

    fn set_value(&self, value: Value, update: bool) {
        let value = self.range.bound(value.as_int());
        let changed = value != self.range.value();
        self.core
            .commit(self, changed, update, || self.range.set_value_raw(value));
    }

    fn min(&self) -> Value {
        Value::Int(self.range.min())
    }

    fn max(&self) -> Value {
        Value::Int(self.range.max())
    }

    fn set_min(&self, min: Value) {
        apply_int_min(self, &self.range, min.as_int());
    }

    fn set_max(&self, max: Value) {
        apply_int_max(self, &self.range, max.as_int());
    }

    fn clone_parameter(&self) -> ParameterRef {
        Self {
            core: self.core.duplicate(),
            range: self.range.clone(),
        }
        .into_shared()
    }

    fn bound_value(&self, value: Value) -> Value {
        Value::Int(self.range.bound(value.as_int()))
    }

    fn precision(&self) -> i32 {
        self.range.precision()
    }

    fn value_normalized(&self, value: &Value) -> f64 {
        self.range.normalize(value.as_int())
    }

    fn value_plain(&self, normalized: f64) -> Value {
        Value::Int(self.range.denormalize(normalized))
    }

    fn string_for(&self, value: &Value) -> String {
        formatted_string(self, value).unwrap_or_else(|| value.as_int().to_string())
    }
}

impl Drop for IntParam {
    fn drop(&mut self) {
        self.core.destroyed(&*self);
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        parameter::{IntFormatter, ParameterState},
        signal::{self, MessageId},
        testing::RecordingObserver,
    };

    #[test]
    fn bounds() {
        let param = IntParam::new(-10, 10, "transpose").into_shared();
        assert_eq!(param.value(), Value::Int(-10));
        for (input, expected) in [(5, 5), (11, 10), (-11, -10), (0, 0)] {
            param.set_value(Value::Int(input), false);
            assert_eq!(param.int_value(), expected);
        }
        param.set_value(Value::Float(2.6), false);
        assert_eq!(param.int_value(), 3);
        param.set_value(Value::from("-4"), false);
        assert_eq!(param.int_value(), -4);
    }

    #[test]
    fn normalization() {
        let param = IntParam::new(0, 8, "voices").into_shared();
        assert_eq!(param.precision(), 8);
        param.set_value(Value::Int(2), false);
        assert_eq!(param.normalized(), 0.25);
        param.set_normalized(0.8, false);
        assert_eq!(param.int_value(), 6);
        // set_normalized(normalized()) is stable
        let normalized = param.normalized();
        param.set_normalized(normalized, false);
        assert_eq!(param.int_value(), 6);

        let empty = IntParam::new(3, 3, "fixed").into_shared();
        assert_eq!(empty.normalized(), 0.0);
        assert_eq!(empty.precision(), 1);
    }

    #[test]
    fn wide_ranges() {
        let param = IntParam::new(i64::MIN, i64::MAX, "wide").into_shared();
        assert_eq!(param.precision(), i32::MAX);
        param.set_value(Value::Int(0), false);
        assert_eq!(param.normalized(), 0.5);
        param.set_normalized(1.0, false);
        assert_eq!(param.int_value(), i64::MAX);
        param.set_normalized(0.0, false);
        assert_eq!(param.int_value(), i64::MIN);
        param.increment();
        assert!(param.int_value() > i64::MIN);
    }

    #[test]
    fn take_value() {
        let source = IntParam::new(0, 10, "source").with_default(3).into_shared();
        let same = IntParam::new(0, 10, "same").into_shared();
        let wider = IntParam::new(0, 100, "wider").into_shared();

        // same ranges copy the plain value, different ranges the normalized one
        same.take_value(source.as_ref(), false);
        assert_eq!(same.int_value(), 3);
        wider.take_value(source.as_ref(), false);
        assert_eq!(wider.int_value(), 30);

        wider.set_value(Value::Int(75), false);
        source.take_value(wider.as_ref(), false);
        assert_eq!(source.int_value(), 8);
    }

    #[test]
    fn range_changes() {
        signal::flush();
        let observer = RecordingObserver::new();
        let param = IntParam::new(0, 100, "size").with_default(50).into_shared();
        param.add_observer(observer.weak());

        param.set_max(Value::Int(40));
        assert_eq!(param.int_value(), 40);
        param.set_min(Value::Int(45));
        assert_eq!(param.int_value(), 45);
        param.set_range(0, 200);
        assert_eq!(param.int_value(), 45);
        assert_eq!(param.max(), Value::Int(200));
        signal::flush();
        assert_eq!(observer.count(MessageId::Changed), 1);
        assert_eq!(param.default_value(), Value::Int(50));
    }

    #[test]
    fn strings() {
        let param = IntParam::new(-24, 24, "pitch").into_shared();
        param.set_string("12", false);
        assert_eq!(param.value_string(), "12");
        param.set_string("nope", false);
        assert_eq!(param.int_value(), 12);
        param.set_formatter(Some(Rc::new(IntFormatter::new().with_unit("st"))));
        assert_eq!(param.value_string(), "12 st");
        param.set_string("-7 st", false);
        assert_eq!(param.int_value(), -7);
    }

    #[test]
    fn clone_is_independent() {
        let param = IntParam::new(0, 10, "a").with_default(3).into_shared();
        param.set_state(ParameterState::Storable, false);
        let clone = param.clone_parameter();
        assert_eq!(clone.value(), Value::Int(3));
        assert_eq!(clone.name(), "a");
        assert!(!clone.state(ParameterState::Storable));
        clone.set_value(Value::Int(9), false);
        assert_eq!(param.int_value(), 3);
    }
}
