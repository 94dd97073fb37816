use std::{any::Any, cell::Cell, rc::Rc};

use super::{formatted_value, Parameter, ParameterCore, ParameterRef, ParameterType};
use crate::value::Value;

// -------------------------------------------------------------------------------------------------

/// An on/off switch with the plain values `0` and `1`.
#[derive(Debug)]
pub struct ToggleParam {
    core: ParameterCore,
    value: Cell<bool>,
}

impl ToggleParam {
    /// Create a new toggle which is off by default.
    pub fn new(name: &str) -> Self {
        let core = ParameterCore::new(name);
        core.set_default_value(Value::Int(0));
        Self {
            core,
            value: Cell::new(false),
        }
    }

    /// Set the initial and default state.
    pub fn with_default(self, on: bool) -> Self {
        self.core.set_default_value(Value::Int(on as i64));
        self.value.set(on);
        self
    }

    pub fn is_on(&self) -> bool {
        self.value.get()
    }

    /// Flip the current state.
    pub fn toggle(&self, update: bool) {
        self.set_value(Value::Int(!self.value.get() as i64), update);
    }
}

impl Parameter for ToggleParam {
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
        ParameterType::Toggle
    }

    fn value(&self) -> Value {
        Value::Int(self.value.get() as i64)
    }

    fn set_value(&self, value: Value, update: bool) {
        let on = self.bound_value(value).as_int() != 0;
        let changed = on != self.value.get();
        self.core
            .commit(self, changed, update, || self.value.set(on));
    }

    fn min(&self) -> Value {
        Value::Int(0)
    }

    fn max(&self) -> Value {
        Value::Int(1)
    }

    fn clone_parameter(&self) -> ParameterRef {
        Self {
            core: self.core.duplicate(),
            value: Cell::new(self.value.get()),
        }
        .into_shared()
    }

    fn bound_value(&self, value: Value) -> Value {
        Value::Int(value.as_int().clamp(0, 1))
    }

    fn increment(&self) {
        self.toggle(true);
    }

    fn decrement(&self) {
        self.toggle(true);
    }

    fn value_plain(&self, normalized: f64) -> Value {
        Value::Int((normalized >= 0.5) as i64)
    }

    fn scan_string(&self, text: &str) -> Option<Value> {
        match formatted_value(self, text) {
            Some(scanned) => scanned,
            None => match text.trim() {
                "on" | "true" => Some(Value::Int(1)),
                "off" | "false" => Some(Value::Int(0)),
                _ => Some(Value::parse(text))
                    .filter(Value::is_numeric)
                    .map(|value| Value::Int((value.as_float() == 1.0) as i64)),
            },
        }
    }
}

impl Drop for ToggleParam {
    fn drop(&mut self) {
        self.core.destroyed(&*self);
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        parameter::{FnFormatter, ParameterState},
        signal::{self, MessageId},
        testing::{RecordingController, RecordingObserver},
    };

    #[test]
    fn set_value_bounds_and_notifies() {
        signal::flush();
        let controller = RecordingController::new();
        let observer = RecordingObserver::new();
        let param = ToggleParam::new("mute").into_shared();
        param.connect(controller.weak(), 7);
        param.add_observer(observer.weak());

        param.set_value(Value::Int(5), false);
        assert_eq!(param.value(), Value::Int(1));
        assert!(controller.changed.borrow().is_empty());
        // observers are notified deferred only
        assert!(observer.messages.borrow().is_empty());
        signal::flush();
        assert_eq!(observer.ids(), vec![MessageId::Changed]);

        param.set_value(Value::Int(-3), true);
        assert_eq!(param.value(), Value::Int(0));
        assert_eq!(*controller.changed.borrow(), vec![(7, Value::Int(0))]);

        // unchanged values don't notify
        observer.clear();
        param.set_value(Value::Int(0), true);
        signal::flush();
        assert!(observer.messages.borrow().is_empty());
        assert_eq!(controller.changed.borrow().len(), 1);
    }

    #[test]
    fn signal_always_and_signal_first() {
        signal::flush();
        let controller = RecordingController::new();
        let param = ToggleParam::new("solo").into_shared();
        param.connect(controller.weak(), 1);

        param.set_state(ParameterState::SignalAlways, true);
        param.set_value(Value::Int(0), true);
        assert_eq!(controller.changed_values(), vec![Value::Int(0)]);

        controller.clear();
        param.set_state(ParameterState::SignalFirst, true);
        param.set_value(Value::Int(1), true);
        // old value first, then the new one
        assert_eq!(controller.changed_values(), vec![Value::Int(0), Value::Int(1)]);

        controller.clear();
        param.set_state(ParameterState::SignalFirst, false);
        param.set_state(ParameterState::CanUndo, true);
        param.begin_edit();
        param.set_value(Value::Int(0), true);
        param.end_edit();
        // no undo snapshot while editing
        assert_eq!(controller.changed_values(), vec![Value::Int(0)]);
        assert_eq!(*controller.edits.borrow(), vec![(1, true), (1, false)]);
    }

    #[test]
    fn increment_flips() {
        let param = ToggleParam::new("bypass").into_shared();
        param.increment();
        assert!(param.is_on());
        param.increment();
        assert!(!param.is_on());
        param.decrement();
        assert!(param.is_on());
        assert_eq!(param.precision(), 1);
        assert_eq!(param.normalized(), 1.0);
        param.set_normalized(0.4, false);
        assert!(!param.is_on());
    }

    #[test]
    fn strings() {
        let param = ToggleParam::new("enabled").with_default(true).into_shared();
        assert_eq!(param.value_string(), "1");
        param.set_string("0", false);
        assert!(!param.is_on());
        param.set_string("on", false);
        assert!(param.is_on());
        param.set_string("false", false);
        assert!(!param.is_on());
        param.set_string("1", false);
        assert!(param.is_on());

        // unknown text leaves the state untouched
        assert_eq!(param.scan_string("garbage"), None);
        param.set_string("garbage", false);
        assert!(param.is_on());

        param.set_formatter(Some(Rc::new(FnFormatter::new(
            |value| (if value.as_bool() { "On" } else { "Off" }).to_string(),
            |text| Some(Value::Int((text == "On") as i64)),
        ))));
        assert_eq!(param.value_string(), "On");
        param.set_string("Off", false);
        assert_eq!(param.value_string(), "Off");
        param.reset_value(false);
        assert!(param.is_on());
    }

    #[test]
    fn feedback_notifies_controller_synchronously() {
        signal::flush();
        let controller = RecordingController::new();
        let param = ToggleParam::new("link").into_shared();
        param.connect(controller.weak(), 3);
        param.set_state(ParameterState::Feedback, true);
        param.set_value(Value::Int(1), false);
        assert_eq!(*controller.notified.borrow(), vec![(3, MessageId::Changed)]);
        assert!(controller.changed.borrow().is_empty());
    }

    #[test]
    fn destroy_notification() {
        let observer = RecordingObserver::new();
        let param = ToggleParam::new("temp").into_shared();
        param.add_observer(observer.weak());
        param.set_value(Value::Int(1), false);
        drop(param);
        assert_eq!(observer.ids(), vec![MessageId::Destroyed]);
        // pending change of the dropped param is discarded
        signal::flush();
        assert_eq!(observer.ids(), vec![MessageId::Destroyed]);
    }
}
