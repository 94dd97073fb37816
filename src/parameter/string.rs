use std::{any::Any, cell::RefCell, rc::Rc};

use super::{formatted_string, Parameter, ParameterCore, ParameterRef, ParameterType};
use crate::value::Value;

// -------------------------------------------------------------------------------------------------

/// A free text parameter. Has no numeric range and can't be incremented.
#[derive(Debug)]
pub struct StringParam {
    core: ParameterCore,
    value: RefCell<String>,
}

impl StringParam {
    pub fn new(name: &str) -> Self {
        let core = ParameterCore::new(name);
        core.set_default_value(Value::String(String::new()));
        Self {
            core,
            value: RefCell::new(String::new()),
        }
    }

    /// Set the initial and default text.
    pub fn with_default<S: Into<String>>(self, text: S) -> Self {
        let text = text.into();
        self.core.set_default_value(Value::String(text.clone()));
        *self.value.borrow_mut() = text;
        self
    }

    pub fn text(&self) -> String {
        self.value.borrow().clone()
    }
}

impl Parameter for StringParam {
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
        ParameterType::String
    }

    fn value(&self) -> Value {
        Value::String(self.text())
    }

    fn set_value(&self, value: Value, update: bool) {
        match value {
            Value::String(text) => {
                let changed = *self.value.borrow() != text;
                self.core.commit(self, changed, update, || {
                    *self.value.borrow_mut() = text;
                });
            }
            other => {
                log::warn!(
                    "Invalid value type '{}' for string parameter '{}'",
                    other.kind_name(),
                    self.name()
                );
            }
        }
    }

    fn min(&self) -> Value {
        Value::String(String::new())
    }

    fn max(&self) -> Value {
        self.min()
    }

    fn set_default_value(&self, value: Value) {
        self.core.set_default_value(Value::String(value.to_string()));
    }

    fn clone_parameter(&self) -> ParameterRef {
        Self {
            core: self.core.duplicate(),
            value: RefCell::new(self.text()),
        }
        .into_shared()
    }

    fn can_increment(&self) -> bool {
        false
    }

    fn increment(&self) {}

    fn decrement(&self) {}

    fn value_normalized(&self, _value: &Value) -> f64 {
        0.0
    }

    fn value_plain(&self, _normalized: f64) -> Value {
        self.value()
    }

    fn set_normalized(&self, _normalized: f64, _update: bool) {}

    fn string_for(&self, value: &Value) -> String {
        formatted_string(self, value).unwrap_or_else(|| value.to_string())
    }

    fn scan_string(&self, text: &str) -> Option<Value> {
        Some(Value::String(text.to_string()))
    }
}

impl Drop for StringParam {
    fn drop(&mut self) {
        self.core.destroyed(&*self);
    }
}

// -------------------------------------------------------------------------------------------------
