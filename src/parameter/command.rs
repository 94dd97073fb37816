use std::{
    any::Any,
    cell::{Cell, RefCell},
    rc::Rc,
};

use super::{Parameter, ParameterCore, ParameterRef, ParameterType};
use crate::{
    controller::{self, CommandMsg},
    signal,
    value::Value,
};

// -------------------------------------------------------------------------------------------------

/// A parameter which triggers a command instead of holding a value.
///
/// Committing a value with `update` set runs the command, then resets the value to `min`.
/// Commands are handed to the connected controller. When the controller doesn't handle commands,
/// they are passed on to the thread's global [`CommandDispatcher`](crate::CommandDispatcher).
#[derive(Debug)]
pub struct CommandParam {
    core: ParameterCore,
    value: Cell<bool>,
    category: RefCell<String>,
    command: RefCell<String>,
}

impl CommandParam {
    pub fn new(name: &str, category: &str, command: &str) -> Self {
        let core = ParameterCore::new(name);
        core.set_default_value(Value::Int(0));
        Self {
            core,
            value: Cell::new(false),
            category: RefCell::new(category.to_string()),
            command: RefCell::new(command.to_string()),
        }
    }

    pub fn command_category(&self) -> String {
        self.category.borrow().clone()
    }

    pub fn command_name(&self) -> String {
        self.command.borrow().clone()
    }

    pub fn set_command(&self, category: &str, name: &str) {
        *self.category.borrow_mut() = category.to_string();
        *self.command.borrow_mut() = name.to_string();
    }

    /// The command message this parameter sends.
    pub fn command_msg(&self) -> CommandMsg {
        CommandMsg::new(self.command_category(), self.command_name())
    }

    /// Ask whether the command currently can be executed and enable or disable the parameter
    /// accordingly.
    pub fn check_enabled(&self) -> bool {
        let state = self.interpret(true);
        self.enable(state);
        state
    }

    /// Run or probe the command. Commands that go to the global dispatcher run deferred and are
    /// assumed to succeed.
    pub fn interpret(&self, check_only: bool) -> bool {
        let msg = self.command_msg().with_check_only(check_only);
        if let Some(result) = self
            .controller()
            .and_then(|controller| controller.interpret_command(&msg))
        {
            return result;
        }
        if check_only {
            controller::command_dispatcher()
                .is_some_and(|dispatcher| dispatcher.interpret_command(&msg))
        } else {
            signal::post(move || match controller::command_dispatcher() {
                Some(dispatcher) => {
                    if !dispatcher.interpret_command(&msg) {
                        log::warn!("Command '{msg}' was not handled");
                    }
                }
                None => log::warn!("No command dispatcher to handle '{msg}'"),
            });
            true
        }
    }
}

impl Parameter for CommandParam {
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
        ParameterType::Command
    }

    fn value(&self) -> Value {
        Value::Int(self.value.get() as i64)
    }

    fn set_value(&self, value: Value, update: bool) {
        let on = value.as_int().clamp(0, 1) != 0;
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
            category: RefCell::new(self.command_category()),
            command: RefCell::new(self.command_name()),
        }
        .into_shared()
    }

    fn bound_value(&self, value: Value) -> Value {
        Value::Int(value.as_int().clamp(0, 1))
    }

    fn value_plain(&self, normalized: f64) -> Value {
        Value::Int((normalized >= 0.5) as i64)
    }

    fn increment(&self) {
        self.set_value(self.max(), true);
    }

    fn perform_update(&self) {
        self.interpret(false);
        // commands don't toggle
        self.set_value(self.min(), false);
    }
}

impl Drop for CommandParam {
    fn drop(&mut self) {
        self.core.destroyed(&*self);
    }
}

// -------------------------------------------------------------------------------------------------
