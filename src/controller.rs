//! Controller callbacks and the global command dispatcher.

use std::{cell::RefCell, fmt, rc::Rc};

use crate::{parameter::Parameter, signal::Message, value::ObjectRef};

// -------------------------------------------------------------------------------------------------

/// Receives synchronous callbacks from the parameters it's connected to.
///
/// Parameters only hold a weak reference to their controller: a controller which gets dropped
/// simply stops receiving callbacks. Callbacks may freely read or modify the calling parameter.
pub trait Controller {
    /// Called after a parameter's value got committed with `update = true`, and before the
    /// commit when the parameter wants its controller to see the old state first.
    /// Returns true when the change got handled.
    fn param_changed(&self, param: &dyn Parameter) -> bool;

    /// Called when a user edit session starts (`begin = true`) or ends.
    fn param_edit(&self, _param: &dyn Parameter, _begin: bool) {}

    /// Synchronous notifications for parameters with the feedback state set.
    fn param_notify(&self, _param: &dyn Parameter, _message: &Message) {}

    /// Command handling for command parameters. Return `None` when the controller doesn't
    /// handle commands at all, so the global [`CommandDispatcher`] gets asked instead.
    fn interpret_command(&self, _command: &CommandMsg) -> Option<bool> {
        None
    }

    /// Resolve the object which represents the given parameter in e.g. drag and drop operations.
    fn resolve_identity(&self, _param: &dyn Parameter) -> Option<ObjectRef> {
        None
    }
}

// -------------------------------------------------------------------------------------------------

/// A command invocation, as sent by command parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMsg {
    pub category: String,
    pub name: String,
    /// When set, only probe if the command could run, without running it.
    pub check_only: bool,
}

impl CommandMsg {
    pub fn new<C: Into<String>, N: Into<String>>(category: C, name: N) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
            check_only: false,
        }
    }

    pub fn with_check_only(mut self, check_only: bool) -> Self {
        self.check_only = check_only;
        self
    }
}

impl fmt::Display for CommandMsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.category, self.name)
    }
}

// -------------------------------------------------------------------------------------------------

/// Application wide command handler, used by command parameters which are not connected to a
/// controller that handles commands.
pub trait CommandDispatcher {
    fn interpret_command(&self, command: &CommandMsg) -> bool;
}

thread_local! {
    static DISPATCHER: RefCell<Option<Rc<dyn CommandDispatcher>>> = const { RefCell::new(None) };
}

/// Install or remove the global command dispatcher of the current thread.
pub fn set_command_dispatcher(dispatcher: Option<Rc<dyn CommandDispatcher>>) {
    DISPATCHER.with(|d| *d.borrow_mut() = dispatcher);
}

/// Access the global command dispatcher of the current thread, if any.
pub fn command_dispatcher() -> Option<Rc<dyn CommandDispatcher>> {
    DISPATCHER.with(|d| d.borrow().clone())
}
