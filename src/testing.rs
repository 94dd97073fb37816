//! Recording controllers and observers for unit tests.

use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use crate::{
    controller::{CommandMsg, Controller},
    parameter::Parameter,
    signal::{Message, MessageId, Observer},
    value::{ObjectRef, Value},
};

// -------------------------------------------------------------------------------------------------

/// Records all controller callbacks.
#[derive(Default)]
pub struct RecordingController {
    pub changed: RefCell<Vec<(i32, Value)>>,
    pub edits: RefCell<Vec<(i32, bool)>>,
    pub notified: RefCell<Vec<(i32, MessageId)>>,
    pub commands: RefCell<Vec<CommandMsg>>,
    /// When set, the controller handles commands with the given result.
    pub command_result: Cell<Option<bool>>,
    /// Object returned from identity requests.
    pub identity: RefCell<Option<ObjectRef>>,
}

impl RecordingController {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn weak(self: &Rc<Self>) -> Option<Weak<dyn Controller>> {
        let weak: Weak<dyn Controller> = Rc::downgrade(self) as Weak<dyn Controller>;
        Some(weak)
    }

    pub fn changed_values(&self) -> Vec<Value> {
        self.changed.borrow().iter().map(|(_, v)| v.clone()).collect()
    }

    pub fn clear(&self) {
        self.changed.borrow_mut().clear();
        self.edits.borrow_mut().clear();
        self.notified.borrow_mut().clear();
        self.commands.borrow_mut().clear();
    }
}

impl Controller for RecordingController {
    fn param_changed(&self, param: &dyn Parameter) -> bool {
        self.changed.borrow_mut().push((param.tag(), param.value()));
        true
    }

    fn param_edit(&self, param: &dyn Parameter, begin: bool) {
        self.edits.borrow_mut().push((param.tag(), begin));
    }

    fn param_notify(&self, param: &dyn Parameter, message: &Message) {
        self.notified
            .borrow_mut()
            .push((param.tag(), message.id.clone()));
    }

    fn interpret_command(&self, command: &CommandMsg) -> Option<bool> {
        let result = self.command_result.get()?;
        self.commands.borrow_mut().push(command.clone());
        Some(result)
    }

    fn resolve_identity(&self, _param: &dyn Parameter) -> Option<ObjectRef> {
        self.identity.borrow().clone()
    }
}

// -------------------------------------------------------------------------------------------------

/// Records all received notifications as `(subject name, message)`.
#[derive(Default)]
pub struct RecordingObserver {
    pub messages: RefCell<Vec<(String, Message)>>,
}

impl RecordingObserver {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn weak(self: &Rc<Self>) -> Weak<dyn Observer> {
        Rc::downgrade(self) as Weak<dyn Observer>
    }

    pub fn ids(&self) -> Vec<MessageId> {
        self.messages
            .borrow()
            .iter()
            .map(|(_, m)| m.id.clone())
            .collect()
    }

    pub fn count(&self, id: MessageId) -> usize {
        self.messages
            .borrow()
            .iter()
            .filter(|(_, m)| m.id == id)
            .count()
    }

    pub fn clear(&self) {
        self.messages.borrow_mut().clear();
    }
}

impl Observer for RecordingObserver {
    fn notify(&self, subject: &dyn Parameter, message: &Message) {
        self.messages
            .borrow_mut()
            .push((subject.name(), message.clone()));
    }
}

// -------------------------------------------------------------------------------------------------

/// Route log output of tests to stderr. Only the first call installs the logger.
pub fn create_logger() {
    let _ = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Debug)
        .init();
}
