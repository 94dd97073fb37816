use std::{
    cell::{Cell, RefCell},
    fmt::{self, Debug},
    rc::{Rc, Weak},
};

use super::{Formatter, Parameter, ParameterCurve, ParameterState, ParameterStates};
use crate::{
    controller::Controller,
    signal::{self, Message, MessageId, ObserverList},
    value::Value,
};

// -------------------------------------------------------------------------------------------------

/// State and notification plumbing which is shared by all parameter types: name, tag, states,
/// the controller connection, curve, formatter and observers.
pub struct ParameterCore {
    name: RefCell<String>,
    tag: Cell<i32>,
    states: Cell<ParameterStates>,
    visual_state: Cell<i32>,
    default_value: RefCell<Value>,
    controller: RefCell<Option<Weak<dyn Controller>>>,
    curve: RefCell<Option<Rc<dyn ParameterCurve>>>,
    formatter: RefCell<Option<Rc<dyn Formatter>>>,
    observers: ObserverList,
    this: RefCell<Option<Weak<dyn Parameter>>>,
}

impl Debug for ParameterCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterCore")
            .field("name", &self.name.borrow())
            .field("tag", &self.tag.get())
            .field("states", &self.states.get())
            .field("controller", &self.controller().is_some())
            .field("curve", &self.curve.borrow().is_some())
            .field("formatter", &self.formatter.borrow().is_some())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl ParameterCore {
    /// New storable and public core with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: RefCell::new(name.to_string()),
            tag: Cell::new(0),
            states: Cell::new(
                ParameterStates::empty()
                    .with(ParameterState::Storable, true)
                    .with(ParameterState::Public, true),
            ),
            visual_state: Cell::new(0),
            default_value: RefCell::new(Value::Empty),
            controller: RefCell::new(None),
            curve: RefCell::new(None),
            formatter: RefCell::new(None),
            observers: ObserverList::new(),
            this: RefCell::new(None),
        }
    }

    /// Copy of this core for cloned parameters: no controller, observers or edit state.
    pub fn duplicate(&self) -> Self {
        let core = Self::new(&self.name());
        core.tag.set(self.tag());
        core.states
            .set(self.states().with(ParameterState::Editing, false));
        core.visual_state.set(self.visual_state());
        *core.default_value.borrow_mut() = self.default_value();
        *core.curve.borrow_mut() = self.curve();
        *core.formatter.borrow_mut() = self.formatter();
        core
    }

    pub fn name(&self) -> String {
        self.name.borrow().clone()
    }

    pub fn set_name(&self, name: &str) {
        *self.name.borrow_mut() = name.to_string();
    }

    pub fn tag(&self) -> i32 {
        self.tag.get()
    }

    pub fn set_tag(&self, tag: i32) {
        self.tag.set(tag);
    }

    pub fn states(&self) -> ParameterStates {
        self.states.get()
    }

    pub fn state(&self, state: ParameterState) -> bool {
        self.states.get().contains(state)
    }

    /// Raw state change, without any notifications.
    pub fn set_state(&self, state: ParameterState, on: bool) {
        self.states.set(self.states.get().with(state, on));
    }

    pub fn visual_state(&self) -> i32 {
        self.visual_state.get()
    }

    pub fn set_visual_state(&self, state: i32) {
        self.visual_state.set(state);
    }

    pub fn default_value(&self) -> Value {
        self.default_value.borrow().clone()
    }

    pub fn set_default_value(&self, value: Value) {
        *self.default_value.borrow_mut() = value;
    }

    pub fn connect(&self, controller: Option<Weak<dyn Controller>>, tag: i32) {
        *self.controller.borrow_mut() = controller;
        self.tag.set(tag);
    }

    pub fn controller(&self) -> Option<Rc<dyn Controller>> {
        self.controller.borrow().as_ref().and_then(Weak::upgrade)
    }

    pub fn curve(&self) -> Option<Rc<dyn ParameterCurve>> {
        self.curve.borrow().clone()
    }

    pub fn set_curve(&self, curve: Option<Rc<dyn ParameterCurve>>) {
        *self.curve.borrow_mut() = curve;
    }

    pub fn formatter(&self) -> Option<Rc<dyn Formatter>> {
        self.formatter.borrow().clone()
    }

    pub fn set_formatter(&self, formatter: Option<Rc<dyn Formatter>>) {
        *self.formatter.borrow_mut() = formatter;
    }

    pub fn observers(&self) -> &ObserverList {
        &self.observers
    }

    /// The shared parameter which owns this core, if it got shared via `into_shared`.
    pub fn this(&self) -> Option<Rc<dyn Parameter>> {
        self.this.borrow().as_ref().and_then(Weak::upgrade)
    }

    pub(crate) fn bind(&self, this: Weak<dyn Parameter>) {
        *self.this.borrow_mut() = Some(this);
    }

    // ---------------------------------------------------------------------------------------------

    /// Queue a message for the observers. Parameters which are not shared can't be referred to
    /// later on, so their observers get notified right away.
    pub fn signal(&self, subject: &dyn Parameter, message: Message) {
        let this = self.this.borrow().clone();
        match this {
            Some(this) => signal::defer(this, message),
            None => self.observers.notify(subject, &message),
        }
    }

    pub fn defer_changed(&self, subject: &dyn Parameter) {
        self.feedback(subject, MessageId::Changed);
        self.signal(subject, Message::new(MessageId::Changed));
    }

    pub fn range_changed(&self, subject: &dyn Parameter) {
        self.feedback(subject, MessageId::RangeChanged);
        self.signal(subject, Message::new(MessageId::RangeChanged));
    }

    fn feedback(&self, subject: &dyn Parameter, id: MessageId) {
        if self.state(ParameterState::Feedback) {
            if let Some(controller) = self.controller() {
                controller.param_notify(subject, &Message::new(id));
            }
        }
    }

    /// Synchronous destroy notification, sent while the owning parameter gets dropped.
    pub fn destroyed(&self, subject: &dyn Parameter) {
        self.observers
            .notify(subject, &Message::new(MessageId::Destroyed));
    }

    /// Notify the controller about the subject's current value.
    pub fn perform_update(&self, subject: &dyn Parameter) {
        if let Some(controller) = self.controller() {
            controller.param_changed(subject);
        }
    }

    /// Give the controller a chance to look at the old value before it gets replaced. This
    /// only notifies the controller and never runs a subject's own update action.
    pub fn check_signal_first(&self, subject: &dyn Parameter) {
        if self.state(ParameterState::SignalFirst)
            || (self.state(ParameterState::CanUndo) && !self.state(ParameterState::Editing))
        {
            self.perform_update(subject);
        }
    }

    pub fn edit(&self, subject: &dyn Parameter, begin: bool) {
        self.set_state(ParameterState::Editing, begin);
        if let Some(controller) = self.controller() {
            controller.param_edit(subject, begin);
        }
        let id = if begin {
            MessageId::BeginEdit
        } else {
            MessageId::EndEdit
        };
        self.signal(subject, Message::new(id));
    }

    /// Shared value commit protocol of all parameter types. `apply` stores the new, already
    /// bounded value and only gets called when the value changed.
    pub fn commit<F: FnOnce()>(&self, subject: &dyn Parameter, changed: bool, update: bool, apply: F) {
        if changed {
            if update {
                self.check_signal_first(subject);
            }
            apply();
            self.defer_changed(subject);
            if update {
                subject.perform_update();
            }
        } else if self.state(ParameterState::SignalAlways) {
            self.defer_changed(subject);
            if update {
                subject.perform_update();
            }
        }
    }
}
