//! A parameter facade which forwards to a rebindable original parameter.

use std::{
    any::Any,
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use crate::{
    parameter::{
        formatted_string, formatted_value, Formatter, Parameter, ParameterCore, ParameterCurve,
        ParameterRef, ParameterState, ParameterType,
    },
    signal::{Message, MessageId, Observer},
    value::{ObjectRef, Value},
};

// -------------------------------------------------------------------------------------------------

/// The original an alias currently forwards to.
#[derive(Debug, Clone, Default)]
enum Binding {
    #[default]
    Disconnected,
    Bound(Weak<dyn Parameter>),
}

impl Binding {
    fn original(&self) -> Option<ParameterRef> {
        match self {
            Binding::Disconnected => None,
            Binding::Bound(original) => original.upgrade(),
        }
    }

    fn is(&self, param: &dyn Parameter) -> bool {
        match self {
            Binding::Disconnected => false,
            Binding::Bound(original) => {
                original.as_ptr() as *const () == param as *const dyn Parameter as *const ()
            }
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// A parameter which has no value on its own, but forwards everything to an original parameter.
///
/// The original can be exchanged at any time, or removed. Without an original, the alias reports
/// a neutral value, is out of range and disabled, and ignores all modifications.
///
/// Name, tag, controller and the storable, public and feedback states belong to the alias. Value,
/// range, curve, formatter and all other states are the original's. The alias observes its
/// original and re-broadcasts the original's notifications to its own observers. When the original
/// gets dropped, the alias unbinds itself and signals [`MessageId::OriginalDestroyed`].
#[derive(Debug)]
pub struct AliasParam {
    core: ParameterCore,
    binding: RefCell<Binding>,
    param_type: Cell<Option<ParameterType>>,
    explicit_identity: Cell<bool>,
    explicit_formatter: Cell<bool>,
    me: Weak<AliasParam>,
}

impl AliasParam {
    /// Create a new, unbound and already shared alias.
    pub fn new(name: &str) -> Rc<Self> {
        Rc::new_cyclic(|me: &Weak<AliasParam>| {
            let core = ParameterCore::new(name);
            core.bind(me.clone() as Weak<dyn Parameter>);
            Self {
                core,
                binding: RefCell::new(Binding::Disconnected),
                param_type: Cell::new(None),
                explicit_identity: Cell::new(false),
                explicit_formatter: Cell::new(false),
                me: me.clone(),
            }
        })
    }

    /// Report the given type instead of the original's type.
    pub fn with_type(self: Rc<Self>, param_type: ParameterType) -> Rc<Self> {
        self.param_type.set(Some(param_type));
        self
    }

    /// The directly bound parameter, which may be another alias.
    pub fn bound(&self) -> Option<ParameterRef> {
        self.binding.borrow().original()
    }

    pub fn is_bound(&self) -> bool {
        self.bound().is_some()
    }

    /// Bind the alias to another original, or unbind it with `None`.
    pub fn set_original(&self, original: Option<ParameterRef>) {
        if let Some(original) = &original {
            if Rc::as_ptr(original) as *const () == self as *const Self as *const () {
                log::warn!("Can't bind alias '{}' to itself", self.name());
                return;
            }
            if self.binding.borrow().is(original.as_ref()) {
                return;
            }
        } else if !self.is_bound() {
            return;
        }

        let observer = self.me.clone() as Weak<dyn Observer>;
        if let Some(previous) = self.bound() {
            previous.remove_observer(&observer);
        }
        *self.binding.borrow_mut() = match &original {
            Some(original) => {
                original.add_observer(observer);
                Binding::Bound(Rc::downgrade(original))
            }
            None => Binding::Disconnected,
        };
        log::debug!(
            "Alias '{}' now forwards to '{}'",
            self.name(),
            original.map(|original| original.name()).unwrap_or_default()
        );

        self.forward(&Message::new(MessageId::OriginalChanged));
    }

    /// When set, the alias itself, instead of the original, is the identity of drag and drop
    /// operations.
    pub fn set_explicit_identity(&self, state: bool) {
        self.explicit_identity.set(state);
    }

    pub fn has_explicit_identity(&self) -> bool {
        self.explicit_identity.get()
    }

    /// When set, the alias uses its own formatter for text conversions while all numeric
    /// operations still go to the original.
    pub fn set_explicit_formatter(&self, state: bool) {
        self.explicit_formatter.set(state);
    }

    pub fn has_explicit_formatter(&self) -> bool {
        self.explicit_formatter.get()
    }

    /// Notify the own controller when feedback is enabled, then queue the message for the own
    /// observers.
    fn forward(&self, message: &Message) {
        if self.core.state(ParameterState::Feedback) {
            if let Some(controller) = self.core.controller() {
                controller.param_notify(self, message);
            }
        }
        self.core.signal(self, message.clone());
    }

    fn is_local_state(state: ParameterState) -> bool {
        matches!(
            state,
            ParameterState::Storable | ParameterState::Public | ParameterState::Feedback
        )
    }

    /// Own formatter, when the alias has an explicit formatter.
    fn own_formatter(&self) -> Option<Rc<dyn Formatter>> {
        if self.explicit_formatter.get() {
            self.core.formatter()
        } else {
            None
        }
    }
}

impl Observer for AliasParam {
    fn notify(&self, subject: &dyn Parameter, message: &Message) {
        if !self.binding.borrow().is(subject) {
            return;
        }
        if message.id == MessageId::Destroyed {
            // the original is being dropped: can't unsubscribe from it anymore
            *self.binding.borrow_mut() = Binding::Disconnected;
            log::debug!("Original of alias '{}' got destroyed", self.name());
            self.forward(&Message::new(MessageId::OriginalDestroyed));
        } else {
            self.forward(message);
        }
    }
}

impl Parameter for AliasParam {
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
        self.param_type.get().unwrap_or_else(|| {
            self.bound()
                .map(|original| original.parameter_type())
                .unwrap_or(ParameterType::Toggle)
        })
    }

    fn value(&self) -> Value {
        self.bound()
            .map(|original| original.value())
            .unwrap_or(Value::Int(0))
    }

    fn set_value(&self, value: Value, update: bool) {
        if let Some(original) = self.bound() {
            original.set_value(value, update);
        }
    }

    fn min(&self) -> Value {
        self.bound()
            .map(|original| original.min())
            .unwrap_or(Value::Int(0))
    }

    fn max(&self) -> Value {
        self.bound()
            .map(|original| original.max())
            .unwrap_or(Value::Int(-1))
    }

    fn clone_parameter(&self) -> ParameterRef {
        let alias = AliasParam::new(&self.name());
        alias.core.set_tag(self.tag());
        for state in [
            ParameterState::Storable,
            ParameterState::Public,
            ParameterState::Feedback,
        ] {
            alias.core.set_state(state, self.core.state(state));
        }
        alias.core.set_formatter(self.core.formatter());
        alias.param_type.set(self.param_type.get());
        alias.explicit_identity.set(self.explicit_identity.get());
        alias.explicit_formatter.set(self.explicit_formatter.get());
        if let Some(original) = self.bound() {
            *alias.binding.borrow_mut() = Binding::Bound(Rc::downgrade(&original));
            original.add_observer(alias.me.clone() as Weak<dyn Observer>);
        }
        alias
    }

    fn set_min(&self, min: Value) {
        if let Some(original) = self.bound() {
            original.set_min(min);
        }
    }

    fn set_max(&self, max: Value) {
        if let Some(original) = self.bound() {
            original.set_max(max);
        }
    }

    fn default_value(&self) -> Value {
        self.bound()
            .map(|original| original.default_value())
            .unwrap_or(Value::Int(0))
    }

    fn set_default_value(&self, value: Value) {
        if let Some(original) = self.bound() {
            original.set_default_value(value);
        }
    }

    fn bound_value(&self, value: Value) -> Value {
        self.bound()
            .map(|original| original.bound_value(value))
            .unwrap_or(Value::Int(0))
    }

    fn precision(&self) -> i32 {
        self.bound()
            .map(|original| original.precision())
            .unwrap_or(1)
    }

    fn set_precision(&self, precision: i32) -> bool {
        self.bound()
            .is_some_and(|original| original.set_precision(precision))
    }

    fn can_increment(&self) -> bool {
        self.bound()
            .is_some_and(|original| original.can_increment())
    }

    fn increment(&self) {
        if let Some(original) = self.bound() {
            original.increment();
        }
    }

    fn decrement(&self) {
        if let Some(original) = self.bound() {
            original.decrement();
        }
    }

    fn value_normalized(&self, value: &Value) -> f64 {
        self.bound()
            .map(|original| original.value_normalized(value))
            .unwrap_or(0.0)
    }

    fn value_plain(&self, normalized: f64) -> Value {
        self.bound()
            .map(|original| original.value_plain(normalized))
            .unwrap_or_default()
    }

    fn normalized(&self) -> f64 {
        self.bound()
            .map(|original| original.normalized())
            .unwrap_or(0.0)
    }

    fn set_normalized(&self, normalized: f64, update: bool) {
        if let Some(original) = self.bound() {
            original.set_normalized(normalized, update);
        }
    }

    fn string_for(&self, value: &Value) -> String {
        let Some(original) = self.bound() else {
            return String::new();
        };
        if self.own_formatter().is_some() {
            formatted_string(self, value).unwrap_or_default()
        } else {
            original.string_for(value)
        }
    }

    fn value_string(&self) -> String {
        let Some(original) = self.bound() else {
            return String::new();
        };
        if self.own_formatter().is_some() {
            self.string_for(&original.value())
        } else {
            original.value_string()
        }
    }

    fn scan_string(&self, text: &str) -> Option<Value> {
        let original = self.bound()?;
        if self.own_formatter().is_some() {
            formatted_value(self, text).flatten()
        } else {
            original.scan_string(text)
        }
    }

    fn set_string(&self, text: &str, update: bool) {
        let Some(original) = self.bound() else {
            return;
        };
        if self.own_formatter().is_some() {
            match formatted_value(self, text).flatten() {
                Some(value) => original.set_value(value, update),
                None => log::warn!(
                    "Ignoring invalid text '{}' for alias '{}'",
                    text,
                    self.name()
                ),
            }
        } else {
            original.set_string(text, update);
        }
    }

    fn take_value(&self, other: &dyn Parameter, update: bool) {
        if let Some(original) = self.bound() {
            original.take_value(other, update);
        }
    }

    fn is_enabled(&self) -> bool {
        self.bound()
            .is_some_and(|original| original.is_enabled())
    }

    fn enable(&self, state: bool) {
        if let Some(original) = self.bound() {
            original.enable(state);
        }
    }

    fn state(&self, state: ParameterState) -> bool {
        if Self::is_local_state(state) {
            return self.core.state(state);
        }
        match self.bound() {
            Some(original) => original.state(state),
            None => state == ParameterState::OutOfRange,
        }
    }

    fn set_state(&self, state: ParameterState, on: bool) {
        if Self::is_local_state(state) {
            self.core.set_state(state, on);
        } else if let Some(original) = self.bound() {
            original.set_state(state, on);
        }
    }

    fn visual_state(&self) -> i32 {
        self.bound()
            .map(|original| original.visual_state())
            .unwrap_or(0)
    }

    fn set_visual_state(&self, state: i32) {
        if let Some(original) = self.bound() {
            original.set_visual_state(state);
        }
    }

    fn is_editing(&self) -> bool {
        self.bound()
            .is_some_and(|original| original.is_editing())
    }

    fn begin_edit(&self) {
        if let Some(original) = self.bound() {
            original.begin_edit();
        }
    }

    fn end_edit(&self) {
        if let Some(original) = self.bound() {
            original.end_edit();
        }
    }

    fn perform_update(&self) {
        if let Some(original) = self.bound() {
            original.perform_update();
        }
    }

    fn curve(&self) -> Option<Rc<dyn ParameterCurve>> {
        self.bound().and_then(|original| original.curve())
    }

    fn set_curve(&self, curve: Option<Rc<dyn ParameterCurve>>) {
        if let Some(original) = self.bound() {
            original.set_curve(curve);
        }
    }

    fn formatter(&self) -> Option<Rc<dyn Formatter>> {
        if self.explicit_formatter.get() {
            self.core.formatter()
        } else {
            self.bound().and_then(|original| original.formatter())
        }
    }

    fn set_formatter(&self, formatter: Option<Rc<dyn Formatter>>) {
        if self.explicit_formatter.get() {
            self.core.set_formatter(formatter);
            self.defer_changed();
        } else if let Some(original) = self.bound() {
            original.set_formatter(formatter);
        }
    }

    fn original(&self) -> Option<ParameterRef> {
        self.bound().and_then(|original| original.original())
    }

    fn create_identity(&self) -> Option<ObjectRef> {
        if self.explicit_identity.get() {
            self.controller()
                .and_then(|controller| controller.resolve_identity(self))
        } else {
            self.bound()
                .and_then(|original| original.create_identity())
        }
    }
}

impl Drop for AliasParam {
    fn drop(&mut self) {
        if let Some(original) = self.bound() {
            original.remove_observer(&(self.me.clone() as Weak<dyn Observer>));
        }
        self.core.destroyed(&*self);
    }
}

// -------------------------------------------------------------------------------------------------
