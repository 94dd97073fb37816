//! Observable parameter values, their typed variants and normalization helpers.

use std::{
    any::Any,
    fmt::{self, Debug},
    rc::{Rc, Weak},
};

use crate::{
    controller::Controller,
    signal::{Message, Observer},
    value::{ObjectRef, Value},
};

// -------------------------------------------------------------------------------------------------

/// Shared reference to a type erased parameter.
pub type ParameterRef = Rc<dyn Parameter>;

// -------------------------------------------------------------------------------------------------

/// Describes the type of a [`Parameter`] to e.g. select a proper visual representation in a UI.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum ParameterType {
    /// An on/off switch.
    Toggle,
    /// A discrete integer value.
    Integer,
    /// A continuous floating-point value.
    Float,
    /// Free text.
    String,
    /// An index into a list of entries.
    List,
    /// A packed RGBA color.
    Color,
    /// A shared image resource.
    Image,
    /// A shared text model.
    TextModel,
    /// A command trigger.
    Command,
    /// A scroll position with a page size.
    Scroll,
}

// -------------------------------------------------------------------------------------------------

/// Boolean states of a [`Parameter`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum ParameterState {
    /// Notify the controller with the old value before committing a new one.
    SignalFirst,
    /// Notify even when a new value equals the current one.
    SignalAlways,
    /// The value is centered around the middle of its range.
    Bipolar,
    /// Display range is flipped.
    Reverse,
    /// The value is not representable, e.g. an unbound alias.
    OutOfRange,
    /// Increment and decrement wrap around at the range bounds.
    WrapAround,
    /// Included in persistence.
    Storable,
    /// Persist a list's selected value instead of its index.
    StoreListValue,
    /// Visible to external automation and scripting.
    Public,
    /// Range or entries may be changed by the user.
    Mutable,
    /// Not editable by the user.
    ReadOnly,
    /// Deliver change notifications synchronously to the controller too.
    Feedback,
    /// The controller records undo steps for this parameter.
    CanUndo,
    /// An edit session is in progress.
    Editing,
    /// Disabled in UIs.
    Disabled,
}

impl ParameterState {
    const fn bit(self) -> u32 {
        1 << self as u32
    }

    /// Only these states change how a value is presented, so toggling them notifies observers.
    pub fn affects_presentation(self) -> bool {
        matches!(
            self,
            ParameterState::Bipolar | ParameterState::Reverse | ParameterState::OutOfRange
        )
    }
}

/// Typed bitset of [`ParameterState`]s.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ParameterStates(u32);

impl ParameterStates {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn contains(&self, state: ParameterState) -> bool {
        self.0 & state.bit() != 0
    }

    pub fn set(&mut self, state: ParameterState, on: bool) {
        if on {
            self.0 |= state.bit();
        } else {
            self.0 &= !state.bit();
        }
    }

    pub fn with(mut self, state: ParameterState, on: bool) -> Self {
        self.set(state, on);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = ParameterState> + '_ {
        use strum::IntoEnumIterator;
        ParameterState::iter().filter(|state| self.contains(*state))
    }
}

impl Debug for ParameterStates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<ParameterState> for ParameterStates {
    fn from_iter<T: IntoIterator<Item = ParameterState>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Self::empty(), |states, state| states.with(state, true))
    }
}

// -------------------------------------------------------------------------------------------------

/// A bindable, observable value, the common interface of all typed parameters and aliases.
///
/// Parameters are shared via [`ParameterRef`]s and use interior mutability, so all methods take
/// `&self`. They are meant to be used from a single thread only: controllers and observers may
/// re-enter the parameter while being called back.
///
/// Plain values are the values in the parameter's own domain, `min..=max`. Normalized values
/// are linear `0.0..=1.0` positions within that range. Curves are not applied here: see
/// [`NormalizedValue`] for display positions which honor curves, reversal and bipolar ranges.
pub trait Parameter: Debug {
    /// Access to the shared parameter state.
    fn core(&self) -> &ParameterCore;

    /// Self as type erased parameter.
    fn as_parameter(&self) -> &dyn Parameter;

    /// Self as [`Any`], to downcast to concrete types.
    fn as_any(&self) -> &dyn Any;

    /// Shared self as [`Any`], to downcast shared refs to concrete types.
    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;

    /// The parameter's type.
    fn parameter_type(&self) -> ParameterType;

    /// The current plain value.
    fn value(&self) -> Value;

    /// Bound and set a new plain value. With `update` set, the connected controller is notified
    /// synchronously. Observers always get a deferred `Changed` notification when the value
    /// changed or when [`ParameterState::SignalAlways`] is set.
    fn set_value(&self, value: Value, update: bool);

    fn min(&self) -> Value;
    fn max(&self) -> Value;

    /// Create an independent copy of this parameter, with the same range, value, states, curve
    /// and formatter, but without a controller and observers.
    fn clone_parameter(&self) -> ParameterRef;

    fn set_min(&self, _min: Value) {}
    fn set_max(&self, _max: Value) {}

    fn default_value(&self) -> Value {
        self.core().default_value()
    }

    fn set_default_value(&self, value: Value) {
        self.core().set_default_value(self.bound_value(value));
    }

    /// Clamp the given value into the parameter's domain.
    fn bound_value(&self, value: Value) -> Value {
        value
    }

    /// Number of increment steps within the full range.
    fn precision(&self) -> i32 {
        1
    }

    /// Set number of increment steps. Returns false when the precision is not supported.
    fn set_precision(&self, precision: i32) -> bool {
        precision == 1
    }

    fn can_increment(&self) -> bool {
        true
    }

    fn increment(&self) {
        inc_dec_normalized(self.as_parameter(), 1);
    }

    fn decrement(&self) {
        inc_dec_normalized(self.as_parameter(), -1);
    }

    /// Linear `0.0..=1.0` position of the given plain value.
    fn value_normalized(&self, value: &Value) -> f64 {
        let min = self.min().as_float();
        let range = self.max().as_float() - min;
        if range > 0.0 {
            ((value.as_float() - min) / range).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Plain value at the given linear `0.0..=1.0` position.
    fn value_plain(&self, normalized: f64) -> Value {
        let min = self.min().as_float();
        let max = self.max().as_float();
        Value::Float(min + normalized.clamp(0.0, 1.0) * (max - min))
    }

    fn normalized(&self) -> f64 {
        self.value_normalized(&self.value())
    }

    fn set_normalized(&self, normalized: f64, update: bool) {
        self.set_value(self.value_plain(normalized.clamp(0.0, 1.0)), update);
    }

    /// Text representation of the given plain value.
    fn string_for(&self, value: &Value) -> String {
        formatted_string(self.as_parameter(), value).unwrap_or_else(|| value.to_string())
    }

    /// Text representation of the current value.
    fn value_string(&self) -> String {
        self.string_for(&self.value())
    }

    /// Convert text to a plain value. Returns `None` if the text can't be converted.
    fn scan_string(&self, text: &str) -> Option<Value> {
        match formatted_value(self.as_parameter(), text) {
            Some(scanned) => scanned,
            None => Some(Value::parse(text)).filter(Value::is_numeric),
        }
    }

    /// Set the value from text. Text which can't be converted is ignored.
    fn set_string(&self, text: &str, update: bool) {
        if let Some(value) = self.scan_string(text) {
            self.set_value(value, update);
        } else {
            log::warn!(
                "Ignoring invalid text '{}' for parameter '{}'",
                text,
                self.name()
            );
        }
    }

    /// Copy the value of another parameter: plain when both have the same range, else via the
    /// normalized value.
    fn take_value(&self, other: &dyn Parameter, update: bool) {
        if self.parameter_type() != ParameterType::String
            && (self.min() != other.min() || self.max() != other.max())
        {
            self.set_normalized(other.normalized(), update);
        } else {
            self.set_value(other.value(), update);
        }
    }

    /// Set the value to the default value.
    fn reset_value(&self, update: bool) {
        self.set_value(self.default_value(), update);
    }

    fn name(&self) -> String {
        self.core().name()
    }

    fn set_name(&self, name: &str) {
        self.core().set_name(name);
    }

    fn tag(&self) -> i32 {
        self.core().tag()
    }

    /// Connect a controller, which gets notified about changes with the given tag.
    fn connect(&self, controller: Option<Weak<dyn Controller>>, tag: i32) {
        self.core().connect(controller, tag);
    }

    fn controller(&self) -> Option<Rc<dyn Controller>> {
        self.core().controller()
    }

    fn is_enabled(&self) -> bool {
        !self.core().state(ParameterState::Disabled)
    }

    /// Enable or disable the parameter. Only affects presentation: disabled parameters can
    /// still be changed.
    fn enable(&self, state: bool) {
        if self.is_enabled() != state {
            self.core().set_state(ParameterState::Disabled, !state);
            self.defer_changed();
        }
    }

    fn state(&self, state: ParameterState) -> bool {
        self.core().state(state)
    }

    fn set_state(&self, state: ParameterState, on: bool) {
        if self.core().state(state) != on {
            self.core().set_state(state, on);
            if state.affects_presentation() {
                self.defer_changed();
            }
        }
    }

    fn visual_state(&self) -> i32 {
        self.core().visual_state()
    }

    fn set_visual_state(&self, state: i32) {
        if self.core().visual_state() != state {
            self.core().set_visual_state(state);
            self.defer_changed();
        }
    }

    fn is_editing(&self) -> bool {
        self.core().state(ParameterState::Editing)
    }

    fn begin_edit(&self) {
        self.core().edit(self.as_parameter(), true);
    }

    fn end_edit(&self) {
        self.core().edit(self.as_parameter(), false);
    }

    /// Notify the connected controller about the current value.
    fn perform_update(&self) {
        self.core().perform_update(self.as_parameter());
    }

    fn curve(&self) -> Option<Rc<dyn ParameterCurve>> {
        self.core().curve()
    }

    fn set_curve(&self, curve: Option<Rc<dyn ParameterCurve>>) {
        self.core().set_curve(curve);
    }

    fn formatter(&self) -> Option<Rc<dyn Formatter>> {
        self.core().formatter()
    }

    fn set_formatter(&self, formatter: Option<Rc<dyn Formatter>>) {
        self.core().set_formatter(formatter);
    }

    fn add_observer(&self, observer: Weak<dyn Observer>) {
        self.core().observers().add(observer);
    }

    fn remove_observer(&self, observer: &Weak<dyn Observer>) {
        self.core().observers().remove(observer);
    }

    /// Queue a message for the observers of this parameter.
    fn signal(&self, message: Message) {
        self.core().signal(self.as_parameter(), message);
    }

    /// Queue a `Changed` notification and notify the controller synchronously if the feedback
    /// state is set.
    fn defer_changed(&self) {
        self.core().defer_changed(self.as_parameter());
    }

    /// The parameter which actually holds the value: self for plain parameters, the bound
    /// original for aliases.
    fn original(&self) -> Option<ParameterRef> {
        self.core().this()
    }

    /// Object which represents this parameter in e.g. drag and drop operations.
    fn create_identity(&self) -> Option<ObjectRef> {
        self.controller()
            .and_then(|controller| controller.resolve_identity(self.as_parameter()))
    }

    fn as_list(&self) -> Option<&ListParam> {
        self.as_any().downcast_ref()
    }

    fn as_command(&self) -> Option<&CommandParam> {
        self.as_any().downcast_ref()
    }

    fn as_scroll(&self) -> Option<&ScrollParam> {
        self.as_any().downcast_ref()
    }

    fn as_color(&self) -> Option<&ColorParam> {
        self.as_any().downcast_ref()
    }

    /// Builder style [`Self::set_state`], for freshly created parameters.
    fn with_state(self, state: ParameterState, on: bool) -> Self
    where
        Self: Sized,
    {
        self.core().set_state(state, on);
        self
    }

    /// Builder style [`Self::set_curve`], for freshly created parameters.
    fn with_curve(self, curve: Rc<dyn ParameterCurve>) -> Self
    where
        Self: Sized,
    {
        self.set_curve(Some(curve));
        self
    }

    /// Builder style [`Self::set_formatter`], for freshly created parameters.
    fn with_formatter(self, formatter: Rc<dyn Formatter>) -> Self
    where
        Self: Sized,
    {
        self.set_formatter(Some(formatter));
        self
    }

    /// Wrap the parameter into a shared ref, which is required to get deferred notifications
    /// delivered.
    fn into_shared(self) -> Rc<Self>
    where
        Self: Sized + 'static,
    {
        let shared = Rc::new(self);
        let this: Weak<dyn Parameter> = Rc::downgrade(&shared) as Weak<dyn Parameter>;
        shared.core().bind(this);
        shared
    }
}

/// Print a value with the parameter's formatter. `None` when there's no formatter.
pub(crate) fn formatted_string(param: &dyn Parameter, value: &Value) -> Option<String> {
    let formatter = param.formatter()?;
    if formatter.is_normalized() {
        Some(formatter.print_string(&Value::Float(param.value_normalized(value))))
    } else {
        Some(formatter.print_string(value))
    }
}

/// Scan text with the parameter's formatter. `None` when there's no formatter, `Some(None)`
/// when the formatter rejected the text.
pub(crate) fn formatted_value(param: &dyn Parameter, text: &str) -> Option<Option<Value>> {
    let formatter = param.formatter()?;
    let scanned = formatter.scan_string(text);
    if formatter.is_normalized() {
        Some(scanned.map(|value| param.value_plain(value.as_float())))
    } else {
        Some(scanned)
    }
}

/// True when both refer to the same parameter instance.
pub fn same_parameter(a: &dyn Parameter, b: &dyn Parameter) -> bool {
    a as *const dyn Parameter as *const () == b as *const dyn Parameter as *const ()
}

/// Downcast a shared parameter ref to its concrete type.
pub fn downcast_parameter<P: Parameter + 'static>(param: ParameterRef) -> Option<Rc<P>> {
    param.into_any().downcast::<P>().ok()
}

// -------------------------------------------------------------------------------------------------

mod base;
pub use base::ParameterCore;

mod normalized;
pub use normalized::{inc_dec_normalized, NormalizedValue};

mod curve;
pub use curve::{
    create_curve, ConcaveCurve, ConvexCurve, CurveKind, InterpolatorCurve, ParameterCurve,
    RangeFunction, Scaling,
};

mod format;
pub use format::{
    FloatFormatter, FnFormatter, Formatter, IntFormatter, PercentFormatter, StringListFormatter,
};

mod toggle;
pub use toggle::ToggleParam;

mod integer;
pub use integer::IntParam;

mod float;
pub use float::FloatParam;

mod string;
pub use string::StringParam;

mod list;
pub use list::{ListEntry, ListParam};

mod color;
pub use color::{Color, ColorPalette, ColorParam};

mod provider;
pub use provider::{ImageProvider, TextModelProvider};

mod command;
pub use command::CommandParam;

mod scroll;
pub use scroll::ScrollParam;
