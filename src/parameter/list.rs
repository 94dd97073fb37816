use std::{any::Any, cell::RefCell, rc::Rc};

use super::{
    formatted_string, formatted_value,
    integer::{apply_int_min, IntRange},
    Parameter, ParameterCore, ParameterRef, ParameterState, ParameterType,
};
use crate::value::{ObjectRef, Value};

// -------------------------------------------------------------------------------------------------

/// A single entry of a [`ListParam`].
#[derive(Debug, Clone)]
pub enum ListEntry {
    /// A text entry. Its value is the text itself.
    String(String),
    /// An arbitrary value with an optional display title.
    Value { value: Value, title: Option<String> },
    /// A shared object.
    Object(ObjectRef),
    /// A menu separator. Can't be selected by incrementing or decrementing.
    Separator,
}

impl ListEntry {
    pub fn value(&self) -> Value {
        match self {
            ListEntry::String(text) => Value::String(text.clone()),
            ListEntry::Value { value, .. } => value.clone(),
            ListEntry::Object(object) => Value::Object(object.clone()),
            ListEntry::Separator => Value::Empty,
        }
    }

    /// Display text of the entry.
    pub fn title(&self) -> String {
        match self {
            ListEntry::String(text) => text.clone(),
            ListEntry::Value {
                title: Some(title), ..
            } => title.clone(),
            ListEntry::Value { value, .. } => value.to_string(),
            ListEntry::Object(object) => object.describe(),
            ListEntry::Separator => String::new(),
        }
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, ListEntry::Separator)
    }
}

impl From<&str> for ListEntry {
    fn from(text: &str) -> Self {
        ListEntry::String(text.to_string())
    }
}

impl From<String> for ListEntry {
    fn from(text: String) -> Self {
        ListEntry::String(text)
    }
}

impl From<Value> for ListEntry {
    fn from(value: Value) -> Self {
        ListEntry::Value { value, title: None }
    }
}

impl From<ObjectRef> for ListEntry {
    fn from(object: ObjectRef) -> Self {
        ListEntry::Object(object)
    }
}

// -------------------------------------------------------------------------------------------------

/// A selection from a list of entries. The plain value is the selected index.
///
/// Its range always is `0..=count - 1`, so an empty list has the range `0..=-1` and the value 0.
/// Lists are persisted by their selected value, unless [`ParameterState::StoreListValue`] gets
/// cleared.
#[derive(Debug)]
pub struct ListParam {
    core: ParameterCore,
    range: IntRange,
    entries: RefCell<Vec<ListEntry>>,
}

impl ListParam {
    pub fn new(name: &str) -> Self {
        let core = ParameterCore::new(name);
        core.set_default_value(Value::Int(0));
        core.set_state(ParameterState::StoreListValue, true);
        Self {
            core,
            range: IntRange::new(0, -1),
            entries: RefCell::new(Vec::new()),
        }
    }

    /// Set the initial entries.
    pub fn with_entries<E: Into<ListEntry>, I: IntoIterator<Item = E>>(self, entries: I) -> Self {
        self.entries
            .borrow_mut()
            .extend(entries.into_iter().map(Into::into));
        self.range.set_max_raw(self.count() as i64 - 1);
        self
    }

    /// Set the initially selected and default index.
    pub fn with_default(self, index: usize) -> Self {
        let index = self.range.bound(index as i64);
        self.core.set_default_value(Value::Int(index));
        self.range.set_value_raw(index);
        self
    }

    pub fn count(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn entries(&self) -> Vec<ListEntry> {
        self.entries.borrow().clone()
    }

    pub fn entry_at(&self, index: usize) -> Option<ListEntry> {
        self.entries.borrow().get(index).cloned()
    }

    /// Append an entry and return its index.
    pub fn append<E: Into<ListEntry>>(&self, entry: E) -> usize {
        self.entries.borrow_mut().push(entry.into());
        self.entries_changed();
        self.count() - 1
    }

    /// Insert an entry at the given index. Out of bounds indices append.
    pub fn insert<E: Into<ListEntry>>(&self, index: usize, entry: E) {
        {
            let mut entries = self.entries.borrow_mut();
            let index = index.min(entries.len());
            entries.insert(index, entry.into());
        }
        self.entries_changed();
    }

    pub fn append_value(&self, value: Value, title: Option<&str>) -> usize {
        self.append(ListEntry::Value {
            value,
            title: title.map(str::to_string),
        })
    }

    pub fn append_separator(&self) -> usize {
        self.append(ListEntry::Separator)
    }

    pub fn remove_at(&self, index: usize) -> bool {
        {
            let mut entries = self.entries.borrow_mut();
            if index >= entries.len() {
                return false;
            }
            entries.remove(index);
        }
        self.entries_changed();
        self.defer_changed();
        true
    }

    pub fn remove_all(&self) {
        self.entries.borrow_mut().clear();
        self.entries_changed();
    }

    pub fn is_separator(&self, index: usize) -> bool {
        self.entries
            .borrow()
            .get(index)
            .is_some_and(ListEntry::is_separator)
    }

    /// Value of the entry at the given index. Empty for invalid indices.
    pub fn value_at(&self, index: usize) -> Value {
        self.entries
            .borrow()
            .get(index)
            .map(ListEntry::value)
            .unwrap_or_default()
    }

    /// Replace the value of a string or value entry, keeping its title.
    pub fn set_value_at(&self, index: usize, value: Value) -> bool {
        {
            let mut entries = self.entries.borrow_mut();
            match entries.get_mut(index) {
                Some(ListEntry::String(text)) => *text = value.to_string(),
                Some(ListEntry::Value { value: old, .. }) => *old = value,
                _ => return false,
            }
        }
        self.defer_changed();
        true
    }

    /// Display string of the entry at the given index.
    pub fn string_at(&self, index: usize) -> String {
        self.string_for(&Value::Int(index as i64))
    }

    /// Index of the first entry with the given value.
    pub fn value_index(&self, value: &Value) -> Option<usize> {
        self.entries
            .borrow()
            .iter()
            .position(|entry| !entry.is_separator() && entry.value() == *value)
    }

    /// Index of the entry with the numerically closest value. The first entry wins when
    /// several are equally close. Separators are skipped.
    pub fn nearest_value_index(&self, value: &Value) -> Option<usize> {
        let value = value.as_float();
        let mut nearest: Option<(usize, f64)> = None;
        for (index, entry) in self.entries.borrow().iter().enumerate() {
            if entry.is_separator() {
                continue;
            }
            let diff = (entry.value().as_float() - value).abs();
            if nearest.map_or(true, |(_, min_diff)| diff < min_diff) {
                nearest = Some((index, diff));
                if diff == 0.0 {
                    break;
                }
            }
        }
        nearest.map(|(index, _)| index)
    }

    pub fn selected_index(&self) -> usize {
        self.range.value().max(0) as usize
    }

    /// Value of the selected entry. Empty for empty lists.
    pub fn selected_value(&self) -> Value {
        if self.is_empty() {
            return Value::Empty;
        }
        self.value_at(self.selected_index())
    }

    pub fn selected_entry(&self) -> Option<ListEntry> {
        self.entry_at(self.selected_index())
    }

    /// Select the entry with the given value. Returns false when there's no such entry.
    pub fn select_value(&self, value: &Value, update: bool) -> bool {
        match self.value_index(value) {
            Some(index) => {
                self.set_value(Value::Int(index as i64), update);
                true
            }
            None => false,
        }
    }

    /// Select the entry with the closest value. Returns false for empty lists only.
    pub fn select_nearest_value(&self, value: &Value, update: bool) -> bool {
        match self.nearest_value_index(value) {
            Some(index) => {
                self.set_value(Value::Int(index as i64), update);
                true
            }
            None => false,
        }
    }

    fn entries_changed(&self) {
        self.apply_max(self.count() as i64 - 1);
        self.core.range_changed(self);
    }

    fn apply_max(&self, max: i64) {
        if max != self.range.max() {
            let empty_involved = self.range.max() < 0 || max < 0;
            self.range.set_max_raw(max);
            if self.range.value() > max {
                self.set_value(Value::Int(max), false);
                // the value stays 0 when changing from or to empty lists, but its meaning changed
                if empty_involved {
                    self.defer_changed();
                }
            } else {
                self.defer_changed();
            }
        }
    }
}

impl Parameter for ListParam {
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
        ParameterType::List
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

    fn clone_parameter(&self) -> ParameterRef {
        Self {
            core: self.core.duplicate(),
            range: self.range.clone(),
            entries: RefCell::new(self.entries()),
        }
        .into_shared()
    }

    fn bound_value(&self, value: Value) -> Value {
        Value::Int(self.range.bound(value.as_int()))
    }

    fn precision(&self) -> i32 {
        self.range.precision()
    }

    fn increment(&self) {
        let max = self.range.max();
        let mut index = self.range.value();
        while index < max {
            index += 1;
            if !self.is_separator(index as usize) {
                self.set_value(Value::Int(index), true);
                break;
            }
        }
    }

    fn decrement(&self) {
        let mut index = self.range.value();
        while index > 0 {
            index -= 1;
            if !self.is_separator(index as usize) {
                self.set_value(Value::Int(index), true);
                break;
            }
        }
    }

    fn value_normalized(&self, value: &Value) -> f64 {
        self.range.normalize(value.as_int())
    }

    fn value_plain(&self, normalized: f64) -> Value {
        Value::Int(self.range.denormalize(normalized))
    }

    fn string_for(&self, value: &Value) -> String {
        if self.is_empty() {
            // lists may be defined by their formatter only
            return formatted_string(self, value).unwrap_or_default();
        }
        let Some(entry) = usize::try_from(value.as_int())
            .ok()
            .and_then(|index| self.entry_at(index))
        else {
            return String::new();
        };
        match self.formatter() {
            Some(formatter) if !entry.is_separator() => formatter.print_string(&entry.value()),
            _ => entry.title(),
        }
    }

    fn scan_string(&self, text: &str) -> Option<Value> {
        if let Some(formatter) = self.formatter() {
            if self.is_empty() || formatter.is_normalized() {
                return formatted_value(self, text).flatten();
            }
            if let Some(value) = formatter.scan_string(text) {
                return match self.nearest_value_index(&value) {
                    Some(index) => Some(Value::Int(index as i64)),
                    None => Some(value),
                };
            }
        }
        self.entries
            .borrow()
            .iter()
            .position(|entry| !entry.is_separator() && entry.title() == text)
            .map(|index| Value::Int(index as i64))
    }
}

impl Drop for ListParam {
    fn drop(&mut self) {
        self.core.destroyed(&*self);
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        parameter::FloatFormatter,
        signal::{self, MessageId},
        testing::RecordingObserver,
    };

    #[test]
    fn max_follows_count() {
        let list = ListParam::new("mode").into_shared();
        assert!(list.is_empty());
        assert_eq!(list.max(), Value::Int(-1));
        assert_eq!(list.value(), Value::Int(0));
        assert_eq!(list.selected_value(), Value::Empty);

        for (index, name) in ["A", "B", "C"].into_iter().enumerate() {
            assert_eq!(list.append(name), index);
            assert_eq!(list.max(), Value::Int(index as i64));
        }
        list.insert(1, "X");
        assert_eq!(list.string_at(1), "X");
        assert_eq!(list.max(), Value::Int(3));

        list.set_value(Value::Int(3), false);
        assert!(list.remove_at(3));
        assert_eq!(list.value(), Value::Int(2));
        assert!(!list.remove_at(10));

        list.remove_all();
        assert_eq!(list.count(), 0);
        assert_eq!(list.max(), Value::Int(-1));
        assert_eq!(list.value(), Value::Int(0));
    }

    #[test]
    fn emptying_signals_change() {
        signal::flush();
        let observer = RecordingObserver::new();
        let list = ListParam::new("presets").with_entries(["one"]).into_shared();
        list.add_observer(observer.weak());
        list.remove_all();
        signal::flush();
        assert_eq!(observer.count(MessageId::Changed), 1);
        assert_eq!(observer.count(MessageId::RangeChanged), 1);
    }

    #[test]
    fn increment_skips_separators() {
        let list = ListParam::new("menu").into_shared();
        list.append("Cut");
        list.append_separator();
        list.append("Paste");
        list.increment();
        assert_eq!(list.selected_index(), 2);
        list.increment();
        assert_eq!(list.selected_index(), 2);
        list.decrement();
        assert_eq!(list.selected_index(), 0);
        list.decrement();
        assert_eq!(list.selected_index(), 0);
        assert_eq!(list.string_at(1), "");
    }

    #[test]
    fn value_selection() {
        let list = ListParam::new("rate").into_shared();
        list.append_value(Value::Int(22050), Some("22 kHz"));
        list.append_value(Value::Int(44100), Some("44.1 kHz"));
        list.append_value(Value::Int(48000), None);

        assert!(list.select_value(&Value::Int(44100), false));
        assert_eq!(list.selected_index(), 1);
        assert_eq!(list.value_string(), "44.1 kHz");
        assert!(!list.select_value(&Value::Int(96000), false));
        assert_eq!(list.selected_index(), 1);

        assert_eq!(list.nearest_value_index(&Value::Int(47000)), Some(2));
        assert!(list.select_nearest_value(&Value::Int(96000), false));
        assert_eq!(list.selected_value(), Value::Int(48000));
        assert_eq!(list.value_string(), "48000");

        assert!(list.set_value_at(2, Value::Int(96000)));
        assert_eq!(list.selected_value(), Value::Int(96000));
        assert!(!list.set_value_at(5, Value::Int(1)));
    }

    #[test]
    fn strings() {
        let list = ListParam::new("wave")
            .with_entries(["Sine", "Saw", "Square"])
            .with_default(1)
            .into_shared();
        assert_eq!(list.value_string(), "Saw");
        list.set_string("Square", false);
        assert_eq!(list.selected_index(), 2);
        list.set_string("Noise", false);
        assert_eq!(list.selected_index(), 2);
        list.reset_value(false);
        assert_eq!(list.selected_value(), Value::from("Saw"));

        let gains = ListParam::new("gain").into_shared();
        for gain in [-6.0, 0.0, 6.0] {
            gains.append(Value::Float(gain));
        }
        gains.set_formatter(Some(Rc::new(FloatFormatter::new(1).with_unit("dB"))));
        assert_eq!(gains.string_at(2), "6.0 dB");
        gains.set_string("-5 dB", false);
        assert_eq!(gains.selected_index(), 0);
    }

    #[test]
    fn clone_copies_entries() {
        let list = ListParam::new("a").with_entries(["x", "y"]).into_shared();
        let clone = downcast(list.clone_parameter());
        clone.append("z");
        assert_eq!(list.count(), 2);
        assert_eq!(clone.count(), 3);
        assert_eq!(clone.max(), Value::Int(2));
    }

    fn downcast(param: ParameterRef) -> Rc<ListParam> {
        crate::parameter::downcast_parameter::<ListParam>(param).expect("a list parameter")
    }
}
