use std::{any::Any, cell::Cell, rc::Rc};

use super::{
    formatted_string,
    integer::{apply_int_max, apply_int_min, IntRange},
    Parameter, ParameterCore, ParameterRef, ParameterType,
};
use crate::value::Value;

// -------------------------------------------------------------------------------------------------

/// A scroll position in `0..=max` with a visible page size.
///
/// The page size is the visible fraction of the scrollable content. Page sizes >= 1 mean that
/// everything is visible, so there's nothing to scroll.
#[derive(Debug)]
pub struct ScrollParam {
    core: ParameterCore,
    range: IntRange,
    page_size: Cell<f64>,
}

impl ScrollParam {
    /// Default scroll range of new scroll parameters.
    pub const DEFAULT_MAX: i64 = 100;

    pub fn new(name: &str) -> Self {
        Self::with_max(Self::DEFAULT_MAX, name)
    }

    pub fn with_max(max: i64, name: &str) -> Self {
        let core = ParameterCore::new(name);
        core.set_default_value(Value::Int(0));
        Self {
            core,
            range: IntRange::new(0, max),
            page_size: Cell::new(0.0),
        }
    }

    pub fn int_value(&self) -> i64 {
        self.range.value()
    }

    /// Set a new scroll range and page size. Observers only get notified when the range changed
    /// or when scrolling got possible or impossible.
    pub fn set_range(&self, range: i64, page_size: f64) {
        let old_page_size = self.page_size.get();
        if range == self.range.max() && page_size == old_page_size {
            return;
        }
        let notify = (old_page_size > 1.0) != (page_size > 1.0) || range != self.range.max();

        self.range.set_min_raw(0);
        self.range.set_max_raw(range);
        self.page_size.set(page_size);
        if self.range.value() > range {
            self.range.set_value_raw(range);
        }

        if notify {
            self.defer_changed();
        }
    }

    pub fn page_size(&self) -> f64 {
        self.page_size.get()
    }

    pub fn set_page_size(&self, page_size: f64) {
        let old_page_size = self.page_size.get();
        if page_size != old_page_size {
            self.page_size.set(page_size);
            if !(old_page_size > 1.0 && page_size > 1.0) {
                self.defer_changed();
            }
        }
    }

    /// True when only a part of the content is visible.
    pub fn can_scroll(&self) -> bool {
        let page_size = self.page_size.get();
        page_size > 0.0 && page_size < 1.0
    }

    /// Increment and decrement step: a twelfth of a page, but at least one.
    pub fn step_size(&self) -> i64 {
        let range = self.range.span() as f64;
        ((range * self.page_size.get() / 12.0) as i64).max(1)
    }

    pub fn page_count(&self) -> i64 {
        let page_size = self.page_size.get();
        if page_size == 0.0 {
            1
        } else {
            (1.0 / page_size).round() as i64
        }
    }

    pub fn current_page(&self) -> i64 {
        let page_size = self.page_size.get();
        if page_size == 0.0 {
            0
        } else {
            (self.normalized() / page_size) as i64
        }
    }

    /// Scroll to the start of the given page.
    pub fn scroll_to_page(&self, page: i64, update: bool) {
        let page_size = self.page_size.get();
        if page_size > 0.0 {
            let page = page.clamp(0, (self.page_count() - 1).max(0));
            self.set_normalized(page as f64 * page_size, update);
        }
    }
}

impl Parameter for ScrollParam {
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
        ParameterType::Scroll
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
            page_size: self.page_size.clone(),
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
        self.set_value(Value::Int(self.range.value().saturating_add(self.step_size())), true);
    }

    fn decrement(&self) {
        self.set_value(Value::Int(self.range.value().saturating_sub(self.step_size())), true);
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

impl Drop for ScrollParam {
    fn drop(&mut self) {
        self.core.destroyed(&*self);
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        signal::{self, MessageId},
        testing::{RecordingController, RecordingObserver},
    };

    #[test]
    fn step_size() {
        let param = ScrollParam::new("scroll").into_shared();
        assert_eq!(param.max(), Value::Int(100));
        assert_eq!(param.step_size(), 1);
        param.set_range(1000, 0.2);
        assert_eq!(param.step_size(), 16);
        assert!(param.can_scroll());

        let controller = RecordingController::new();
        param.connect(controller.weak(), 9);
        param.increment();
        param.increment();
        assert_eq!(param.int_value(), 32);
        param.decrement();
        assert_eq!(param.int_value(), 16);
        assert_eq!(controller.changed_values(), vec![Value::Int(16), Value::Int(32), Value::Int(16)]);
    }

    #[test]
    fn range_notifications() {
        signal::flush();
        let observer = RecordingObserver::new();
        let param = ScrollParam::with_max(200, "list").into_shared();
        param.add_observer(observer.weak());
        param.set_value(Value::Int(150), false);
        signal::flush();
        observer.clear();

        // new range clamps without a separate value change
        param.set_range(100, 0.5);
        assert_eq!(param.int_value(), 100);
        signal::flush();
        assert_eq!(observer.count(MessageId::Changed), 1);

        // same range, page size stays scrollable: quiet
        param.set_range(100, 0.25);
        assert_eq!(param.page_size(), 0.25);
        signal::flush();
        assert_eq!(observer.count(MessageId::Changed), 1);

        // page sizes beyond one are all equivalent
        param.set_page_size(2.0);
        param.set_page_size(3.0);
        signal::flush();
        assert_eq!(observer.count(MessageId::Changed), 2);
        assert!(!param.can_scroll());
    }

    #[test]
    fn pages() {
        let param = ScrollParam::with_max(300, "pages").into_shared();
        assert_eq!(param.page_count(), 1);
        assert_eq!(param.current_page(), 0);

        param.set_page_size(0.25);
        assert_eq!(param.page_count(), 4);
        param.scroll_to_page(2, false);
        assert_eq!(param.int_value(), 150);
        assert_eq!(param.current_page(), 2);
        param.scroll_to_page(10, false);
        assert_eq!(param.current_page(), 3);
        param.set_value(Value::Int(300), false);
        assert_eq!(param.current_page(), 4);
    }
}
