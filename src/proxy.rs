//! Aggregation of multiple source parameters behind a single proxy parameter.

use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use crate::{
    controller::Controller,
    parameter::{same_parameter, Parameter, ParameterRef, ParameterState},
    signal::{self, Message, MessageId, Observer},
    value::Value,
};

// -------------------------------------------------------------------------------------------------

/// How a [`MultiSourceProxy`] combines its sources into the proxy value.
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
#[strum(serialize_all = "lowercase")]
pub enum ProxyPolicy {
    /// Minimum of all enabled sources. For toggles: on when all sources are on.
    Min,
    /// Maximum of all enabled sources. For toggles: on when any source is on.
    Max,
    /// Momentary trigger which resets all enabled sources to their minimum. The proxy is enabled
    /// while any enabled source differs from its minimum.
    Reset,
}

// -------------------------------------------------------------------------------------------------

/// Represents a set of source parameters with a single proxy parameter, e.g. a "mute all" button
/// for a group of mute toggles.
///
/// The proxy becomes the controller of the proxy parameter, keeping its tag. Editing the proxy
/// parameter immediately writes all enabled sources. Source changes are collected and resync the
/// proxy parameter on the next [`signal::flush`].
///
/// Sources are not owned: they are held weakly and usually live in some other container.
#[derive(Debug)]
pub struct MultiSourceProxy {
    policy: ProxyPolicy,
    notify_original_controller: bool,
    proxy: RefCell<Option<ParameterRef>>,
    original_controller: RefCell<Option<Weak<dyn Controller>>>,
    sources: RefCell<Vec<Weak<dyn Parameter>>>,
    sync_pending: Cell<bool>,
    me: Weak<MultiSourceProxy>,
}

impl MultiSourceProxy {
    /// Create a new shared proxy without a proxy parameter and sources. With
    /// `notify_original_controller` set, the controller which was connected to a proxy parameter
    /// before it got installed still gets notified about proxy changes and edits.
    pub fn new(policy: ProxyPolicy, notify_original_controller: bool) -> Rc<Self> {
        Rc::new_cyclic(|me| Self {
            policy,
            notify_original_controller,
            proxy: RefCell::new(None),
            original_controller: RefCell::new(None),
            sources: RefCell::new(Vec::new()),
            sync_pending: Cell::new(false),
            me: me.clone(),
        })
    }

    pub fn policy(&self) -> ProxyPolicy {
        self.policy
    }

    pub fn proxy_param(&self) -> Option<ParameterRef> {
        self.proxy.borrow().clone()
    }

    /// Install a new proxy parameter, connecting it to this proxy with its current tag.
    pub fn set_proxy_param(&self, param: Option<ParameterRef>) {
        let controller = self.me.clone() as Weak<dyn Controller>;
        let original_controller = match &param {
            Some(param) if self.notify_original_controller => {
                let current = self.original_controller.borrow().clone();
                current.or_else(|| {
                    param
                        .controller()
                        .filter(|controller| {
                            Rc::as_ptr(controller) as *const () != self as *const Self as *const ()
                        })
                        .map(|controller| Rc::downgrade(&controller))
                })
            }
            _ => None,
        };
        *self.original_controller.borrow_mut() = original_controller;
        if let Some(param) = &param {
            param.connect(Some(controller), param.tag());
        }
        *self.proxy.borrow_mut() = param;
    }

    /// All live sources.
    pub fn sources(&self) -> Vec<ParameterRef> {
        self.sources
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    pub fn source_count(&self) -> usize {
        self.sources().len()
    }

    pub fn add_source(&self, source: ParameterRef) {
        let weak = Rc::downgrade(&source);
        {
            let mut sources = self.sources.borrow_mut();
            if sources.iter().any(|s| Weak::ptr_eq(s, &weak)) {
                return;
            }
            sources.push(weak);
        }
        source.add_observer(self.me.clone() as Weak<dyn Observer>);
        self.trigger_sync();
    }

    pub fn remove_source(&self, source: &ParameterRef) {
        source.remove_observer(&(self.me.clone() as Weak<dyn Observer>));
        let weak = Rc::downgrade(source);
        self.sources
            .borrow_mut()
            .retain(|s| !Weak::ptr_eq(s, &weak) && s.strong_count() > 0);
        self.trigger_sync();
    }

    pub fn remove_all_sources(&self) {
        self.detach_sources();
        self.trigger_sync();
    }

    fn detach_sources(&self) {
        let observer = self.me.clone() as Weak<dyn Observer>;
        for source in self.sources() {
            source.remove_observer(&observer);
        }
        self.sources.borrow_mut().clear();
    }

    /// Set the proxy value without notifying anyone, then write it to the sources.
    pub fn set_value(&self, value: Value, update: bool) {
        if let Some(proxy) = self.proxy_param() {
            proxy.set_value(value, false);
            self.sync_sources(update);
        }
    }

    /// Schedule a proxy resync on the next flush. Multiple requests are merged.
    fn trigger_sync(&self) {
        if self.sync_pending.replace(true) {
            return;
        }
        let me = self.me.clone();
        signal::post(move || {
            if let Some(proxy) = me.upgrade() {
                proxy.sync_pending.set(false);
                proxy.sync_proxy();
            }
        });
    }

    /// Recalculate the proxy parameter's value and enabled state from the sources.
    pub fn sync_proxy(&self) {
        let Some(proxy) = self.proxy_param() else {
            return;
        };
        let sources = self.sources();
        let enabled = sources
            .iter()
            .filter(|source| source.is_enabled())
            .collect::<Vec<_>>();
        proxy.enable(!enabled.is_empty());

        match self.policy {
            ProxyPolicy::Reset => {
                let any_set = enabled.iter().any(|source| source.value() > source.min());
                proxy.set_value(proxy.min(), false);
                proxy.enable(any_set);
            }
            ProxyPolicy::Min | ProxyPolicy::Max => {
                let value = enabled
                    .iter()
                    .map(|source| source.value())
                    .reduce(|value, source_value| match self.policy {
                        ProxyPolicy::Min if source_value < value => source_value,
                        ProxyPolicy::Max if source_value > value => source_value,
                        _ => value,
                    })
                    .unwrap_or_else(|| proxy.min());
                proxy.set_value(value, false);
            }
        }
    }

    /// Write the proxy value, or the source minimum for reset proxies, to all enabled sources.
    pub fn sync_sources(&self, update: bool) {
        let Some(proxy) = self.proxy_param() else {
            return;
        };
        let value = proxy.value();
        for source in self.sources() {
            if !source.is_enabled() {
                continue;
            }
            let target = if self.policy == ProxyPolicy::Reset {
                source.min()
            } else {
                value.clone()
            };
            if source.value() != target {
                source.set_value(target, update);
            } else if update && source.state(ParameterState::SignalAlways) {
                source.perform_update();
            }
        }
    }

    fn original_controller(&self) -> Option<Rc<dyn Controller>> {
        self.original_controller
            .borrow()
            .as_ref()
            .and_then(Weak::upgrade)
    }

    fn is_proxy(&self, param: &dyn Parameter) -> bool {
        self.proxy
            .borrow()
            .as_ref()
            .is_some_and(|proxy| same_parameter(proxy.as_ref(), param))
    }
}

impl Controller for MultiSourceProxy {
    fn param_changed(&self, param: &dyn Parameter) -> bool {
        if !self.is_proxy(param) {
            return false;
        }
        if let Some(controller) = self.original_controller() {
            controller.param_changed(param);
        }
        self.sync_sources(true);
        true
    }

    fn param_edit(&self, param: &dyn Parameter, begin: bool) {
        if let Some(controller) = self.original_controller() {
            controller.param_edit(param, begin);
        }
        if self.is_proxy(param) {
            for source in self.sources() {
                if source.is_enabled() {
                    if begin {
                        source.begin_edit();
                    } else {
                        source.end_edit();
                    }
                }
            }
        }
    }
}

impl Observer for MultiSourceProxy {
    fn notify(&self, _subject: &dyn Parameter, message: &Message) {
        if matches!(message.id, MessageId::Changed | MessageId::Destroyed) {
            self.trigger_sync();
        }
    }
}

impl Drop for MultiSourceProxy {
    fn drop(&mut self) {
        self.detach_sources();
    }
}

// -------------------------------------------------------------------------------------------------
