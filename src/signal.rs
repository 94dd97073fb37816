//! Parameter change notifications and the deferred signal queue.
//!
//! Parameters don't notify their observers right away: changes get queued into a thread local
//! queue, which is delivered when the host application calls [`flush`], usually once per event
//! loop turn. Only the feedback path (see [`ParameterState::Feedback`]) bypasses the queue.
//!
//! [`ParameterState::Feedback`]: crate::ParameterState::Feedback

use std::{
    cell::RefCell,
    collections::VecDeque,
    rc::{Rc, Weak},
};

use crate::{parameter::Parameter, value::Value};

// -------------------------------------------------------------------------------------------------

/// Upper bound of deliveries in a single [`flush`] call. Protects against observers which keep
/// re-signalling each other forever.
pub const MAX_FLUSH_ITERATIONS: usize = 100_000;

// -------------------------------------------------------------------------------------------------

/// Symbolic notification id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageId {
    /// The value or state of a parameter changed.
    Changed,
    /// The range (min, max, entries) of a parameter changed.
    RangeChanged,
    /// The parameter is about to be dropped. Delivered synchronously.
    Destroyed,
    /// A user edit session started.
    BeginEdit,
    /// A user edit session ended.
    EndEdit,
    /// An alias got bound to another original parameter.
    OriginalChanged,
    /// The original parameter of an alias got dropped.
    OriginalDestroyed,
    /// Free form, application defined id.
    Custom(String),
}

/// A notification with optional positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub args: Vec<Value>,
}

impl Message {
    pub fn new(id: MessageId) -> Self {
        Self { id, args: vec![] }
    }

    pub fn custom<S: Into<String>>(id: S) -> Self {
        Self::new(MessageId::Custom(id.into()))
    }

    /// Append a positional argument.
    pub fn with_arg<V: Into<Value>>(mut self, value: V) -> Self {
        self.args.push(value.into());
        self
    }

    /// True for all messages which indicate that a subject's value may have changed.
    pub fn is_change(&self) -> bool {
        matches!(
            self.id,
            MessageId::Changed | MessageId::OriginalChanged | MessageId::OriginalDestroyed
        )
    }
}

impl From<MessageId> for Message {
    fn from(id: MessageId) -> Self {
        Self::new(id)
    }
}

// -------------------------------------------------------------------------------------------------

/// Receives notifications from parameters it subscribed to.
pub trait Observer {
    fn notify(&self, subject: &dyn Parameter, message: &Message);
}

// -------------------------------------------------------------------------------------------------

/// Weakly held list of observers. Dropped observers get pruned lazily.
#[derive(Default)]
pub struct ObserverList {
    observers: RefCell<Vec<Weak<dyn Observer>>>,
}

impl ObserverList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer. Adding the same observer twice has no effect.
    pub fn add(&self, observer: Weak<dyn Observer>) {
        let mut observers = self.observers.borrow_mut();
        if !observers.iter().any(|o| Weak::ptr_eq(o, &observer)) {
            observers.push(observer);
        }
    }

    pub fn remove(&self, observer: &Weak<dyn Observer>) {
        self.observers
            .borrow_mut()
            .retain(|o| !Weak::ptr_eq(o, observer) && o.strong_count() > 0);
    }

    /// Number of live observers.
    pub fn len(&self) -> usize {
        self.observers
            .borrow()
            .iter()
            .filter(|o| o.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Synchronously deliver a message to all live observers. Observers may add or remove
    /// observers while being notified: changes apply to the next delivery.
    pub fn notify(&self, subject: &dyn Parameter, message: &Message) {
        let observers = {
            let mut observers = self.observers.borrow_mut();
            observers.retain(|o| o.strong_count() > 0);
            observers.iter().filter_map(Weak::upgrade).collect::<Vec<_>>()
        };
        for observer in observers {
            observer.notify(subject, message);
        }
    }
}

// -------------------------------------------------------------------------------------------------

enum Deferred {
    Signal {
        subject: Weak<dyn Parameter>,
        message: Message,
    },
    Task(Box<dyn FnOnce()>),
}

thread_local! {
    static QUEUE: RefCell<VecDeque<Deferred>> = const { RefCell::new(VecDeque::new()) };
}

/// Queue a message for the given subject's observers. A plain `Changed` message which is already
/// pending for the same subject is not queued again.
pub(crate) fn defer(subject: Weak<dyn Parameter>, message: Message) {
    QUEUE.with(|queue| {
        let mut queue = queue.borrow_mut();
        let coalesce = message.id == MessageId::Changed && message.args.is_empty();
        if coalesce
            && queue.iter().any(|pending| match pending {
                Deferred::Signal {
                    subject: pending_subject,
                    message: pending_message,
                } => Weak::ptr_eq(pending_subject, &subject) && *pending_message == message,
                Deferred::Task(_) => false,
            })
        {
            return;
        }
        queue.push_back(Deferred::Signal { subject, message });
    });
}

/// Queue a task which gets run on the next [`flush`].
pub fn post<F: FnOnce() + 'static>(task: F) {
    QUEUE.with(|queue| queue.borrow_mut().push_back(Deferred::Task(Box::new(task))));
}

/// Number of pending deferred messages and tasks.
pub fn pending() -> usize {
    QUEUE.with(|queue| queue.borrow().len())
}

/// Deliver all pending messages and tasks, including the ones which get queued while flushing.
/// Returns the number of delivered entries.
pub fn flush() -> usize {
    let mut delivered = 0;
    loop {
        if delivered >= MAX_FLUSH_ITERATIONS {
            log::error!(
                "Signal queue still not empty after {} deliveries, giving up",
                MAX_FLUSH_ITERATIONS
            );
            break;
        }
        let next = QUEUE.with(|queue| queue.borrow_mut().pop_front());
        match next {
            None => break,
            Some(Deferred::Signal { subject, message }) => {
                // messages of dropped parameters are silently discarded
                if let Some(subject) = subject.upgrade() {
                    deliver(&subject, &message);
                }
            }
            Some(Deferred::Task(task)) => task(),
        }
        delivered += 1;
    }
    if delivered > 0 {
        log::debug!("Flushed {delivered} deferred signals");
    }
    delivered
}

fn deliver(subject: &Rc<dyn Parameter>, message: &Message) {
    subject.core().observers().notify(subject.as_ref(), message);
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn posted_tasks_run_in_order() {
        flush();
        let log = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let log = log.clone();
            post(move || log.borrow_mut().push(i));
        }
        assert_eq!(pending(), 3);
        assert!(log.borrow().is_empty());
        assert_eq!(flush(), 3);
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        assert_eq!(pending(), 0);
    }

    #[test]
    fn tasks_posted_while_flushing_get_delivered() {
        flush();
        let counter = Rc::new(Cell::new(0));
        let inner_counter = counter.clone();
        post(move || {
            inner_counter.set(inner_counter.get() + 1);
            let inner_counter = inner_counter.clone();
            post(move || inner_counter.set(inner_counter.get() + 10));
        });
        assert_eq!(flush(), 2);
        assert_eq!(counter.get(), 11);
    }

    #[test]
    fn message_helpers() {
        let message = Message::custom("refresh").with_arg(1).with_arg("x");
        assert_eq!(message.id, MessageId::Custom("refresh".into()));
        assert_eq!(message.args, vec![Value::Int(1), Value::from("x")]);
        assert!(!message.is_change());
        assert!(Message::new(MessageId::OriginalChanged).is_change());
    }
}
