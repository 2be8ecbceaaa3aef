#![forbid(unsafe_code)]

//! Typed property slots with change notification.
//!
//! # Design
//!
//! [`Property`] wraps a [`Value`] in shared, reference-counted storage
//! (`Rc<..>` with a `RefCell` for the mutable part). The slot's
//! [`ValueType`] is fixed at construction; `set()` rejects values of any
//! other type. Every accepted write notifies all live subscribers in
//! registration order, including writes that store a value equal to the
//! current one.
//!
//! # Failure Modes
//!
//! - **Type mismatch**: `set()` returns [`PropertyError::TypeMismatch`] and
//!   neither stores nor notifies.
//! - **Re-entrant set**: a subscriber may write *other* properties. Writing
//!   the property that is currently notifying from inside its own callback
//!   nests a second notification round; callers must not rely on it.
//! - **Subscriber leak**: callbacks live as long as their [`Subscription`]
//!   guard. Dead weak references are pruned lazily during notification.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::PropertyError;
use crate::value::{Value, ValueKind, ValueType};

type CallbackRc = Rc<dyn Fn(&Value)>;
type CallbackWeak = Weak<dyn Fn(&Value)>;

struct SlotState {
    value: Value,
    /// Number of accepted writes since construction.
    version: u64,
    /// Subscribers stored as weak references. Dead entries are pruned on notify.
    subscribers: Vec<CallbackWeak>,
}

struct PropertyInner {
    name: Box<str>,
    value_type: ValueType,
    state: RefCell<SlotState>,
}

/// A named, typed, observable value slot.
///
/// Cloning a `Property` creates a new handle to the **same** slot.
///
/// # Invariants
///
/// 1. The stored value's tag always equals [`Property::value_type`].
/// 2. `version` increments by exactly 1 on each accepted `set()`.
/// 3. Each accepted `set()` notifies every live subscriber exactly once, in
///    registration order, before `set()` returns.
pub struct Property {
    inner: Rc<PropertyInner>,
}

impl Clone for Property {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("Property")
            .field("name", &self.inner.name)
            .field("value_type", &self.inner.value_type)
            .field("value", &state.value)
            .field("version", &state.version)
            .field("subscriber_count", &state.subscribers.len())
            .finish()
    }
}

impl Property {
    /// Create a slot whose type is taken from `initial`.
    #[must_use]
    pub fn new(name: impl Into<String>, initial: impl Into<Value>) -> Self {
        let value = initial.into();
        Self {
            inner: Rc::new(PropertyInner {
                name: name.into().into_boxed_str(),
                value_type: value.value_type(),
                state: RefCell::new(SlotState {
                    value,
                    version: 0,
                    subscribers: Vec::new(),
                }),
            }),
        }
    }

    /// Create a slot of `value_type` holding that type's zero value.
    #[must_use]
    pub fn with_type(name: impl Into<String>, value_type: ValueType) -> Self {
        Self::new(name, Value::default_for(value_type))
    }

    /// Property name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Declared type of the slot.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        self.inner.value_type
    }

    /// Get a clone of the current value.
    #[must_use]
    pub fn get(&self) -> Value {
        self.inner.state.borrow().value.clone()
    }

    /// Get the current value as `T`, or `None` if `T` is not the slot's type.
    #[must_use]
    pub fn get_as<T: ValueKind>(&self) -> Option<T> {
        T::from_value(&self.inner.state.borrow().value)
    }

    /// Access the current value by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        f(&self.inner.state.borrow().value)
    }

    /// Store a new value and notify subscribers.
    ///
    /// Writing a value equal to the current one still notifies.
    pub fn set(&self, value: impl Into<Value>) -> Result<(), PropertyError> {
        let value = value.into();
        if value.value_type() != self.inner.value_type {
            return Err(PropertyError::TypeMismatch {
                property: self.inner.name.to_string(),
                expected: self.inner.value_type,
                found: value.value_type(),
            });
        }
        {
            let mut state = self.inner.state.borrow_mut();
            state.value = value;
            state.version += 1;
        }
        self.notify();
        Ok(())
    }

    /// Subscribe to writes. The callback receives the value just stored.
    ///
    /// Returns a [`Subscription`] guard. Dropping the guard unsubscribes the
    /// callback; it will not be called afterwards, though its dead entry may
    /// remain in the list until the next notification prunes it.
    pub fn subscribe(&self, callback: impl Fn(&Value) + 'static) -> Subscription {
        let strong: CallbackRc = Rc::new(callback);
        let weak = Rc::downgrade(&strong);
        self.inner.state.borrow_mut().subscribers.push(weak);
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Number of accepted writes since construction.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.state.borrow().version
    }

    /// Registered subscribers, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.state.borrow().subscribers.len()
    }

    /// Subscribers whose guard is still alive.
    #[must_use]
    pub fn live_subscriber_count(&self) -> usize {
        self.inner
            .state
            .borrow()
            .subscribers
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Whether two handles refer to the same slot.
    #[must_use]
    pub fn ptr_eq(&self, other: &Property) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Notify live subscribers and prune dead ones.
    fn notify(&self) {
        // Collect first so no borrow is held while callbacks run.
        let (callbacks, value): (Vec<CallbackRc>, Value) = {
            let mut state = self.inner.state.borrow_mut();
            state.subscribers.retain(|w| w.strong_count() > 0);
            let callbacks = state.subscribers.iter().filter_map(Weak::upgrade).collect();
            (callbacks, state.value.clone())
        };

        for cb in &callbacks {
            cb(&value);
        }
    }
}

/// RAII guard for a subscriber callback.
///
/// Dropping the `Subscription` drops the strong `Rc` to the callback, so the
/// `Weak` in the property's subscriber list fails to upgrade from then on.
pub struct Subscription {
    /// Type-erased strong reference keeping the callback `Rc` alive.
    _guard: Box<dyn std::any::Any>,
}

impl Subscription {
    /// Explicitly unsubscribe. Equivalent to dropping the guard.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn get_set_basic() {
        let prop = Property::new("int", 7);
        assert_eq!(prop.get(), Value::Int(7));
        assert_eq!(prop.version(), 0);

        prop.set(47).unwrap();
        assert_eq!(prop.get_as::<i32>(), Some(47));
        assert_eq!(prop.version(), 1);
    }

    #[test]
    fn with_type_starts_at_zero_value() {
        let prop = Property::with_type("string", ValueType::String);
        assert_eq!(prop.get_as::<String>().as_deref(), Some(""));
        assert_eq!(prop.name(), "string");
        assert_eq!(prop.value_type(), ValueType::String);
    }

    #[test]
    fn wrong_type_is_rejected_without_notify() {
        let prop = Property::new("int", 7);
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let _sub = prop.subscribe(move |_| count_clone.set(count_clone.get() + 1));

        let err = prop.set("47").unwrap_err();
        assert_eq!(
            err,
            PropertyError::TypeMismatch {
                property: "int".into(),
                expected: ValueType::Int,
                found: ValueType::String,
            }
        );
        assert_eq!(prop.get_as::<i32>(), Some(7));
        assert_eq!(prop.version(), 0);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn equal_write_still_notifies() {
        let prop = Property::new("int", 0);
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);

        let _sub = prop.subscribe(move |_| count_clone.set(count_clone.get() + 1));

        prop.set(1).unwrap();
        prop.set(1).unwrap();
        assert_eq!(count.get(), 2);
        assert_eq!(prop.version(), 2);
    }

    #[test]
    fn subscriber_receives_new_value() {
        let prop = Property::new("string", "");
        let last_seen = Rc::new(RefCell::new(String::new()));
        let last_clone = Rc::clone(&last_seen);

        let _sub = prop.subscribe(move |v| *last_clone.borrow_mut() = v.to_string());

        prop.set("42").unwrap();
        assert_eq!(*last_seen.borrow(), "42");
    }

    #[test]
    fn subscription_drop_unsubscribes() {
        let prop = Property::new("int", 0);
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);

        let sub = prop.subscribe(move |_| count_clone.set(count_clone.get() + 1));
        prop.set(1).unwrap();
        assert_eq!(count.get(), 1);

        sub.unsubscribe();
        prop.set(2).unwrap();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn dead_subscribers_pruned_on_notify() {
        let prop = Property::new("int", 0);
        let _s1 = prop.subscribe(|_| {});
        let s2 = prop.subscribe(|_| {});
        assert_eq!(prop.subscriber_count(), 2);

        drop(s2);
        assert_eq!(prop.subscriber_count(), 2);
        assert_eq!(prop.live_subscriber_count(), 1);

        prop.set(1).unwrap();
        assert_eq!(prop.subscriber_count(), 1);
    }

    #[test]
    fn clone_shares_slot() {
        let a = Property::new("int", 0);
        let b = a.clone();
        assert!(a.ptr_eq(&b));

        a.set(42).unwrap();
        assert_eq!(b.get_as::<i32>(), Some(42));
        assert!(!a.ptr_eq(&Property::new("int", 42)));
    }

    #[test]
    fn notification_order_is_registration_order() {
        let prop = Property::new("int", 0);
        let log = Rc::new(RefCell::new(Vec::new()));

        let log1 = Rc::clone(&log);
        let _s1 = prop.subscribe(move |_| log1.borrow_mut().push('A'));
        let log2 = Rc::clone(&log);
        let _s2 = prop.subscribe(move |_| log2.borrow_mut().push('B'));

        prop.set(1).unwrap();
        assert_eq!(*log.borrow(), vec!['A', 'B']);
    }

    #[test]
    fn subscriber_may_write_another_property() {
        let source = Property::new("a", 0);
        let target = Property::new("b", 0);
        let target_clone = target.clone();

        let _sub = source.subscribe(move |v| {
            let doubled = v.get::<i32>().unwrap_or_default() * 2;
            target_clone.set(doubled).unwrap();
        });

        source.set(21).unwrap();
        assert_eq!(target.get_as::<i32>(), Some(42));
    }

    #[test]
    fn debug_format() {
        let prop = Property::new("int", 42);
        let dbg = format!("{prop:?}");
        assert!(dbg.contains("Property"));
        assert!(dbg.contains("42"));
        assert!(dbg.contains("version"));
    }
}
