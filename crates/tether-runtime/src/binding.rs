#![forbid(unsafe_code)]

//! Property bindings.
//!
//! A [`Binding`] links a source [`Property`] to a target [`Property`]: every
//! write to the source is run through a [`Transform`] and, if the transform
//! yields a value, written to the target before the source's `set()` returns.
//!
//! # Lifecycle
//!
//! ```text
//!            bind()                  unbind() / last handle dropped
//!   ─────────────────▶  BOUND  ───────────────────────────────────▶  UNBOUND
//!                         │                                            ▲
//!                         │ manage()                                   │
//!                         ▼                                            │
//!                      MANAGED ──── unbind() / registry released ──────┘
//! ```
//!
//! - **Caller-owned** (default): [`Binding`] is a shared handle; when the last
//!   clone is dropped the binding unbinds.
//! - **Manager-owned**: after [`Binding::manage`] the registry keeps the
//!   binding alive, and dropping handles has no effect.
//! - **Unbound** is terminal. Handles stay valid to hold and query.
//!
//! # Invariants
//!
//! 1. While bound, each source write whose transform yields a value causes
//!    exactly one target write, synchronously.
//! 2. A transform yielding `None` leaves the target untouched.
//! 3. Without `SYNC_CREATE`, creating a binding never writes the target.
//! 4. Redundant writes are not suppressed; the target notifies every time.
//! 5. `unbind()` is idempotent.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Type mismatch at bind | No transform, no default conversion | `BindError`, nothing subscribed |
//! | Empty transform result | Unparseable input etc. | No write, `trace` log |
//! | Target rejects write | Untyped transform produced wrong type | No write, `warn` log |
//! | Echo in bidirectional mode | Target write notifies back | Suppressed by in-flight guard |
//!
//! Writes made from inside a transform back to the triggering source are
//! unsupported; the in-flight guard drops them.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tether_core::{
    BindingId, BindingRegistry, ManagedBinding, Object, Property, Subscription, Value, ValueType,
    WeakBindingRegistry,
};
use tracing::{debug, trace, warn};

use crate::error::BindError;
use crate::flags::BindingFlags;
use crate::transform::Transform;

/// Propagation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Source to target.
    Forward,
    /// Target to source (`BIDIRECTIONAL` only).
    Reverse,
}

impl Direction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Reverse => "reverse",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resets the in-flight flag even if a subscriber panics.
struct InFlight<'a>(&'a Cell<bool>);

impl<'a> InFlight<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

struct BindingState {
    id: BindingId,
    flags: BindingFlags,
    source: Property,
    target: Property,
    forward: Transform,
    reverse: Option<Transform>,
    /// Empty once unbound.
    subscriptions: RefCell<Vec<Subscription>>,
    bound: Cell<bool>,
    /// Set while this binding transforms or writes; blocks echoes and self-writes.
    in_flight: Cell<bool>,
    /// Sticky: once managed, dropping handles never unbinds.
    managed: Cell<bool>,
    manager: RefCell<Option<WeakBindingRegistry>>,
    /// Registry `manage()` uses; the source object's when bound by name.
    home: Option<WeakBindingRegistry>,
}

impl BindingState {
    fn propagate(&self, direction: Direction, value: &Value) {
        if !self.bound.get() || self.in_flight.get() {
            return;
        }
        let (transform, dest) = match direction {
            Direction::Forward => (Some(&self.forward), &self.target),
            Direction::Reverse => (self.reverse.as_ref(), &self.source),
        };
        let Some(transform) = transform else {
            return;
        };

        // Held across the transform too, so writes it makes are dropped.
        let _guard = InFlight::enter(&self.in_flight);
        let Some(output) = transform.apply(value) else {
            trace!(id = %self.id, %direction, "transform yielded nothing, target untouched");
            return;
        };
        if let Err(err) = dest.set(output) {
            warn!(id = %self.id, %direction, error = %err, "binding write rejected");
        }
    }

    fn unbind(&self) {
        if !self.bound.replace(false) {
            return;
        }
        let subscriptions = std::mem::take(&mut *self.subscriptions.borrow_mut());
        drop(subscriptions);

        let manager = self.manager.borrow_mut().take();
        if let Some(registry) = manager.and_then(|weak| weak.upgrade()) {
            registry.forget(self.id);
        }
        debug!(
            id = %self.id,
            source = self.source.name(),
            target = self.target.name(),
            "binding unbound"
        );
    }
}

impl ManagedBinding for BindingState {
    fn id(&self) -> BindingId {
        self.id
    }

    fn is_bound(&self) -> bool {
        self.bound.get()
    }

    fn release(&self) {
        self.unbind();
    }
}

/// Caller ownership token. Its drop is the scope-exit release path.
struct Owner {
    state: Rc<BindingState>,
}

impl Drop for Owner {
    fn drop(&mut self) {
        if !self.state.managed.get() {
            self.state.unbind();
        }
    }
}

/// Handle to a live or unbound property binding.
///
/// Clones share ownership. Unless the binding has been
/// [managed](Binding::manage), dropping the last clone unbinds it.
#[derive(Clone)]
#[must_use = "dropping the only handle to an unmanaged binding unbinds it immediately"]
pub struct Binding {
    owner: Rc<Owner>,
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = &self.owner.state;
        f.debug_struct("Binding")
            .field("id", &state.id)
            .field("source", &state.source.name())
            .field("target", &state.target.name())
            .field("flags", &state.flags)
            .field("bound", &state.bound.get())
            .field("managed", &state.managed.get())
            .finish()
    }
}

impl Binding {
    /// Start building a binding between two properties.
    pub fn builder(source: &Property, target: &Property) -> BindingBuilder {
        BindingBuilder::new(source, target)
    }

    #[must_use]
    pub fn id(&self) -> BindingId {
        self.owner.state.id
    }

    #[must_use]
    pub fn flags(&self) -> BindingFlags {
        self.owner.state.flags
    }

    /// The observed property.
    #[must_use]
    pub fn source(&self) -> &Property {
        &self.owner.state.source
    }

    /// The written property.
    #[must_use]
    pub fn target(&self) -> &Property {
        &self.owner.state.target
    }

    #[must_use]
    pub fn source_property_name(&self) -> &str {
        self.owner.state.source.name()
    }

    #[must_use]
    pub fn target_property_name(&self) -> &str {
        self.owner.state.target.name()
    }

    /// Whether the binding still synchronizes.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.owner.state.bound.get()
    }

    /// Whether ownership was transferred to a registry.
    #[must_use]
    pub fn is_managed(&self) -> bool {
        self.owner.state.managed.get()
    }

    /// Stop synchronizing. Safe to call any number of times.
    pub fn unbind(&self) {
        self.owner.state.unbind();
    }

    /// Transfer ownership to the default manager.
    ///
    /// That is the source object's registry for bindings created by property
    /// name, and the thread's [`BindingRegistry::global`] otherwise.
    pub fn manage(&self) -> BindingId {
        let registry = self
            .owner
            .state
            .home
            .as_ref()
            .and_then(WeakBindingRegistry::upgrade)
            .unwrap_or_else(BindingRegistry::global);
        self.manage_in(&registry)
    }

    /// Transfer ownership to `registry`.
    ///
    /// No-op if the binding is already managed or already unbound. The
    /// binding is released when the registry's last handle goes away.
    pub fn manage_in(&self, registry: &BindingRegistry) -> BindingId {
        let state = &self.owner.state;
        if !state.bound.get() || state.managed.get() {
            return state.id;
        }
        state.managed.set(true);
        *state.manager.borrow_mut() = Some(registry.downgrade());
        registry.adopt(Rc::clone(state) as Rc<dyn ManagedBinding>);
        debug!(id = %state.id, "binding ownership transferred to registry");
        state.id
    }
}

/// Collects flags and transforms for a new [`Binding`].
#[derive(Debug)]
pub struct BindingBuilder {
    source: Property,
    target: Property,
    flags: BindingFlags,
    transform_to: Option<Transform>,
    transform_from: Option<Transform>,
    home: Option<WeakBindingRegistry>,
}

impl BindingBuilder {
    pub fn new(source: &Property, target: &Property) -> Self {
        Self {
            source: source.clone(),
            target: target.clone(),
            flags: BindingFlags::DEFAULT,
            transform_to: None,
            transform_from: None,
            home: None,
        }
    }

    /// Replace the flag set.
    #[must_use]
    pub fn flags(mut self, flags: BindingFlags) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub fn sync_create(mut self) -> Self {
        self.flags |= BindingFlags::SYNC_CREATE;
        self
    }

    #[must_use]
    pub fn bidirectional(mut self) -> Self {
        self.flags |= BindingFlags::BIDIRECTIONAL;
        self
    }

    #[must_use]
    pub fn invert_boolean(mut self) -> Self {
        self.flags |= BindingFlags::INVERT_BOOLEAN;
        self
    }

    /// Source → target transform.
    #[must_use]
    pub fn transform_to(mut self, transform: Transform) -> Self {
        self.transform_to = Some(transform);
        self
    }

    /// Target → source transform; only used with `BIDIRECTIONAL`.
    #[must_use]
    pub fn transform_from(mut self, transform: Transform) -> Self {
        self.transform_from = Some(transform);
        self
    }

    /// Registry that [`Binding::manage`] hands ownership to.
    #[must_use]
    pub fn managed_by(mut self, registry: &BindingRegistry) -> Self {
        self.home = Some(registry.downgrade());
        self
    }

    /// Validate, subscribe, and apply `SYNC_CREATE`.
    pub fn build(self) -> Result<Binding, BindError> {
        if self.source.ptr_eq(&self.target) {
            return Err(BindError::SelfBinding {
                property: self.source.name().to_owned(),
            });
        }

        let source_type = self.source.value_type();
        let target_type = self.target.value_type();
        let bidirectional = self.flags.contains(BindingFlags::BIDIRECTIONAL);

        let (forward, reverse) = if self.flags.contains(BindingFlags::INVERT_BOOLEAN) {
            if self.transform_to.is_some() || self.transform_from.is_some() {
                return Err(BindError::InvertWithTransform);
            }
            if source_type != ValueType::Bool || target_type != ValueType::Bool {
                return Err(BindError::InvertRequiresBool {
                    source: source_type,
                    target: target_type,
                });
            }
            (
                Transform::invert_boolean(),
                bidirectional.then(Transform::invert_boolean),
            )
        } else {
            let forward = resolve(
                Direction::Forward,
                self.transform_to,
                source_type,
                target_type,
            )?;
            let reverse = if bidirectional {
                Some(resolve(
                    Direction::Reverse,
                    self.transform_from,
                    target_type,
                    source_type,
                )?)
            } else {
                None
            };
            (forward, reverse)
        };

        let state = Rc::new(BindingState {
            id: BindingId::next(),
            flags: self.flags,
            source: self.source,
            target: self.target,
            forward,
            reverse,
            subscriptions: RefCell::new(Vec::new()),
            bound: Cell::new(true),
            in_flight: Cell::new(false),
            managed: Cell::new(false),
            manager: RefCell::new(None),
            home: self.home,
        });
        attach(&state);

        debug!(
            id = %state.id,
            source = state.source.name(),
            target = state.target.name(),
            flags = %state.flags.describe(),
            "binding created"
        );

        if state.flags.contains(BindingFlags::SYNC_CREATE) {
            let current = state.source.get();
            state.propagate(Direction::Forward, &current);
        }

        Ok(Binding {
            owner: Rc::new(Owner { state }),
        })
    }
}

fn resolve(
    direction: Direction,
    transform: Option<Transform>,
    from: ValueType,
    to: ValueType,
) -> Result<Transform, BindError> {
    match transform {
        Some(transform) => match transform.signature() {
            Some(found) if found != (from, to) => Err(BindError::TransformTypeMismatch {
                direction,
                expected: (from, to),
                found,
            }),
            _ => Ok(transform),
        },
        None if from.can_convert_to(to) => Ok(Transform::convert(from, to)),
        None => Err(BindError::IncompatibleTypes {
            direction,
            from,
            to,
        }),
    }
}

/// Subscribe the state's callbacks. They hold the state weakly so the
/// subscriptions stored inside it do not form a cycle.
fn attach(state: &Rc<BindingState>) {
    let weak = Rc::downgrade(state);
    let mut subscriptions = vec![state.source.subscribe(move |value| {
        if let Some(state) = weak.upgrade() {
            state.propagate(Direction::Forward, value);
        }
    })];

    if state.reverse.is_some() {
        let weak = Rc::downgrade(state);
        subscriptions.push(state.target.subscribe(move |value| {
            if let Some(state) = weak.upgrade() {
                state.propagate(Direction::Reverse, value);
            }
        }));
    }

    *state.subscriptions.borrow_mut() = subscriptions;
}

/// Bind `source` to `target`.
///
/// With no transform the property types must match or have a default
/// conversion (see [`ValueType::can_convert_to`]).
pub fn bind(
    source: &Property,
    target: &Property,
    flags: BindingFlags,
    transform: Option<Transform>,
) -> Result<Binding, BindError> {
    let mut builder = BindingBuilder::new(source, target).flags(flags);
    if let Some(transform) = transform {
        builder = builder.transform_to(transform);
    }
    builder.build()
}

/// Bind two object properties by name with default conversions.
pub fn bind_property(
    source: &Object,
    source_property: &str,
    target: &Object,
    target_property: &str,
    flags: BindingFlags,
) -> Result<Binding, BindError> {
    bind_property_full(
        source,
        source_property,
        target,
        target_property,
        flags,
        None,
        None,
    )
}

/// Bind two object properties by name.
///
/// [`Binding::manage`] on the result hands ownership to `source`.
pub fn bind_property_full(
    source: &Object,
    source_property: &str,
    target: &Object,
    target_property: &str,
    flags: BindingFlags,
    transform_to: Option<Transform>,
    transform_from: Option<Transform>,
) -> Result<Binding, BindError> {
    let source_prop = lookup(source, source_property)?;
    let target_prop = lookup(target, target_property)?;

    let mut builder = BindingBuilder::new(&source_prop, &target_prop)
        .flags(flags)
        .managed_by(source.registry());
    if let Some(transform) = transform_to {
        builder = builder.transform_to(transform);
    }
    if let Some(transform) = transform_from {
        builder = builder.transform_from(transform);
    }
    builder.build()
}

fn lookup(object: &Object, name: &str) -> Result<Property, BindError> {
    object
        .property(name)
        .ok_or_else(|| BindError::UnknownProperty {
            type_name: object.type_name().to_owned(),
            property: name.to_owned(),
        })
}
