#![forbid(unsafe_code)]

//! Core: values, observable property slots, objects, and managed-binding tables.
//!
//! # Role in Tether
//! `tether-core` is the object layer the binding engine sits on. It owns
//! typed [`Property`] slots with synchronous change notification, the
//! [`Object`] handle that groups them by name, and the [`BindingRegistry`]
//! that manager-owned bindings are parked in.
//!
//! # How it fits in the system
//! The runtime (`tether-runtime`) subscribes to source properties and writes
//! target properties. It never reaches into slot storage; everything goes
//! through [`Property::get`], [`Property::set`] and [`Property::subscribe`].
//!
//! # Threading
//! All handles are `Rc`-based and therefore `!Send`. Notifications run to
//! completion on the writing thread before `set()` returns.

pub mod error;
pub mod logging;
pub mod object;
pub mod property;
pub mod registry;
pub mod value;

use std::sync::OnceLock;

pub use error::PropertyError;
pub use object::Object;
pub use property::{Property, Subscription};
pub use registry::{BindingId, BindingRegistry, ManagedBinding, WeakBindingRegistry};
pub use value::{Value, ValueKind, ValueType};

static INIT: OnceLock<()> = OnceLock::new();

/// One-time, process-wide setup.
///
/// Safe to call any number of times. With the `tracing-json` feature it
/// installs a subscriber configured from [`logging::LogConfig::from_env`];
/// otherwise it only records that initialization happened.
pub fn init() {
    INIT.get_or_init(|| {
        #[cfg(feature = "tracing-json")]
        {
            logging::install_from(&logging::LogConfig::from_env());
        }
    });
}

/// Whether [`init`] has run in this process.
#[must_use]
pub fn is_initialized() -> bool {
    INIT.get().is_some()
}
