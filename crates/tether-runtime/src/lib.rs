#![forbid(unsafe_code)]

//! Runtime: the property-binding engine.
//!
//! # Role in Tether
//! `tether-runtime` links properties from `tether-core`. A [`Binding`]
//! subscribes to a source property and writes each transformed change to a
//! target property, synchronously and at most once per change.
//!
//! # Primary responsibilities
//! - **Binding**: bind/unbind, scope-based release, and ownership transfer
//!   to a [`BindingRegistry`] via [`Binding::manage`].
//! - **BindingFlags**: `SYNC_CREATE`, `BIDIRECTIONAL`, `INVERT_BOOLEAN`.
//! - **Transform**: typed and untyped value mappings, plus stock transforms
//!   such as [`transform::string_to_int`].
//!
//! # Example
//!
//! ```
//! use tether_core::Object;
//! use tether_runtime::{BindingFlags, bind_property_full, transform};
//!
//! let source = Object::new("StringSource").with_property("string", "89").unwrap();
//! let target = Object::new("IntTarget").with_property("int", 7).unwrap();
//!
//! let binding = bind_property_full(
//!     &source, "string", &target, "int",
//!     BindingFlags::SYNC_CREATE,
//!     Some(transform::string_to_int()),
//!     None,
//! )
//! .unwrap();
//! assert_eq!(target.property("int").unwrap().get_as::<i32>(), Some(89));
//!
//! binding.manage();
//! drop(binding);
//! source.property("string").unwrap().set("2001").unwrap();
//! assert_eq!(target.property("int").unwrap().get_as::<i32>(), Some(2001));
//! ```

pub mod binding;
pub mod error;
pub mod flags;
pub mod transform;

pub use binding::{Binding, BindingBuilder, Direction, bind, bind_property, bind_property_full};
pub use error::BindError;
pub use flags::BindingFlags;
pub use tether_core::{BindingId, BindingRegistry};
pub use transform::Transform;
