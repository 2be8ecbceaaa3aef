#![forbid(unsafe_code)]

//! Objects: named property sets that own a managed-binding table.
//!
//! An [`Object`] is a thin, shared handle. It carries a type name (for
//! diagnostics), an ordered list of [`Property`] slots, and a
//! [`BindingRegistry`]. Bindings handed over to the object through `manage`
//! are released when the last handle to the object is dropped.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::PropertyError;
use crate::property::Property;
use crate::registry::BindingRegistry;
use crate::value::Value;

struct ObjectInner {
    type_name: Box<str>,
    properties: RefCell<Vec<Property>>,
    registry: BindingRegistry,
}

/// Shared handle to an object.
#[derive(Clone)]
pub struct Object {
    inner: Rc<ObjectInner>,
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .inner
            .properties
            .borrow()
            .iter()
            .map(|p| p.name().to_owned())
            .collect();
        f.debug_struct("Object")
            .field("type_name", &self.inner.type_name)
            .field("properties", &names)
            .field("managed_bindings", &self.inner.registry.len())
            .finish()
    }
}

impl Object {
    /// Create an object with no properties.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(ObjectInner {
                type_name: type_name.into().into_boxed_str(),
                properties: RefCell::new(Vec::new()),
                registry: BindingRegistry::new(),
            }),
        }
    }

    /// Builder form of [`install_property`](Self::install_property).
    pub fn with_property(
        self,
        name: impl Into<String>,
        initial: impl Into<Value>,
    ) -> Result<Self, PropertyError> {
        self.install_property(name, initial)?;
        Ok(self)
    }

    /// Add a property. Names are unique per object.
    pub fn install_property(
        &self,
        name: impl Into<String>,
        initial: impl Into<Value>,
    ) -> Result<Property, PropertyError> {
        let name = name.into();
        let mut properties = self.inner.properties.borrow_mut();
        if properties.iter().any(|p| p.name() == name) {
            return Err(PropertyError::DuplicateProperty {
                type_name: self.inner.type_name.to_string(),
                property: name,
            });
        }
        let property = Property::new(name, initial);
        properties.push(property.clone());
        Ok(property)
    }

    /// Look up a property by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<Property> {
        self.inner
            .properties
            .borrow()
            .iter()
            .find(|p| p.name() == name)
            .cloned()
    }

    /// All properties in installation order.
    #[must_use]
    pub fn properties(&self) -> Vec<Property> {
        self.inner.properties.borrow().clone()
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.inner.type_name
    }

    /// The table holding bindings managed by this object.
    #[must_use]
    pub fn registry(&self) -> &BindingRegistry {
        &self.inner.registry
    }

    /// Whether two handles refer to the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}
