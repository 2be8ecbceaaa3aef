//! Errors raised by property slots and objects.

use crate::value::ValueType;

/// Errors from property operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyError {
    /// A value of the wrong type was written to a property.
    TypeMismatch {
        property: String,
        expected: ValueType,
        found: ValueType,
    },
    /// An object already has a property with this name.
    DuplicateProperty { type_name: String, property: String },
}

impl std::fmt::Display for PropertyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TypeMismatch {
                property,
                expected,
                found,
            } => write!(
                f,
                "property '{property}' holds {expected}, cannot store {found}"
            ),
            Self::DuplicateProperty {
                type_name,
                property,
            } => write!(f, "{type_name} already has a property named '{property}'"),
        }
    }
}

impl std::error::Error for PropertyError {}
