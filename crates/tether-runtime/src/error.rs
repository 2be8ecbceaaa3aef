//! Bind-time errors.
//!
//! Every variant is raised by `bind` before any subscription exists, so a
//! failed bind leaves both properties untouched. Runtime propagation never
//! produces errors: empty transform results and rejected writes are
//! swallowed (the latter with a `warn` log).

use tether_core::ValueType;

use crate::binding::Direction;

/// Reasons a binding could not be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// The named property does not exist on the object.
    UnknownProperty { type_name: String, property: String },
    /// Source and target are the same slot.
    SelfBinding { property: String },
    /// No transform was given and the types have no default conversion.
    IncompatibleTypes {
        direction: Direction,
        from: ValueType,
        to: ValueType,
    },
    /// A typed transform does not match the bound properties.
    TransformTypeMismatch {
        direction: Direction,
        expected: (ValueType, ValueType),
        found: (ValueType, ValueType),
    },
    /// `INVERT_BOOLEAN` on a non-`bool` property.
    InvertRequiresBool { source: ValueType, target: ValueType },
    /// `INVERT_BOOLEAN` combined with a custom transform.
    InvertWithTransform,
}

impl std::fmt::Display for BindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownProperty {
                type_name,
                property,
            } => write!(f, "{type_name} has no property named '{property}'"),
            Self::SelfBinding { property } => {
                write!(f, "cannot bind property '{property}' to itself")
            }
            Self::IncompatibleTypes {
                direction,
                from,
                to,
            } => write!(
                f,
                "no {direction} conversion from {from} to {to}; supply a transform"
            ),
            Self::TransformTypeMismatch {
                direction,
                expected,
                found,
            } => write!(
                f,
                "{direction} transform maps {} -> {}, properties need {} -> {}",
                found.0, found.1, expected.0, expected.1
            ),
            Self::InvertRequiresBool { source, target } => write!(
                f,
                "INVERT_BOOLEAN needs bool properties, got {source} and {target}"
            ),
            Self::InvertWithTransform => {
                f.write_str("INVERT_BOOLEAN cannot be combined with a custom transform")
            }
        }
    }
}

impl std::error::Error for BindError {}
