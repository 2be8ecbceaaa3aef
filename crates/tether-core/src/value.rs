#![forbid(unsafe_code)]

//! Variant-erased property values with runtime type tags.
//!
//! Every [`Property`](crate::property::Property) holds a [`Value`] and is
//! tagged with the [`ValueType`] it was created with. Bindings compare tags
//! at bind time, so a mismatch without a transform is rejected before any
//! notification is wired up.
//!
//! # Default conversions
//!
//! | From     | To                         |
//! |----------|----------------------------|
//! | any `T`  | `T`                        |
//! | `Int`    | `Int64`, `Double`          |
//! | `UInt`   | `Int64`, `Double`          |
//! | `Bool`   | `Int`                      |
//!
//! Every listed conversion is lossless. Anything else needs an explicit
//! transform.

use std::fmt;

/// Runtime type tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Bool,
    Int,
    Int64,
    UInt,
    Double,
    String,
}

impl ValueType {
    /// Stable lowercase name, used in logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Int64 => "int64",
            Self::UInt => "uint",
            Self::Double => "double",
            Self::String => "string",
        }
    }

    /// Whether a value of this type can be converted to `target` without a
    /// user-supplied transform.
    #[must_use]
    pub const fn can_convert_to(self, target: ValueType) -> bool {
        matches!(
            (self, target),
            (Self::Bool, Self::Bool)
                | (Self::Int, Self::Int)
                | (Self::Int64, Self::Int64)
                | (Self::UInt, Self::UInt)
                | (Self::Double, Self::Double)
                | (Self::String, Self::String)
                | (Self::Int, Self::Int64 | Self::Double)
                | (Self::UInt, Self::Int64 | Self::Double)
                | (Self::Bool, Self::Int)
        )
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Int64(i64),
    UInt(u32),
    Double(f64),
    String(String),
}

impl Value {
    /// The type tag of this value.
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::Bool(_) => ValueType::Bool,
            Self::Int(_) => ValueType::Int,
            Self::Int64(_) => ValueType::Int64,
            Self::UInt(_) => ValueType::UInt,
            Self::Double(_) => ValueType::Double,
            Self::String(_) => ValueType::String,
        }
    }

    /// Zero value for a type: `false`, `0`, `0.0` or the empty string.
    #[must_use]
    pub fn default_for(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Bool => Self::Bool(false),
            ValueType::Int => Self::Int(0),
            ValueType::Int64 => Self::Int64(0),
            ValueType::UInt => Self::UInt(0),
            ValueType::Double => Self::Double(0.0),
            ValueType::String => Self::String(String::new()),
        }
    }

    /// Apply the default conversion to `target`.
    ///
    /// Returns `None` when [`ValueType::can_convert_to`] does not allow the
    /// pair.
    #[must_use]
    pub fn convert_to(&self, target: ValueType) -> Option<Value> {
        if self.value_type() == target {
            return Some(self.clone());
        }
        match (self, target) {
            (Self::Int(v), ValueType::Int64) => Some(Self::Int64(i64::from(*v))),
            (Self::Int(v), ValueType::Double) => Some(Self::Double(f64::from(*v))),
            (Self::UInt(v), ValueType::Int64) => Some(Self::Int64(i64::from(*v))),
            (Self::UInt(v), ValueType::Double) => Some(Self::Double(f64::from(*v))),
            (Self::Bool(v), ValueType::Int) => Some(Self::Int(i32::from(*v))),
            _ => None,
        }
    }

    /// Extract a typed copy of the payload, if the tag matches `T`.
    #[must_use]
    pub fn get<T: ValueKind>(&self) -> Option<T> {
        T::from_value(self)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

/// Rust types that map onto a [`ValueType`].
pub trait ValueKind: Sized + 'static {
    /// The tag values of this type carry.
    const TYPE: ValueType;

    /// Borrowing extraction; `None` when the tag differs.
    fn from_value(value: &Value) -> Option<Self>;

    /// Wrap into a [`Value`].
    fn into_value(self) -> Value;
}

macro_rules! value_kind {
    ($ty:ty, $variant:ident) => {
        impl ValueKind for $ty {
            const TYPE: ValueType = ValueType::$variant;

            #[inline]
            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }

            #[inline]
            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }

        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::$variant(value)
            }
        }
    };
}

value_kind!(bool, Bool);
value_kind!(i32, Int);
value_kind!(i64, Int64);
value_kind!(u32, UInt);
value_kind!(f64, Double);
value_kind!(String, String);
