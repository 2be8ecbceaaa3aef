#![forbid(unsafe_code)]

//! Value transforms applied on the way from one property to another.
//!
//! A [`Transform`] maps a source [`Value`] to an optional target value.
//! `None` means "do not write"; it is an expected outcome, not an error.
//!
//! Typed transforms ([`Transform::typed`]) record their input and output
//! types so `bind` can reject a mismatch with the bound properties before
//! anything is subscribed. Untyped transforms ([`Transform::new`]) are
//! checked only when the target rejects the write.
//!
//! Transforms must be pure. The engine calls one at least once per
//! triggering change and writes at most once per triggering change.

use std::fmt;
use std::rc::Rc;

use tether_core::value::{Value, ValueKind, ValueType};

type TransformFn = dyn Fn(&Value) -> Option<Value>;

/// A shareable `(Value) -> Option<Value>` function.
#[derive(Clone)]
pub struct Transform {
    func: Rc<TransformFn>,
    signature: Option<(ValueType, ValueType)>,
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

impl Transform {
    /// Wrap an untyped function.
    #[must_use]
    pub fn new(func: impl Fn(&Value) -> Option<Value> + 'static) -> Self {
        Self {
            func: Rc::new(func),
            signature: None,
        }
    }

    /// Wrap a function between two concrete value kinds.
    ///
    /// Inputs of any other type yield `None`.
    #[must_use]
    pub fn typed<S, T>(func: impl Fn(&S) -> Option<T> + 'static) -> Self
    where
        S: ValueKind,
        T: ValueKind,
    {
        Self {
            func: Rc::new(move |value: &Value| {
                let input = S::from_value(value)?;
                func(&input).map(T::into_value)
            }),
            signature: Some((S::TYPE, T::TYPE)),
        }
    }

    /// The default conversion into `target` (see [`Value::convert_to`]).
    #[must_use]
    pub fn convert(source: ValueType, target: ValueType) -> Self {
        Self {
            func: Rc::new(move |value: &Value| value.convert_to(target)),
            signature: Some((source, target)),
        }
    }

    /// Boolean negation.
    #[must_use]
    pub fn invert_boolean() -> Self {
        Self::typed(|v: &bool| Some(!*v))
    }

    /// Declared `(input, output)` types, if known.
    #[must_use]
    pub fn signature(&self) -> Option<(ValueType, ValueType)> {
        self.signature
    }

    /// Run the transform.
    #[must_use]
    pub fn apply(&self, value: &Value) -> Option<Value> {
        (self.func)(value)
    }
}

/// Text → `int` with `strtol` semantics and range rejection.
#[must_use]
pub fn string_to_int() -> Transform {
    Transform::typed(|s: &String| parse_i32(s))
}

/// Any value → its [`Display`](fmt::Display) text.
#[must_use]
pub fn to_text(source: ValueType) -> Transform {
    Transform {
        func: Rc::new(|value: &Value| Some(Value::String(value.to_string()))),
        signature: Some((source, ValueType::String)),
    }
}

/// Parse a decimal integer prefix the way C `strtol(_, _, 10)` does, then
/// reject anything outside `i32`.
///
/// Leading ASCII whitespace and one optional sign are skipped; parsing stops
/// at the first non-digit and the rest of the text is ignored. Returns `None`
/// when no digit was consumed, or when the value does not fit in `i32`.
/// Out-of-range input is rejected, never clamped.
#[must_use]
pub fn parse_i32(text: &str) -> Option<i32> {
    let bytes = text.as_bytes();
    let mut pos = bytes
        .iter()
        .position(|b| !matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C))
        .unwrap_or(bytes.len());

    let negative = match bytes.get(pos) {
        Some(b'-') => {
            pos += 1;
            true
        }
        Some(b'+') => {
            pos += 1;
            false
        }
        _ => false,
    };

    let digits = bytes[pos..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .map(|b| i64::from(b - b'0'));

    // Accumulate negatively so i32::MIN is representable on the way.
    let mut acc: i64 = 0;
    let mut consumed = 0usize;
    for digit in digits {
        consumed += 1;
        acc = acc.checked_mul(10)?.checked_sub(digit)?;
        if acc < i64::from(i32::MIN) {
            return None;
        }
    }
    if consumed == 0 {
        return None;
    }

    let value = if negative { acc } else { acc.checked_neg()? };
    i32::try_from(value).ok()
}
