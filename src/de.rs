//! Lenient numeric decoding.
//!
//! The webhook is inconsistent about numbers: timestamps usually arrive as
//! `"1603069091"`, coordinates as bare floats, and either may flip. These
//! helpers accept a JSON number or a string holding one, and reject anything
//! else with a serde `invalid_value`/`invalid_type` error naming the raw input.
//!
//! The form a value arrived in is kept next to it, so it can be written back
//! the way it was sent.

use serde::{
    de::{self, Unexpected, Visitor},
    Deserializer, Serialize, Serializer,
};
use std::{fmt, marker::PhantomData, str::FromStr};

pub(crate) trait Numeric: FromStr + Copy {
    const EXPECTING: &'static str;

    fn from_i64(v: i64) -> Option<Self>;

    fn from_u64(v: u64) -> Option<Self>;

    fn from_f64(v: f64) -> Option<Self>;

    /// Extra acceptance check applied to values parsed from strings.
    #[inline]
    fn is_acceptable(self) -> bool {
        true
    }
}

impl Numeric for i64 {
    const EXPECTING: &'static str = "an integer or a string holding an integer";

    #[inline]
    fn from_i64(v: i64) -> Option<Self> {
        Some(v)
    }

    #[inline]
    fn from_u64(v: u64) -> Option<Self> {
        i64::try_from(v).ok()
    }

    #[inline]
    fn from_f64(_: f64) -> Option<Self> {
        None
    }
}

impl Numeric for f64 {
    const EXPECTING: &'static str = "a number or a string holding a number";

    #[inline]
    fn from_i64(v: i64) -> Option<Self> {
        Some(v as f64)
    }

    #[inline]
    fn from_u64(v: u64) -> Option<Self> {
        Some(v as f64)
    }

    #[inline]
    fn from_f64(v: f64) -> Option<Self> {
        v.is_finite().then_some(v)
    }

    // "NaN" and "inf" parse, but are not coordinates
    #[inline]
    fn is_acceptable(self) -> bool {
        self.is_finite()
    }
}

/// How a lenient number appeared on the wire.
#[derive(PartialEq, Eq, Clone, Debug)]
pub(crate) enum WireForm {
    /// A bare JSON number.
    Number,
    /// A JSON string, kept verbatim.
    Text(Box<str>),
}

struct LenientVisitor<T>(PhantomData<T>);

impl<'de, T: Numeric> Visitor<'de> for LenientVisitor<T> {
    type Value = (T, WireForm);

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(T::EXPECTING)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        T::from_i64(v)
            .map(|n| (n, WireForm::Number))
            .ok_or_else(|| E::invalid_value(Unexpected::Signed(v), &self))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        T::from_u64(v)
            .map(|n| (n, WireForm::Number))
            .ok_or_else(|| E::invalid_value(Unexpected::Unsigned(v), &self))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        T::from_f64(v)
            .map(|n| (n, WireForm::Number))
            .ok_or_else(|| E::invalid_value(Unexpected::Float(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse::<T>()
            .ok()
            .filter(|parsed| parsed.is_acceptable())
            .map(|n| (n, WireForm::Text(v.into())))
            .ok_or_else(|| E::invalid_value(Unexpected::Str(v), &self))
    }
}

/// Reads a number or a numeric string, returning the value and the form it came in.
pub(crate) fn deserialize_lenient<'de, T, D>(deserializer: D) -> Result<(T, WireForm), D::Error>
where
    T: Numeric,
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(LenientVisitor(PhantomData))
}

/// Writes `value` back in `form`.
pub(crate) fn serialize_lenient<T, S>(value: &T, form: &WireForm, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    match form {
        WireForm::Number => value.serialize(serializer),
        WireForm::Text(text) => serializer.serialize_str(text),
    }
}
