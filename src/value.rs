//! The wire tree.
//!
//! This module provides [`Value`], the transport-agnostic, JSON-representable
//! tree produced by serialization and consumed by deserialization, together
//! with [`Shape`], the classification every decoder matches on.
//!
//! ## Wire shapes
//!
//! | Shape | Encoding |
//! |-------|----------|
//! | Primitive | `null`, booleans, numbers, strings |
//! | Sequence | arrays |
//! | Mapping | objects without reserved keys |
//! | Object | `{ <field>: <Value>, ..., "__type__": "<TypeName>" }` |
//! | Reference | `{ "@": <id> }` |
//!
//! ## Examples
//!
//! ```rust
//! use serde_memo::{wire, Shape, Value};
//!
//! let point = wire!({ "x": 1, "y": 2, "__type__": "Point" });
//! assert!(matches!(point.shape(), Ok(Shape::Object { type_name: "Point", .. })));
//!
//! let reference = Value::reference(0);
//! assert!(matches!(reference.shape(), Ok(Shape::Reference(0))));
//! ```

use crate::{Error, Result, ValueMap};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Reserved key naming the registered type of an object encoding.
pub const TYPE_KEY: &str = "__type__";

/// Reserved key carrying the memo id of a reference marker.
pub const REF_KEY: &str = "@";

/// Returns `true` if `key` is one of the reserved wire keys.
#[inline]
#[must_use]
pub fn is_reserved_key(key: &str) -> bool {
    key == TYPE_KEY || key == REF_KEY
}

/// A node of the wire tree.
///
/// # Examples
///
/// ```rust
/// use serde_memo::{Value, Number};
///
/// let null = Value::Null;
/// let num = Value::Number(Number::Integer(42));
/// let text = Value::String("hello".to_string());
///
/// assert!(null.is_null());
/// assert!(num.is_number());
/// assert!(text.is_string());
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    Object(ValueMap),
}

/// A numeric wire value.
///
/// # Examples
///
/// ```rust
/// use serde_memo::Number;
///
/// assert!(Number::Integer(42).is_integer());
/// assert_eq!(Number::Float(42.0).as_i64(), Some(42));
/// assert_eq!(Number::Integer(3).as_f64(), 3.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Number::Integer(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Number::Float(_))
    }

    /// Converts this number to an `i64` if possible.
    ///
    /// Returns `Some(i64)` for integers and for floats with no fractional part
    /// that fit in the `i64` range.
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Integer(i) => Some(*i),
            Number::Float(f) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    Some(*f as i64)
                } else {
                    None
                }
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(i) => *i as f64,
            Number::Float(f) => *f,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{}", i),
            Number::Float(fl) => write!(f, "{}", fl),
        }
    }
}

/// Structural classification of a wire node.
///
/// `__type__` takes precedence over `@` when a mapping carries both.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape<'a> {
    Primitive(&'a Value),
    Sequence(&'a [Value]),
    Mapping(&'a ValueMap),
    Object {
        type_name: &'a str,
        fields: &'a ValueMap,
    },
    Reference(usize),
}

impl Value {
    /// Builds a reference marker `{"@": id}`.
    #[must_use]
    pub fn reference(id: usize) -> Self {
        let mut map = ValueMap::with_capacity(1);
        map.insert(REF_KEY.to_string(), Value::Number(Number::Integer(id as i64)));
        Value::Object(map)
    }

    /// Classifies this node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTypeTag`] if `__type__` is not a string and
    /// [`Error::InvalidReference`] if `@` is not a non-negative integer.
    pub fn shape(&self) -> Result<Shape<'_>> {
        match self {
            Value::Array(items) => Ok(Shape::Sequence(items)),
            Value::Object(map) => {
                if let Some(tag) = map.get(TYPE_KEY) {
                    return match tag {
                        Value::String(type_name) => Ok(Shape::Object {
                            type_name: type_name.as_str(),
                            fields: map,
                        }),
                        other => Err(Error::InvalidTypeTag(other.kind().to_string())),
                    };
                }
                if let Some(id) = map.get(REF_KEY) {
                    return id
                        .as_i64()
                        .and_then(|id| usize::try_from(id).ok())
                        .map(Shape::Reference)
                        .ok_or_else(|| Error::InvalidReference(id.to_string()));
                }
                Ok(Shape::Mapping(map))
            }
            primitive => Ok(Shape::Primitive(primitive)),
        }
    }

    /// Returns the type name of an object encoding, if this is one.
    #[must_use]
    pub fn type_tag(&self) -> Option<&str> {
        self.as_object()
            .and_then(|map| map.get(TYPE_KEY))
            .and_then(Value::as_str)
    }

    /// Short name of the variant, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(Number::Integer(_)) => "integer",
            Value::Number(Number::Float(_)) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// If the value is a boolean, returns it. Otherwise returns `None`.
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// If the value is a string, returns a reference to it. Otherwise returns `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_memo::Value;
    ///
    /// assert_eq!(Value::from("hello").as_str(), Some("hello"));
    /// assert_eq!(Value::from(42).as_str(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// If the value is an i64 integer or a whole-number float, returns it.
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&ValueMap> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Array(arr) => {
                write!(
                    f,
                    "[{}]",
                    arr.iter()
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join(",")
                )
            }
            Value::Object(map) => {
                write!(
                    f,
                    "{{{}}}",
                    map.iter()
                        .map(|(k, v)| format!("{:?}:{}", k, v))
                        .collect::<Vec<_>>()
                        .join(",")
                )
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(Number::Integer(i)) => serializer.serialize_i64(*i),
            Value::Number(Number::Float(f)) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(arr) => {
                use serde::ser::SerializeSeq;
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for element in arr {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            Value::Object(obj) => {
                use serde::ser::SerializeMap;
                let mut map = serializer.serialize_map(Some(obj.len()))?;
                for (k, v) in obj.iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a null, boolean, number, string, array or map")
            }

            fn visit_bool<E>(self, value: bool) -> std::result::Result<Self::Value, E> {
                Ok(Value::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> std::result::Result<Self::Value, E> {
                Ok(Value::Number(Number::Integer(value)))
            }

            fn visit_u64<E>(self, value: u64) -> std::result::Result<Self::Value, E> {
                if value <= i64::MAX as u64 {
                    Ok(Value::Number(Number::Integer(value as i64)))
                } else {
                    Ok(Value::Number(Number::Float(value as f64)))
                }
            }

            fn visit_f64<E>(self, value: f64) -> std::result::Result<Self::Value, E> {
                Ok(Value::Number(Number::Float(value)))
            }

            fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E> {
                Ok(Value::String(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> std::result::Result<Self::Value, E> {
                Ok(Value::String(value))
            }

            fn visit_unit<E>(self) -> std::result::Result<Self::Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E>(self) -> std::result::Result<Self::Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut vec = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(elem) = seq.next_element()? {
                    vec.push(elem);
                }
                Ok(Value::Array(vec))
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut values = ValueMap::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry()? {
                    values.insert(key, value);
                }
                Ok(Value::Object(values))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(Number::Integer(value as i64))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(Number::Integer(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(Number::Integer(value as i64))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(Number::Float(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<ValueMap> for Value {
    fn from(value: ValueMap) -> Self {
        Value::Object(value)
    }
}

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_of(entries: Vec<(&str, Value)>) -> Value {
        Value::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    #[test]
    fn test_shape_primitives_and_sequences() {
        assert_eq!(Value::Null.shape().unwrap(), Shape::Primitive(&Value::Null));
        let arr = Value::Array(vec![Value::from(1)]);
        assert!(matches!(arr.shape().unwrap(), Shape::Sequence(items) if items.len() == 1));
    }

    #[test]
    fn test_shape_type_tag_wins_over_reference() {
        let both = map_of(vec![
            ("@", Value::from(3)),
            (TYPE_KEY, Value::from("Point")),
        ]);
        assert!(matches!(
            both.shape().unwrap(),
            Shape::Object {
                type_name: "Point",
                ..
            }
        ));
    }

    #[test]
    fn test_shape_rejects_malformed_reserved_keys() {
        let bad_tag = map_of(vec![(TYPE_KEY, Value::from(1))]);
        assert_eq!(
            bad_tag.shape(),
            Err(Error::InvalidTypeTag("integer".to_string()))
        );

        let negative = map_of(vec![(REF_KEY, Value::from(-1))]);
        assert!(matches!(negative.shape(), Err(Error::InvalidReference(_))));

        let text = map_of(vec![(REF_KEY, Value::from("0"))]);
        assert!(matches!(text.shape(), Err(Error::InvalidReference(_))));
    }

    #[test]
    fn test_reference_accepts_whole_float_ids() {
        let float_id = map_of(vec![(REF_KEY, Value::from(2.0))]);
        assert_eq!(float_id.shape().unwrap(), Shape::Reference(2));
    }

    #[test]
    fn test_type_tag() {
        let obj = map_of(vec![(TYPE_KEY, Value::from("Rule"))]);
        assert_eq!(obj.type_tag(), Some("Rule"));
        assert_eq!(Value::reference(0).type_tag(), None);
        assert!(is_reserved_key("@"));
        assert!(!is_reserved_key("type"));
    }

    #[test]
    fn test_display() {
        let obj = map_of(vec![("a", Value::Array(vec![Value::from(1), Value::Null]))]);
        assert_eq!(obj.to_string(), "{\"a\":[1,null]}");
    }
}
