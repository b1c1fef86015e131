//! Object graph → wire tree.
//!
//! This module provides the [`Serializer`] and the [`ToValue`] trait it
//! drives. Dispatch is by static type: sequences keep their order, sets
//! emit their elements in iteration order, string-keyed maps keep their keys,
//! and objects ([`Rc<T>`] of a [`Serializable`], or an [`ObjectRef`]) become
//! `__type__`-tagged mappings.
//!
//! ## Memoization
//!
//! With a [`Memoizer`] attached, the first occurrence of a tracked object is
//! assigned the next id and still encoded in full; every later occurrence of
//! the same allocation becomes `{"@": id}`.
//!
//! ```rust
//! use serde_memo::{serializable, wire, Memoizer, Serializer};
//! use std::rc::Rc;
//!
//! #[derive(Default)]
//! struct Point { x: i64, y: i64 }
//! serializable!(Point { x, y });
//!
//! let p = Rc::new(Point { x: 1, y: 2 });
//! let mut memo = Memoizer::new().track::<Point>();
//! let value = Serializer::with_memo(&mut memo)
//!     .serialize(&(Rc::clone(&p), p))
//!     .unwrap();
//!
//! assert_eq!(value, wire!([{ "x": 1, "y": 2, "__type__": "Point" }, { "@": 0 }]));
//! ```

use crate::object::AnyObject;
use crate::{
    CodecOptions, Error, Memoizer, Node, Number, ObjectRef, Result, Serializable, Value, ValueMap,
};
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::{IndexMap, IndexSet};
use num_bigint::BigInt;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::rc::Rc;

/// Conversion of an in-memory value into a wire node.
pub trait ToValue {
    fn to_value(&self, ser: &mut Serializer<'_>) -> Result<Value>;
}

enum MemoMode<'m> {
    Off,
    Live(&'m mut Memoizer),
    Frozen(&'m Memoizer),
}

/// The serializer.
///
/// Holds the memo (if any), the options and the current nesting depth for
/// one serialize call.
pub struct Serializer<'m> {
    memo: MemoMode<'m>,
    options: CodecOptions,
    depth: usize,
}

impl<'m> Serializer<'m> {
    /// A serializer without memoization.
    #[must_use]
    pub fn new() -> Self {
        Serializer {
            memo: MemoMode::Off,
            options: CodecOptions::default(),
            depth: 0,
        }
    }

    /// A serializer that registers tracked objects in `memo`.
    pub fn with_memo(memo: &'m mut Memoizer) -> Self {
        Serializer {
            memo: MemoMode::Live(memo),
            ..Self::new()
        }
    }

    /// A serializer that turns tracked objects into references using the ids
    /// `memo` already holds, without assigning new ones.
    pub fn frozen(memo: &'m Memoizer) -> Self {
        Serializer {
            memo: MemoMode::Frozen(memo),
            ..Self::new()
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: CodecOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    #[must_use]
    pub fn is_memoizing(&self) -> bool {
        !matches!(self.memo, MemoMode::Off)
    }

    /// Serializes `value`, counting one level of nesting.
    pub fn serialize<T: ToValue + ?Sized>(&mut self, value: &T) -> Result<Value> {
        if let Some(limit) = self.options.max_depth {
            if self.depth >= limit {
                return Err(Error::DepthLimitExceeded(limit));
            }
        }
        self.depth += 1;
        let result = value.to_value(self);
        self.depth -= 1;
        result
    }

    /// Serializes an object, consulting the memo when its type is tracked.
    pub fn serialize_object(&mut self, object: &Rc<dyn AnyObject>) -> Result<Value> {
        match &mut self.memo {
            MemoMode::Live(memo) if memo.tracks(object.concrete_type_id()) => {
                if let Some(id) = memo.enumerator().position(object) {
                    log::trace!("reference #{} to {}", id, object.type_name());
                    return Ok(Value::reference(id));
                }
                let id = memo.enumerator_mut().get(object);
                log::trace!("memoized {} as #{}", object.type_name(), id);
            }
            MemoMode::Frozen(memo) if memo.tracks(object.concrete_type_id()) => {
                return memo
                    .enumerator()
                    .position(object)
                    .map(Value::reference)
                    .ok_or_else(|| Error::UnregisteredObject(object.type_name().to_string()));
            }
            _ => {}
        }
        object.encode(self)
    }
}

impl Default for Serializer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Serializable> ToValue for Rc<T> {
    fn to_value(&self, ser: &mut Serializer<'_>) -> Result<Value> {
        let object: Rc<dyn AnyObject> = Rc::clone(self) as Rc<dyn AnyObject>;
        ser.serialize_object(&object)
    }
}

impl ToValue for ObjectRef {
    fn to_value(&self, ser: &mut Serializer<'_>) -> Result<Value> {
        ser.serialize_object(self.as_rc())
    }
}

impl ToValue for Value {
    fn to_value(&self, _ser: &mut Serializer<'_>) -> Result<Value> {
        Ok(self.clone())
    }
}

impl ToValue for Node {
    fn to_value(&self, ser: &mut Serializer<'_>) -> Result<Value> {
        match self {
            Node::Null => Ok(Value::Null),
            Node::Bool(b) => Ok(Value::Bool(*b)),
            Node::Number(n) => Ok(Value::Number(*n)),
            Node::String(s) => Ok(Value::String(s.clone())),
            Node::List(items) | Node::Set(items) => serialize_seq(items.iter(), ser),
            Node::Map(map) => serialize_map(map.iter(), ser),
            Node::Object(object) => ser.serialize_object(object.as_rc()),
        }
    }
}

impl ToValue for bool {
    fn to_value(&self, _ser: &mut Serializer<'_>) -> Result<Value> {
        Ok(Value::Bool(*self))
    }
}

macro_rules! lossless_integer {
    ($($ty:ty),*) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self, _ser: &mut Serializer<'_>) -> Result<Value> {
                    Ok(Value::Number(Number::Integer(i64::from(*self))))
                }
            }
        )*
    };
}

lossless_integer!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! wide_integer {
    ($($ty:ty),*) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self, _ser: &mut Serializer<'_>) -> Result<Value> {
                    i64::try_from(*self)
                        .map(|i| Value::Number(Number::Integer(i)))
                        .map_err(|_| Error::out_of_range(format!("{} does not fit in i64", self)))
                }
            }
        )*
    };
}

wide_integer!(u64, usize, isize);

impl ToValue for f32 {
    fn to_value(&self, _ser: &mut Serializer<'_>) -> Result<Value> {
        Ok(Value::Number(Number::Float(f64::from(*self))))
    }
}

impl ToValue for f64 {
    fn to_value(&self, _ser: &mut Serializer<'_>) -> Result<Value> {
        Ok(Value::Number(Number::Float(*self)))
    }
}

impl ToValue for str {
    fn to_value(&self, _ser: &mut Serializer<'_>) -> Result<Value> {
        Ok(Value::String(self.to_string()))
    }
}

impl ToValue for String {
    fn to_value(&self, _ser: &mut Serializer<'_>) -> Result<Value> {
        Ok(Value::String(self.clone()))
    }
}

impl ToValue for char {
    fn to_value(&self, _ser: &mut Serializer<'_>) -> Result<Value> {
        Ok(Value::String(self.to_string()))
    }
}

impl ToValue for DateTime<Utc> {
    fn to_value(&self, _ser: &mut Serializer<'_>) -> Result<Value> {
        Ok(Value::String(self.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
    }
}

impl ToValue for BigInt {
    fn to_value(&self, _ser: &mut Serializer<'_>) -> Result<Value> {
        Ok(Value::String(self.to_string()))
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self, ser: &mut Serializer<'_>) -> Result<Value> {
        (**self).to_value(ser)
    }
}

impl<T: ToValue + ?Sized> ToValue for Box<T> {
    fn to_value(&self, ser: &mut Serializer<'_>) -> Result<Value> {
        (**self).to_value(ser)
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self, ser: &mut Serializer<'_>) -> Result<Value> {
        match self {
            Some(value) => value.to_value(ser),
            None => Ok(Value::Null),
        }
    }
}

fn serialize_seq<'a, T, I>(items: I, ser: &mut Serializer<'_>) -> Result<Value>
where
    T: ToValue + 'a,
    I: ExactSizeIterator<Item = &'a T>,
{
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        out.push(ser.serialize(item)?);
    }
    Ok(Value::Array(out))
}

fn serialize_map<'a, T, I>(entries: I, ser: &mut Serializer<'_>) -> Result<Value>
where
    T: ToValue + 'a,
    I: ExactSizeIterator<Item = (&'a String, &'a T)>,
{
    let mut out = ValueMap::with_capacity(entries.len());
    for (key, value) in entries {
        out.insert(key.clone(), ser.serialize(value)?);
    }
    Ok(Value::Object(out))
}

impl<T: ToValue> ToValue for [T] {
    fn to_value(&self, ser: &mut Serializer<'_>) -> Result<Value> {
        serialize_seq(self.iter(), ser)
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self, ser: &mut Serializer<'_>) -> Result<Value> {
        serialize_seq(self.iter(), ser)
    }
}

impl<T: ToValue> ToValue for VecDeque<T> {
    fn to_value(&self, ser: &mut Serializer<'_>) -> Result<Value> {
        serialize_seq(self.iter(), ser)
    }
}

impl<T: ToValue> ToValue for BTreeSet<T> {
    fn to_value(&self, ser: &mut Serializer<'_>) -> Result<Value> {
        serialize_seq(self.iter(), ser)
    }
}

impl<T: ToValue, S> ToValue for HashSet<T, S> {
    fn to_value(&self, ser: &mut Serializer<'_>) -> Result<Value> {
        serialize_seq(self.iter(), ser)
    }
}

impl<T: ToValue, S> ToValue for IndexSet<T, S> {
    fn to_value(&self, ser: &mut Serializer<'_>) -> Result<Value> {
        serialize_seq(self.iter(), ser)
    }
}

impl<T: ToValue> ToValue for BTreeMap<String, T> {
    fn to_value(&self, ser: &mut Serializer<'_>) -> Result<Value> {
        serialize_map(self.iter(), ser)
    }
}

impl<T: ToValue, S> ToValue for HashMap<String, T, S> {
    fn to_value(&self, ser: &mut Serializer<'_>) -> Result<Value> {
        serialize_map(self.iter(), ser)
    }
}

impl<T: ToValue, S> ToValue for IndexMap<String, T, S> {
    fn to_value(&self, ser: &mut Serializer<'_>) -> Result<Value> {
        serialize_map(self.iter(), ser)
    }
}

impl<A: ToValue, B: ToValue> ToValue for (A, B) {
    fn to_value(&self, ser: &mut Serializer<'_>) -> Result<Value> {
        Ok(Value::Array(vec![ser.serialize(&self.0)?, ser.serialize(&self.1)?]))
    }
}

impl<A: ToValue, B: ToValue, C: ToValue> ToValue for (A, B, C) {
    fn to_value(&self, ser: &mut Serializer<'_>) -> Result<Value> {
        Ok(Value::Array(vec![
            ser.serialize(&self.0)?,
            ser.serialize(&self.1)?,
            ser.serialize(&self.2)?,
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{serializable, wire};

    #[derive(Debug, Default)]
    struct Point {
        x: i64,
        y: i64,
    }
    serializable!(Point { x, y });

    #[derive(Debug, Default)]
    struct Line {
        p: Option<Rc<Point>>,
        label: String,
    }
    serializable!(Line { p, label });

    #[test]
    fn test_primitives_unchanged() {
        let mut ser = Serializer::new();
        assert_eq!(ser.serialize(&Value::Null).unwrap(), Value::Null);
        assert_eq!(ser.serialize(&true).unwrap(), Value::Bool(true));
        assert_eq!(ser.serialize(&42).unwrap(), Value::from(42));
        assert_eq!(ser.serialize("x").unwrap(), Value::from("x"));
        assert_eq!(ser.serialize(&None::<i32>).unwrap(), Value::Null);
    }

    #[test]
    fn test_containers() {
        let mut ser = Serializer::new();
        let mut map = BTreeMap::new();
        map.insert("b".to_string(), vec![1u8, 2]);
        map.insert("a".to_string(), vec![]);
        assert_eq!(ser.serialize(&map).unwrap(), wire!({ "a": [], "b": [1, 2] }));

        let set: BTreeSet<i32> = [3, 1, 2].into_iter().collect();
        assert_eq!(ser.serialize(&set).unwrap(), wire!([1, 2, 3]));
        assert_eq!(ser.serialize(&("a", 1)).unwrap(), wire!(["a", 1]));
    }

    #[test]
    fn test_without_memo_shared_objects_repeat() {
        let p = Rc::new(Point { x: 1, y: 2 });
        let pair = vec![Rc::clone(&p), p];
        let value = Serializer::new().serialize(&pair).unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items[0], items[1]);
        assert_eq!(items[0].type_tag(), Some("Point"));
    }

    #[test]
    fn test_untracked_types_are_not_memoized() {
        let p = Rc::new(Point { x: 1, y: 2 });
        let line = Rc::new(Line {
            p: Some(Rc::clone(&p)),
            label: "l".to_string(),
        });
        let mut memo = Memoizer::new().track::<Point>();
        let value = Serializer::with_memo(&mut memo)
            .serialize(&vec![Rc::clone(&line), line])
            .unwrap();

        let items = value.as_array().unwrap();
        assert_eq!(items[0].type_tag(), Some("Line"));
        assert_eq!(items[1].type_tag(), Some("Line"));
        assert_eq!(items[1].as_object().unwrap().get("p"), Some(&Value::reference(0)));
        assert_eq!(memo.len(), 1);
    }

    #[test]
    fn test_wide_integers() {
        let mut ser = Serializer::new();
        assert_eq!(ser.serialize(&7usize).unwrap(), Value::from(7));
        assert!(matches!(ser.serialize(&u64::MAX), Err(Error::OutOfRange(_))));
    }

    #[test]
    fn test_depth_limit() {
        let nested = vec![vec![vec![1]]];
        let mut ser = Serializer::new().with_options(CodecOptions::new().with_max_depth(3));
        assert_eq!(ser.serialize(&nested), Err(Error::DepthLimitExceeded(3)));

        let mut ser = Serializer::new().with_options(CodecOptions::new().with_max_depth(4));
        assert!(ser.serialize(&nested).is_ok());
    }

    #[test]
    fn test_dates_and_bigints() {
        let mut ser = Serializer::new();
        let date = DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(ser.serialize(&date).unwrap(), Value::from("2024-01-15T10:30:00Z"));

        let big: BigInt = "123456789012345678901234567890".parse().unwrap();
        assert_eq!(
            ser.serialize(&big).unwrap(),
            Value::from("123456789012345678901234567890")
        );
    }
}
