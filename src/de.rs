//! Wire tree → object graph.
//!
//! This module provides the [`Deserializer`] and the [`FromValue`] trait. The
//! target Rust type decides what a wire node becomes; [`Node`] is the dynamic
//! target that follows the wire shape.
//!
//! Objects are only ever instantiated through the caller's [`Namespace`].
//! References resolve against the deserializer's [`MemoTable`], which is
//! filled either by [`Deserializer::load_memo`] or by inline objects of
//! memoized types as they are decoded.
//!
//! ## Id assignment
//!
//! Every inline object whose type is memoized claims the next id in pre-order,
//! the same order in which the serializer handed ids out. An id already present
//! in the table (loaded from a memo payload) returns the stored object instead
//! of building a second copy.

use crate::object::TypeDescriptor;
use crate::value::TYPE_KEY;
use crate::{
    CodecOptions, Error, MemoTable, Namespace, Node, ObjectRef, Result, Serializable, Shape, Value,
    ValueMap,
};
use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use num_bigint::BigInt;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::{BuildHasher, Hash};
use std::rc::Rc;

/// Conversion of a wire node into an in-memory value.
pub trait FromValue: Sized {
    fn from_value(value: &Value, de: &mut Deserializer<'_>) -> Result<Self>;
}

/// The deserializer.
///
/// Borrows the namespace for its lifetime and owns the memo table it fills.
pub struct Deserializer<'a> {
    namespace: &'a Namespace,
    options: CodecOptions,
    memo: MemoTable,
    pending: HashMap<usize, Value>,
    in_progress: HashSet<usize>,
    tracked: HashSet<&'static str>,
    next_id: usize,
    loading: bool,
    depth: usize,
}

impl<'a> Deserializer<'a> {
    pub fn new(namespace: &'a Namespace) -> Self {
        Deserializer {
            namespace,
            options: CodecOptions::default(),
            memo: MemoTable::new(),
            pending: HashMap::new(),
            in_progress: HashSet::new(),
            tracked: HashSet::new(),
            next_id: 0,
            loading: false,
            depth: 0,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: CodecOptions) -> Self {
        self.options = options;
        self
    }

    /// Starts from an existing memo table. The types it holds are memoized.
    #[must_use]
    pub fn with_memo(mut self, memo: MemoTable) -> Self {
        self.tracked.extend(memo.type_names());
        self.memo = memo;
        self
    }

    /// Declares `T` as memoized, so inline `T` objects claim ids.
    #[must_use]
    pub fn memoize<T: Serializable>(mut self) -> Self {
        self.tracked.insert(T::TYPE_NAME);
        self
    }

    #[must_use]
    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    #[must_use]
    pub fn namespace(&self) -> &'a Namespace {
        self.namespace
    }

    #[must_use]
    pub fn memo(&self) -> &MemoTable {
        &self.memo
    }

    #[must_use]
    pub fn into_memo(self) -> MemoTable {
        self.memo
    }

    /// Fills the memo table from a memo payload `{"<id>": <object>}`.
    ///
    /// Entries may reference each other in any id order; each is built the
    /// first time it is needed.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidMemoKey`] for a key that is not a canonical decimal id,
    /// [`Error::TypeMismatch`] for an entry that is not an object encoding and
    /// [`Error::CyclicReference`] when entries refer back to one another.
    pub fn load_memo(&mut self, payload: &Value) -> Result<()> {
        let entries = match payload.shape()? {
            Shape::Mapping(entries) => entries,
            Shape::Object { .. } => return Err(Error::type_mismatch("memo payload", "object encoding")),
            Shape::Reference(_) => return Err(Error::type_mismatch("memo payload", "reference")),
            _ => return Err(Error::type_mismatch("memo payload", payload.kind())),
        };

        let mut ids = Vec::with_capacity(entries.len());
        for (key, entry) in entries {
            let id = parse_memo_key(key)?;
            match entry.shape()? {
                Shape::Object { type_name, .. } => {
                    if let Some(descriptor) = self.namespace.get(type_name) {
                        self.tracked.insert(descriptor.name());
                    }
                }
                _ => return Err(Error::type_mismatch("object encoding", entry.kind())),
            }
            self.pending.insert(id, entry.clone());
            ids.push(id);
        }
        ids.sort_unstable();

        let loading = std::mem::replace(&mut self.loading, true);
        let result = ids.iter().try_for_each(|&id| self.load_entry(id).map(drop));
        self.loading = loading;
        self.pending.clear();
        self.in_progress.clear();
        result?;

        log::debug!(
            "loaded {} memo entries ({} memoized types)",
            ids.len(),
            self.tracked.len()
        );
        Ok(())
    }

    fn load_entry(&mut self, id: usize) -> Result<ObjectRef> {
        if let Some(object) = self.memo.get(id) {
            return Ok(object.clone());
        }
        if !self.in_progress.insert(id) {
            return Err(Error::CyclicReference(id));
        }
        let entry = self
            .pending
            .get(&id)
            .cloned()
            .ok_or(Error::DanglingReference(id))?;
        let object = self.deserialize::<ObjectRef>(&entry)?;
        self.in_progress.remove(&id);
        log::trace!("memo entry #{} is {}", id, object.type_name());
        self.memo.insert(id, object.clone());
        Ok(object)
    }

    /// Deserializes `value` as `T`, counting one level of nesting.
    pub fn deserialize<T: FromValue>(&mut self, value: &Value) -> Result<T> {
        if let Some(limit) = self.options.max_depth {
            if self.depth >= limit {
                return Err(Error::DepthLimitExceeded(limit));
            }
        }
        self.depth += 1;
        let result = T::from_value(value, self);
        self.depth -= 1;
        result
    }

    fn descriptor(&self, type_name: &str) -> Result<TypeDescriptor> {
        match self.namespace.get(type_name) {
            Some(descriptor) => Ok(*descriptor),
            None => {
                log::warn!("payload names type `{}` outside the namespace", type_name);
                Err(Error::unknown_type(type_name))
            }
        }
    }

    /// Decodes an object encoding, claiming a memo id if its type is memoized.
    pub fn decode_object(&mut self, type_name: &str, fields: &ValueMap) -> Result<ObjectRef> {
        let descriptor = self.descriptor(type_name)?;
        if self.loading || !self.tracked.contains(descriptor.name()) {
            return descriptor.build(fields, self);
        }

        let id = self.next_id;
        self.next_id += 1;
        if let Some(existing) = self.memo.get(id).cloned() {
            if existing.type_name() != descriptor.name() {
                return Err(Error::memo_mismatch(id, existing.type_name(), type_name));
            }
            for (key, value) in fields {
                if key != TYPE_KEY {
                    self.skip(value)?;
                }
            }
            log::trace!("inline {} matched memo entry #{}", type_name, id);
            return Ok(existing);
        }

        let object = descriptor.build(fields, self)?;
        log::trace!("memoized {} as #{}", type_name, id);
        self.memo.insert(id, object.clone());
        Ok(object)
    }

    /// Returns the object stored under `id`.
    pub fn resolve_reference(&mut self, id: usize) -> Result<ObjectRef> {
        if let Some(object) = self.memo.get(id) {
            log::trace!("resolved reference #{}", id);
            return Ok(object.clone());
        }
        if self.loading && self.pending.contains_key(&id) {
            return self.load_entry(id);
        }
        Err(Error::DanglingReference(id))
    }

    /// Accounts for memoized objects inside a value that is not decoded.
    ///
    /// `value` counts as one level of nesting below the current one.
    ///
    /// # Errors
    ///
    /// [`Error::DepthLimitExceeded`] when `value` nests deeper than
    /// [`CodecOptions::max_depth`] allows.
    pub fn skip(&mut self, value: &Value) -> Result<()> {
        self.skip_at(value, self.depth)
    }

    fn skip_at(&mut self, value: &Value, depth: usize) -> Result<()> {
        let count = self.count_tracked(value, depth)?;
        if !self.loading {
            self.next_id += count;
        }
        Ok(())
    }

    fn count_tracked(&self, value: &Value, depth: usize) -> Result<usize> {
        if let Some(limit) = self.options.max_depth {
            if depth >= limit {
                return Err(Error::DepthLimitExceeded(limit));
            }
        }
        match value {
            Value::Array(items) => items.iter().try_fold(0, |total, item| -> Result<usize> {
                Ok(total + self.count_tracked(item, depth + 1)?)
            }),
            Value::Object(map) => {
                let own = match value.type_tag() {
                    Some(name) if self.tracked.contains(name) => 1,
                    _ => 0,
                };
                map.iter()
                    .filter(|(key, _)| key.as_str() != TYPE_KEY)
                    .try_fold(own, |total, (_, item)| -> Result<usize> {
                        Ok(total + self.count_tracked(item, depth + 1)?)
                    })
            }
            _ => Ok(0),
        }
    }

    fn decode_handle(&mut self, value: &Value, expected: &str) -> Result<ObjectRef> {
        match value.shape()? {
            Shape::Object { type_name, fields } => self.decode_object(type_name, fields),
            Shape::Reference(id) => self.resolve_reference(id),
            Shape::Mapping(_) => Err(Error::type_mismatch(expected, "mapping")),
            Shape::Sequence(_) | Shape::Primitive(_) => {
                Err(Error::type_mismatch(expected, value.kind()))
            }
        }
    }
}

fn parse_memo_key(key: &str) -> Result<usize> {
    let canonical = key == "0" || !key.starts_with('0');
    if key.is_empty() || !canonical || !key.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidMemoKey(key.to_string()));
    }
    key.parse()
        .map_err(|_| Error::InvalidMemoKey(key.to_string()))
}

impl FromValue for ObjectRef {
    fn from_value(value: &Value, de: &mut Deserializer<'_>) -> Result<Self> {
        de.decode_handle(value, "object")
    }
}

impl<T: Serializable> FromValue for Rc<T> {
    fn from_value(value: &Value, de: &mut Deserializer<'_>) -> Result<Self> {
        let object = de.decode_handle(value, T::TYPE_NAME)?;
        object
            .downcast::<T>()
            .ok_or_else(|| Error::type_mismatch(T::TYPE_NAME, object.type_name()))
    }
}

impl FromValue for Value {
    fn from_value(value: &Value, de: &mut Deserializer<'_>) -> Result<Self> {
        // `deserialize` already counted this level.
        de.skip_at(value, de.depth.saturating_sub(1))?;
        Ok(value.clone())
    }
}

impl FromValue for Node {
    fn from_value(value: &Value, de: &mut Deserializer<'_>) -> Result<Self> {
        match value.shape()? {
            Shape::Object { type_name, fields } => {
                de.decode_object(type_name, fields).map(Node::Object)
            }
            Shape::Reference(id) => de.resolve_reference(id).map(Node::Object),
            Shape::Mapping(map) => {
                let mut out = IndexMap::with_capacity(map.len());
                for (key, item) in map {
                    out.insert(key.clone(), de.deserialize::<Node>(item)?);
                }
                Ok(Node::Map(out))
            }
            Shape::Sequence(items) => items
                .iter()
                .map(|item| de.deserialize::<Node>(item))
                .collect::<Result<Vec<_>>>()
                .map(Node::List),
            Shape::Primitive(primitive) => Ok(match primitive {
                Value::Bool(b) => Node::Bool(*b),
                Value::Number(n) => Node::Number(*n),
                Value::String(s) => Node::String(s.clone()),
                _ => Node::Null,
            }),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value, _de: &mut Deserializer<'_>) -> Result<Self> {
        value
            .as_bool()
            .ok_or_else(|| Error::type_mismatch("bool", value.kind()))
    }
}

macro_rules! integer {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value, _de: &mut Deserializer<'_>) -> Result<Self> {
                    let wide = value
                        .as_i64()
                        .ok_or_else(|| Error::type_mismatch("integer", value.kind()))?;
                    <$ty>::try_from(wide).map_err(|_| {
                        Error::out_of_range(format!("{} does not fit in {}", wide, stringify!($ty)))
                    })
                }
            }
        )*
    };
}

integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn from_value(value: &Value, _de: &mut Deserializer<'_>) -> Result<Self> {
        value
            .as_f64()
            .ok_or_else(|| Error::type_mismatch("number", value.kind()))
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value, de: &mut Deserializer<'_>) -> Result<Self> {
        f64::from_value(value, de).map(|f| f as f32)
    }
}

impl FromValue for String {
    fn from_value(value: &Value, _de: &mut Deserializer<'_>) -> Result<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::type_mismatch("string", value.kind()))
    }
}

impl FromValue for char {
    fn from_value(value: &Value, _de: &mut Deserializer<'_>) -> Result<Self> {
        let s = value
            .as_str()
            .ok_or_else(|| Error::type_mismatch("char", value.kind()))?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(Error::type_mismatch("char", "string")),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value, _de: &mut Deserializer<'_>) -> Result<Self> {
        let s = value
            .as_str()
            .ok_or_else(|| Error::type_mismatch("RFC 3339 timestamp", value.kind()))?;
        DateTime::parse_from_rfc3339(s)
            .map(|date| date.with_timezone(&Utc))
            .map_err(|e| Error::custom(format!("invalid timestamp `{}`: {}", s, e)))
    }
}

impl FromValue for BigInt {
    fn from_value(value: &Value, _de: &mut Deserializer<'_>) -> Result<Self> {
        match value {
            Value::String(s) => s
                .parse()
                .map_err(|e| Error::custom(format!("invalid big integer `{}`: {}", s, e))),
            Value::Number(n) => n
                .as_i64()
                .map(BigInt::from)
                .ok_or_else(|| Error::type_mismatch("integer", "float")),
            other => Err(Error::type_mismatch("big integer", other.kind())),
        }
    }
}

impl<T: FromValue> FromValue for Box<T> {
    fn from_value(value: &Value, de: &mut Deserializer<'_>) -> Result<Self> {
        T::from_value(value, de).map(Box::new)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value, de: &mut Deserializer<'_>) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            _ => T::from_value(value, de).map(Some),
        }
    }
}

fn deserialize_seq<T, C>(value: &Value, de: &mut Deserializer<'_>) -> Result<C>
where
    T: FromValue,
    C: FromIterator<T>,
{
    match value.shape()? {
        Shape::Sequence(items) => items.iter().map(|item| de.deserialize::<T>(item)).collect(),
        Shape::Object { type_name, .. } => Err(Error::type_mismatch("sequence", type_name)),
        Shape::Reference(_) => Err(Error::type_mismatch("sequence", "reference")),
        _ => Err(Error::type_mismatch("sequence", value.kind())),
    }
}

fn deserialize_map<T, C>(value: &Value, de: &mut Deserializer<'_>) -> Result<C>
where
    T: FromValue,
    C: FromIterator<(String, T)>,
{
    match value.shape()? {
        Shape::Mapping(map) => map
            .iter()
            .map(|(key, item)| -> Result<(String, T)> { Ok((key.clone(), de.deserialize(item)?)) })
            .collect(),
        Shape::Object { type_name, .. } => Err(Error::type_mismatch("mapping", type_name)),
        Shape::Reference(_) => Err(Error::type_mismatch("mapping", "reference")),
        _ => Err(Error::type_mismatch("mapping", value.kind())),
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value, de: &mut Deserializer<'_>) -> Result<Self> {
        deserialize_seq(value, de)
    }
}

impl<T: FromValue> FromValue for VecDeque<T> {
    fn from_value(value: &Value, de: &mut Deserializer<'_>) -> Result<Self> {
        deserialize_seq(value, de)
    }
}

impl<T: FromValue + Ord> FromValue for BTreeSet<T> {
    fn from_value(value: &Value, de: &mut Deserializer<'_>) -> Result<Self> {
        deserialize_seq(value, de)
    }
}

impl<T, S> FromValue for HashSet<T, S>
where
    T: FromValue + Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_value(value: &Value, de: &mut Deserializer<'_>) -> Result<Self> {
        deserialize_seq(value, de)
    }
}

impl<T, S> FromValue for IndexSet<T, S>
where
    T: FromValue + Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_value(value: &Value, de: &mut Deserializer<'_>) -> Result<Self> {
        deserialize_seq(value, de)
    }
}

impl<T: FromValue> FromValue for BTreeMap<String, T> {
    fn from_value(value: &Value, de: &mut Deserializer<'_>) -> Result<Self> {
        deserialize_map(value, de)
    }
}

impl<T, S> FromValue for HashMap<String, T, S>
where
    T: FromValue,
    S: BuildHasher + Default,
{
    fn from_value(value: &Value, de: &mut Deserializer<'_>) -> Result<Self> {
        deserialize_map(value, de)
    }
}

impl<T, S> FromValue for IndexMap<String, T, S>
where
    T: FromValue,
    S: BuildHasher + Default,
{
    fn from_value(value: &Value, de: &mut Deserializer<'_>) -> Result<Self> {
        deserialize_map(value, de)
    }
}

fn tuple_items<'v>(value: &'v Value, len: usize) -> Result<&'v [Value]> {
    match value {
        Value::Array(items) if items.len() == len => Ok(items),
        Value::Array(items) => Err(Error::type_mismatch(
            &format!("{}-tuple", len),
            &format!("array of {}", items.len()),
        )),
        other => Err(Error::type_mismatch(&format!("{}-tuple", len), other.kind())),
    }
}

impl<A: FromValue, B: FromValue> FromValue for (A, B) {
    fn from_value(value: &Value, de: &mut Deserializer<'_>) -> Result<Self> {
        let items = tuple_items(value, 2)?;
        Ok((de.deserialize(&items[0])?, de.deserialize(&items[1])?))
    }
}

impl<A: FromValue, B: FromValue, C: FromValue> FromValue for (A, B, C) {
    fn from_value(value: &Value, de: &mut Deserializer<'_>) -> Result<Self> {
        let items = tuple_items(value, 3)?;
        Ok((
            de.deserialize(&items[0])?,
            de.deserialize(&items[1])?,
            de.deserialize(&items[2])?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{serializable, wire, Memoizer, Serializer};

    #[derive(Debug, Default, PartialEq)]
    struct Point {
        x: i64,
        y: i64,
    }
    serializable!(Point { x, y });

    #[derive(Debug, Default)]
    struct Segment {
        from: Option<Rc<Point>>,
        to: Option<Rc<Point>>,
    }
    serializable!(Segment { from, to });

    fn namespace() -> Namespace {
        Namespace::new()
            .with::<Point>()
            .and_then(|ns| ns.with::<Segment>())
            .unwrap()
    }

    #[test]
    fn test_primitives_unchanged() {
        let ns = Namespace::new();
        let mut de = Deserializer::new(&ns);
        assert_eq!(de.deserialize::<Node>(&Value::Null).unwrap(), Node::Null);
        assert!(de.deserialize::<bool>(&Value::Bool(true)).unwrap());
        assert_eq!(de.deserialize::<i64>(&Value::from(42)).unwrap(), 42);
        assert_eq!(de.deserialize::<String>(&Value::from("x")).unwrap(), "x");
    }

    #[test]
    fn test_object_from_namespace() {
        let ns = namespace();
        let point: Rc<Point> = Deserializer::new(&ns)
            .deserialize(&wire!({ "x": 1, "y": 2, "__type__": "Point" }))
            .unwrap();
        assert_eq!(*point, Point { x: 1, y: 2 });
    }

    #[test]
    fn test_unknown_type() {
        let ns = Namespace::new().with::<Point>().unwrap();
        let err = Deserializer::new(&ns)
            .deserialize::<Node>(&wire!({ "__type__": "Ghost" }))
            .unwrap_err();
        assert_eq!(err, Error::UnknownType("Ghost".to_string()));
    }

    #[test]
    fn test_missing_and_unexpected_fields() {
        let ns = namespace();
        let err = Deserializer::new(&ns)
            .deserialize::<Node>(&wire!({ "x": 1, "__type__": "Point" }))
            .unwrap_err();
        assert_eq!(err, Error::missing_field("Point", "y"));

        let extra = wire!({ "x": 1, "y": 2, "z": 3, "__type__": "Point" });
        let err = Deserializer::new(&ns).deserialize::<Node>(&extra).unwrap_err();
        assert_eq!(err, Error::unexpected_field("Point", "z"));

        let lenient = Deserializer::new(&ns)
            .with_options(CodecOptions::new().allow_unknown_fields())
            .deserialize::<Rc<Point>>(&extra)
            .unwrap();
        assert_eq!(lenient.y, 2);
    }

    #[test]
    fn test_typed_targets_check_shape() {
        let ns = namespace();
        let mut de = Deserializer::new(&ns);
        let err = de.deserialize::<i32>(&Value::from("1")).unwrap_err();
        assert_eq!(err, Error::type_mismatch("integer", "string"));

        let err = de.deserialize::<u8>(&Value::from(300)).unwrap_err();
        assert!(matches!(err, Error::OutOfRange(_)));

        let segment = wire!({ "from": null, "to": null, "__type__": "Segment" });
        let err = de.deserialize::<Rc<Point>>(&segment).unwrap_err();
        assert_eq!(err, Error::type_mismatch("Point", "Segment"));

        let err = de.deserialize::<Vec<i32>>(&wire!({ "a": 1 })).unwrap_err();
        assert_eq!(err, Error::type_mismatch("sequence", "object"));
    }

    #[test]
    fn test_target_type_decides_set_or_list() {
        let ns = Namespace::new();
        let mut de = Deserializer::new(&ns);
        let payload = wire!([3, 1, 3, 2]);

        let set: BTreeSet<i32> = de.deserialize(&payload).unwrap();
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![1, 2, 3]);

        let list: Vec<i32> = de.deserialize(&payload).unwrap();
        assert_eq!(list, vec![3, 1, 3, 2]);
    }

    #[test]
    fn test_dangling_reference() {
        let ns = namespace();
        let err = Deserializer::new(&ns)
            .deserialize::<Node>(&wire!({ "@": 5 }))
            .unwrap_err();
        assert_eq!(err, Error::DanglingReference(5));
    }

    #[test]
    fn test_inline_memoized_objects_claim_ids() {
        let ns = namespace();
        let payload = wire!([
            { "x": 1, "y": 2, "__type__": "Point" },
            { "from": { "@": 0 }, "to": { "x": 3, "y": 4, "__type__": "Point" }, "__type__": "Segment" },
            { "@": 1 }
        ]);
        let mut de = Deserializer::new(&ns).memoize::<Point>();
        let (a, segment, b): (Rc<Point>, Rc<Segment>, Rc<Point>) = de.deserialize(&payload).unwrap();

        assert!(Rc::ptr_eq(&a, segment.from.as_ref().unwrap()));
        assert!(Rc::ptr_eq(&b, segment.to.as_ref().unwrap()));
        assert_eq!(de.memo().len(), 2);
    }

    #[test]
    fn test_load_memo_builds_out_of_order() {
        let ns = namespace();
        let memo = wire!({
            "0": { "from": { "@": 1 }, "to": { "@": 1 }, "__type__": "Segment" },
            "1": { "x": 5, "y": 6, "__type__": "Point" }
        });
        let mut de = Deserializer::new(&ns);
        de.load_memo(&memo).unwrap();

        let segment: Rc<Segment> = de.deserialize(&wire!({ "@": 0 })).unwrap();
        let point: Rc<Point> = de.deserialize(&wire!({ "@": 1 })).unwrap();
        assert!(Rc::ptr_eq(segment.from.as_ref().unwrap(), &point));
        assert!(Rc::ptr_eq(segment.to.as_ref().unwrap(), &point));
    }

    #[test]
    fn test_load_memo_rejects_bad_input() {
        let ns = namespace();

        let err = Deserializer::new(&ns)
            .load_memo(&wire!({ "first": { "x": 1, "y": 2, "__type__": "Point" } }))
            .unwrap_err();
        assert_eq!(err, Error::InvalidMemoKey("first".to_string()));

        let err = Deserializer::new(&ns)
            .load_memo(&wire!({
                "0": { "x": 1, "y": 2, "__type__": "Point" },
                "00": { "x": 3, "y": 4, "__type__": "Point" }
            }))
            .unwrap_err();
        assert_eq!(err, Error::InvalidMemoKey("00".to_string()));

        let err = Deserializer::new(&ns)
            .load_memo(&wire!({ "0": [1, 2] }))
            .unwrap_err();
        assert_eq!(err, Error::type_mismatch("object encoding", "array"));

        let cyclic = wire!({
            "0": { "from": { "@": 1 }, "to": null, "__type__": "Segment" },
            "1": { "from": { "@": 0 }, "to": null, "__type__": "Segment" }
        });
        let err = Deserializer::new(&ns).load_memo(&cyclic).unwrap_err();
        assert!(matches!(err, Error::CyclicReference(_)));
    }

    #[test]
    fn test_inline_object_must_match_memo_entry() {
        let ns = namespace();
        let mut de = Deserializer::new(&ns);
        de.load_memo(&wire!({ "0": { "x": 1, "y": 2, "__type__": "Point" } }))
            .unwrap();
        let untracked = de
            .deserialize::<Node>(&wire!({ "from": null, "to": null, "__type__": "Segment" }))
            .unwrap();
        assert!(matches!(untracked, Node::Object(_)));

        let mut de = Deserializer::new(&ns).memoize::<Segment>();
        de.load_memo(&wire!({ "0": { "x": 1, "y": 2, "__type__": "Point" } }))
            .unwrap();
        let err = de
            .deserialize::<Node>(&wire!({ "from": null, "to": null, "__type__": "Segment" }))
            .unwrap_err();
        assert_eq!(err, Error::memo_mismatch(0, "Point", "Segment"));
    }

    #[test]
    fn test_memo_round_trip_restores_sharing() {
        let p = Rc::new(Point { x: 1, y: 2 });
        let segment = Rc::new(Segment {
            from: Some(Rc::clone(&p)),
            to: Some(p),
        });
        let mut memo = Memoizer::new().track::<Segment>().track::<Point>();
        let payload = Serializer::with_memo(&mut memo).serialize(&segment).unwrap();
        let memo_payload = memo.serialize().unwrap();

        let ns = namespace();
        let mut de = Deserializer::new(&ns);
        de.load_memo(&memo_payload).unwrap();
        let back: Rc<Segment> = de.deserialize(&payload).unwrap();

        let from = back.from.as_ref().unwrap();
        assert!(Rc::ptr_eq(from, back.to.as_ref().unwrap()));
        assert_eq!(**from, Point { x: 1, y: 2 });
        assert_eq!(de.memo().len(), 2);
    }

    #[test]
    fn test_dates_and_bigints() {
        let ns = Namespace::new();
        let mut de = Deserializer::new(&ns);

        let date: DateTime<Utc> = de.deserialize(&Value::from("2024-01-15T10:30:00+02:00")).unwrap();
        assert_eq!(date.to_rfc3339(), "2024-01-15T08:30:00+00:00");
        assert!(de.deserialize::<DateTime<Utc>>(&Value::from("yesterday")).is_err());

        let big: BigInt = de.deserialize(&Value::from("-98765432109876543210")).unwrap();
        assert_eq!(big.to_string(), "-98765432109876543210");
        let small: BigInt = de.deserialize(&Value::from(12)).unwrap();
        assert_eq!(small, BigInt::from(12));
    }

    #[test]
    fn test_depth_limit() {
        let ns = Namespace::new();
        let mut de = Deserializer::new(&ns).with_options(CodecOptions::new().with_max_depth(2));
        let err = de.deserialize::<Node>(&wire!([[[1]]])).unwrap_err();
        assert_eq!(err, Error::DepthLimitExceeded(2));

        assert!(de.deserialize::<Value>(&wire!([[1]])).is_ok());
        let err = de.deserialize::<Value>(&wire!([[[1]]])).unwrap_err();
        assert_eq!(err, Error::DepthLimitExceeded(2));
    }

    fn nested_array(depth: usize) -> Value {
        (0..depth).fold(Value::from(0), |inner, _| Value::Array(vec![inner]))
    }

    #[test]
    fn test_depth_limit_covers_undecoded_keys() {
        let ns = namespace();
        let mut point = ValueMap::new();
        point.insert("x".to_string(), Value::from(1));
        point.insert("y".to_string(), Value::from(2));
        point.insert("junk".to_string(), nested_array(1000));
        point.insert(TYPE_KEY.to_string(), Value::from("Point"));
        let point = Value::Object(point);

        let mut de = Deserializer::new(&ns)
            .with_options(CodecOptions::new().allow_unknown_fields())
            .memoize::<Point>();
        let err = de.deserialize::<Node>(&point).unwrap_err();
        assert_eq!(err, Error::DepthLimitExceeded(256));

        let mut memo = ValueMap::new();
        memo.insert("0".to_string(), point);
        let mut de =
            Deserializer::new(&ns).with_options(CodecOptions::new().allow_unknown_fields());
        let err = de.load_memo(&Value::Object(memo)).unwrap_err();
        assert_eq!(err, Error::DepthLimitExceeded(256));

        let mut de = Deserializer::new(&ns);
        let err = de.deserialize::<Value>(&nested_array(1000)).unwrap_err();
        assert_eq!(err, Error::DepthLimitExceeded(256));
    }
}
