//! # serde_memo
//!
//! A memoizing object-graph codec. It turns a graph of shared `Rc` objects
//! into a JSON-like wire tree of primitives, containers, tagged objects and
//! backreferences, and rebuilds an equivalent graph from that tree.
//!
//! ## Key Features
//!
//! - **Identity memoization**: objects of memoized types are written once and
//!   referenced by a compact id afterwards, so sharing survives a round trip
//! - **Explicit allow-list**: a payload can only instantiate types the caller
//!   registered in a [`Namespace`]; there is no global registry
//! - **Typed fields**: the Rust type of each field decides how its wire node is
//!   read, so a set field rebuilds a set and a list field a list
//! - **Transport agnostic**: the wire tree implements `serde::Serialize` and
//!   `serde::Deserialize`, so any order-preserving serde format can carry it
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_memo::{memo_deserialize, memo_serialize, serializable, Memoizer, Namespace};
//! use std::rc::Rc;
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Terminal { name: String }
//! serializable!(Terminal { name });
//!
//! #[derive(Debug, Default)]
//! struct Rule { origin: String, expansion: Vec<Rc<Terminal>> }
//! serializable!(Rule { origin, expansion });
//!
//! let name = Rc::new(Terminal { name: "NAME".into() });
//! let rule = Rc::new(Rule {
//!     origin: "pair".into(),
//!     expansion: vec![Rc::clone(&name), name],
//! });
//!
//! let (payload, memo) = memo_serialize(&rule, Memoizer::new().track::<Terminal>()).unwrap();
//!
//! let namespace = Namespace::new()
//!     .with::<Terminal>()
//!     .and_then(|ns| ns.with::<Rule>())
//!     .unwrap();
//! let back: Rc<Rule> = memo_deserialize(&payload, &memo, &namespace).unwrap();
//!
//! assert!(Rc::ptr_eq(&back.expansion[0], &back.expansion[1]));
//! assert_eq!(back.expansion[0].name, "NAME");
//! ```
//!
//! ## Dynamic Values
//!
//! When the payload shape is not known statically, deserialize into a
//! [`Node`]:
//!
//! ```rust
//! use serde_memo::{deserialize, wire, Namespace, Node};
//!
//! let node: Node = deserialize(&wire!({ "tags": ["a", "b"] }), &Namespace::new()).unwrap();
//! let tags = node.as_map().and_then(|map| map["tags"].as_list()).unwrap();
//! assert_eq!(tags.len(), 2);
//! ```
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade and never installs a logger.
//! Id assignment and reference resolution are logged at `trace`, memo
//! summaries at `debug`, and payloads naming types outside the namespace at
//! `warn`.
//!
//! ## Safety Guarantees
//!
//! - No `unsafe` code blocks
//! - Recursion is bounded by [`CodecOptions::max_depth`]
//! - Every failure is an [`Error`]; nothing panics on malformed input
//!
//! See the [`format`] module for the wire shape.

pub mod de;
pub mod enumerator;
pub mod error;
pub mod format;
pub mod macros;
pub mod map;
pub mod memo;
pub mod namespace;
pub mod node;
pub mod object;
pub mod options;
pub mod ser;
pub mod value;

pub use de::{Deserializer, FromValue};
pub use enumerator::Enumerator;
pub use error::{Error, Result};
pub use map::ValueMap;
pub use memo::{MemoTable, Memoizer};
pub use namespace::Namespace;
pub use node::Node;
pub use object::{AnyObject, ObjectRef, Serializable, TypeDescriptor};
pub use options::CodecOptions;
pub use ser::{Serializer, ToValue};
pub use value::{Number, Shape, Value, REF_KEY, TYPE_KEY};

/// Serialize any `T: ToValue` to a wire tree without memoization.
///
/// Shared objects are written in full at every occurrence.
///
/// # Examples
///
/// ```rust
/// use serde_memo::{serialize, wire};
///
/// let value = serialize(&vec![("a".to_string(), 1)]).unwrap();
/// assert_eq!(value, wire!([["a", 1]]));
/// ```
///
/// # Errors
///
/// Returns an error if a field fails to serialize or nesting exceeds the
/// default depth limit.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn serialize<T>(value: &T) -> Result<Value>
where
    T: ?Sized + ToValue,
{
    Serializer::new().serialize(value)
}

/// Serialize with a caller-owned [`Memoizer`].
///
/// The memoizer keeps the ids it assigned, so the caller can produce the memo
/// payload afterwards with [`Memoizer::serialize`].
///
/// # Errors
///
/// Returns an error if a field fails to serialize or nesting exceeds the
/// default depth limit.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn serialize_with_memo<T>(value: &T, memo: &mut Memoizer) -> Result<Value>
where
    T: ?Sized + ToValue,
{
    Serializer::with_memo(memo).serialize(value)
}

/// Serialize `value` and return `(payload, memo_payload)`.
///
/// `memo` declares which types are memoized and must not have been used yet.
///
/// # Examples
///
/// ```rust
/// use serde_memo::{memo_serialize, serializable, wire, Memoizer};
/// use std::rc::Rc;
///
/// #[derive(Default)]
/// struct Terminal { name: String }
/// serializable!(Terminal { name });
///
/// let t = Rc::new(Terminal { name: "A".into() });
/// let (payload, memo) = memo_serialize(&vec![Rc::clone(&t), t], Memoizer::new().track::<Terminal>()).unwrap();
///
/// assert_eq!(payload, wire!([{ "name": "A", "__type__": "Terminal" }, { "@": 0 }]));
/// assert_eq!(memo, wire!({ "0": { "name": "A", "__type__": "Terminal" } }));
/// ```
///
/// # Errors
///
/// Returns [`Error::MemoizerInUse`] if `memo` already holds entries, or any
/// error raised while serializing.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn memo_serialize<T>(value: &T, mut memo: Memoizer) -> Result<(Value, Value)>
where
    T: ?Sized + ToValue,
{
    if !memo.is_empty() {
        return Err(Error::MemoizerInUse(memo.len()));
    }
    let payload = serialize_with_memo(value, &mut memo)?;
    let memo_payload = memo.serialize()?;
    log::debug!(
        "memo_serialize: {} memoized objects across {} tracked types",
        memo.len(),
        memo.tracked_names().len()
    );
    Ok((payload, memo_payload))
}

/// Deserialize a wire tree, instantiating only types allowed by `namespace`.
///
/// References can only point at objects decoded earlier in the same payload.
///
/// # Examples
///
/// ```rust
/// use serde_memo::{deserialize, wire, Namespace};
/// use std::collections::BTreeSet;
///
/// let set: BTreeSet<i64> = deserialize(&wire!([3, 1, 2]), &Namespace::new()).unwrap();
/// assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![1, 2, 3]);
/// ```
///
/// # Errors
///
/// Returns an error if the tree names an unknown type, misses a declared
/// field, holds a dangling reference, or does not fit `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn deserialize<T>(value: &Value, namespace: &Namespace) -> Result<T>
where
    T: FromValue,
{
    Deserializer::new(namespace).deserialize(value)
}

/// Deserialize against a caller-owned [`MemoTable`].
///
/// Types present in the table are memoized. The table is updated in place
/// with every object decoded under an id; entries added before an error are
/// kept.
///
/// # Errors
///
/// As for [`deserialize`], plus [`Error::MemoMismatch`] if an inline object
/// disagrees with the table entry for its id.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn deserialize_with_memo<T>(
    value: &Value,
    namespace: &Namespace,
    memo: &mut MemoTable,
) -> Result<T>
where
    T: FromValue,
{
    let mut de = Deserializer::new(namespace).with_memo(std::mem::take(memo));
    let result = de.deserialize(value);
    *memo = de.into_memo();
    result
}

/// Deserialize the pair produced by [`memo_serialize`].
///
/// The memo payload is loaded first; the main payload is then decoded against
/// the populated table.
///
/// # Errors
///
/// Returns an error if either tree is malformed, names a type outside
/// `namespace`, or if memo entries refer to each other in a cycle.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn memo_deserialize<T>(payload: &Value, memo_payload: &Value, namespace: &Namespace) -> Result<T>
where
    T: FromValue,
{
    let mut de = Deserializer::new(namespace);
    de.load_memo(memo_payload)?;
    de.deserialize(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[derive(Debug, Default, PartialEq)]
    struct Point {
        x: i64,
        y: i64,
    }
    serializable!(Point { x, y });

    #[derive(Debug, Default)]
    struct Polygon {
        name: String,
        corners: Vec<Rc<Point>>,
    }
    serializable!(Polygon { name, corners });

    fn namespace() -> Namespace {
        Namespace::new()
            .with::<Point>()
            .and_then(|ns| ns.with::<Polygon>())
            .unwrap()
    }

    #[test]
    fn test_round_trip_without_memo() {
        let polygon = Rc::new(Polygon {
            name: "tri".to_string(),
            corners: vec![
                Rc::new(Point { x: 0, y: 0 }),
                Rc::new(Point { x: 1, y: 0 }),
                Rc::new(Point { x: 0, y: 1 }),
            ],
        });
        let value = serialize(&polygon).unwrap();
        let back: Rc<Polygon> = deserialize(&value, &namespace()).unwrap();
        assert_eq!(back.name, "tri");
        assert_eq!(back.corners, polygon.corners);
    }

    #[test]
    fn test_memo_serialize_round_trip() {
        let shared = Rc::new(Point { x: 5, y: 5 });
        let polygon = Rc::new(Polygon {
            name: "degenerate".to_string(),
            corners: vec![Rc::clone(&shared), Rc::new(Point { x: 1, y: 1 }), shared],
        });

        let (payload, memo) =
            memo_serialize(&polygon, Memoizer::new().track::<Point>()).unwrap();
        let corners = payload.as_object().and_then(|m| m.get("corners")).unwrap();
        assert_eq!(corners.as_array().unwrap()[2], Value::reference(0));
        assert_eq!(memo.as_object().unwrap().len(), 2);

        let back: Rc<Polygon> = memo_deserialize(&payload, &memo, &namespace()).unwrap();
        assert!(Rc::ptr_eq(&back.corners[0], &back.corners[2]));
        assert!(!Rc::ptr_eq(&back.corners[0], &back.corners[1]));
        assert_eq!(*back.corners[1], Point { x: 1, y: 1 });
    }

    #[test]
    fn test_memo_serialize_rejects_used_memoizer() {
        let mut memo = Memoizer::new().track::<Point>();
        serialize_with_memo(&Rc::new(Point::default()), &mut memo).unwrap();
        let err = memo_serialize(&1, memo).unwrap_err();
        assert_eq!(err, Error::MemoizerInUse(1));
    }

    #[test]
    fn test_deserialize_with_memo_shares_table() {
        let p = Rc::new(Point { x: 2, y: 3 });
        let mut memoizer = Memoizer::new().track::<Point>();
        let first = serialize_with_memo(&Rc::clone(&p), &mut memoizer).unwrap();
        let second = serialize_with_memo(&p, &mut memoizer).unwrap();
        assert_eq!(second, Value::reference(0));

        let ns = namespace();
        let mut table = MemoTable::new();
        let a: Rc<Point> = deserialize_with_memo(&first, &ns, &mut table).unwrap();
        assert_eq!(table.len(), 0);

        let mut table: MemoTable = [(0, ObjectRef::from(Rc::clone(&a)))].into_iter().collect();
        let b: Rc<Point> = deserialize_with_memo(&second, &ns, &mut table).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_deserialize_with_memo_keeps_table_on_error() {
        let ns = namespace();
        let mut table: MemoTable = [(0, ObjectRef::new(Point::default()))].into_iter().collect();
        let err = deserialize_with_memo::<Node>(&Value::reference(4), &ns, &mut table).unwrap_err();
        assert_eq!(err, Error::DanglingReference(4));
        assert_eq!(table.len(), 1);
    }
}
