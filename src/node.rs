//! Dynamic in-memory graph node.
//!
//! [`Node`] is the target to use when the shape of a payload is not known
//! statically. Decoding follows the wire shape: object encodings and
//! references become [`Node::Object`], plain mappings [`Node::Map`],
//! sequences [`Node::List`], and primitives stay primitives.
//!
//! [`Node::Set`] exists for the serialize direction only. A set is written as a
//! sequence, and a sequence decodes back as a list; use a typed set field to get
//! a set back.

use crate::{Number, ObjectRef, Serializable};
use indexmap::IndexMap;
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<Node>),
    Set(Vec<Node>),
    Map(IndexMap<String, Node>),
    Object(ObjectRef),
}

impl Node {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    /// Elements of a list or a set.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Node::List(items) | Node::Set(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&IndexMap<String, Node>> {
        match self {
            Node::Map(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Node::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Typed handle to the object behind this node.
    #[must_use]
    pub fn downcast<T: Serializable>(&self) -> Option<Rc<T>> {
        self.as_object().and_then(ObjectRef::downcast::<T>)
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Bool(b)
    }
}

impl From<i32> for Node {
    fn from(n: i32) -> Self {
        Node::Number(Number::Integer(i64::from(n)))
    }
}

impl From<i64> for Node {
    fn from(n: i64) -> Self {
        Node::Number(Number::Integer(n))
    }
}

impl From<f64> for Node {
    fn from(f: f64) -> Self {
        Node::Number(Number::Float(f))
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::String(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::String(s)
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Node::List(items)
    }
}

impl From<ObjectRef> for Node {
    fn from(object: ObjectRef) -> Self {
        Node::Object(object)
    }
}

impl<T: Serializable> From<Rc<T>> for Node {
    fn from(object: Rc<T>) -> Self {
        Node::Object(ObjectRef::from_rc(object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{deserialize, serializable, serialize, wire, Namespace};

    #[derive(Debug, Default)]
    struct Leaf {
        label: String,
    }
    serializable!(Leaf { label });

    #[test]
    fn test_set_is_written_as_sequence() {
        let node = Node::Set(vec![Node::from(1), Node::from(2)]);
        let value = serialize(&node).unwrap();
        assert_eq!(value, wire!([1, 2]));

        let back: Node = deserialize(&value, &Namespace::new()).unwrap();
        assert_eq!(back, Node::List(vec![Node::from(1), Node::from(2)]));
    }

    #[test]
    fn test_mapping_keys_unchanged() {
        let mut map = IndexMap::new();
        map.insert("b".to_string(), Node::Null);
        map.insert("a".to_string(), Node::from("x"));
        let value = serialize(&Node::Map(map.clone())).unwrap();
        let back: Node = deserialize(&value, &Namespace::new()).unwrap();
        assert_eq!(back.as_map(), Some(&map));
    }

    #[test]
    fn test_objects_decode_to_handles() {
        let leaf = Rc::new(Leaf {
            label: "a".to_string(),
        });
        let value = serialize(&Node::from(Rc::clone(&leaf))).unwrap();
        let namespace = Namespace::new().with::<Leaf>().unwrap();
        let back: Node = deserialize(&value, &namespace).unwrap();

        let rebuilt = back.downcast::<Leaf>().unwrap();
        assert_eq!(rebuilt.label, "a");
        assert!(!Rc::ptr_eq(&rebuilt, &leaf));
        assert!(back.as_list().is_none());
    }
}
