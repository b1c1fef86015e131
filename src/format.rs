//! Wire format reference
//!
//! This module documents the tree produced by [`serialize`](crate::serialize)
//! and consumed by [`deserialize`](crate::deserialize). The tree is a
//! [`Value`](crate::Value): JSON's data model with integers and floats kept
//! apart. Any serde format that preserves map entry order can carry it.
//!
//! # Node kinds
//!
//! | Kind      | Shape                                              |
//! |-----------|----------------------------------------------------|
//! | Primitive | `null`, boolean, number or string                  |
//! | Sequence  | array                                              |
//! | Mapping   | object without a reserved key                      |
//! | Object    | `{ <field>: <node>, ..., "__type__": "<Name>" }`   |
//! | Reference | `{ "@": <non-negative integer> }`                  |
//!
//! `__type__` and `@` are reserved. A mapping carrying `__type__` is always an
//! object encoding, even if it also carries `@`. A type may not declare either
//! key as a field.
//!
//! ## Objects
//!
//! Declared fields come first, in declaration order, followed by `__type__`.
//! A type's `serialize_extra` hook may append computed keys after that.
//!
//! ```rust
//! use serde_memo::{serializable, serialize, wire};
//! use std::rc::Rc;
//!
//! #[derive(Default)]
//! struct Rule { origin: String, expansion: Vec<String> }
//! serializable!(Rule { origin, expansion });
//!
//! let rule = Rc::new(Rule { origin: "start".into(), expansion: vec!["NAME".into()] });
//! assert_eq!(
//!     serialize(&rule).unwrap(),
//!     wire!({ "origin": "start", "expansion": ["NAME"], "__type__": "Rule" })
//! );
//! ```
//!
//! ## References
//!
//! Only objects of memoized types are ever referenced. The first occurrence of
//! such an object during a serialize call is written in full and gets the next
//! id, starting at 0; every later occurrence of the same allocation is written
//! as a reference.
//!
//! ```rust
//! use serde_memo::{serializable, serialize_with_memo, wire, Memoizer};
//! use std::rc::Rc;
//!
//! #[derive(Default)]
//! struct Terminal { name: String }
//! serializable!(Terminal { name });
//!
//! let name = Rc::new(Terminal { name: "NAME".into() });
//! let mut memo = Memoizer::new().track::<Terminal>();
//! let value = serialize_with_memo(&vec![Rc::clone(&name), name], &mut memo).unwrap();
//! assert_eq!(value, wire!([{ "name": "NAME", "__type__": "Terminal" }, { "@": 0 }]));
//! ```
//!
//! # Memo payload
//!
//! [`memo_serialize`](crate::memo_serialize) returns a second tree next to the
//! main payload:
//!
//! ```text
//! { "0": <object encoding>, "1": <object encoding>, ... }
//! ```
//!
//! Keys are decimal ids. Each entry is the full encoding of the object with that
//! id; memoized objects nested inside an entry are references to their own
//! entries. When reading, the memo payload is loaded first, and each inline
//! object of a memoized type in the main payload is matched to its entry by
//! encounter order.
//!
//! # Ordering
//!
//! Ids follow a pre-order walk of the payload in map entry order. A transport
//! that reorders keys (for example one that sorts them) breaks the match
//! between inline objects and memo entries. `serde_json` text preserves order:
//!
//! ```rust
//! use serde_memo::{wire, Value};
//!
//! let value = wire!({ "b": 1, "a": { "@": 0 } });
//! let text = serde_json::to_string(&value).unwrap();
//! assert_eq!(text, r#"{"b":1,"a":{"@":0}}"#);
//! assert_eq!(serde_json::from_str::<Value>(&text).unwrap(), value);
//! ```
//!
//! # Limits
//!
//! Both directions stop with `DepthLimitExceeded` once nesting passes
//! [`CodecOptions::max_depth`](crate::CodecOptions) (256 by default).
