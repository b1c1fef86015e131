//! Identity-keyed id assignment.
//!
//! An [`Enumerator`] hands out compact ids to `Rc` allocations in
//! first-encounter order, starting at 0. Two `Rc`s are the same item when they
//! point at the same allocation; equal contents in different allocations get
//! different ids. The enumerator holds a strong count on every item it has
//! seen, so an address cannot be freed and reused while the table is alive.
//!
//! ```rust
//! use serde_memo::Enumerator;
//! use std::rc::Rc;
//!
//! let a = Rc::new("a");
//! let b = Rc::new("a");
//!
//! let mut enumerator = Enumerator::new();
//! assert_eq!(enumerator.get(&a), 0);
//! assert_eq!(enumerator.get(&b), 1);
//! assert_eq!(enumerator.get(&a), 0);
//!
//! let reversed = enumerator.reversed().unwrap();
//! assert!(Rc::ptr_eq(&reversed[&1], &b));
//! ```

use crate::object::AnyObject;
use crate::{Error, Result, Serializer, ToValue, Value, ValueMap};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

/// Identity-based id table over `Rc<T>`.
pub struct Enumerator<T: ?Sized> {
    ids: HashMap<*const (), usize>,
    items: Vec<Rc<T>>,
}

#[inline]
fn identity<T: ?Sized>(item: &Rc<T>) -> *const () {
    Rc::as_ptr(item) as *const ()
}

impl<T: ?Sized> Enumerator<T> {
    #[must_use]
    pub fn new() -> Self {
        Enumerator {
            ids: HashMap::new(),
            items: Vec::new(),
        }
    }

    /// Returns the id of `item`, assigning `len()` if it has not been seen.
    pub fn get(&mut self, item: &Rc<T>) -> usize {
        let next = self.ids.len();
        let id = *self.ids.entry(identity(item)).or_insert(next);
        if id == next {
            self.items.push(Rc::clone(item));
        }
        id
    }

    /// Returns the id of `item` without registering it.
    #[must_use]
    pub fn position(&self, item: &Rc<T>) -> Option<usize> {
        self.ids.get(&identity(item)).copied()
    }

    #[must_use]
    pub fn contains(&self, item: &Rc<T>) -> bool {
        self.ids.contains_key(&identity(item))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterates `(id, item)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Rc<T>)> + '_ {
        self.items.iter().enumerate()
    }

    /// Returns the id → item view.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EnumeratorInvariant`] if two identities share an id or
    /// an id has no stored item. Either case is a bug in this module.
    pub fn reversed(&self) -> Result<BTreeMap<usize, Rc<T>>> {
        let mut reversed = BTreeMap::new();
        for &id in self.ids.values() {
            if let Some(item) = self.items.get(id) {
                reversed.insert(id, Rc::clone(item));
            }
        }
        if reversed.len() != self.ids.len() || self.items.len() != self.ids.len() {
            return Err(Error::EnumeratorInvariant {
                forward: self.ids.len(),
                reversed: reversed.len(),
            });
        }
        Ok(reversed)
    }
}

impl<T: ?Sized> Default for Enumerator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Enumerator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enumerator")
            .field("len", &self.len())
            .finish()
    }
}

/// The wire form is the reversed mapping, `{"<id>": <object encoding>}`.
///
/// Every entry is encoded in full at its top level. Nested objects follow the
/// serializer's memo mode: a plain serializer inlines them, the frozen
/// serializer used by [`Memoizer::serialize`](crate::Memoizer::serialize)
/// turns enumerated ones into references.
impl ToValue for Enumerator<dyn AnyObject> {
    fn to_value(&self, ser: &mut Serializer<'_>) -> Result<Value> {
        let reversed = self.reversed()?;
        let mut out = ValueMap::with_capacity(reversed.len());
        for (id, object) in reversed {
            out.insert(id.to_string(), object.encode(ser)?);
        }
        Ok(Value::Object(out))
    }
}
