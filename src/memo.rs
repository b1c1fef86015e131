//! Memo state for both directions.
//!
//! - [`Memoizer`] lives for one serialize call. It knows which concrete types
//!   are memoized and owns the [`Enumerator`] that numbers their instances.
//! - [`MemoTable`] lives for one deserialize call and maps ids back to the
//!   objects already rebuilt.
//!
//! Neither type is `Send`, and neither should outlive the call it was created
//! for.

use crate::object::AnyObject;
use crate::{CodecOptions, Enumerator, ObjectRef, Result, Serializable, Serializer, Value};
use std::any::TypeId;
use std::collections::{BTreeMap, HashSet};

/// Serialize-side memo: tracked types plus their enumerator.
///
/// # Examples
///
/// ```rust
/// use serde_memo::{serializable, serialize_with_memo, Memoizer};
/// use std::rc::Rc;
///
/// #[derive(Default)]
/// struct Point { x: i64, y: i64 }
/// serializable!(Point { x, y });
///
/// let p = Rc::new(Point { x: 1, y: 2 });
/// let mut memo = Memoizer::new().track::<Point>();
/// let payload = serialize_with_memo(&vec![Rc::clone(&p), p], &mut memo).unwrap();
///
/// assert_eq!(memo.len(), 1);
/// assert_eq!(payload.as_array().unwrap()[1], serde_memo::Value::reference(0));
/// ```
#[derive(Debug, Default)]
pub struct Memoizer {
    tracked: HashSet<TypeId>,
    names: Vec<&'static str>,
    enumerator: Enumerator<dyn AnyObject>,
}

impl Memoizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Memoizes instances of `T`.
    #[must_use]
    pub fn track<T: Serializable>(mut self) -> Self {
        if self.tracked.insert(TypeId::of::<T>()) {
            self.names.push(T::TYPE_NAME);
        }
        self
    }

    #[must_use]
    pub fn tracks(&self, type_id: TypeId) -> bool {
        self.tracked.contains(&type_id)
    }

    /// Names of the tracked types, in the order they were added.
    #[must_use]
    pub fn tracked_names(&self) -> &[&'static str] {
        &self.names
    }

    #[must_use]
    pub fn enumerator(&self) -> &Enumerator<dyn AnyObject> {
        &self.enumerator
    }

    pub(crate) fn enumerator_mut(&mut self) -> &mut Enumerator<dyn AnyObject> {
        &mut self.enumerator
    }

    /// Number of objects memoized so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.enumerator.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.enumerator.is_empty()
    }

    /// Produces the memo payload `{"<id>": <object>}`.
    ///
    /// The enumerator is frozen while this runs: each entry is encoded in
    /// full, memoized objects nested inside an entry become references to
    /// their own entries, and no new ids are assigned.
    pub fn serialize(&self) -> Result<Value> {
        self.serialize_with_options(CodecOptions::default())
    }

    pub fn serialize_with_options(&self, options: CodecOptions) -> Result<Value> {
        Serializer::frozen(self)
            .with_options(options)
            .serialize(&self.enumerator)
    }
}

/// Deserialize-side memo: id → rebuilt object.
#[derive(Clone, Debug, Default)]
pub struct MemoTable {
    entries: BTreeMap<usize, ObjectRef>,
}

impl MemoTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: usize) -> Option<&ObjectRef> {
        self.entries.get(&id)
    }

    pub fn insert(&mut self, id: usize, object: ObjectRef) -> Option<ObjectRef> {
        self.entries.insert(id, object)
    }

    #[must_use]
    pub fn contains(&self, id: usize) -> bool {
        self.entries.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ObjectRef)> + '_ {
        self.entries.iter().map(|(id, object)| (*id, object))
    }

    /// Distinct type names present in the table.
    #[must_use]
    pub fn type_names(&self) -> HashSet<&'static str> {
        self.entries.values().map(ObjectRef::type_name).collect()
    }
}

impl FromIterator<(usize, ObjectRef)> for MemoTable {
    fn from_iter<T: IntoIterator<Item = (usize, ObjectRef)>>(iter: T) -> Self {
        MemoTable {
            entries: iter.into_iter().collect(),
        }
    }
}
