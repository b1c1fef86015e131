//! The capability contract for participating types.
//!
//! A domain type takes part in the codec by implementing [`Serializable`]:
//! it names itself, lists the fields it serializes in order, reads and writes
//! each field by name, and may hook into both directions. Most types can use
//! the [`serializable!`](crate::serializable) macro instead of writing the
//! impl by hand.
//!
//! Deserialization constructs objects in two phases: a placeholder is
//! allocated with [`Serializable::placeholder`], every declared field is
//! assigned from the payload, then [`Serializable::finalize`] rebuilds any
//! derived state. Constructors that need arguments are never called.
//!
//! ## Examples
//!
//! ```rust
//! use serde_memo::{
//!     Deserializer, Error, Result, Serializable, Serializer, Value, ValueMap,
//! };
//! use std::collections::HashMap;
//!
//! #[derive(Debug, Default)]
//! struct Vocabulary {
//!     words: Vec<String>,
//!     index: HashMap<String, usize>,
//! }
//!
//! impl Serializable for Vocabulary {
//!     const TYPE_NAME: &'static str = "Vocabulary";
//!     const FIELDS: &'static [&'static str] = &["words"];
//!
//!     fn placeholder() -> Self {
//!         Self::default()
//!     }
//!
//!     fn serialize_field(&self, field: &str, ser: &mut Serializer<'_>) -> Result<Value> {
//!         match field {
//!             "words" => ser.serialize(&self.words),
//!             _ => Err(Error::unexpected_field(Self::TYPE_NAME, field)),
//!         }
//!     }
//!
//!     fn deserialize_field(
//!         &mut self,
//!         field: &str,
//!         value: &Value,
//!         de: &mut Deserializer<'_>,
//!     ) -> Result<()> {
//!         match field {
//!             "words" => self.words = de.deserialize(value)?,
//!             _ => return Err(Error::unexpected_field(Self::TYPE_NAME, field)),
//!         }
//!         Ok(())
//!     }
//!
//!     fn finalize(&mut self) -> Result<()> {
//!         self.index = self.words.iter().cloned().enumerate().map(|(i, w)| (w, i)).collect();
//!         Ok(())
//!     }
//! }
//! ```

use crate::value::{is_reserved_key, REF_KEY, TYPE_KEY};
use crate::{Deserializer, Error, Result, Serializer, Value, ValueMap};
use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

/// A type that can be encoded as a tagged object and rebuilt from one.
pub trait Serializable: Any + Sized {
    /// Name written to `__type__` and looked up in the [`Namespace`](crate::Namespace).
    const TYPE_NAME: &'static str;

    /// Fields serialized, in order. Exactly these are required on deserialize.
    const FIELDS: &'static [&'static str];

    /// Keys that [`Serializable::serialize_extra`] may add. They are tolerated
    /// on deserialize but never read.
    const COMPUTED_FIELDS: &'static [&'static str] = &[];

    /// Allocates an instance whose fields are about to be overwritten.
    fn placeholder() -> Self;

    /// Serializes the named declared field.
    fn serialize_field(&self, field: &str, ser: &mut Serializer<'_>) -> Result<Value>;

    /// Deserializes `value` into the named declared field.
    fn deserialize_field(
        &mut self,
        field: &str,
        value: &Value,
        de: &mut Deserializer<'_>,
    ) -> Result<()>;

    /// Runs after the declared fields and `__type__` are in `out`.
    fn serialize_extra(&self, _out: &mut ValueMap, _ser: &mut Serializer<'_>) -> Result<()> {
        Ok(())
    }

    /// Runs once every declared field has been assigned.
    fn finalize(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Object-safe view of a [`Serializable`], implemented for every one of them.
pub trait AnyObject: Any {
    fn type_name(&self) -> &'static str;

    /// `TypeId` of the concrete type behind the trait object.
    fn concrete_type_id(&self) -> TypeId;

    /// Encodes the object in full, without a memo check on the object itself.
    fn encode(&self, ser: &mut Serializer<'_>) -> Result<Value>;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<T: Serializable> AnyObject for T {
    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn concrete_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn encode(&self, ser: &mut Serializer<'_>) -> Result<Value> {
        encode_object(self, ser)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

pub(crate) fn check_reserved(type_name: &str, fields: &[&str]) -> Result<()> {
    match fields.iter().find(|field| is_reserved_key(field)) {
        Some(field) => Err(Error::reserved_field(type_name, field)),
        None => Ok(()),
    }
}

fn encode_object<T: Serializable>(object: &T, ser: &mut Serializer<'_>) -> Result<Value> {
    check_reserved(T::TYPE_NAME, T::FIELDS)?;

    let mut out = ValueMap::with_capacity(T::FIELDS.len() + 1);
    for &field in T::FIELDS {
        let value = object.serialize_field(field, ser)?;
        out.insert(field.to_string(), value);
    }
    out.insert(TYPE_KEY.to_string(), Value::from(T::TYPE_NAME));
    object.serialize_extra(&mut out, ser)?;

    if out.contains_key(REF_KEY) {
        return Err(Error::reserved_field(T::TYPE_NAME, REF_KEY));
    }
    if out.get(TYPE_KEY).and_then(Value::as_str) != Some(T::TYPE_NAME) {
        return Err(Error::reserved_field(T::TYPE_NAME, TYPE_KEY));
    }
    Ok(Value::Object(out))
}

fn build_object<T: Serializable>(fields: &ValueMap, de: &mut Deserializer<'_>) -> Result<ObjectRef> {
    for key in fields.keys() {
        if key == TYPE_KEY || T::FIELDS.contains(&key.as_str()) {
            continue;
        }
        if de.options().deny_unknown_fields && !T::COMPUTED_FIELDS.contains(&key.as_str()) {
            return Err(Error::unexpected_field(T::TYPE_NAME, key));
        }
    }

    let mut instance = T::placeholder();
    for &field in T::FIELDS {
        let value = fields
            .get(field)
            .ok_or_else(|| Error::missing_field(T::TYPE_NAME, field))?;
        instance.deserialize_field(field, value, de)?;
    }
    // Keys that are never read may still hold inline memoized objects.
    for (key, value) in fields {
        if key != TYPE_KEY && !T::FIELDS.contains(&key.as_str()) {
            de.skip(value)?;
        }
    }
    instance.finalize()?;
    Ok(ObjectRef::new(instance))
}

/// A shared handle to an object of any registered type.
///
/// Equality is identity: two handles are equal when they point at the same
/// allocation.
///
/// # Examples
///
/// ```rust
/// use serde_memo::{serializable, ObjectRef};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Point { x: i64, y: i64 }
/// serializable!(Point { x, y });
///
/// let a = ObjectRef::new(Point { x: 1, y: 2 });
/// let b = ObjectRef::new(Point { x: 1, y: 2 });
/// assert_eq!(a, a.clone());
/// assert_ne!(a, b);
/// assert_eq!(a.type_name(), "Point");
/// assert_eq!(a.downcast_ref::<Point>(), Some(&Point { x: 1, y: 2 }));
/// ```
#[derive(Clone)]
pub struct ObjectRef(Rc<dyn AnyObject>);

impl ObjectRef {
    pub fn new<T: Serializable>(object: T) -> Self {
        ObjectRef(Rc::new(object))
    }

    pub fn from_rc<T: Serializable>(object: Rc<T>) -> Self {
        ObjectRef(object)
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    #[must_use]
    pub fn is<T: Serializable>(&self) -> bool {
        self.0.concrete_type_id() == TypeId::of::<T>()
    }

    /// Returns a typed handle to the same allocation.
    #[must_use]
    pub fn downcast<T: Serializable>(&self) -> Option<Rc<T>> {
        Rc::clone(&self.0).into_any().downcast::<T>().ok()
    }

    #[must_use]
    pub fn downcast_ref<T: Serializable>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        std::ptr::eq(
            Rc::as_ptr(&self.0) as *const (),
            Rc::as_ptr(&other.0) as *const (),
        )
    }

    #[must_use]
    pub fn as_rc(&self) -> &Rc<dyn AnyObject> {
        &self.0
    }
}

impl<T: Serializable> From<Rc<T>> for ObjectRef {
    fn from(object: Rc<T>) -> Self {
        ObjectRef::from_rc(object)
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef<{}>({:p})", self.type_name(), Rc::as_ptr(&self.0) as *const ())
    }
}

type BuildFn = fn(&ValueMap, &mut Deserializer<'_>) -> Result<ObjectRef>;

/// Everything the deserializer needs to know about one allowed type.
#[derive(Clone, Copy)]
pub struct TypeDescriptor {
    name: &'static str,
    type_id: TypeId,
    fields: &'static [&'static str],
    computed_fields: &'static [&'static str],
    build: BuildFn,
}

impl TypeDescriptor {
    #[must_use]
    pub fn of<T: Serializable>() -> Self {
        TypeDescriptor {
            name: T::TYPE_NAME,
            type_id: TypeId::of::<T>(),
            fields: T::FIELDS,
            computed_fields: T::COMPUTED_FIELDS,
            build: build_object::<T>,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[must_use]
    pub fn fields(&self) -> &'static [&'static str] {
        self.fields
    }

    #[must_use]
    pub fn computed_fields(&self) -> &'static [&'static str] {
        self.computed_fields
    }

    /// Fails with [`Error::ReservedField`] if a declared key is reserved.
    pub fn validate(&self) -> Result<()> {
        check_reserved(self.name, self.fields)?;
        check_reserved(self.name, self.computed_fields)
    }

    /// Builds an instance from an object payload. Memo bookkeeping is the
    /// caller's job; see [`Deserializer::decode_object`].
    pub fn build(&self, fields: &ValueMap, de: &mut Deserializer<'_>) -> Result<ObjectRef> {
        (self.build)(fields, de)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("computed_fields", &self.computed_fields)
            .finish()
    }
}
