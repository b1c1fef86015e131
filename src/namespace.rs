//! The deserialization allow-list.
//!
//! A [`Namespace`] maps type names to [`TypeDescriptor`]s. It is the only
//! authority on which types a payload may instantiate: there is no global
//! registry, and every deserialize call takes its namespace explicitly, so a
//! caller handling untrusted input can hand over exactly the types it expects.
//!
//! ```rust
//! use serde_memo::{serializable, Namespace};
//!
//! #[derive(Default)]
//! struct Terminal { name: String }
//! serializable!(Terminal { name });
//!
//! let namespace = Namespace::new().with::<Terminal>().unwrap();
//! assert!(namespace.contains("Terminal"));
//! assert!(!namespace.contains("NonTerminal"));
//! ```

use crate::object::TypeDescriptor;
use crate::{Error, Result, Serializable};
use indexmap::IndexMap;

#[derive(Clone, Debug, Default)]
pub struct Namespace {
    types: IndexMap<&'static str, TypeDescriptor>,
}

impl Namespace {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows `T` to be instantiated under its `TYPE_NAME`.
    ///
    /// Registering the same type twice is a no-op.
    ///
    /// # Errors
    ///
    /// [`Error::ReservedField`] if `T` declares `__type__` or `@`, and
    /// [`Error::Custom`] if a different type already claimed the name.
    pub fn register<T: Serializable>(&mut self) -> Result<()> {
        self.insert(TypeDescriptor::of::<T>())
    }

    /// Builder form of [`Namespace::register`].
    pub fn with<T: Serializable>(mut self) -> Result<Self> {
        self.register::<T>()?;
        Ok(self)
    }

    pub fn insert(&mut self, descriptor: TypeDescriptor) -> Result<()> {
        descriptor.validate()?;
        if let Some(existing) = self.types.get(descriptor.name()) {
            if existing.type_id() != descriptor.type_id() {
                return Err(Error::custom(format!(
                    "type name `{}` is already registered for a different type",
                    descriptor.name()
                )));
            }
            return Ok(());
        }
        self.types.insert(descriptor.name(), descriptor);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.types.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
