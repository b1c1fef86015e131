//! Error types for memoized serialization and deserialization.
//!
//! Every failure aborts the call that raised it. There is no partial result
//! and no retry; callers that want per-object tolerance must catch the error
//! at their own call boundary.
//!
//! ## Error Categories
//!
//! - **Trust boundary**: [`Error::UnknownType`] is raised whenever a payload
//!   names a type the caller's [`Namespace`](crate::Namespace) does not allow
//! - **Schema**: missing, unexpected or reserved fields
//! - **References**: dangling, cyclic or mismatched memo ids
//! - **Internal**: [`Error::EnumeratorInvariant`] signals a bug, not bad input
//!
//! ## Examples
//!
//! ```rust
//! use serde_memo::{deserialize, wire, Error, Namespace, Node};
//!
//! let result: Result<Node, Error> = deserialize(&wire!({ "__type__": "Ghost" }), &Namespace::new());
//! assert!(matches!(result, Err(Error::UnknownType(ref name)) if name == "Ghost"));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors raised by the codec.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// `__type__` names a type absent from the namespace
    #[error("Unknown type `{0}`: not present in the deserialization namespace")]
    UnknownType(String),

    /// A declared field is absent from an object payload
    #[error("Missing field `{field}` for type `{type_name}`")]
    MissingField { type_name: String, field: String },

    /// An object payload carries a key its type does not declare
    #[error("Unexpected field `{field}` for type `{type_name}`")]
    UnexpectedField { type_name: String, field: String },

    /// A declared field or injected key collides with `__type__` or `@`
    #[error("Type `{type_name}` uses reserved key `{field}`")]
    ReservedField { type_name: String, field: String },

    /// A reference id with no entry in the memo table
    #[error("Dangling reference: memo id {0} is not defined")]
    DanglingReference(usize),

    /// A reference back to an object whose construction has not finished
    #[error("Cyclic reference: memo id {0} refers to an object still under construction")]
    CyclicReference(usize),

    /// The enumerator's reversed view disagrees with its forward table
    #[error("Enumerator invariant violated: {forward} forward entries but {reversed} reversed entries")]
    EnumeratorInvariant { forward: usize, reversed: usize },

    /// A tracked object reached the frozen memo serializer without an id
    #[error("Object of memoized type `{0}` was never enumerated")]
    UnregisteredObject(String),

    /// `memo_serialize` was handed a memoizer that already holds entries
    #[error("Memoizer already holds {0} entries; memoizers cannot be reused across calls")]
    MemoizerInUse(usize),

    /// The wire shape does not fit the requested Rust type
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// `__type__` is present but not a string
    #[error("Invalid type tag: expected a string, found {0}")]
    InvalidTypeTag(String),

    /// `@` is present but not a non-negative integer
    #[error("Invalid reference: expected a non-negative integer id, found {0}")]
    InvalidReference(String),

    /// A memo payload key is not a decimal id
    #[error("Invalid memo key `{0}`: expected a decimal id")]
    InvalidMemoKey(String),

    /// An inline memoized object disagrees with the memo table entry for its id
    #[error("Memo id {id} holds `{expected}` but the payload encodes `{found}` there")]
    MemoMismatch {
        id: usize,
        expected: String,
        found: String,
    },

    /// Nesting exceeded `CodecOptions::max_depth`
    #[error("Depth limit of {0} exceeded")]
    DepthLimitExceeded(usize),

    /// A number does not fit the target integer type
    #[error("Number out of range: {0}")]
    OutOfRange(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates an unknown-type error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_memo::Error;
    ///
    /// let err = Error::unknown_type("Ghost");
    /// assert!(err.to_string().contains("Ghost"));
    /// ```
    pub fn unknown_type(name: &str) -> Self {
        Error::UnknownType(name.to_string())
    }

    /// Creates a missing-field error naming both the type and the field.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_memo::Error;
    ///
    /// let err = Error::missing_field("Point", "y");
    /// assert_eq!(err.to_string(), "Missing field `y` for type `Point`");
    /// ```
    pub fn missing_field(type_name: &str, field: &str) -> Self {
        Error::MissingField {
            type_name: type_name.to_string(),
            field: field.to_string(),
        }
    }

    pub fn unexpected_field(type_name: &str, field: &str) -> Self {
        Error::UnexpectedField {
            type_name: type_name.to_string(),
            field: field.to_string(),
        }
    }

    pub fn reserved_field(type_name: &str, field: &str) -> Self {
        Error::ReservedField {
            type_name: type_name.to_string(),
            field: field.to_string(),
        }
    }

    /// Creates a type mismatch error when a wire value cannot become the requested type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_memo::Error;
    ///
    /// let err = Error::type_mismatch("integer", "string");
    /// assert!(err.to_string().contains("expected integer"));
    /// ```
    pub fn type_mismatch(expected: &str, found: &str) -> Self {
        Error::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub fn memo_mismatch(id: usize, expected: &str, found: &str) -> Self {
        Error::MemoMismatch {
            id,
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub fn out_of_range<T: fmt::Display>(msg: T) -> Self {
        Error::OutOfRange(msg.to_string())
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Returns `true` for errors caused by untrusted or malformed input, as
    /// opposed to internal invariant violations.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_memo::Error;
    ///
    /// assert!(Error::unknown_type("Ghost").is_input_error());
    /// assert!(!Error::EnumeratorInvariant { forward: 2, reversed: 1 }.is_input_error());
    /// ```
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        !matches!(
            self,
            Error::EnumeratorInvariant { .. } | Error::UnregisteredObject(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
