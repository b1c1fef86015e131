//! Configuration options for the codec.
//!
//! [`CodecOptions`] is shared by the [`Serializer`](crate::Serializer) and the
//! [`Deserializer`](crate::Deserializer). It is plain data and implements
//! serde's traits, so it can live in an application config file; missing
//! keys fall back to the defaults.
//!
//! ## Examples
//!
//! ```rust
//! use serde_memo::CodecOptions;
//!
//! let options = CodecOptions::new().with_max_depth(64).allow_unknown_fields();
//! assert_eq!(options.max_depth, Some(64));
//! assert!(!options.deny_unknown_fields);
//! ```

use serde::{Deserialize, Serialize};

/// Default nesting limit for serialize and deserialize recursion.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Configuration options for serialization and deserialization.
///
/// # Examples
///
/// ```rust
/// use serde_memo::CodecOptions;
///
/// let options = CodecOptions::default();
/// assert_eq!(options.max_depth, Some(256));
/// assert!(options.deny_unknown_fields);
///
/// let unbounded = CodecOptions::new().without_depth_limit();
/// assert_eq!(unbounded.max_depth, None);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecOptions {
    /// Maximum nesting depth; `None` disables the guard.
    pub max_depth: Option<usize>,
    /// Reject object payloads carrying keys the type does not declare.
    pub deny_unknown_fields: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        CodecOptions {
            max_depth: Some(DEFAULT_MAX_DEPTH),
            deny_unknown_fields: true,
        }
    }
}

impl CodecOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum nesting depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Disables the nesting guard. Very deep graphs may then exhaust the stack.
    #[must_use]
    pub fn without_depth_limit(mut self) -> Self {
        self.max_depth = None;
        self
    }

    /// Ignores undeclared keys in object payloads instead of rejecting them.
    #[must_use]
    pub fn allow_unknown_fields(mut self) -> Self {
        self.deny_unknown_fields = false;
        self
    }
}
