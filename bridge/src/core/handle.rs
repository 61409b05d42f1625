//! Host handles
//!
//! A handle is an opaque reference to a value owned by the host runtime.
//! Scripts never look inside it; only the registry can turn it back into
//! an object.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to a host-owned object
///
/// # Example
/// ```
/// use zeno_script_bridge::Handle;
///
/// let h = Handle::from_raw(42);
/// assert_eq!(h.as_raw(), 42);
/// assert!(!h.is_null());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(u64);

impl Handle {
    /// Never issued by the registry
    pub const NULL: Handle = Handle(0);

    pub fn from_raw(raw: u64) -> Self {
        Handle(raw)
    }

    pub fn as_raw(self) -> u64 {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for Handle {
    fn from(raw: u64) -> Self {
        Handle(raw)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
