//! Host object registry
//!
//! Translates handles into shared host objects. The host loads an object to
//! obtain a handle, hands the handle to a script, finds the object again when
//! the script returns a handle, and erases the entry when it is done.
//!
//! # Critical Invariants
//!
//! 1. Handles are never reused within one registry
//! 2. `Handle::NULL` is never issued

use crate::binding::{ObjectBinding, ZenoObject};
use crate::core::handle::Handle;
use crate::models::literal::{ConversionError, Literal};
use crate::models::object::HostObject;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::trace;

/// Errors from handle resolution
#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("Invalid object handle: {handle}")]
    InvalidHandle { handle: Handle },
}

/// Table of live host objects, keyed by handle
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use zeno_script_bridge::{HostObject, Literal, ObjectRegistry};
///
/// let mut registry = ObjectRegistry::new();
/// let h = registry.load(Arc::new(HostObject::from_literal(Literal::from("hi"))));
/// assert_eq!(registry.find(h).unwrap().to_literal(), Literal::from("hi"));
/// assert!(registry.erase(h));
/// assert!(registry.find(h).is_err());
/// ```
#[derive(Debug)]
pub struct ObjectRegistry {
    objects: HashMap<Handle, Arc<HostObject>>,
    next_handle: u64,
}

impl Default for ObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self {
            objects: HashMap::new(),
            next_handle: 1,
        }
    }

    /// Register an object and issue a fresh handle for it
    pub fn load(&mut self, object: Arc<HostObject>) -> Handle {
        let handle = Handle::from_raw(self.next_handle);
        self.next_handle += 1;
        trace!(%handle, kind = object.type_name(), "loaded host object");
        self.objects.insert(handle, object);
        handle
    }

    /// Resolve a handle
    ///
    /// # Errors
    /// `RegistryError::InvalidHandle` if the handle was never issued or has
    /// been erased.
    pub fn find(&self, handle: Handle) -> Result<Arc<HostObject>, RegistryError> {
        self.objects
            .get(&handle)
            .cloned()
            .ok_or(RegistryError::InvalidHandle { handle })
    }

    /// Drop the registry's reference; returns whether the handle was live
    pub fn erase(&mut self, handle: Handle) -> bool {
        let erased = self.objects.remove(&handle).is_some();
        if erased {
            trace!(%handle, "erased host object");
        }
        erased
    }

    /// The next handle to be issued
    ///
    /// Every handle loaded after this call compares `>=` the returned mark.
    pub fn watermark(&self) -> Handle {
        Handle::from_raw(self.next_handle)
    }

    /// Erase every handle issued at or after `mark`; returns how many were live
    pub fn erase_since(&mut self, mark: Handle) -> usize {
        let before = self.objects.len();
        self.objects.retain(|handle, _| *handle < mark);
        before - self.objects.len()
    }

    /// Like [`erase_since`](Self::erase_since), but spares handles in `keep`
    ///
    /// `erase_since_except(Handle::NULL, keep)` erases everything outside `keep`.
    pub fn erase_since_except(&mut self, mark: Handle, keep: &HashSet<Handle>) -> usize {
        let before = self.objects.len();
        self.objects
            .retain(|handle, _| *handle < mark || keep.contains(handle));
        before - self.objects.len()
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.objects.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl ObjectBinding for ObjectRegistry {
    type Object = ZenoObject;
    type Literal = Literal;

    fn wrap(&self, handle: Handle) -> Result<ZenoObject, RegistryError> {
        Ok(ZenoObject::new(handle, self.find(handle)?))
    }

    fn to_handle(&self, object: &ZenoObject) -> Handle {
        object.handle()
    }

    fn from_literal(&mut self, literal: Literal) -> Result<ZenoObject, ConversionError> {
        let object = Arc::new(HostObject::from_literal(literal));
        let handle = self.load(Arc::clone(&object));
        Ok(ZenoObject::new(handle, object))
    }

    fn to_literal(&self, object: &ZenoObject) -> Result<Literal, ConversionError> {
        Ok(object.to_literal())
    }
}
