//! Binding contract between scripts and the host
//!
//! Scripts never touch handles directly. They get wrapper objects from the
//! binding, and the binding alone knows how a wrapper maps to a handle and
//! how it converts to and from literals.
//!
//! The host's own binding is [`ObjectRegistry`](crate::registry::ObjectRegistry).
//! Tests and alternative hosts can plug in their own.

use crate::core::handle::Handle;
use crate::models::literal::{ConversionError, Literal};
use crate::models::object::HostObject;
use crate::registry::RegistryError;
use std::sync::Arc;

/// Wrap/unwrap rules for one host
///
/// # Example
///
/// ```rust
/// use zeno_script_bridge::{Literal, ObjectBinding, ObjectRegistry};
///
/// let mut registry = ObjectRegistry::new();
/// let obj = registry.from_literal(Literal::from(5)).unwrap();
/// let handle = registry.to_handle(&obj);
///
/// let again = registry.wrap(handle).unwrap();
/// assert_eq!(registry.to_literal(&again).unwrap(), Literal::Int(5));
/// ```
pub trait ObjectBinding {
    /// Script-facing wrapper
    type Object: Clone;

    /// Script-native value
    type Literal;

    /// Wrap a raw handle into a script-facing object
    fn wrap(&self, handle: Handle) -> Result<Self::Object, RegistryError>;

    fn to_handle(&self, object: &Self::Object) -> Handle;

    /// Create a host object from a literal and wrap it
    fn from_literal(&mut self, literal: Self::Literal) -> Result<Self::Object, ConversionError>;

    fn to_literal(&self, object: &Self::Object) -> Result<Self::Literal, ConversionError>;
}

impl<B: ObjectBinding + ?Sized> ObjectBinding for &mut B {
    type Object = B::Object;
    type Literal = B::Literal;

    fn wrap(&self, handle: Handle) -> Result<Self::Object, RegistryError> {
        (**self).wrap(handle)
    }

    fn to_handle(&self, object: &Self::Object) -> Handle {
        (**self).to_handle(object)
    }

    fn from_literal(&mut self, literal: Self::Literal) -> Result<Self::Object, ConversionError> {
        (**self).from_literal(literal)
    }

    fn to_literal(&self, object: &Self::Object) -> Result<Self::Literal, ConversionError> {
        (**self).to_literal(object)
    }
}

/// Script-facing wrapper around a host object
///
/// Holds the handle together with a shared reference to the object, so a
/// retained wrapper keeps the object alive even after the registry entry is
/// erased.
#[derive(Debug, Clone)]
pub struct ZenoObject {
    handle: Handle,
    object: Arc<HostObject>,
}

impl ZenoObject {
    pub(crate) fn new(handle: Handle, object: Arc<HostObject>) -> Self {
        Self { handle, object }
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn object(&self) -> &Arc<HostObject> {
        &self.object
    }

    pub fn to_literal(&self) -> Literal {
        self.object.to_literal()
    }
}

impl PartialEq for ZenoObject {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle && Arc::ptr_eq(&self.object, &other.object)
    }
}
