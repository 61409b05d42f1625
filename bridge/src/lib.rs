//! Zeno Script Bridge
//!
//! Exposes a node-graph host's input/output slots to embedded user scripts.
//!
//! # Architecture
//!
//! - **core**: Opaque host handles
//! - **models**: Host object kinds and script-native literals
//! - **registry**: Host object table (handle → shared object)
//! - **binding**: The wrap/unwrap contract between scripts and the host
//! - **context**: Per-invocation input/output/retain tables, `args` and `rets`
//! - **node**: Host side of one script run
//!
//! # Critical Invariants
//!
//! 1. Input lookups fail only on a missing key, and the error carries the key
//! 2. Every output handle has its wrapper retained under the same key
//! 3. A script node run leaves the registry exactly as large as it found it

// Module declarations
pub mod binding;
pub mod context;
pub mod core;
pub mod models;
pub mod node;
pub mod registry;

// Re-exports for convenience
pub use binding::{ObjectBinding, ZenoObject};
pub use context::{Args, Rets, ScriptContext, ScriptError};
pub use core::handle::Handle;
pub use models::{
    literal::{ConversionError, Literal},
    object::{DictObject, HostObject, NumericValue},
};
pub use node::{HostContext, Script, ScriptNode, ScriptNodeInputs, ScriptSource};
pub use registry::{ObjectRegistry, RegistryError};

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn zeno_script_bridge(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::context::PyScriptContext>()?;
    m.add_class::<ffi::context::PyZenoObject>()?;
    m.add_class::<ffi::context::PyArgs>()?;
    m.add_class::<ffi::context::PyRets>()?;
    m.add_function(wrap_pyfunction!(ffi::context::run_code, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::context::run_file, m)?)?;
    Ok(())
}
