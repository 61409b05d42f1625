//! Script context
//!
//! One context per script invocation. The host fills the input table,
//! hands the context to the script by `&mut`, and reads the output table
//! back once the script returns.
//!
//! # Tables
//!
//! - **inputs**: key → handle, read-only for the script
//! - **outputs**: key → handle, written by the script
//! - **retained**: key → wrapper backing each output handle, replaced on
//!   every write to the same key
//!
//! # Example
//!
//! ```rust
//! use zeno_script_bridge::{Literal, ObjectBinding, ObjectRegistry, ScriptContext};
//!
//! let mut registry = ObjectRegistry::new();
//! let seed = registry.from_literal(Literal::from(20)).unwrap();
//! let seed_handle = registry.to_handle(&seed);
//!
//! let mut ctx = ScriptContext::new(&mut registry);
//! ctx.insert_input("count", seed_handle);
//! ctx.update_args().unwrap();
//!
//! let count: i64 = ctx.get_input_as("count").unwrap();
//! ctx.rets().set("doubled", count * 2).unwrap();
//!
//! assert_eq!(ctx.args().get("count"), Some(&Literal::Int(20)));
//! assert!(ctx.outputs().contains_key("doubled"));
//! ```

pub mod args;
pub mod rets;

pub use args::Args;
pub use rets::Rets;

use crate::binding::ObjectBinding;
use crate::core::handle::Handle;
use crate::models::literal::ConversionError;
use crate::registry::RegistryError;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, trace};
use uuid::Uuid;

/// Errors raised while a script runs
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Input lookup on a key the host never provided
    #[error("invalid input key: {key}")]
    MissingInput { key: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("cannot open file for read: {}", path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The script body itself reported failure
    #[error("Script failed: {message}")]
    Failed { message: String },
}

impl ScriptError {
    pub fn failed(message: impl Into<String>) -> Self {
        ScriptError::Failed {
            message: message.into(),
        }
    }

    /// Key carried by a `MissingInput` error
    pub fn missing_key(&self) -> Option<&str> {
        match self {
            ScriptError::MissingInput { key } => Some(key),
            _ => None,
        }
    }
}

/// Input, output and retain tables for one script invocation
pub struct ScriptContext<B: ObjectBinding> {
    binding: B,
    inputs: BTreeMap<String, Handle>,
    outputs: BTreeMap<String, Handle>,
    retained: BTreeMap<String, B::Object>,
    args: Args<B::Literal>,
    run_id: Uuid,
}

impl<B: ObjectBinding> ScriptContext<B> {
    pub fn new(binding: B) -> Self {
        Self {
            binding,
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            retained: BTreeMap::new(),
            args: Args::default(),
            run_id: Uuid::new_v4(),
        }
    }

    /// Create a context with a pre-filled input table
    pub fn with_inputs<I, K>(binding: B, inputs: I) -> Self
    where
        I: IntoIterator<Item = (K, Handle)>,
        K: Into<String>,
    {
        let mut ctx = Self::new(binding);
        for (key, handle) in inputs {
            ctx.insert_input(key, handle);
        }
        ctx
    }

    // ========================================================================
    // Host side
    // ========================================================================

    /// Provide an input before the script runs
    pub fn insert_input(&mut self, key: impl Into<String>, handle: Handle) -> Option<Handle> {
        self.inputs.insert(key.into(), handle)
    }

    pub fn inputs(&self) -> &BTreeMap<String, Handle> {
        &self.inputs
    }

    pub fn outputs(&self) -> &BTreeMap<String, Handle> {
        &self.outputs
    }

    pub fn retained(&self) -> &BTreeMap<String, B::Object> {
        &self.retained
    }

    /// Drain the output table and release every retained wrapper
    pub fn take_outputs(&mut self) -> BTreeMap<String, Handle> {
        self.retained.clear();
        std::mem::take(&mut self.outputs)
    }

    pub fn binding(&self) -> &B {
        &self.binding
    }

    pub fn binding_mut(&mut self) -> &mut B {
        &mut self.binding
    }

    /// Tear the context down, handing the binding back to the host
    pub fn into_binding(self) -> B {
        self.binding
    }

    /// Identifier of this invocation, for log correlation
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    // ========================================================================
    // Script side
    // ========================================================================

    pub fn has_input(&self, key: &str) -> bool {
        self.inputs.contains_key(key)
    }

    /// Look up an input and wrap its handle
    ///
    /// # Errors
    /// `ScriptError::MissingInput` carrying `key` if the host did not
    /// provide it; `ScriptError::Registry` if the binding rejects the handle.
    pub fn get_input(&self, key: &str) -> Result<B::Object, ScriptError> {
        let handle = *self
            .inputs
            .get(key)
            .ok_or_else(|| ScriptError::MissingInput {
                key: key.to_string(),
            })?;
        trace!(key, %handle, "get input");
        Ok(self.binding.wrap(handle)?)
    }

    /// Look up an input and convert it to a literal
    pub fn get_input2(&self, key: &str) -> Result<B::Literal, ScriptError> {
        let object = self.get_input(key)?;
        Ok(self.binding.to_literal(&object)?)
    }

    /// Look up an input and convert it to a concrete Rust type
    ///
    /// # Example
    /// ```ignore
    /// let path: String = ctx.get_input_as("path")?;
    /// ```
    pub fn get_input_as<T>(&self, key: &str) -> Result<T, ScriptError>
    where
        T: TryFrom<B::Literal, Error = ConversionError>,
    {
        Ok(T::try_from(self.get_input2(key)?)?)
    }

    /// Publish a wrapper's handle under `key` and retain the wrapper
    pub fn set_output(&mut self, key: impl Into<String>, value: B::Object) {
        let key = key.into();
        let handle = self.binding.to_handle(&value);
        debug!(key = key.as_str(), %handle, "set output");
        self.outputs.insert(key.clone(), handle);
        self.retained.insert(key, value);
    }

    /// Convert a literal to a wrapper and publish it under `key`
    pub fn set_output2(
        &mut self,
        key: impl Into<String>,
        value: impl Into<B::Literal>,
    ) -> Result<(), ScriptError> {
        let object = self.binding.from_literal(value.into())?;
        self.set_output(key, object);
        Ok(())
    }

    /// Snapshot every input into `args` as a literal
    ///
    /// Not a live view: call again to pick up later input changes.
    pub fn update_args(&mut self) -> Result<(), ScriptError> {
        let snapshot = self
            .inputs
            .keys()
            .map(|key| Ok((key.clone(), self.get_input2(key)?)))
            .collect::<Result<Vec<(String, B::Literal)>, ScriptError>>()?;
        for (key, value) in snapshot {
            self.args.set(key, value);
        }
        Ok(())
    }

    pub fn args(&self) -> &Args<B::Literal> {
        &self.args
    }

    /// Write-only view redirecting assignments to `set_output2`
    pub fn rets(&mut self) -> Rets<'_, B> {
        Rets::new(self)
    }
}
