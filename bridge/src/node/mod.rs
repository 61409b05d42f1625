//! Script node
//!
//! The host side of one script run. A graph node that embeds a script
//! receives its arguments as a [`DictObject`], exposes them to the script
//! through a fresh [`ScriptContext`], and turns whatever the script published
//! into its own `rets` dict.
//!
//! # Lifecycle
//!
//! 1. Load every argument into the registry and record its handle as an input
//! 2. Snapshot the inputs into `args`
//! 3. Run the script
//! 4. Resolve every output handle back into an object
//! 5. Erase every handle issued since step 1, success or not
//!
//! Step 5 leaves the registry exactly as large as it was before the run.
//! Objects published as outputs stay alive through the returned dict.

pub mod source;

pub use source::{ScriptNodeInputs, ScriptSource};

use crate::binding::ObjectBinding;
use crate::context::{ScriptContext, ScriptError};
use crate::models::object::DictObject;
use crate::registry::ObjectRegistry;
use std::sync::Arc;
use tracing::{debug, info_span, warn};

/// Context type seen by scripts run on the host registry
pub type HostContext<'r> = ScriptContext<&'r mut ObjectRegistry>;

/// A script body
///
/// Closures of the right shape are scripts too.
pub trait Script<B: ObjectBinding> {
    fn run(&mut self, ctx: &mut ScriptContext<B>) -> Result<(), ScriptError>;
}

impl<B, F> Script<B> for F
where
    B: ObjectBinding,
    F: FnMut(&mut ScriptContext<B>) -> Result<(), ScriptError>,
{
    fn run(&mut self, ctx: &mut ScriptContext<B>) -> Result<(), ScriptError> {
        self(ctx)
    }
}

/// Graph node that runs one script per application
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use zeno_script_bridge::{
///     DictObject, HostObject, Literal, ObjectRegistry, ScriptNode, ScriptNodeInputs,
/// };
///
/// let mut registry = ObjectRegistry::new();
/// let mut args = DictObject::new();
/// args.insert("n", Arc::new(HostObject::from_literal(Literal::from(3))));
///
/// let node = ScriptNode::new(ScriptNodeInputs::default());
/// let rets = node
///     .apply_fn(&mut registry, &args, |ctx| {
///         let n: i64 = ctx.get_input_as("n")?;
///         ctx.rets().set("square", n * n)
///     })
///     .unwrap();
///
/// assert_eq!(rets.get("square").unwrap().to_literal(), Literal::Int(9));
/// assert!(registry.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptNode {
    inputs: ScriptNodeInputs,
}

impl ScriptNode {
    pub fn new(inputs: ScriptNodeInputs) -> Self {
        Self { inputs }
    }

    pub fn inputs(&self) -> &ScriptNodeInputs {
        &self.inputs
    }

    /// Where this node's script text comes from
    pub fn source(&self) -> ScriptSource {
        ScriptSource::from_inputs(&self.inputs)
    }

    /// Run `script` against `args` and collect its outputs
    ///
    /// # Errors
    ///
    /// Whatever the script returns (a missing input key included), or
    /// `ScriptError::Registry` if an output handle no longer resolves.
    pub fn apply<'r, S>(
        &self,
        registry: &'r mut ObjectRegistry,
        args: &DictObject,
        script: &mut S,
    ) -> Result<DictObject, ScriptError>
    where
        S: Script<&'r mut ObjectRegistry> + ?Sized,
    {
        let mark = registry.watermark();
        let mut ctx = ScriptContext::new(registry);

        let span = info_span!(
            "script_node",
            run_id = %ctx.run_id(),
            source = %self.source().name()
        );
        let _guard = span.enter();

        for (key, object) in args {
            let handle = ctx.binding_mut().load(Arc::clone(object));
            ctx.insert_input(key.clone(), handle);
        }
        debug!(num_inputs = ctx.inputs().len(), "script inputs loaded");

        let result = ctx
            .update_args()
            .and_then(|()| script.run(&mut ctx))
            .and_then(|()| collect_outputs(&ctx));

        ctx.take_outputs();
        let erased = ctx.binding_mut().erase_since(mark);
        debug!(erased, "script handles released");

        match result {
            Ok(rets) => {
                debug!(num_outputs = rets.len(), "script finished");
                Ok(rets)
            }
            Err(e) => {
                warn!(error = %e, "script invocation failed");
                Err(e)
            }
        }
    }

    /// Run this node's own program (`code` or `path`) as Python
    ///
    /// Same lifecycle as [`apply`](Self::apply): args become inputs, `args`
    /// is snapshotted, the program runs, published outputs come back as a
    /// dict, and every handle issued during the run is released.
    ///
    /// # Errors
    ///
    /// `ScriptError::SourceUnreadable` if `path` cannot be read;
    /// `ScriptError::Failed` carrying the Python exception otherwise.
    #[cfg(feature = "pyo3")]
    pub fn apply_python(
        &self,
        registry: &mut ObjectRegistry,
        args: &DictObject,
    ) -> Result<DictObject, ScriptError> {
        let source = self.source();
        let mark = registry.watermark();

        let span = info_span!("script_node", source = %source.name());
        let _guard = span.enter();

        pyo3::prepare_freethreaded_python();
        let result = pyo3::Python::with_gil(|py| {
            crate::ffi::context::run_node_script(py, registry, args, &source)
        });

        let erased = registry.erase_since(mark);
        debug!(erased, "script handles released");

        if let Err(e) = &result {
            warn!(error = %e, "python script invocation failed");
        }
        result
    }

    /// [`apply`](Self::apply) for closure scripts
    pub fn apply_fn<F>(
        &self,
        registry: &mut ObjectRegistry,
        args: &DictObject,
        mut script: F,
    ) -> Result<DictObject, ScriptError>
    where
        F: FnMut(&mut HostContext<'_>) -> Result<(), ScriptError>,
    {
        self.apply(registry, args, &mut script)
    }
}

fn collect_outputs(ctx: &HostContext<'_>) -> Result<DictObject, ScriptError> {
    let mut rets = DictObject::new();
    for (key, handle) in ctx.outputs() {
        rets.insert(key.clone(), ctx.binding().find(*handle)?);
    }
    Ok(rets)
}
