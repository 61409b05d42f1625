//! Write-only output proxy

use super::{ScriptContext, ScriptError};
use crate::binding::ObjectBinding;

/// Assignment sugar over [`ScriptContext::set_output2`]
///
/// Holds no keys of its own.
pub struct Rets<'a, B: ObjectBinding> {
    ctx: &'a mut ScriptContext<B>,
}

impl<'a, B: ObjectBinding> Rets<'a, B> {
    pub(crate) fn new(ctx: &'a mut ScriptContext<B>) -> Self {
        Self { ctx }
    }

    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<B::Literal>,
    ) -> Result<(), ScriptError> {
        self.ctx.set_output2(key, value)
    }
}
