//! Snapshot of a context's inputs as literals

use std::collections::BTreeMap;

/// Inputs captured by [`ScriptContext::update_args`](super::ScriptContext::update_args)
#[derive(Debug, Clone, PartialEq)]
pub struct Args<L> {
    values: BTreeMap<String, L>,
}

impl<L> Default for Args<L> {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }
}

impl<L> Args<L> {
    pub fn get(&self, key: &str) -> Option<&L> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn set(&mut self, key: String, value: L) {
        self.values.insert(key, value);
    }
}
