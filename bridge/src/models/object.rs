//! Host objects
//!
//! The values a node graph passes between nodes. Objects are shared through
//! `Arc` so a handle, a dict entry and a script wrapper can all point at the
//! same value without copying it.
//!
//! Kinds:
//! - Numeric (integer, float, small float vectors)
//! - String
//! - List of objects
//! - Dict of objects keyed by name

use crate::models::literal::Literal;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Numeric payload of a host numeric object
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericValue {
    Int(i64),
    Float(f64),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
}

/// A value owned by the host runtime
#[derive(Debug, Clone, PartialEq)]
pub enum HostObject {
    Numeric(NumericValue),
    String(String),
    List(Vec<Arc<HostObject>>),
    Dict(DictObject),
}

impl HostObject {
    /// Build a host object from a script literal
    ///
    /// Structure-preserving: every literal kind has exactly one object kind.
    pub fn from_literal(literal: Literal) -> Self {
        match literal {
            Literal::Int(v) => HostObject::Numeric(NumericValue::Int(v)),
            Literal::Float(v) => HostObject::Numeric(NumericValue::Float(v)),
            Literal::Vec2(v) => HostObject::Numeric(NumericValue::Vec2(v)),
            Literal::Vec3(v) => HostObject::Numeric(NumericValue::Vec3(v)),
            Literal::Vec4(v) => HostObject::Numeric(NumericValue::Vec4(v)),
            Literal::Str(s) => HostObject::String(s),
            Literal::List(items) => HostObject::List(
                items
                    .into_iter()
                    .map(|item| Arc::new(HostObject::from_literal(item)))
                    .collect(),
            ),
            Literal::Dict(entries) => HostObject::Dict(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Arc::new(HostObject::from_literal(v))))
                    .collect(),
            ),
        }
    }

    /// Convert this object into a script literal
    pub fn to_literal(&self) -> Literal {
        match self {
            HostObject::Numeric(NumericValue::Int(v)) => Literal::Int(*v),
            HostObject::Numeric(NumericValue::Float(v)) => Literal::Float(*v),
            HostObject::Numeric(NumericValue::Vec2(v)) => Literal::Vec2(*v),
            HostObject::Numeric(NumericValue::Vec3(v)) => Literal::Vec3(*v),
            HostObject::Numeric(NumericValue::Vec4(v)) => Literal::Vec4(*v),
            HostObject::String(s) => Literal::Str(s.clone()),
            HostObject::List(items) => {
                Literal::List(items.iter().map(|item| item.to_literal()).collect())
            }
            HostObject::Dict(dict) => Literal::Dict(
                dict.iter()
                    .map(|(k, v)| (k.clone(), v.to_literal()))
                    .collect(),
            ),
        }
    }

    /// Host-side type name, as shown in node sockets
    pub fn type_name(&self) -> &'static str {
        match self {
            HostObject::Numeric(_) => "NumericObject",
            HostObject::String(_) => "StringObject",
            HostObject::List(_) => "ListObject",
            HostObject::Dict(_) => "DictObject",
        }
    }
}

impl From<Literal> for HostObject {
    fn from(literal: Literal) -> Self {
        HostObject::from_literal(literal)
    }
}

/// Name-keyed collection of host objects
///
/// This is what a script node receives on its `args` socket and produces on
/// its `rets` socket. Iteration order is by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DictObject {
    lut: BTreeMap<String, Arc<HostObject>>,
}

impl DictObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, returning the object previously stored under `key`
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: Arc<HostObject>,
    ) -> Option<Arc<HostObject>> {
        self.lut.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&Arc<HostObject>> {
        self.lut.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.lut.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lut.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lut.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Arc<HostObject>> {
        self.lut.iter()
    }

    /// Literal view of every entry
    pub fn to_literals(&self) -> BTreeMap<String, Literal> {
        self.lut
            .iter()
            .map(|(k, v)| (k.clone(), v.to_literal()))
            .collect()
    }
}

impl FromIterator<(String, Arc<HostObject>)> for DictObject {
    fn from_iter<I: IntoIterator<Item = (String, Arc<HostObject>)>>(iter: I) -> Self {
        DictObject {
            lut: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a DictObject {
    type Item = (&'a String, &'a Arc<HostObject>);
    type IntoIter = btree_map::Iter<'a, String, Arc<HostObject>>;

    fn into_iter(self) -> Self::IntoIter {
        self.lut.iter()
    }
}
