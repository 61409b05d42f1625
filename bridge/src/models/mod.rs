//! Host object kinds and the script-native literals they convert to

pub mod literal;
pub mod object;

// Re-exports
pub use literal::{ConversionError, Literal};
pub use object::{DictObject, HostObject, NumericValue};
