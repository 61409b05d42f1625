//! Core host primitives

pub mod handle;
