//! Type conversion utilities for FFI boundary
//!
//! Converts between script literals and Python objects, and maps crate
//! errors to Python exceptions.
//!
//! Python → literal:
//! - `int` → `Int`, `float` → `Float`, `str` → `Str`
//! - tuple of 2, 3 or 4 numbers → `Vec2` / `Vec3` / `Vec4`
//! - `list` → `List`, `dict` with `str` keys → `Dict`
//! - anything else (`None` and `bool` included) raises `TypeError`

use pyo3::exceptions::{PyIOError, PyKeyError, PyRuntimeError, PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict, PyFloat, PyInt, PyList, PyString, PyTuple};
use std::collections::BTreeMap;

use crate::context::ScriptError;
use crate::models::literal::Literal;

// ========================================================================
// Python → Literal
// ========================================================================

/// Convert a Python value into a literal
///
/// # Errors
/// Raises TypeError for values with no host kind.
pub fn py_to_literal(value: &Bound<'_, PyAny>) -> PyResult<Literal> {
    // bool is a subclass of int
    if value.is_none() || value.is_instance_of::<PyBool>() {
        return Err(unsupported(value));
    }

    if value.is_instance_of::<PyInt>() {
        return Ok(Literal::Int(value.extract()?));
    }

    if value.is_instance_of::<PyFloat>() {
        return Ok(Literal::Float(value.extract()?));
    }

    if let Ok(s) = value.downcast::<PyString>() {
        return Ok(Literal::Str(s.to_str()?.to_owned()));
    }

    if let Ok(tuple) = value.downcast::<PyTuple>() {
        return match tuple.len() {
            2 => Ok(Literal::Vec2(tuple.extract()?)),
            3 => Ok(Literal::Vec3(tuple.extract()?)),
            4 => Ok(Literal::Vec4(tuple.extract()?)),
            n => Err(PyTypeError::new_err(format!(
                "tuple literals must have 2 to 4 components, got {}",
                n
            ))),
        };
    }

    if let Ok(list) = value.downcast::<PyList>() {
        let items = list
            .iter()
            .map(|item| py_to_literal(&item))
            .collect::<PyResult<Vec<_>>>()?;
        return Ok(Literal::List(items));
    }

    if let Ok(dict) = value.downcast::<PyDict>() {
        let mut entries = BTreeMap::new();
        for (key, item) in dict.iter() {
            let key: String = key.extract().map_err(|_| {
                PyTypeError::new_err("dict literal keys must be str")
            })?;
            entries.insert(key, py_to_literal(&item)?);
        }
        return Ok(Literal::Dict(entries));
    }

    Err(unsupported(value))
}

fn unsupported(value: &Bound<'_, PyAny>) -> PyErr {
    let type_name = value
        .get_type()
        .name()
        .map(|name| name.to_string())
        .unwrap_or_else(|_| "<unknown>".to_string());
    PyTypeError::new_err(format!("cannot convert {} to a host object", type_name))
}

// ========================================================================
// Literal → Python
// ========================================================================

/// Convert a literal into a Python value
pub fn literal_to_py(py: Python<'_>, literal: &Literal) -> PyResult<PyObject> {
    let obj = match literal {
        Literal::Int(v) => v.into_pyobject(py)?.into_any(),
        Literal::Float(v) => v.into_pyobject(py)?.into_any(),
        Literal::Vec2(v) => PyTuple::new(py, v.iter())?.into_any(),
        Literal::Vec3(v) => PyTuple::new(py, v.iter())?.into_any(),
        Literal::Vec4(v) => PyTuple::new(py, v.iter())?.into_any(),
        Literal::Str(s) => PyString::new(py, s).into_any(),
        Literal::List(items) => {
            let items = items
                .iter()
                .map(|item| literal_to_py(py, item))
                .collect::<PyResult<Vec<_>>>()?;
            PyList::new(py, items)?.into_any()
        }
        Literal::Dict(entries) => {
            let dict = PyDict::new(py);
            for (key, value) in entries {
                dict.set_item(key, literal_to_py(py, value)?)?;
            }
            dict.into_any()
        }
    };
    Ok(obj.unbind())
}

// ========================================================================
// Errors
// ========================================================================

/// Map a script error onto the matching Python exception
pub fn script_error_to_py(err: ScriptError) -> PyErr {
    match err {
        ScriptError::MissingInput { .. } => PyKeyError::new_err(err.to_string()),
        ScriptError::Registry(_) => PyValueError::new_err(err.to_string()),
        ScriptError::Conversion(_) => PyTypeError::new_err(err.to_string()),
        ScriptError::SourceUnreadable { .. } => PyIOError::new_err(err.to_string()),
        ScriptError::Failed { .. } => PyRuntimeError::new_err(err.to_string()),
    }
}
