//! PyO3 wrappers for the script context
//!
//! This module provides the Python classes a script sees.
//!
//! # Example (from Python)
//!
//! ```python
//! from zeno_script_bridge import ScriptContext, run_code
//!
//! ctx = ScriptContext()
//! ctx.load_input("radius", 2.0)
//! run_code(ctx, "rets.area = 3.14159 * args.radius ** 2")
//! print(ctx.take_outputs())   # {'area': 12.56636}
//! ```

use pyo3::exceptions::{PyAttributeError, PyKeyError};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use std::collections::HashSet;
use std::ffi::CString;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use super::types::{literal_to_py, py_to_literal, script_error_to_py};
use crate::binding::{ObjectBinding, ZenoObject};
use crate::context::{ScriptContext, ScriptError};
use crate::core::handle::Handle;
use crate::models::object::DictObject;
use crate::node::ScriptSource;
use crate::registry::ObjectRegistry;

/// Python wrapper for a host object handle
#[pyclass(name = "ZenoObject")]
#[derive(Clone)]
pub struct PyZenoObject {
    inner: ZenoObject,
}

#[pymethods]
impl PyZenoObject {
    fn to_handle(&self) -> u64 {
        self.inner.handle().as_raw()
    }

    fn to_literal(&self, py: Python<'_>) -> PyResult<PyObject> {
        literal_to_py(py, &self.inner.to_literal())
    }

    fn __repr__(&self) -> String {
        format!(
            "ZenoObject(handle={}, type={})",
            self.inner.handle(),
            self.inner.object().type_name()
        )
    }
}

/// Python wrapper for a script context
///
/// Owns its own object registry. The host loads inputs with `load_input`,
/// runs a script with `run_code` / `run_file`, then reads `outputs()` or
/// `take_outputs()`.
#[pyclass(name = "ScriptContext")]
pub struct PyScriptContext {
    inner: ScriptContext<ObjectRegistry>,
}

impl PyScriptContext {
    /// Erase handles issued at or after `mark` that neither table references
    fn release_since(&mut self, mark: Handle) -> usize {
        let live: HashSet<Handle> = self
            .inner
            .inputs()
            .values()
            .chain(self.inner.outputs().values())
            .copied()
            .collect();
        self.inner.binding_mut().erase_since_except(mark, &live)
    }
}

#[pymethods]
impl PyScriptContext {
    #[new]
    fn new() -> Self {
        PyScriptContext {
            inner: ScriptContext::new(ObjectRegistry::new()),
        }
    }

    // ========================================================================
    // Host side
    // ========================================================================

    /// Register a Python value as an input; returns its handle
    fn load_input(&mut self, key: &str, value: &Bound<'_, PyAny>) -> PyResult<u64> {
        let literal = py_to_literal(value)?;
        let object = self
            .inner
            .binding_mut()
            .from_literal(literal)
            .map_err(|e| script_error_to_py(e.into()))?;
        let handle = object.handle();
        self.inner.insert_input(key, handle);
        Ok(handle.as_raw())
    }

    /// Output table as key → integer handle
    fn outputs<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let dict = PyDict::new(py);
        for (key, handle) in self.inner.outputs() {
            dict.set_item(key, handle.as_raw())?;
        }
        Ok(dict)
    }

    /// Drain the outputs as literals and release everything but the inputs
    ///
    /// Outputs are resolved through their retained wrappers before anything
    /// is released, so one object published under several keys, or an input
    /// passed straight through, comes back intact.
    fn take_outputs<'py>(&mut self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let dict = PyDict::new(py);
        for (key, object) in self.inner.retained() {
            dict.set_item(key, literal_to_py(py, &object.to_literal())?)?;
        }
        self.inner.take_outputs();
        self.release_since(Handle::NULL);
        Ok(dict)
    }

    #[getter]
    fn run_id(&self) -> String {
        self.inner.run_id().to_string()
    }

    // ========================================================================
    // Script side
    // ========================================================================

    /// Raises KeyError("invalid input key: ...") if absent
    fn get_input(&self, key: &str) -> PyResult<PyZenoObject> {
        let inner = self.inner.get_input(key).map_err(script_error_to_py)?;
        Ok(PyZenoObject { inner })
    }

    fn get_input2(&self, py: Python<'_>, key: &str) -> PyResult<PyObject> {
        let literal = self.inner.get_input2(key).map_err(script_error_to_py)?;
        literal_to_py(py, &literal)
    }

    fn set_output(&mut self, key: &str, value: PyRef<'_, PyZenoObject>) {
        self.inner.set_output(key, value.inner.clone());
    }

    fn set_output2(&mut self, key: &str, value: &Bound<'_, PyAny>) -> PyResult<()> {
        let literal = py_to_literal(value)?;
        self.inner
            .set_output2(key, literal)
            .map_err(script_error_to_py)
    }

    /// Wrap a Python value as a host object without publishing it
    fn from_literal(&mut self, value: &Bound<'_, PyAny>) -> PyResult<PyZenoObject> {
        let literal = py_to_literal(value)?;
        let inner = self
            .inner
            .binding_mut()
            .from_literal(literal)
            .map_err(|e| script_error_to_py(e.into()))?;
        Ok(PyZenoObject { inner })
    }

    fn update_args(&mut self) -> PyResult<()> {
        self.inner.update_args().map_err(script_error_to_py)
    }

    #[getter]
    fn args(slf: PyRef<'_, Self>) -> PyArgs {
        PyArgs { ctx: slf.into() }
    }

    #[getter]
    fn rets(slf: PyRef<'_, Self>) -> PyRets {
        PyRets { ctx: slf.into() }
    }
}

/// Attribute view of the `update_args` snapshot
#[pyclass(name = "Args")]
pub struct PyArgs {
    ctx: Py<PyScriptContext>,
}

impl PyArgs {
    fn lookup(&self, py: Python<'_>, key: &str) -> Option<PyResult<PyObject>> {
        let ctx = self.ctx.borrow(py);
        ctx.inner
            .args()
            .get(key)
            .map(|literal| literal_to_py(py, literal))
    }
}

#[pymethods]
impl PyArgs {
    fn __getattr__(&self, py: Python<'_>, name: &str) -> PyResult<PyObject> {
        self.lookup(py, name)
            .unwrap_or_else(|| Err(PyAttributeError::new_err(name.to_string())))
    }

    fn __getitem__(&self, py: Python<'_>, key: &str) -> PyResult<PyObject> {
        self.lookup(py, key)
            .unwrap_or_else(|| Err(PyKeyError::new_err(key.to_string())))
    }

    fn __contains__(&self, py: Python<'_>, key: &str) -> bool {
        self.ctx.borrow(py).inner.args().contains(key)
    }

    fn __len__(&self, py: Python<'_>) -> usize {
        self.ctx.borrow(py).inner.args().len()
    }
}

/// Write-only proxy: `rets.x = v` and `rets["x"] = v` both call `set_output2`
#[pyclass(name = "Rets")]
pub struct PyRets {
    ctx: Py<PyScriptContext>,
}

#[pymethods]
impl PyRets {
    fn __setattr__(&self, py: Python<'_>, name: &str, value: &Bound<'_, PyAny>) -> PyResult<()> {
        self.ctx.borrow_mut(py).set_output2(name, value)
    }

    fn __setitem__(&self, py: Python<'_>, key: &str, value: &Bound<'_, PyAny>) -> PyResult<()> {
        self.ctx.borrow_mut(py).set_output2(key, value)
    }
}

// ========================================================================
// Script execution
// ========================================================================

/// Run Python source against a context
///
/// The script's globals hold `args`, `rets`, the accessor functions bound
/// to `ctx`, and a `print` writing to stderr. `update_args` runs first.
/// Handles the script creates but does not publish are released when it
/// returns.
#[pyfunction]
pub fn run_code(py: Python<'_>, ctx: Py<PyScriptContext>, code: &str) -> PyResult<()> {
    exec_source(py, ctx, "<string>", code.to_string())
}

/// Run a Python file against a context
#[pyfunction]
pub fn run_file(py: Python<'_>, ctx: Py<PyScriptContext>, path: PathBuf) -> PyResult<()> {
    let source = ScriptSource::File(path);
    let code = source.load().map_err(script_error_to_py)?;
    exec_source(py, ctx, &source.name(), code)
}

fn exec_source(
    py: Python<'_>,
    ctx: Py<PyScriptContext>,
    name: &str,
    code: String,
) -> PyResult<()> {
    let code = CString::new(code).map_err(|e| {
        script_error_to_py(ScriptError::failed(format!(
            "script {} contains a NUL byte: {}",
            name, e
        )))
    })?;

    let mark = ctx.borrow(py).inner.binding().watermark();
    ctx.borrow_mut(py).update_args()?;

    let result = script_globals(py, &ctx).and_then(|globals| py.run(&code, Some(&globals), None));

    let released = ctx.borrow_mut(py).release_since(mark);
    debug!(script = name, released, "released unpublished script objects");
    result
}

fn script_globals<'py>(
    py: Python<'py>,
    ctx: &Py<PyScriptContext>,
) -> PyResult<Bound<'py, PyDict>> {
    let bound = ctx.bind(py);
    let globals = PyDict::new(py);
    for name in [
        "get_input",
        "get_input2",
        "set_output",
        "set_output2",
        "from_literal",
        "update_args",
    ] {
        globals.set_item(name, bound.getattr(name)?)?;
    }
    globals.set_item("args", bound.getattr("args")?)?;
    globals.set_item("rets", bound.getattr("rets")?)?;

    // keep script chatter off the host's stdout
    let kwargs = PyDict::new(py);
    kwargs.set_item("file", py.import("sys")?.getattr("stderr")?)?;
    let print = py
        .import("functools")?
        .getattr("partial")?
        .call((py.import("builtins")?.getattr("print")?,), Some(&kwargs))?;
    globals.set_item("print", print)?;

    Ok(globals)
}

/// Run a script node's program on the host registry
///
/// The registry is lent to a Python context for the duration of the run and
/// handed back afterwards, success or not. Outputs are resolved through
/// their retained wrappers. Releasing the handles issued during the run is
/// left to the caller.
pub fn run_node_script(
    py: Python<'_>,
    registry: &mut ObjectRegistry,
    args: &DictObject,
    source: &ScriptSource,
) -> Result<DictObject, ScriptError> {
    let code = source.load()?;
    let ctx = Py::new(py, PyScriptContext::new()).map_err(python_failure)?;

    {
        let mut cell = ctx.borrow_mut(py);
        cell.inner = ScriptContext::new(std::mem::take(registry));
        for (key, object) in args {
            let handle = cell.inner.binding_mut().load(Arc::clone(object));
            cell.inner.insert_input(key.clone(), handle);
        }
    }

    let run = exec_source(py, ctx.clone_ref(py), &source.name(), code);

    let inner = std::mem::replace(
        &mut ctx.borrow_mut(py).inner,
        ScriptContext::new(ObjectRegistry::new()),
    );
    let rets = run.map_err(python_failure).map(|()| {
        inner
            .retained()
            .iter()
            .map(|(key, object)| (key.clone(), Arc::clone(object.object())))
            .collect::<DictObject>()
    });
    *registry = inner.into_binding();
    rets
}

fn python_failure(err: PyErr) -> ScriptError {
    ScriptError::failed(format!("Python exception occurred: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;
    use std::io::Write;

    fn with_context<F>(f: F)
    where
        F: for<'py> FnOnce(Python<'py>, Py<PyScriptContext>),
    {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            let ctx = Py::new(py, PyScriptContext::new()).unwrap();
            f(py, ctx)
        })
    }

    fn eval<'py>(py: Python<'py>, expr: &CStr) -> Bound<'py, PyAny> {
        py.eval(expr, None, None).unwrap()
    }

    fn take_i64(py: Python<'_>, ctx: &Py<PyScriptContext>) -> Vec<(String, i64)> {
        let dict = ctx.borrow_mut(py).take_outputs(py).unwrap();
        let mut items: Vec<(String, i64)> = dict
            .iter()
            .map(|(k, v)| (k.extract().unwrap(), v.extract().unwrap()))
            .collect();
        items.sort();
        items
    }

    #[test]
    fn test_rets_attribute_and_item_assignment_agree() {
        with_context(|py, ctx| {
            run_code(py, ctx.clone_ref(py), "rets.x = 3\nrets['y'] = 3").unwrap();

            {
                let cell = ctx.borrow(py);
                let x = &cell.inner.retained()["x"];
                let y = &cell.inner.retained()["y"];
                assert_eq!(cell.inner.outputs()["x"], x.handle());
                assert_eq!(cell.inner.outputs()["y"], y.handle());
                assert_eq!(x.to_literal(), y.to_literal());
            }

            assert_eq!(
                take_i64(py, &ctx),
                vec![("x".to_string(), 3), ("y".to_string(), 3)]
            );
        });
    }

    #[test]
    fn test_args_attribute_access() {
        with_context(|py, ctx| {
            ctx.borrow_mut(py)
                .load_input("n", &eval(py, c"4"))
                .unwrap();
            run_code(py, ctx.clone_ref(py), "rets.sq = args.n * args['n']").unwrap();
            assert_eq!(take_i64(py, &ctx), vec![("sq".to_string(), 16)]);

            let err = run_code(py, ctx.clone_ref(py), "args.nope").unwrap_err();
            assert!(err.is_instance_of::<PyAttributeError>(py));
        });
    }

    #[test]
    fn test_missing_input_raises_key_error() {
        with_context(|py, ctx| {
            let err = run_code(py, ctx.clone_ref(py), "get_input('missing')").unwrap_err();
            assert!(err.is_instance_of::<PyKeyError>(py));
            assert!(err.to_string().contains("invalid input key: missing"));

            run_code(
                py,
                ctx.clone_ref(py),
                "try:\n    get_input2('gone')\nexcept KeyError as e:\n    rets.msg = e.args[0]",
            )
            .unwrap();
            let dict = ctx.borrow_mut(py).take_outputs(py).unwrap();
            let msg: String = dict.get_item("msg").unwrap().unwrap().extract().unwrap();
            assert_eq!(msg, "invalid input key: gone");
        });
    }

    #[test]
    fn test_shared_output_object_survives_take() {
        with_context(|py, ctx| {
            run_code(
                py,
                ctx.clone_ref(py),
                "x = from_literal(1)\nset_output('a', x)\nset_output('b', x)",
            )
            .unwrap();

            assert_eq!(
                take_i64(py, &ctx),
                vec![("a".to_string(), 1), ("b".to_string(), 1)]
            );
            assert!(ctx.borrow(py).inner.outputs().is_empty());
        });
    }

    #[test]
    fn test_pass_through_keeps_input_resolvable() {
        with_context(|py, ctx| {
            ctx.borrow_mut(py)
                .load_input("a", &eval(py, c"7"))
                .unwrap();
            run_code(py, ctx.clone_ref(py), "set_output('b', get_input('a'))").unwrap();

            assert_eq!(take_i64(py, &ctx), vec![("b".to_string(), 7)]);

            let again: i64 = ctx
                .borrow(py)
                .get_input2(py, "a")
                .unwrap()
                .extract(py)
                .unwrap();
            assert_eq!(again, 7);
        });
    }

    #[test]
    fn test_unpublished_objects_released_after_run() {
        with_context(|py, ctx| {
            ctx.borrow_mut(py)
                .load_input("a", &eval(py, c"1"))
                .unwrap();
            run_code(
                py,
                ctx.clone_ref(py),
                "tmp = from_literal(5)\nrets.x = 1\nrets.x = 2",
            )
            .unwrap();

            // the input and the final value of x
            assert_eq!(ctx.borrow(py).inner.binding().len(), 2);

            assert_eq!(take_i64(py, &ctx), vec![("x".to_string(), 2)]);
            assert_eq!(ctx.borrow(py).inner.binding().len(), 1);
        });
    }

    #[test]
    fn test_print_writes_to_stderr() {
        with_context(|py, ctx| {
            run_code(
                py,
                ctx.clone_ref(py),
                "import sys\nassert print.keywords['file'] is sys.stderr\nprint('hello')",
            )
            .unwrap();
        });
    }

    #[test]
    fn test_run_file() {
        let path = std::env::temp_dir().join(format!("zeno_bridge_ffi_{}.py", std::process::id()));
        {
            let mut file = std::fs::File::create(&path).unwrap();
            writeln!(file, "rets.doubled = args.n * 2").unwrap();
        }

        with_context(|py, ctx| {
            ctx.borrow_mut(py)
                .load_input("n", &eval(py, c"21"))
                .unwrap();
            run_file(py, ctx.clone_ref(py), path.clone()).unwrap();
            assert_eq!(take_i64(py, &ctx), vec![("doubled".to_string(), 42)]);
        });

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_run_file_missing_raises_os_error() {
        with_context(|py, ctx| {
            let err = run_file(py, ctx, PathBuf::from("/nonexistent/zeno/script.py")).unwrap_err();
            assert!(err.is_instance_of::<pyo3::exceptions::PyOSError>(py));
        });
    }
}
