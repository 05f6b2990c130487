//! Exercises the Python-facing module through an embedded interpreter.
//!
//! Needs a Python runtime with numpy at execute time (`SHARDNUM_TEST_PYTHON`
//! or `python3` on the path); build with `--features python`.

use libloading::Library;
use pyo3::exceptions::{PyArithmeticError, PyNotImplementedError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{IntoPyDict, PyList, PyModule, PyTuple};
use shardnum::init_test_module;
use std::process::Command;
use std::sync::Once;

static PY_RUNTIME: Once = Once::new();

/// Loads libpython for the lifetime of the test process, then starts the interpreter.
fn ensure_python_initialized() {
    PY_RUNTIME.call_once(|| {
        let python = std::env::var("SHARDNUM_TEST_PYTHON").unwrap_or_else(|_| "python3".into());
        let output = Command::new(&python)
            .args([
                "-c",
                "import sysconfig, os; print(os.path.join(sysconfig.get_config_var('LIBDIR'), \
                 sysconfig.get_config_var('INSTSONAME') or sysconfig.get_config_var('LDLIBRARY')))",
            ])
            .output()
            .unwrap_or_else(|err| panic!("failed to run {python}: {err}"));
        assert!(output.status.success(), "{python} could not locate libpython");
        let libpython = String::from_utf8_lossy(&output.stdout).trim().to_owned();
        let library = unsafe { Library::new(&libpython) }
            .unwrap_or_else(|err| panic!("failed to load {libpython}: {err}"));
        std::mem::forget(library);
        pyo3::prepare_freethreaded_python();
    });
}

fn init(py: Python<'_>) -> PyResult<Bound<'_, PyModule>> {
    let module = PyModule::new_bound(py, "_shardnum_test")?;
    init_test_module(py, &module)?;
    Ok(module)
}

#[test]
fn full_reductions_return_python_scalars() -> PyResult<()> {
    ensure_python_initialized();

    Python::with_gil(|py| -> PyResult<()> {
        let module = init(py)?;
        let array = module
            .getattr("array")?
            .call1((PyList::new_bound(py, [[1, 2, 3], [4, 5, 6]]),))?;
        let shape: Vec<usize> = array.getattr("shape")?.extract()?;
        assert_eq!(shape, vec![2, 3]);
        assert_eq!(array.getattr("dtype")?.extract::<String>()?, "int64");

        let total: i64 = module.getattr("sum")?.call1((array.clone(),))?.extract()?;
        assert_eq!(total, 21);
        let product: i64 = module.getattr("prod")?.call1((array,))?.extract()?;
        assert_eq!(product, 720);

        let empty = module.getattr("array")?.call1((PyList::empty_bound(py),))?;
        let zero: f64 = module.getattr("sum")?.call1((empty,))?.extract()?;
        assert_eq!(zero, 0.0);
        Ok(())
    })?;

    Ok(())
}

#[test]
fn axis_reductions_return_arrays() -> PyResult<()> {
    ensure_python_initialized();

    Python::with_gil(|py| -> PyResult<()> {
        let module = init(py)?;
        let zeros = module.getattr("zeros")?;
        let eye_like = module
            .getattr("array")?
            .call1((PyList::new_bound(py, [[1.0, 0.0], [0.0, 1.0]]),))?;
        let sum = module.getattr("sum")?;
        let kwargs = [("axis", 0.into_py(py)), ("keepdims", true.into_py(py))]
            .into_py_dict_bound(py);
        let columns = sum.call((eye_like,), Some(&kwargs))?;
        let shape: Vec<usize> = columns.getattr("shape")?.extract()?;
        assert_eq!(shape, vec![1, 2]);
        let values: Vec<f64> = columns.call_method0("to_list")?.extract()?;
        assert_eq!(values, vec![1.0, 1.0]);

        let empty = zeros.call1((PyTuple::new_bound(py, [2, 0]),))?;
        let kwargs = [("axis", 1.into_py(py))].into_py_dict_bound(py);
        let rows: Vec<f64> = sum
            .call((empty,), Some(&kwargs))?
            .call_method0("to_list")?
            .extract()?;
        assert_eq!(rows, vec![0.0, 0.0]);
        Ok(())
    })?;

    Ok(())
}

#[test]
fn norm_dispatches_on_ord() -> PyResult<()> {
    ensure_python_initialized();

    Python::with_gil(|py| -> PyResult<()> {
        let module = init(py)?;
        let norm = module.getattr("norm")?;
        let x = module
            .getattr("array")?
            .call1((PyList::new_bound(py, [3.0, -4.0]),))?;

        let two: f64 = norm.call1((x.clone(),))?.extract()?;
        assert_eq!(two, 5.0);
        let one: f64 = norm.call1((x.clone(), 1))?.extract()?;
        assert_eq!(one, 7.0);
        let inf: f64 = norm.call1((x.clone(), f64::INFINITY))?.extract()?;
        assert_eq!(inf, 4.0);

        let err = norm.call1((x, "fro")).unwrap_err();
        assert!(err.is_instance_of::<PyValueError>(py));
        Ok(())
    })?;

    Ok(())
}

#[test]
fn cholesky_maps_errors_to_python_exceptions() -> PyResult<()> {
    ensure_python_initialized();

    Python::with_gil(|py| -> PyResult<()> {
        let module = init(py)?;
        let cholesky = module.getattr("cholesky")?;
        let zeros = module.getattr("zeros")?;

        let vector = zeros.call1((3,))?;
        let err = cholesky.call1((vector,)).unwrap_err();
        assert!(err.is_instance_of::<PyValueError>(py));

        let stacked = zeros.call1((PyTuple::new_bound(py, [2, 3, 3]),))?;
        let err = cholesky.call1((stacked,)).unwrap_err();
        assert!(err.is_instance_of::<PyNotImplementedError>(py));

        let indefinite = PyList::new_bound(py, [[1.0, 2.0], [2.0, 1.0]]);
        let err = cholesky.call1((indefinite,)).unwrap_err();
        assert!(err.is_instance_of::<PyArithmeticError>(py));

        let spd = PyList::new_bound(py, [[4.0, 2.0], [2.0, 2.0]]);
        let factor: Vec<f64> = cholesky.call1((spd,))?.call_method0("to_list")?.extract()?;
        assert_eq!(factor, vec![2.0, 0.0, 1.0, 1.0]);
        Ok(())
    })?;

    Ok(())
}

#[test]
fn numpy_arrays_round_trip() -> PyResult<()> {
    ensure_python_initialized();

    Python::with_gil(|py| -> PyResult<()> {
        let module = init(py)?;
        let numpy = py.import_bound("numpy")?;
        let source = numpy
            .getattr("arange")?
            .call1((6.0,))?
            .call_method1("reshape", ((2, 3),))?;
        let array = module.getattr("from_numpy")?.call1((source.clone(),))?;
        let transposed = array.getattr("T")?;
        let back = transposed.call_method0("to_numpy")?;
        let equal: bool = numpy
            .getattr("array_equal")?
            .call1((back, source.getattr("T")?))?
            .extract()?;
        assert!(equal);
        let max_dim: usize = module.getattr("max_dim")?.call0()?.extract()?;
        assert!(max_dim >= 1);
        Ok(())
    })?;

    Ok(())
}
