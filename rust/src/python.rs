use num_complex::Complex64;
use numpy::{PyArray1, PyArrayMethods, PyReadonlyArrayDyn, PyUntypedArrayMethods};
use pyo3::exceptions::{PyArithmeticError, PyNotImplementedError, PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyAny, PyBool, PyComplex, PyFloat, PyLong, PyModule, PySequence, PyString};

use crate::array::NdArray;
use crate::config;
use crate::dtype::{DType, Scalar};
use crate::error::{ArrayError, ErrorKind};
use crate::linalg::{self, NormOrder};
use crate::reduce::{self, Axis};
use crate::storage::Storage;

impl From<ArrayError> for PyErr {
    fn from(err: ArrayError) -> PyErr {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::Value => PyValueError::new_err(message),
            ErrorKind::NotImplemented => PyNotImplementedError::new_err(message),
            ErrorKind::Numerical => PyArithmeticError::new_err(message),
        }
    }
}

#[pyclass(name = "ndarray", module = "shardnum")]
pub struct PyNdArray {
    inner: NdArray,
}

impl PyNdArray {
    fn from_inner(inner: NdArray) -> Self {
        Self { inner }
    }
}

#[pymethods]
impl PyNdArray {
    #[new]
    fn new(obj: &Bound<'_, PyAny>) -> PyResult<Self> {
        Ok(Self::from_inner(to_array(obj)?))
    }

    #[getter]
    fn shape(&self) -> Vec<usize> {
        self.inner.shape().to_vec()
    }

    #[getter]
    fn ndim(&self) -> usize {
        self.inner.ndim()
    }

    #[getter]
    fn size(&self) -> usize {
        self.inner.size()
    }

    #[getter]
    fn dtype(&self) -> &'static str {
        self.inner.dtype().name()
    }

    fn __len__(&self) -> PyResult<usize> {
        self.inner
            .shape()
            .first()
            .copied()
            .ok_or_else(|| PyTypeError::new_err("len() of unsized object"))
    }

    fn __repr__(&self) -> String {
        format!("{:?}", self.inner)
    }

    fn item(&self, py: Python<'_>) -> PyResult<PyObject> {
        Ok(scalar_to_py(py, self.inner.item()?))
    }

    /// Elements in row-major order as a flat list.
    fn to_list(&self, py: Python<'_>) -> Vec<PyObject> {
        self.inner
            .to_scalars()
            .into_iter()
            .map(|value| scalar_to_py(py, value))
            .collect()
    }

    fn copy(&self) -> Self {
        Self::from_inner(self.inner.copy())
    }

    fn astype(&self, dtype: &str) -> PyResult<Self> {
        Ok(Self::from_inner(self.inner.astype(parse_dtype(dtype)?)))
    }

    fn reshape(&self, shape: Vec<usize>) -> PyResult<Self> {
        Ok(Self::from_inner(self.inner.reshape(&shape)?))
    }

    #[pyo3(signature = (axes=None))]
    fn transpose(&self, axes: Option<Vec<usize>>) -> PyResult<Self> {
        let view = match axes {
            Some(axes) => self.inner.transpose(&axes)?,
            None => self.inner.t(),
        };
        Ok(Self::from_inner(view))
    }

    #[getter(T)]
    fn transposed(&self) -> Self {
        Self::from_inner(self.inner.t())
    }

    fn to_numpy(&self, py: Python<'_>) -> PyResult<PyObject> {
        let shape = self.inner.shape().to_vec();
        let array = match self.inner.to_storage() {
            Storage::Bool(data) => PyArray1::from_vec_bound(py, data).reshape(shape)?.into_any(),
            Storage::Int64(data) => PyArray1::from_vec_bound(py, data).reshape(shape)?.into_any(),
            Storage::Float64(data) => {
                PyArray1::from_vec_bound(py, data).reshape(shape)?.into_any()
            }
            Storage::Complex128(data) => {
                PyArray1::from_vec_bound(py, data).reshape(shape)?.into_any()
            }
        };
        Ok(array.unbind())
    }
}

fn parse_dtype(name: &str) -> PyResult<DType> {
    match name {
        "bool" => Ok(DType::Bool),
        "int" | "int64" => Ok(DType::Int64),
        "float" | "float64" => Ok(DType::Float64),
        "complex" | "complex128" => Ok(DType::Complex128),
        other => Err(PyTypeError::new_err(format!("data type '{other}' not understood"))),
    }
}

fn scalar_to_py(py: Python<'_>, value: Scalar) -> PyObject {
    match value {
        Scalar::Bool(v) => v.into_py(py),
        Scalar::Int(v) => v.into_py(py),
        Scalar::Float(v) => v.into_py(py),
        Scalar::Complex(v) => PyComplex::from_doubles_bound(py, v.re, v.im)
            .into_any()
            .unbind(),
    }
}

/// 0-d results come back as Python scalars, like NumPy reductions.
fn wrap(py: Python<'_>, array: NdArray) -> PyResult<PyObject> {
    if array.ndim() == 0 {
        return Ok(scalar_to_py(py, array.item()?));
    }
    Ok(Py::new(py, PyNdArray::from_inner(array))?.into_py(py))
}

fn extract_scalar(obj: &Bound<'_, PyAny>) -> Option<Scalar> {
    if let Ok(value) = obj.downcast::<PyBool>() {
        return Some(Scalar::Bool(value.is_true()));
    }
    if obj.is_instance_of::<PyLong>() {
        return obj.extract::<i64>().ok().map(Scalar::Int);
    }
    if obj.is_instance_of::<PyFloat>() {
        return obj.extract::<f64>().ok().map(Scalar::Float);
    }
    if let Ok(value) = obj.downcast::<PyComplex>() {
        return Some(Scalar::Complex(Complex64::new(value.real(), value.imag())));
    }
    None
}

fn parse_nested(obj: &Bound<'_, PyAny>, values: &mut Vec<Scalar>) -> PyResult<Vec<usize>> {
    if let Some(value) = extract_scalar(obj) {
        values.push(value);
        return Ok(Vec::new());
    }
    let seq = obj
        .downcast::<PySequence>()
        .map_err(|_| PyTypeError::new_err("expected a number or a nested sequence of numbers"))?;
    let items: Vec<Bound<'_, PyAny>> = seq.iter()?.collect::<PyResult<Vec<_>>>()?;
    let mut inner: Option<Vec<usize>> = None;
    for item in &items {
        let shape = parse_nested(item, values)?;
        match &inner {
            Some(expected) if *expected != shape => {
                return Err(PyValueError::new_err(
                    "setting an array element with a sequence. The requested array has an \
                     inhomogeneous shape",
                ));
            }
            Some(_) => {}
            None => inner = Some(shape),
        }
    }
    let mut shape = vec![items.len()];
    shape.extend(inner.unwrap_or_default());
    Ok(shape)
}

fn from_numpy_array(obj: &Bound<'_, PyAny>) -> Option<NdArray> {
    fn convert<T: crate::dtype::Element + numpy::Element>(
        array: PyReadonlyArrayDyn<'_, T>,
    ) -> Option<NdArray> {
        let shape = array.shape().to_vec();
        let data: Vec<T> = array.as_array().iter().copied().collect();
        NdArray::from_vec(data, &shape).ok()
    }
    if let Ok(array) = obj.extract::<PyReadonlyArrayDyn<'_, f64>>() {
        return convert(array);
    }
    if let Ok(array) = obj.extract::<PyReadonlyArrayDyn<'_, i64>>() {
        return convert(array);
    }
    if let Ok(array) = obj.extract::<PyReadonlyArrayDyn<'_, bool>>() {
        return convert(array);
    }
    if let Ok(array) = obj.extract::<PyReadonlyArrayDyn<'_, Complex64>>() {
        return convert(array);
    }
    None
}

fn to_array(obj: &Bound<'_, PyAny>) -> PyResult<NdArray> {
    if let Ok(array) = obj.downcast::<PyNdArray>() {
        return Ok(array.borrow().inner.view());
    }
    if let Some(array) = from_numpy_array(obj) {
        return Ok(array);
    }
    let mut values = Vec::new();
    let shape = parse_nested(obj, &mut values)?;
    let dtype = values
        .iter()
        .map(Scalar::dtype)
        .max()
        .unwrap_or(DType::Float64);
    Ok(NdArray::from_storage(
        Storage::from_scalars(dtype, values),
        &shape,
    ))
}

fn parse_shape(obj: &Bound<'_, PyAny>) -> PyResult<Vec<usize>> {
    if let Ok(value) = obj.extract::<usize>() {
        return Ok(vec![value]);
    }
    obj.extract::<Vec<usize>>()
        .map_err(|_| PyTypeError::new_err("shape must be an int or a sequence of ints"))
}

fn parse_axis(axis: Option<&Bound<'_, PyAny>>) -> PyResult<Axis> {
    let Some(axis) = axis else {
        return Ok(Axis::All);
    };
    if axis.is_none() {
        return Ok(Axis::All);
    }
    if let Ok(index) = axis.extract::<isize>() {
        return Ok(Axis::Index(index));
    }
    axis.extract::<Vec<isize>>()
        .map(Axis::Many)
        .map_err(|_| PyTypeError::new_err("axis must be None, an int or a tuple of ints"))
}

fn parse_ord(ord: Option<&Bound<'_, PyAny>>) -> PyResult<Option<NormOrder>> {
    let Some(ord) = ord else {
        return Ok(None);
    };
    if ord.is_none() {
        return Ok(None);
    }
    if let Ok(name) = ord.downcast::<PyString>() {
        return Ok(Some(NormOrder::Named(name.to_str()?.to_string())));
    }
    if ord.is_instance_of::<PyLong>() {
        return Ok(Some(NormOrder::Int(ord.extract::<i64>()?)));
    }
    if let Ok(value) = ord.extract::<f64>() {
        return Ok(Some(NormOrder::from(value)));
    }
    Err(PyValueError::new_err("Invalid 'ord' argument passed to norm"))
}

#[pyfunction]
fn array(obj: &Bound<'_, PyAny>) -> PyResult<PyNdArray> {
    Ok(PyNdArray::from_inner(to_array(obj)?.copy()))
}

#[pyfunction]
fn from_numpy(obj: &Bound<'_, PyAny>) -> PyResult<PyNdArray> {
    from_numpy_array(obj)
        .map(PyNdArray::from_inner)
        .ok_or_else(|| {
            PyTypeError::new_err("expected a bool, int64, float64 or complex128 numpy array")
        })
}

#[pyfunction]
#[pyo3(signature = (shape, dtype="float64"))]
fn zeros(shape: &Bound<'_, PyAny>, dtype: &str) -> PyResult<PyNdArray> {
    Ok(PyNdArray::from_inner(NdArray::zeros(
        &parse_shape(shape)?,
        parse_dtype(dtype)?,
    )))
}

#[pyfunction]
fn full(shape: &Bound<'_, PyAny>, value: &Bound<'_, PyAny>) -> PyResult<PyNdArray> {
    let value = extract_scalar(value)
        .ok_or_else(|| PyTypeError::new_err("fill value must be a number"))?;
    Ok(PyNdArray::from_inner(NdArray::full(&parse_shape(shape)?, value)))
}

#[pyfunction]
#[pyo3(signature = (start, stop=None))]
fn arange(start: i64, stop: Option<i64>) -> PyNdArray {
    let array = match stop {
        Some(stop) => NdArray::arange(start, stop),
        None => NdArray::arange(0, start),
    };
    PyNdArray::from_inner(array)
}

#[pyfunction]
#[pyo3(name = "sum", signature = (a, axis=None, keepdims=false))]
fn py_sum(
    py: Python<'_>,
    a: &Bound<'_, PyAny>,
    axis: Option<&Bound<'_, PyAny>>,
    keepdims: bool,
) -> PyResult<PyObject> {
    let result = reduce::sum(&to_array(a)?, parse_axis(axis)?, keepdims)?;
    wrap(py, result)
}

#[pyfunction]
#[pyo3(name = "prod", signature = (a, axis=None, keepdims=false))]
fn py_prod(
    py: Python<'_>,
    a: &Bound<'_, PyAny>,
    axis: Option<&Bound<'_, PyAny>>,
    keepdims: bool,
) -> PyResult<PyObject> {
    let result = reduce::prod(&to_array(a)?, parse_axis(axis)?, keepdims)?;
    wrap(py, result)
}

#[pyfunction]
#[pyo3(signature = (x, ord=None, axis=None, keepdims=false))]
fn norm(
    py: Python<'_>,
    x: &Bound<'_, PyAny>,
    ord: Option<&Bound<'_, PyAny>>,
    axis: Option<&Bound<'_, PyAny>>,
    keepdims: bool,
) -> PyResult<PyObject> {
    let result = linalg::norm(&to_array(x)?, parse_ord(ord)?, &parse_axis(axis)?, keepdims)?;
    wrap(py, result)
}

#[pyfunction]
fn cholesky(a: &Bound<'_, PyAny>) -> PyResult<PyNdArray> {
    Ok(PyNdArray::from_inner(linalg::cholesky(to_array(a)?)?))
}

#[pyfunction]
fn max_dim() -> usize {
    config::max_dim()
}

#[pymodule]
fn _shardnum(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyNdArray>()?;

    m.add_wrapped(pyo3::wrap_pyfunction!(array))?;
    m.add_wrapped(pyo3::wrap_pyfunction!(from_numpy))?;
    m.add_wrapped(pyo3::wrap_pyfunction!(zeros))?;
    m.add_wrapped(pyo3::wrap_pyfunction!(full))?;
    m.add_wrapped(pyo3::wrap_pyfunction!(arange))?;
    m.add_wrapped(pyo3::wrap_pyfunction!(py_sum))?;
    m.add_wrapped(pyo3::wrap_pyfunction!(py_prod))?;
    m.add_wrapped(pyo3::wrap_pyfunction!(norm))?;
    m.add_wrapped(pyo3::wrap_pyfunction!(cholesky))?;
    m.add_wrapped(pyo3::wrap_pyfunction!(max_dim))?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add("__doc__", "NumPy-compatible array core: reductions, norms and Cholesky.")?;

    Ok(())
}

/// Populates `module` with the extension's contents; used by the embedded
/// interpreter tests.
pub fn init_test_module(py: Python<'_>, module: &Bound<'_, PyModule>) -> PyResult<()> {
    _shardnum(py, module)
}
