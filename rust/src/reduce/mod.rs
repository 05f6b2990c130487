//! Axis reductions with NumPy result shapes and dtypes.
//!
//! The input is transposed so the kept axes come first and the reduced axes
//! last, then copied contiguous: every output element becomes one contiguous
//! lane that [`lanes::reduce_lanes`] folds.

mod lanes;

use log::trace;

use crate::array::NdArray;
use crate::dtype::{DType, Scalar};
use crate::error::{ArrayError, Result};
use crate::metrics::{self, ReductionPath};
use crate::shape::{normalize_axis, size_of};
use crate::storage::Storage;
use crate::ufunc;

/// Which axes a reduction collapses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Axis {
    /// `axis=None`
    #[default]
    All,
    Index(isize),
    Many(Vec<isize>),
}

impl Axis {
    /// Normalized axes in ascending order.
    pub fn resolve(&self, ndim: usize) -> Result<Vec<usize>> {
        match self {
            Axis::All => Ok((0..ndim).collect()),
            Axis::Index(axis) => Ok(vec![normalize_axis(*axis, ndim)?]),
            Axis::Many(axes) => {
                let mut resolved = Vec::with_capacity(axes.len());
                for &axis in axes {
                    let axis = normalize_axis(axis, ndim)?;
                    if resolved.contains(&axis) {
                        return Err(ArrayError::DuplicateAxis(axis));
                    }
                    resolved.push(axis);
                }
                resolved.sort_unstable();
                Ok(resolved)
            }
        }
    }
}

impl From<isize> for Axis {
    fn from(axis: isize) -> Self {
        Axis::Index(axis)
    }
}

impl From<i32> for Axis {
    fn from(axis: i32) -> Self {
        Axis::Index(axis as isize)
    }
}

impl From<usize> for Axis {
    fn from(axis: usize) -> Self {
        Axis::Index(axis as isize)
    }
}

impl From<Option<isize>> for Axis {
    fn from(axis: Option<isize>) -> Self {
        axis.map_or(Axis::All, Axis::Index)
    }
}

impl From<Vec<isize>> for Axis {
    fn from(axes: Vec<isize>) -> Self {
        Axis::Many(axes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReduceOp {
    Add,
    Multiply,
    Maximum,
    Minimum,
    LogicalOr,
    LogicalAnd,
    LogicalXor,
}

impl ReduceOp {
    pub const fn name(self) -> &'static str {
        match self {
            ReduceOp::Add => "add",
            ReduceOp::Multiply => "multiply",
            ReduceOp::Maximum => "maximum",
            ReduceOp::Minimum => "minimum",
            ReduceOp::LogicalOr => "logical_or",
            ReduceOp::LogicalAnd => "logical_and",
            ReduceOp::LogicalXor => "logical_xor",
        }
    }

    /// Dtype the lanes are accumulated in, which is also the result dtype.
    pub fn result_dtype(self, input: DType) -> DType {
        match self {
            ReduceOp::Add | ReduceOp::Multiply if input == DType::Bool => DType::Int64,
            ReduceOp::LogicalOr | ReduceOp::LogicalAnd | ReduceOp::LogicalXor => DType::Bool,
            _ => input,
        }
    }

    /// Value of a reduction over zero elements; `None` for max/min.
    pub fn identity(self, dtype: DType) -> Option<Scalar> {
        match self {
            ReduceOp::Add => Some(dtype.zero()),
            ReduceOp::Multiply => Some(dtype.one()),
            ReduceOp::LogicalOr | ReduceOp::LogicalXor => Some(Scalar::Bool(false)),
            ReduceOp::LogicalAnd => Some(Scalar::Bool(true)),
            ReduceOp::Maximum | ReduceOp::Minimum => None,
        }
    }
}

/// `op.reduce(array, axis=axis, keepdims=keepdims)`.
///
/// A full reduction without `keepdims` yields a 0-d array; use
/// [`NdArray::item`] for the scalar.
pub fn reduce(op: ReduceOp, array: &NdArray, axis: &Axis, keepdims: bool) -> Result<NdArray> {
    let ndim = array.ndim();
    let shape = array.shape();
    let axes = axis.resolve(ndim)?;
    let kept: Vec<usize> = (0..ndim).filter(|a| !axes.contains(a)).collect();

    let lane_len = size_of(&axes.iter().map(|&a| shape[a]).collect::<Vec<_>>());
    let lanes = size_of(&kept.iter().map(|&a| shape[a]).collect::<Vec<_>>());
    let result_shape: Vec<usize> = if keepdims {
        (0..ndim)
            .map(|a| if axes.contains(&a) { 1 } else { shape[a] })
            .collect()
    } else {
        kept.iter().map(|&a| shape[a]).collect()
    };
    let dtype = op.result_dtype(array.dtype());

    if lanes == 0 || lane_len == 0 {
        let fill = match op.identity(dtype) {
            Some(identity) => identity,
            None if lanes == 0 => dtype.zero(),
            None => {
                return Err(ArrayError::shape(format!(
                    "zero-size array to reduction operation {} which has no identity",
                    op.name()
                )))
            }
        };
        metrics::record_reduction(op.name(), dtype, ReductionPath::Empty);
        return Ok(NdArray::full_dtype(&result_shape, fill, dtype));
    }

    let order: Vec<usize> = kept.iter().chain(axes.iter()).copied().collect();
    let values = array.transpose(&order)?.to_storage().astype(dtype);
    let (storage, path) = match values {
        Storage::Bool(data) => {
            let (out, path) = lanes::reduce_lanes(op, &data, lane_len);
            (Storage::Bool(out), path)
        }
        Storage::Int64(data) => {
            let (out, path) = lanes::reduce_lanes(op, &data, lane_len);
            (Storage::Int64(out), path)
        }
        Storage::Float64(data) => {
            let (out, path) = lanes::reduce_lanes(op, &data, lane_len);
            (Storage::Float64(out), path)
        }
        Storage::Complex128(data) => {
            let (out, path) = lanes::reduce_lanes(op, &data, lane_len);
            (Storage::Complex128(out), path)
        }
    };
    trace!(
        "{} over {:?} axes {:?}: {} lanes of {} ({})",
        op.name(),
        shape,
        axes,
        lanes,
        lane_len,
        path
    );
    metrics::record_reduction(op.name(), dtype, path);
    Ok(NdArray::from_storage(storage, &result_shape))
}

pub fn sum(array: &NdArray, axis: impl Into<Axis>, keepdims: bool) -> Result<NdArray> {
    reduce(ReduceOp::Add, array, &axis.into(), keepdims)
}

pub fn prod(array: &NdArray, axis: impl Into<Axis>, keepdims: bool) -> Result<NdArray> {
    reduce(ReduceOp::Multiply, array, &axis.into(), keepdims)
}

pub fn max(array: &NdArray, axis: impl Into<Axis>, keepdims: bool) -> Result<NdArray> {
    reduce(ReduceOp::Maximum, array, &axis.into(), keepdims)
}

pub fn min(array: &NdArray, axis: impl Into<Axis>, keepdims: bool) -> Result<NdArray> {
    reduce(ReduceOp::Minimum, array, &axis.into(), keepdims)
}

pub fn any(array: &NdArray, axis: impl Into<Axis>, keepdims: bool) -> Result<NdArray> {
    reduce(ReduceOp::LogicalOr, array, &axis.into(), keepdims)
}

pub fn all(array: &NdArray, axis: impl Into<Axis>, keepdims: bool) -> Result<NdArray> {
    reduce(ReduceOp::LogicalAnd, array, &axis.into(), keepdims)
}

/// Arithmetic mean in float64 (complex128 for complex input). An empty
/// reduction yields NaN.
pub fn mean(array: &NdArray, axis: impl Into<Axis>, keepdims: bool) -> Result<NdArray> {
    let axis = axis.into();
    let count = size_of(
        &axis
            .resolve(array.ndim())?
            .iter()
            .map(|&a| array.shape()[a])
            .collect::<Vec<_>>(),
    );
    let inexact = array.astype(array.dtype().inexact());
    let total = reduce(ReduceOp::Add, &inexact, &axis, keepdims)?;
    ufunc::divide(&total, &NdArray::from(count as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube() -> NdArray {
        let data: Vec<i64> = (0..24).collect();
        NdArray::from_vec(data, &[2, 3, 4]).unwrap()
    }

    #[test]
    fn axis_resolution_normalizes_and_sorts() {
        assert_eq!(Axis::All.resolve(3).unwrap(), vec![0, 1, 2]);
        assert_eq!(Axis::Index(-1).resolve(3).unwrap(), vec![2]);
        assert_eq!(Axis::Many(vec![2, -3]).resolve(3).unwrap(), vec![0, 2]);
        assert_eq!(
            Axis::Many(vec![1, -2]).resolve(3).unwrap_err(),
            ArrayError::DuplicateAxis(1)
        );
        assert!(Axis::Index(3).resolve(3).is_err());
        assert_eq!(Axis::from(None), Axis::All);
    }

    #[test]
    fn full_reduction_is_zero_dimensional() {
        let total = sum(&cube(), Axis::All, false).unwrap();
        assert_eq!(total.ndim(), 0);
        assert_eq!(total.item().unwrap(), Scalar::Int(276));

        let kept = sum(&cube(), Axis::All, true).unwrap();
        assert_eq!(kept.shape(), &[1, 1, 1]);
    }

    #[test]
    fn single_axis_reductions() {
        let array = cube();
        let rows = sum(&array, 1, false).unwrap();
        assert_eq!(rows.shape(), &[2, 4]);
        assert_eq!(rows.to_vec::<i64>(), vec![12, 15, 18, 21, 48, 51, 54, 57]);

        let last = max(&array, -1, true).unwrap();
        assert_eq!(last.shape(), &[2, 3, 1]);
        assert_eq!(last.to_vec::<i64>(), vec![3, 7, 11, 15, 19, 23]);
    }

    #[test]
    fn boolean_sums_count() {
        let flags = NdArray::from(vec![true, false, true, true]);
        let count = sum(&flags, Axis::All, false).unwrap();
        assert_eq!(count.dtype(), DType::Int64);
        assert_eq!(count.item().unwrap(), Scalar::Int(3));
        assert_eq!(any(&flags, Axis::All, false).unwrap().item().unwrap(), Scalar::Bool(true));
        assert_eq!(all(&flags, Axis::All, false).unwrap().item().unwrap(), Scalar::Bool(false));
    }

    #[test]
    fn empty_inputs_use_the_identity() {
        let empty = NdArray::zeros(&[2, 0], DType::Float64);
        assert_eq!(sum(&empty, 0, false).unwrap().shape(), &[0]);
        assert_eq!(sum(&empty, 1, false).unwrap().to_vec::<f64>(), vec![0.0, 0.0]);
        assert_eq!(prod(&empty, 1, false).unwrap().to_vec::<f64>(), vec![1.0, 1.0]);
        assert_eq!(
            all(&empty, Axis::All, false).unwrap().item().unwrap(),
            Scalar::Bool(true)
        );
        let err = max(&empty, Axis::All, false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "zero-size array to reduction operation maximum which has no identity"
        );
        assert!(max(&empty, 0, false).unwrap().size() == 0);
    }

    #[test]
    fn integer_sums_wrap() {
        let array = NdArray::from(vec![i64::MAX, 1]);
        assert_eq!(
            sum(&array, Axis::All, false).unwrap().item().unwrap(),
            Scalar::Int(i64::MIN)
        );
    }

    #[test]
    fn strided_views_reduce_correctly() {
        let array = cube();
        let transposed = array.transpose(&[2, 0, 1]).unwrap();
        let expected = sum(&array, 2, false).unwrap();
        let actual = sum(&transposed, 0, false).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn mean_divides_by_the_reduced_count() {
        let array = NdArray::from_vec(vec![1i64, 2, 3, 4], &[2, 2]).unwrap();
        let means = mean(&array, 0, false).unwrap();
        assert_eq!(means.dtype(), DType::Float64);
        assert_eq!(means.to_vec::<f64>(), vec![2.0, 3.0]);
        let empty = NdArray::zeros(&[0], DType::Float64);
        let nan = mean(&empty, Axis::All, false).unwrap().item().unwrap();
        assert!(nan.to_f64().is_nan());
    }
}
