//! The N-dimensional array handle.
//!
//! An [`NdArray`] is a [`Layout`] over a shared, lock-guarded [`Storage`].
//! Views produced by [`NdArray::slice`], [`NdArray::transpose`],
//! [`NdArray::broadcast_to`] and [`NdArray::view`] clone the storage `Arc`, so
//! writes through a view land in the base buffer and the buffer outlives the
//! base as long as any view is alive.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use num_complex::Complex64;

use crate::dtype::{DType, Element, Scalar};
use crate::error::{ArrayError, Result};
use crate::layout::{Layout, SliceSpec};
use crate::shape::size_of;
use crate::storage::Storage;

pub struct NdArray {
    storage: Arc<RwLock<Storage>>,
    layout: Layout,
    dtype: DType,
    view: bool,
}

impl NdArray {
    pub(crate) fn from_storage(storage: Storage, shape: &[usize]) -> Self {
        debug_assert_eq!(storage.len(), size_of(shape));
        Self {
            dtype: storage.dtype(),
            storage: Arc::new(RwLock::new(storage)),
            layout: Layout::contiguous(shape),
            view: false,
        }
    }

    pub fn from_vec<T: Element>(data: Vec<T>, shape: &[usize]) -> Result<Self> {
        if data.len() != size_of(shape) {
            return Err(ArrayError::shape(format!(
                "cannot reshape array of size {} into shape {shape:?}",
                data.len()
            )));
        }
        Ok(Self::from_storage(T::wrap(data), shape))
    }

    /// 0-d array holding `value`.
    pub fn from_scalar(value: impl Into<Scalar>) -> Self {
        let value = value.into();
        Self::from_storage(Storage::filled(value.dtype(), 1, value), &[])
    }

    /// Array of `shape` filled with `value`, using the value's own dtype.
    pub fn full(shape: &[usize], value: impl Into<Scalar>) -> Self {
        let value = value.into();
        Self::full_dtype(shape, value, value.dtype())
    }

    pub fn full_dtype(shape: &[usize], value: impl Into<Scalar>, dtype: DType) -> Self {
        Self::from_storage(
            Storage::filled(dtype, size_of(shape), value.into()),
            shape,
        )
    }

    pub fn zeros(shape: &[usize], dtype: DType) -> Self {
        Self::full_dtype(shape, dtype.zero(), dtype)
    }

    pub fn ones(shape: &[usize], dtype: DType) -> Self {
        Self::full_dtype(shape, dtype.one(), dtype)
    }

    /// `[start, start + 1, ..., stop - 1]` as int64.
    pub fn arange(start: i64, stop: i64) -> Self {
        let data: Vec<i64> = (start..stop).collect();
        let len = data.len();
        Self::from_storage(Storage::Int64(data), &[len])
    }

    /// `n x n` float64 identity matrix.
    pub fn eye(n: usize) -> Self {
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            data[i * n + i] = 1.0;
        }
        Self::from_storage(Storage::Float64(data), &[n, n])
    }

    /// Joins `arrays` along an existing `axis`; the dtype is their common type.
    pub fn concatenate(arrays: &[&NdArray], axis: usize) -> Result<Self> {
        let first = arrays
            .first()
            .ok_or_else(|| ArrayError::invalid("need at least one array to concatenate"))?;
        let ndim = first.ndim();
        if axis >= ndim {
            return Err(ArrayError::AxisOutOfBounds {
                axis: axis as isize,
                ndim,
            });
        }
        let mut shape = first.shape().to_vec();
        shape[axis] = 0;
        let mut dtype = first.dtype();
        for array in arrays {
            let compatible = array.ndim() == ndim
                && array
                    .shape()
                    .iter()
                    .zip(first.shape())
                    .enumerate()
                    .all(|(i, (a, b))| i == axis || a == b);
            if !compatible {
                return Err(ArrayError::shape(format!(
                    "all the input array dimensions except for the concatenation axis must match exactly, \
                     got {:?} and {:?}",
                    first.shape(),
                    array.shape()
                )));
            }
            shape[axis] += array.shape()[axis];
            dtype = dtype.promote(array.dtype());
        }

        let result = Self::zeros(&shape, dtype);
        let mut start = 0isize;
        for array in arrays {
            let stop = start + array.shape()[axis] as isize;
            let mut specs = vec![SliceSpec::full(); axis + 1];
            specs[axis] = SliceSpec::range(start, stop);
            result.slice(&specs)?.assign(array)?;
            start = stop;
        }
        Ok(result)
    }

    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    pub fn ndim(&self) -> usize {
        self.layout.ndim()
    }

    pub fn size(&self) -> usize {
        self.layout.size()
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Element strides (not byte strides).
    pub fn strides(&self) -> &[isize] {
        self.layout.strides()
    }

    /// True for arrays produced by a view operation rather than owning a fresh buffer.
    pub fn is_view(&self) -> bool {
        self.view
    }

    pub fn is_contiguous(&self) -> bool {
        self.layout.is_contiguous()
    }

    pub fn shares_storage(&self, other: &NdArray) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }

    fn read(&self) -> RwLockReadGuard<'_, Storage> {
        self.storage.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Storage> {
        self.storage.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the elements in row-major logical order.
    pub fn to_storage(&self) -> Storage {
        self.read().gather(self.layout.offsets())
    }

    pub fn to_vec<T: Element>(&self) -> Vec<T> {
        self.to_storage().to_vec()
    }

    pub fn to_scalars(&self) -> Vec<Scalar> {
        self.to_storage().iter().collect()
    }

    pub fn get(&self, index: &[usize]) -> Result<Scalar> {
        if index.len() != self.ndim() {
            return Err(ArrayError::invalid(format!(
                "expected {} indices, got {}",
                self.ndim(),
                index.len()
            )));
        }
        let mut offset = self.layout.offset() as isize;
        for (axis, (&i, &dim)) in index.iter().zip(self.shape()).enumerate() {
            if i >= dim {
                return Err(ArrayError::invalid(format!(
                    "index {i} is out of bounds for axis {axis} with size {dim}"
                )));
            }
            offset += i as isize * self.layout.strides()[axis];
        }
        Ok(self.read().get(offset as usize))
    }

    /// The single element of a size-1 array, as a Python scalar conversion would.
    pub fn item(&self) -> Result<Scalar> {
        if self.size() != 1 {
            return Err(ArrayError::invalid(
                "can only convert an array of size 1 to a Python scalar",
            ));
        }
        let offset = self.layout.offsets().next().unwrap_or(0);
        Ok(self.read().get(offset))
    }

    fn with_layout(&self, layout: Layout) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            layout,
            dtype: self.dtype,
            view: true,
        }
    }

    pub fn view(&self) -> Self {
        self.with_layout(self.layout.clone())
    }

    /// Axis permutation as a view; `result.shape[i] == self.shape[axes[i]]`.
    pub fn transpose(&self, axes: &[usize]) -> Result<Self> {
        Ok(self.with_layout(self.layout.transpose(axes)?))
    }

    /// Reverses the axis order.
    pub fn t(&self) -> Self {
        let axes: Vec<usize> = (0..self.ndim()).rev().collect();
        let layout = self
            .layout
            .transpose(&axes)
            .unwrap_or_else(|_| self.layout.clone());
        self.with_layout(layout)
    }

    pub fn slice(&self, specs: &[SliceSpec]) -> Result<Self> {
        Ok(self.with_layout(self.layout.slice(specs)?))
    }

    pub fn broadcast_to(&self, shape: &[usize]) -> Result<Self> {
        Ok(self.with_layout(self.layout.broadcast_to(shape)?))
    }

    /// Reshape; returns a view when the data is contiguous, a copy otherwise.
    pub fn reshape(&self, shape: &[usize]) -> Result<Self> {
        if size_of(shape) != self.size() {
            return Err(ArrayError::shape(format!(
                "cannot reshape array of size {} into shape {shape:?}",
                self.size()
            )));
        }
        if self.is_contiguous() {
            return Ok(self.with_layout(self.layout.reshaped(shape)));
        }
        Ok(Self::from_storage(self.to_storage(), shape))
    }

    pub fn flatten(&self) -> Self {
        Self::from_storage(self.to_storage(), &[self.size()])
    }

    /// Deep copy into a fresh contiguous buffer.
    pub fn copy(&self) -> Self {
        Self::from_storage(self.to_storage(), self.shape())
    }

    pub fn astype(&self, dtype: DType) -> Self {
        Self::from_storage(self.to_storage().astype(dtype), self.shape())
    }

    /// `self[...] = source`: broadcasts `source` to this shape and casts it to
    /// this dtype. The source is read completely before anything is written,
    /// so overlapping views are safe.
    pub fn assign(&self, source: &NdArray) -> Result<()> {
        let source = if source.ndim() > self.ndim() {
            let extra = source.ndim() - self.ndim();
            if source.shape()[..extra].iter().any(|&dim| dim != 1) {
                return Err(ArrayError::Broadcast {
                    axis: 0,
                    left: source.shape().to_vec(),
                    right: self.shape().to_vec(),
                });
            }
            source.reshape(&source.shape()[extra..])?
        } else {
            source.view()
        };
        let values = source.broadcast_to(self.shape())?.to_storage();
        self.write_storage(&values);
        Ok(())
    }

    pub fn fill(&self, value: impl Into<Scalar>) {
        let values = Storage::filled(self.dtype, self.size(), value.into());
        self.write_storage(&values);
    }

    /// Writes `values` (row-major, same size as `self`) through this layout.
    pub(crate) fn write_storage(&self, values: &Storage) {
        debug_assert_eq!(values.len(), self.size());
        self.write().scatter(self.layout.offsets(), values);
    }

    /// Same shape and numerically equal elements (dtype-insensitive, NaN != NaN).
    pub fn array_equal(&self, other: &NdArray) -> bool {
        self.shape() == other.shape()
            && self
                .to_scalars()
                .iter()
                .zip(other.to_scalars().iter())
                .all(|(a, b)| a.equals(b))
    }

    /// `|a - b| <= atol + rtol * |b|` elementwise after broadcasting.
    pub fn allclose(&self, other: &NdArray, rtol: f64, atol: f64) -> bool {
        let Ok(shape) = crate::shape::broadcast_shapes(self.shape(), other.shape()) else {
            return false;
        };
        let (Ok(left), Ok(right)) = (self.broadcast_to(&shape), other.broadcast_to(&shape)) else {
            return false;
        };
        left.to_scalars()
            .iter()
            .zip(right.to_scalars().iter())
            .all(|(a, b)| {
                let (a, b) = (a.to_complex(), b.to_complex());
                if a == b {
                    return true;
                }
                (a - b).norm() <= atol + rtol * b.norm()
            })
    }
}

impl fmt::Debug for NdArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<String> = self.to_scalars().iter().map(ToString::to_string).collect();
        write!(
            f,
            "NdArray(shape={:?}, dtype={}, data=[{}])",
            self.shape(),
            self.dtype,
            values.join(", ")
        )
    }
}

impl PartialEq for NdArray {
    fn eq(&self, other: &Self) -> bool {
        self.array_equal(other)
    }
}

impl From<&NdArray> for NdArray {
    fn from(array: &NdArray) -> Self {
        array.view()
    }
}

macro_rules! impl_from_data {
    ($($t:ty),*) => {
        $(
            impl From<Vec<$t>> for NdArray {
                fn from(data: Vec<$t>) -> Self {
                    let len = data.len();
                    Self::from_storage(<$t as Element>::wrap(data), &[len])
                }
            }

            impl From<$t> for NdArray {
                fn from(value: $t) -> Self {
                    Self::from_scalar(value)
                }
            }
        )*
    };
}

impl_from_data!(bool, i64, f64, Complex64);
