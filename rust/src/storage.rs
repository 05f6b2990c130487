use num_complex::Complex64;

use crate::dtype::{DType, Element, Scalar};

/// Flat, homogeneously typed element buffer shared by an array and its views.
#[derive(Debug, Clone, PartialEq)]
pub enum Storage {
    Bool(Vec<bool>),
    Int64(Vec<i64>),
    Float64(Vec<f64>),
    Complex128(Vec<Complex64>),
}

macro_rules! with_storage {
    ($storage:expr, $data:ident => $body:expr) => {
        match $storage {
            Storage::Bool($data) => $body,
            Storage::Int64($data) => $body,
            Storage::Float64($data) => $body,
            Storage::Complex128($data) => $body,
        }
    };
}

impl Storage {
    pub fn filled(dtype: DType, len: usize, value: Scalar) -> Self {
        match dtype {
            DType::Bool => Storage::Bool(vec![bool::from_scalar(value); len]),
            DType::Int64 => Storage::Int64(vec![i64::from_scalar(value); len]),
            DType::Float64 => Storage::Float64(vec![f64::from_scalar(value); len]),
            DType::Complex128 => Storage::Complex128(vec![Complex64::from_scalar(value); len]),
        }
    }

    pub fn from_scalars<I>(dtype: DType, values: I) -> Self
    where
        I: IntoIterator<Item = Scalar>,
    {
        let values = values.into_iter();
        match dtype {
            DType::Bool => Storage::Bool(values.map(bool::from_scalar).collect()),
            DType::Int64 => Storage::Int64(values.map(i64::from_scalar).collect()),
            DType::Float64 => Storage::Float64(values.map(f64::from_scalar).collect()),
            DType::Complex128 => {
                Storage::Complex128(values.map(Complex64::from_scalar).collect())
            }
        }
    }

    pub fn dtype(&self) -> DType {
        match self {
            Storage::Bool(_) => DType::Bool,
            Storage::Int64(_) => DType::Int64,
            Storage::Float64(_) => DType::Float64,
            Storage::Complex128(_) => DType::Complex128,
        }
    }

    pub fn len(&self) -> usize {
        with_storage!(self, data => data.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Scalar {
        with_storage!(self, data => data[index].into_scalar())
    }

    /// Writes `value` at `index`, casting it to the buffer's dtype.
    pub fn set(&mut self, index: usize, value: Scalar) {
        match self {
            Storage::Bool(data) => data[index] = bool::from_scalar(value),
            Storage::Int64(data) => data[index] = i64::from_scalar(value),
            Storage::Float64(data) => data[index] = f64::from_scalar(value),
            Storage::Complex128(data) => data[index] = Complex64::from_scalar(value),
        }
    }

    /// Copies the elements at `offsets`, in order, into a new buffer of the same dtype.
    pub fn gather<I>(&self, offsets: I) -> Storage
    where
        I: IntoIterator<Item = usize>,
    {
        let offsets = offsets.into_iter();
        match self {
            Storage::Bool(data) => Storage::Bool(offsets.map(|i| data[i]).collect()),
            Storage::Int64(data) => Storage::Int64(offsets.map(|i| data[i]).collect()),
            Storage::Float64(data) => Storage::Float64(offsets.map(|i| data[i]).collect()),
            Storage::Complex128(data) => {
                Storage::Complex128(offsets.map(|i| data[i]).collect())
            }
        }
    }

    /// Writes `source` element `k` (cast to this dtype) at the `k`-th of `offsets`.
    pub fn scatter<I>(&mut self, offsets: I, source: &Storage)
    where
        I: IntoIterator<Item = usize>,
    {
        match (&mut *self, source) {
            (Storage::Bool(dst), Storage::Bool(src)) => scatter_same(dst, offsets, src),
            (Storage::Int64(dst), Storage::Int64(src)) => scatter_same(dst, offsets, src),
            (Storage::Float64(dst), Storage::Float64(src)) => scatter_same(dst, offsets, src),
            (Storage::Complex128(dst), Storage::Complex128(src)) => {
                scatter_same(dst, offsets, src)
            }
            (dst, src) => {
                for (k, offset) in offsets.into_iter().enumerate() {
                    dst.set(offset, src.get(k));
                }
            }
        }
    }

    pub fn astype(&self, dtype: DType) -> Storage {
        if dtype == self.dtype() {
            return self.clone();
        }
        Storage::from_scalars(dtype, self.iter())
    }

    pub fn iter(&self) -> impl Iterator<Item = Scalar> + '_ {
        (0..self.len()).map(move |index| self.get(index))
    }

    /// Typed copy of the buffer, casting element-wise when the dtype differs.
    pub fn to_vec<T: Element>(&self) -> Vec<T> {
        match T::slice(self) {
            Some(data) => data.to_vec(),
            None => self.iter().map(T::from_scalar).collect(),
        }
    }
}

fn scatter_same<T: Copy, I>(dst: &mut [T], offsets: I, src: &[T])
where
    I: IntoIterator<Item = usize>,
{
    for (offset, &value) in offsets.into_iter().zip(src.iter()) {
        dst[offset] = value;
    }
}
