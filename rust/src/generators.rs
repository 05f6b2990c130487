//! Deterministic array builders for exercising operations over many layouts.
//!
//! [`scalar_like`] covers every way a single value can be presented as an
//! array. [`broadcast_variants`] and [`permute_variants`] produce inputs that
//! only reach a target shape through broadcasting or through a transposed
//! view.

use crate::array::NdArray;
use crate::config;
use crate::dtype::{DType, Scalar};
use crate::error::Result;
use crate::layout::SliceSpec;
use crate::shape::{shapes_broadcasting_to, shapes_permuting_to, size_of};
use crate::ufunc;

/// Iterator returned by [`scalar_like`].
#[derive(Debug, Clone)]
pub struct ScalarLike {
    value: Scalar,
    max_dim: usize,
    step: usize,
}

/// Scalar-like arrays holding `value`, for every rank up to the runtime's
/// [`config::max_dim`].
pub fn scalar_like(value: impl Into<Scalar>) -> ScalarLike {
    scalar_like_up_to(value, config::max_dim())
}

/// Yields `2 + 2 * max_dim` arrays: a 0-d array built from the bare value, a
/// 0-d `full`, then for each rank `r` a `[1; r]` array and a `[1; r]`
/// singleton slice taken from the interior of a `[5; r]` array.
pub fn scalar_like_up_to(value: impl Into<Scalar>, max_dim: usize) -> ScalarLike {
    ScalarLike {
        value: value.into(),
        max_dim,
        step: 0,
    }
}

impl Iterator for ScalarLike {
    type Item = Result<NdArray>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.step >= 2 + 2 * self.max_dim {
            return None;
        }
        let step = self.step;
        self.step += 1;
        let item = match step {
            0 => Ok(NdArray::from_scalar(self.value)),
            1 => Ok(NdArray::full(&[], self.value)),
            _ => {
                let rank = (step - 2) / 2 + 1;
                if step % 2 == 0 {
                    Ok(NdArray::full(&vec![1; rank], self.value))
                } else {
                    NdArray::full(&vec![5; rank], self.value)
                        .slice(&vec![SliceSpec::range(1, 2); rank])
                }
            }
        };
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (2 + 2 * self.max_dim).saturating_sub(self.step);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ScalarLike {}

/// Int64 array of `shape` holding `1, 2, ..., size` in row-major order.
///
/// The values are assigned into a freshly allocated array rather than
/// returned as a reshaped range, so the result owns its storage.
pub fn sequential_array(shape: &[usize]) -> Result<NdArray> {
    let array = NdArray::zeros(shape, DType::Int64);
    let size = size_of(shape) as i64;
    array.assign(&NdArray::arange(1, size + 1).reshape(shape)?)?;
    Ok(array)
}

/// Float64 array of `shape` with evenly spaced values in `(0, 1]`.
/// A single-element array holds `0.5` so it is never zero.
pub fn fractional_array(shape: &[usize]) -> Result<NdArray> {
    let size = size_of(shape);
    if size == 1 {
        return Ok(NdArray::full(shape, 0.5));
    }
    ufunc::divide(&sequential_array(shape)?, &NdArray::from(size as f64))
}

/// Arrays built by `builder` for every shape that broadcasts to `target`
/// (other than `target` itself).
pub fn broadcast_variants<F>(
    target: &[usize],
    builder: F,
) -> impl ExactSizeIterator<Item = Result<NdArray>>
where
    F: Fn(&[usize]) -> Result<NdArray>,
{
    shapes_broadcasting_to(target).map(move |shape| builder(&shape))
}

/// Transposed views of shape `target`, each over a base array built by
/// `builder` with a permuted shape.
pub fn permute_variants<F>(
    target: &[usize],
    builder: F,
) -> impl ExactSizeIterator<Item = Result<NdArray>>
where
    F: Fn(&[usize]) -> Result<NdArray>,
{
    shapes_permuting_to(target).map(move |(source, axes)| builder(&source)?.transpose(&axes))
}
