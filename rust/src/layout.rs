//! Strided views over a flat buffer.
//!
//! A [`Layout`] maps logical row-major positions onto buffer offsets. Slices,
//! transposes and broadcasts only rewrite shape/strides/offset, which is what
//! lets views share the buffer of their base array.

use crate::error::{ArrayError, Result};
use crate::shape::{row_major_strides, size_of};

/// One axis of a basic slice, `start:stop:step` with Python semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceSpec {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: isize,
}

impl SliceSpec {
    pub const fn new(start: Option<isize>, stop: Option<isize>, step: isize) -> Self {
        Self { start, stop, step }
    }

    /// `:`
    pub const fn full() -> Self {
        Self::new(None, None, 1)
    }

    /// `start:stop`
    pub const fn range(start: isize, stop: isize) -> Self {
        Self::new(Some(start), Some(stop), 1)
    }

    /// Resolves against an axis of `len` elements, like `slice.indices(len)`.
    /// Returns `(first index, step, element count)`.
    fn resolve(&self, len: usize) -> Result<(isize, isize, usize)> {
        let step = self.step;
        if step == 0 {
            return Err(ArrayError::invalid("slice step cannot be zero"));
        }
        let len = len as isize;
        let (lower, upper) = if step > 0 { (0, len) } else { (-1, len - 1) };
        let clamp = |bound: isize| {
            if bound < 0 {
                (bound + len).max(lower)
            } else {
                bound.min(upper)
            }
        };
        let start = self
            .start
            .map(clamp)
            .unwrap_or(if step > 0 { lower } else { upper });
        let stop = self
            .stop
            .map(clamp)
            .unwrap_or(if step > 0 { upper } else { lower });
        let count = if step > 0 && stop > start {
            (stop - start + step - 1) / step
        } else if step < 0 && start > stop {
            (start - stop - step - 1) / -step
        } else {
            0
        };
        Ok((start, step, count as usize))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    shape: Vec<usize>,
    strides: Vec<isize>,
    offset: usize,
}

impl Layout {
    pub fn contiguous(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
            strides: row_major_strides(shape)
                .into_iter()
                .map(|stride| stride as isize)
                .collect(),
            offset: 0,
        }
    }

    /// Row-major layout of `shape` starting at this layout's offset. Only
    /// meaningful when `self` is contiguous.
    pub(crate) fn reshaped(&self, shape: &[usize]) -> Self {
        Self {
            offset: self.offset,
            ..Self::contiguous(shape)
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn size(&self) -> usize {
        size_of(&self.shape)
    }

    /// True when logical order matches buffer order with no gaps.
    pub fn is_contiguous(&self) -> bool {
        if self.size() == 0 {
            return true;
        }
        let expected = row_major_strides(&self.shape);
        self.shape
            .iter()
            .zip(self.strides.iter().zip(expected.iter()))
            .all(|(&dim, (&stride, &want))| dim == 1 || stride == want as isize)
    }

    /// Buffer offsets of every element in row-major logical order.
    pub fn offsets(&self) -> Offsets {
        let remaining = self.size();
        Offsets {
            shape: self.shape.clone(),
            strides: self.strides.clone(),
            index: vec![0; self.shape.len()],
            next: self.offset as isize,
            remaining,
        }
    }

    pub fn transpose(&self, axes: &[usize]) -> Result<Layout> {
        let ndim = self.ndim();
        let mut seen = vec![false; ndim];
        let valid = axes.len() == ndim
            && axes.iter().all(|&axis| {
                axis < ndim && !std::mem::replace(&mut seen[axis], true)
            });
        if !valid {
            return Err(ArrayError::invalid(format!(
                "axes {axes:?} don't match array of dimension {ndim}"
            )));
        }
        Ok(Layout {
            shape: axes.iter().map(|&axis| self.shape[axis]).collect(),
            strides: axes.iter().map(|&axis| self.strides[axis]).collect(),
            offset: self.offset,
        })
    }

    /// Basic slicing; axes beyond `specs.len()` are taken whole.
    pub fn slice(&self, specs: &[SliceSpec]) -> Result<Layout> {
        if specs.len() > self.ndim() {
            return Err(ArrayError::invalid(format!(
                "too many indices for array: array is {}-dimensional, but {} were indexed",
                self.ndim(),
                specs.len()
            )));
        }
        let mut layout = self.clone();
        let mut offset = self.offset as isize;
        for (axis, spec) in specs.iter().enumerate() {
            let (start, step, count) = spec.resolve(self.shape[axis])?;
            if count > 0 {
                offset += start * self.strides[axis];
            }
            layout.shape[axis] = count;
            layout.strides[axis] = self.strides[axis] * step;
        }
        layout.offset = offset as usize;
        Ok(layout)
    }

    /// Stretches size-1 and missing leading axes to `shape` with zero strides.
    pub fn broadcast_to(&self, shape: &[usize]) -> Result<Layout> {
        if shape.len() < self.ndim() {
            return Err(ArrayError::shape(format!(
                "cannot broadcast array of shape {:?} to lower-dimensional shape {shape:?}",
                self.shape
            )));
        }
        let lead = shape.len() - self.ndim();
        let mut strides = vec![0isize; shape.len()];
        for (axis, &target) in shape.iter().enumerate().skip(lead) {
            let source = self.shape[axis - lead];
            strides[axis] = if source == target {
                self.strides[axis - lead]
            } else if source == 1 {
                0
            } else {
                return Err(ArrayError::Broadcast {
                    axis,
                    left: self.shape.clone(),
                    right: shape.to_vec(),
                });
            };
        }
        Ok(Layout {
            shape: shape.to_vec(),
            strides,
            offset: self.offset,
        })
    }
}

/// Iterator over the buffer offsets of a [`Layout`].
#[derive(Debug, Clone)]
pub struct Offsets {
    shape: Vec<usize>,
    strides: Vec<isize>,
    index: Vec<usize>,
    next: isize,
    remaining: usize,
}

impl Iterator for Offsets {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next as usize;
        self.remaining -= 1;
        if self.remaining > 0 {
            for axis in (0..self.shape.len()).rev() {
                self.index[axis] += 1;
                self.next += self.strides[axis];
                if self.index[axis] < self.shape[axis] {
                    break;
                }
                self.next -= self.strides[axis] * self.shape[axis] as isize;
                self.index[axis] = 0;
            }
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Offsets {}
