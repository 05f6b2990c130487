//! Shape arithmetic: broadcasting rules, strides, axis normalisation and the
//! shape enumerations used to build broadcast/transpose test inputs.

use crate::error::{ArrayError, Result};

pub fn size_of(shape: &[usize]) -> usize {
    shape.iter().product()
}

pub fn row_major_strides(shape: &[usize]) -> Vec<usize> {
    if shape.is_empty() {
        return Vec::new();
    }
    let mut strides = vec![0; shape.len()];
    let mut acc = 1usize;
    for i in (0..shape.len()).rev() {
        strides[i] = acc;
        acc = acc.saturating_mul(shape[i]);
    }
    strides
}

/// Maps a possibly negative axis onto `0..ndim`.
pub fn normalize_axis(axis: isize, ndim: usize) -> Result<usize> {
    let rank = ndim as isize;
    if axis < -rank || axis >= rank {
        return Err(ArrayError::AxisOutOfBounds { axis, ndim });
    }
    let axis = if axis < 0 { axis + rank } else { axis };
    Ok(axis as usize)
}

/// Combined shape of two operands under NumPy broadcasting.
///
/// Trailing dimensions are aligned; a missing leading dimension counts as 1.
/// The error names the offending axis of the result shape.
pub fn broadcast_shapes(left: &[usize], right: &[usize]) -> Result<Vec<usize>> {
    let ndim = left.len().max(right.len());
    let left_offset = ndim - left.len();
    let right_offset = ndim - right.len();
    let mut shape = vec![1; ndim];

    for i in 0..ndim {
        let l_dim = if i >= left_offset {
            left[i - left_offset]
        } else {
            1
        };
        let r_dim = if i >= right_offset {
            right[i - right_offset]
        } else {
            1
        };

        shape[i] = match (l_dim, r_dim) {
            (a, b) if a == b => a,
            (1, b) => b,
            (a, 1) => a,
            _ => {
                return Err(ArrayError::Broadcast {
                    axis: i,
                    left: left.to_vec(),
                    right: right.to_vec(),
                })
            }
        };
    }

    Ok(shape)
}

pub fn broadcast_all<S: AsRef<[usize]>>(shapes: &[S]) -> Result<Vec<usize>> {
    shapes
        .iter()
        .try_fold(Vec::new(), |acc, shape| broadcast_shapes(&acc, shape.as_ref()))
}

/// Every shape that broadcasts to `target` by replacing some of its axes
/// with 1, excluding `target` itself. See [`shapes_broadcasting_to`].
#[derive(Debug, Clone)]
pub struct BroadcastingShapes {
    target: Vec<usize>,
    next: u64,
    end: u64,
}

/// Enumerates the `2^R - 1` shapes obtained by keeping or collapsing each axis
/// of `target`.
///
/// Mask `m` collapses axis `i` when bit `R - 1 - i` is set, so the last axis
/// toggles fastest. Mask 0 is the target itself and is skipped; callers that
/// need the identity case add it explicitly.
pub fn shapes_broadcasting_to(target: &[usize]) -> BroadcastingShapes {
    debug_assert!(target.len() < 64, "rank too large to enumerate");
    BroadcastingShapes {
        target: target.to_vec(),
        next: 1,
        end: 1u64.checked_shl(target.len() as u32).unwrap_or(u64::MAX),
    }
}

impl Iterator for BroadcastingShapes {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let mask = self.next;
        self.next += 1;
        let rank = self.target.len();
        let shape = self
            .target
            .iter()
            .enumerate()
            .map(|(i, &dim)| {
                if (mask >> (rank - 1 - i)) & 1 == 1 {
                    1
                } else {
                    dim
                }
            })
            .collect();
        Some(shape)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end.saturating_sub(self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for BroadcastingShapes {}

/// `(source_shape, axes)` pairs such that transposing an array of
/// `source_shape` by `axes` yields `target`. See [`shapes_permuting_to`].
#[derive(Debug, Clone)]
pub struct PermutingShapes {
    target: Vec<usize>,
    axes: Vec<usize>,
    remaining: usize,
}

/// Enumerates all `R! - 1` non-identity axis permutations of `target` in
/// lexicographic order.
pub fn shapes_permuting_to(target: &[usize]) -> PermutingShapes {
    let total = (1..=target.len()).fold(1usize, |acc, n| acc.saturating_mul(n));
    PermutingShapes {
        target: target.to_vec(),
        axes: (0..target.len()).collect(),
        remaining: total - 1,
    }
}

impl Iterator for PermutingShapes {
    type Item = (Vec<usize>, Vec<usize>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 || !next_permutation(&mut self.axes) {
            self.remaining = 0;
            return None;
        }
        self.remaining -= 1;
        let mut source = vec![0; self.target.len()];
        for (i, &j) in self.axes.iter().enumerate() {
            source[j] = self.target[i];
        }
        Some((source, self.axes.clone()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for PermutingShapes {}

fn next_permutation(items: &mut [usize]) -> bool {
    if items.len() < 2 {
        return false;
    }
    let mut pivot = items.len() - 1;
    while pivot > 0 && items[pivot - 1] >= items[pivot] {
        pivot -= 1;
    }
    if pivot == 0 {
        return false;
    }
    let mut successor = items.len() - 1;
    while items[successor] <= items[pivot - 1] {
        successor -= 1;
    }
    items.swap(pivot - 1, successor);
    items[pivot..].reverse();
    true
}
