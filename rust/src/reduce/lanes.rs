use num_complex::Complex64;
use rayon::prelude::*;

use crate::config;
use crate::dtype::Element;
use crate::metrics::ReductionPath;
use crate::reduce::ReduceOp;
use crate::ufunc::compare;

/// Lanes longer than this are folded block by block and the block results
/// merged in order. Block boundaries never depend on the thread count.
pub(crate) const BLOCK: usize = 1 << 14;

/// Once the running sum leaves the finite range the compensation term is
/// dropped, so an infinity stays an infinity instead of turning into NaN.
pub(crate) fn kahan_add(sum: &mut f64, comp: &mut f64, value: f64) {
    let y = value - *comp;
    let t = *sum + y;
    if !t.is_finite() {
        *sum = t;
        *comp = 0.0;
        return;
    }
    *comp = (t - *sum) - y;
    *sum = t;
}

/// Element types the lane kernels operate on. `fold` and `merge` are only
/// called with non-empty slices.
pub(crate) trait Reducible: Element {
    fn combine(op: ReduceOp, acc: Self, value: Self) -> Self;

    fn fold(op: ReduceOp, lane: &[Self]) -> Self {
        lane[1..]
            .iter()
            .fold(lane[0], |acc, &value| Self::combine(op, acc, value))
    }

    fn merge(op: ReduceOp, partials: &[Self]) -> Self {
        Self::fold(op, partials)
    }
}

impl Reducible for bool {
    fn combine(op: ReduceOp, acc: bool, value: bool) -> bool {
        match op {
            ReduceOp::Add | ReduceOp::LogicalOr | ReduceOp::Maximum => acc || value,
            ReduceOp::Multiply | ReduceOp::LogicalAnd | ReduceOp::Minimum => acc && value,
            ReduceOp::LogicalXor => acc != value,
        }
    }
}

impl Reducible for i64 {
    fn combine(op: ReduceOp, acc: i64, value: i64) -> i64 {
        match op {
            ReduceOp::Add => acc.wrapping_add(value),
            ReduceOp::Multiply => acc.wrapping_mul(value),
            ReduceOp::Maximum => acc.max(value),
            ReduceOp::Minimum => acc.min(value),
            ReduceOp::LogicalOr => i64::from(acc != 0 || value != 0),
            ReduceOp::LogicalAnd => i64::from(acc != 0 && value != 0),
            ReduceOp::LogicalXor => i64::from((acc != 0) != (value != 0)),
        }
    }
}

impl Reducible for f64 {
    fn combine(op: ReduceOp, acc: f64, value: f64) -> f64 {
        match op {
            ReduceOp::Add => acc + value,
            ReduceOp::Multiply => acc * value,
            ReduceOp::Maximum | ReduceOp::Minimum if acc.is_nan() => acc,
            ReduceOp::Maximum | ReduceOp::Minimum if value.is_nan() => value,
            ReduceOp::Maximum => acc.max(value),
            ReduceOp::Minimum => acc.min(value),
            ReduceOp::LogicalOr => f64::from(u8::from(acc != 0.0 || value != 0.0)),
            ReduceOp::LogicalAnd => f64::from(u8::from(acc != 0.0 && value != 0.0)),
            ReduceOp::LogicalXor => f64::from(u8::from((acc != 0.0) != (value != 0.0))),
        }
    }

    fn fold(op: ReduceOp, lane: &[f64]) -> f64 {
        if op != ReduceOp::Add {
            return lane[1..]
                .iter()
                .fold(lane[0], |acc, &value| Self::combine(op, acc, value));
        }
        let mut sum = lane[0];
        let mut comp = 0.0;
        for &value in &lane[1..] {
            kahan_add(&mut sum, &mut comp, value);
        }
        sum
    }
}

impl Reducible for Complex64 {
    fn combine(op: ReduceOp, acc: Complex64, value: Complex64) -> Complex64 {
        let has_nan = |z: Complex64| z.re.is_nan() || z.im.is_nan();
        match op {
            ReduceOp::Add => acc + value,
            ReduceOp::Multiply => acc * value,
            ReduceOp::Maximum | ReduceOp::Minimum if has_nan(acc) => acc,
            ReduceOp::Maximum | ReduceOp::Minimum if has_nan(value) => value,
            ReduceOp::Maximum | ReduceOp::Minimum => {
                let ordering = compare(acc.into_scalar(), value.into_scalar());
                let keep_acc = match op {
                    ReduceOp::Maximum => ordering != Some(std::cmp::Ordering::Less),
                    _ => ordering != Some(std::cmp::Ordering::Greater),
                };
                if keep_acc {
                    acc
                } else {
                    value
                }
            }
            ReduceOp::LogicalOr | ReduceOp::LogicalAnd | ReduceOp::LogicalXor => {
                let (a, b) = (acc != Complex64::default(), value != Complex64::default());
                let truth = match op {
                    ReduceOp::LogicalOr => a || b,
                    ReduceOp::LogicalAnd => a && b,
                    _ => a != b,
                };
                Complex64::new(f64::from(u8::from(truth)), 0.0)
            }
        }
    }

    fn fold(op: ReduceOp, lane: &[Complex64]) -> Complex64 {
        if op != ReduceOp::Add {
            return lane[1..]
                .iter()
                .fold(lane[0], |acc, &value| Self::combine(op, acc, value));
        }
        let (mut re, mut re_comp) = (lane[0].re, 0.0);
        let (mut im, mut im_comp) = (lane[0].im, 0.0);
        for value in &lane[1..] {
            kahan_add(&mut re, &mut re_comp, value.re);
            kahan_add(&mut im, &mut im_comp, value.im);
        }
        Complex64::new(re, im)
    }
}

fn fold_blocked<T: Reducible>(op: ReduceOp, lane: &[T]) -> T {
    if lane.len() <= BLOCK {
        return T::fold(op, lane);
    }
    let partials: Vec<T> = lane.chunks(BLOCK).map(|block| T::fold(op, block)).collect();
    T::merge(op, &partials)
}

/// Reduces `data`, laid out as consecutive lanes of `lane_len` elements,
/// to one value per lane. `lane_len` must be non-zero.
pub(crate) fn reduce_lanes<T: Reducible>(
    op: ReduceOp,
    data: &[T],
    lane_len: usize,
) -> (Vec<T>, ReductionPath) {
    let lanes = data.len() / lane_len;
    let pool = if data.len() >= config::runtime().parallel_min_elements {
        config::thread_pool()
    } else {
        None
    };

    match pool {
        Some(pool) if lanes > 1 => {
            let out = pool.install(|| {
                data.par_chunks(lane_len)
                    .map(|lane| fold_blocked(op, lane))
                    .collect()
            });
            (out, ReductionPath::Parallel)
        }
        Some(pool) => {
            let partials: Vec<T> = pool.install(|| {
                data.par_chunks(BLOCK)
                    .map(|block| T::fold(op, block))
                    .collect()
            });
            (vec![T::merge(op, &partials)], ReductionPath::Parallel)
        }
        None => {
            let out = data
                .chunks(lane_len)
                .map(|lane| fold_blocked(op, lane))
                .collect();
            (out, ReductionPath::Sequential)
        }
    }
}
