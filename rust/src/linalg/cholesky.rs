use crate::array::NdArray;
use crate::error::{ArrayError, Result};
use crate::linalg::decomp::{self, DecompositionProvider};

/// Lower-triangular Cholesky factor of a square matrix, computed by the
/// process-wide decomposition provider.
pub fn cholesky(a: impl Into<NdArray>) -> Result<NdArray> {
    cholesky_with(decomp::current_provider(), a)
}

/// [`cholesky`] with an explicit provider.
pub fn cholesky_with(
    provider: &dyn DecompositionProvider,
    a: impl Into<NdArray>,
) -> Result<NdArray> {
    let a = a.into();
    let shape = a.shape();
    let ndim = shape.len();
    if ndim < 2 {
        return Err(ArrayError::shape(format!(
            "{ndim}-dimensional array given. Array must be at least two-dimensional"
        )));
    }
    if shape[ndim - 1] != shape[ndim - 2] {
        return Err(ArrayError::shape(
            "Last 2 dimensions of the array must be square",
        ));
    }
    if ndim > 2 {
        return Err(ArrayError::not_implemented(
            "needs to support stacked 2d arrays",
        ));
    }

    let working = decomp::working_dtype(a.dtype());
    let input = if working == a.dtype() {
        a
    } else {
        a.astype(working)
    };
    provider.cholesky(&input)
}
