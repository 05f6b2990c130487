//! Pluggable matrix decompositions.
//!
//! The Cholesky entry point validates its input and then hands a single
//! square matrix to the process-wide [`DecompositionProvider`]. The default is
//! [`NativeDecomposition`]; another provider can be installed once, before the
//! first decomposition runs.

use std::sync::OnceLock;

use log::debug;

use crate::array::NdArray;
use crate::dtype::DType;
use crate::error::{ArrayError, Result};

pub trait DecompositionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Lower-triangular factor `L` of a square matrix `a` with `a = L L^H`.
    /// `a` is always 2-d and square.
    fn cholesky(&self, a: &NdArray) -> Result<NdArray>;
}

/// Cholesky–Banachiewicz over float64.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeDecomposition;

impl DecompositionProvider for NativeDecomposition {
    fn name(&self) -> &'static str {
        "native"
    }

    fn cholesky(&self, a: &NdArray) -> Result<NdArray> {
        if a.dtype().is_complex() {
            return Err(ArrayError::not_implemented(
                "complex Cholesky decomposition is not supported by the native provider",
            ));
        }
        let n = a.shape()[0];
        let data = a.to_vec::<f64>();
        let mut l = vec![0.0f64; n * n];

        for i in 0..n {
            for j in 0..=i {
                let sum: f64 = (0..j).map(|k| l[i * n + k] * l[j * n + k]).sum();
                if i == j {
                    let diag = data[j * n + j] - sum;
                    if diag.is_nan() || diag <= 0.0 {
                        return Err(ArrayError::Numerical(
                            "Matrix is not positive definite".to_string(),
                        ));
                    }
                    l[j * n + j] = diag.sqrt();
                } else {
                    l[i * n + j] = (data[i * n + j] - sum) / l[j * n + j];
                }
            }
        }

        NdArray::from_vec(l, &[n, n])
    }
}

static PROVIDER: OnceLock<Box<dyn DecompositionProvider>> = OnceLock::new();

pub fn current_provider() -> &'static dyn DecompositionProvider {
    PROVIDER
        .get_or_init(|| {
            debug!("using native decomposition provider");
            Box::new(NativeDecomposition)
        })
        .as_ref()
}

/// Installs `provider` as the process-wide provider. Fails if one was
/// already installed or the default has already been used.
pub fn install_provider(provider: Box<dyn DecompositionProvider>) -> Result<()> {
    let name = provider.name();
    PROVIDER.set(provider).map_err(|_| {
        ArrayError::invalid(format!(
            "cannot install decomposition provider '{name}': '{}' is already active",
            current_provider().name()
        ))
    })?;
    debug!("installed decomposition provider '{name}'");
    Ok(())
}

/// Element dtype a provider receives: integral input is promoted to float64.
pub(crate) fn working_dtype(dtype: DType) -> DType {
    dtype.inexact()
}
