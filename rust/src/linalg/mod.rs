//! `numpy.linalg` entry points.

mod cholesky;
pub mod decomp;
mod norm;

pub use cholesky::{cholesky, cholesky_with};
pub use decomp::{current_provider, install_provider, DecompositionProvider, NativeDecomposition};
pub use norm::{norm, NormOrder};
