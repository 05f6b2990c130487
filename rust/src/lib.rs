//! NumPy-compatible N-dimensional array core.
//!
//! [`NdArray`] is a strided view over shared storage. On top of it sit NumPy
//! broadcasting ([`shape`]), elementwise kernels ([`ufunc`]), axis reductions
//! ([`reduce`]), vector norms and a Cholesky entry point ([`linalg`]), plus
//! deterministic input generators ([`generators`]) for exercising all of
//! them across layouts.

pub mod array;
pub mod config;
pub mod dtype;
pub mod error;
pub mod generators;
pub mod layout;
pub mod linalg;
pub mod metrics;
pub mod reduce;
pub mod shape;
pub mod storage;
pub mod ufunc;

#[cfg(feature = "python")]
mod python;

pub use array::NdArray;
pub use dtype::{DType, Element, Scalar};
pub use error::{ArrayError, ErrorKind, Result};
pub use layout::SliceSpec;
pub use linalg::{cholesky, norm, NormOrder};
pub use reduce::{reduce, Axis, ReduceOp};

#[cfg(feature = "python")]
pub use python::{init_test_module, PyNdArray};
