use thiserror::Error;

use crate::dtype::DType;

/// Coarse classification of [`ArrayError`], mirroring the Python exception a
/// NumPy-compatible front end raises for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// `ValueError`: bad shapes, axes or arguments.
    Value,
    /// `NotImplementedError`: a known, permanently signalled gap.
    NotImplemented,
    /// Failure reported by a numerical routine (e.g. a non positive definite matrix).
    Numerical,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArrayError {
    #[error("{0}")]
    Shape(String),

    #[error(
        "operands could not be broadcast together with shapes {left:?} {right:?} (mismatch at axis {axis})"
    )]
    Broadcast {
        axis: usize,
        left: Vec<usize>,
        right: Vec<usize>,
    },

    #[error("axis {axis} is out of bounds for array of dimension {ndim}")]
    AxisOutOfBounds { axis: isize, ndim: usize },

    #[error("duplicate value in 'axis': {0}")]
    DuplicateAxis(usize),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("cannot cast ufunc output from {from} to {to} with casting rule 'same_kind'")]
    DTypeMismatch { from: DType, to: DType },

    #[error("{0}")]
    NotImplemented(String),

    #[error("{0}")]
    Numerical(String),
}

impl ArrayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ArrayError::NotImplemented(_) => ErrorKind::NotImplemented,
            ArrayError::Numerical(_) => ErrorKind::Numerical,
            _ => ErrorKind::Value,
        }
    }

    pub(crate) fn shape(message: impl Into<String>) -> Self {
        ArrayError::Shape(message.into())
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        ArrayError::InvalidArgument(message.into())
    }

    pub(crate) fn not_implemented(message: impl Into<String>) -> Self {
        ArrayError::NotImplemented(message.into())
    }
}

pub type Result<T> = std::result::Result<T, ArrayError>;
