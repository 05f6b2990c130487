//! Element kinds and scalar values.
//!
//! [`DType`] is ordered by NumPy's promotion lattice, so the common type of two
//! operands is simply the larger of the two.

use std::fmt;

use num_complex::Complex64;
use num_traits::{ToPrimitive, Zero};

use crate::storage::Storage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DType {
    Bool,
    Int64,
    Float64,
    Complex128,
}

impl DType {
    pub const fn name(self) -> &'static str {
        match self {
            DType::Bool => "bool",
            DType::Int64 => "int64",
            DType::Float64 => "float64",
            DType::Complex128 => "complex128",
        }
    }

    pub fn promote(self, other: DType) -> DType {
        self.max(other)
    }

    pub fn is_integral(self) -> bool {
        matches!(self, DType::Bool | DType::Int64)
    }

    pub fn is_complex(self) -> bool {
        self == DType::Complex128
    }

    /// Real counterpart used by `abs`, `real` and `imag`.
    pub fn real_part(self) -> DType {
        match self {
            DType::Complex128 => DType::Float64,
            other => other,
        }
    }

    /// Result kind of transcendental functions (`sqrt`, `exp`, `tanh`, true division).
    pub fn inexact(self) -> DType {
        match self {
            DType::Complex128 => DType::Complex128,
            _ => DType::Float64,
        }
    }

    pub fn zero(self) -> Scalar {
        Scalar::Int(0).cast(self)
    }

    pub fn one(self) -> Scalar {
        Scalar::Int(1).cast(self)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single tagged element value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Complex(Complex64),
}

impl Scalar {
    pub fn dtype(&self) -> DType {
        match self {
            Scalar::Bool(_) => DType::Bool,
            Scalar::Int(_) => DType::Int64,
            Scalar::Float(_) => DType::Float64,
            Scalar::Complex(_) => DType::Complex128,
        }
    }

    /// Unsafe-casting conversion, as `ndarray.astype` performs it.
    pub fn cast(self, dtype: DType) -> Scalar {
        match dtype {
            DType::Bool => Scalar::Bool(self.is_nonzero()),
            DType::Int64 => Scalar::Int(self.to_i64()),
            DType::Float64 => Scalar::Float(self.to_f64()),
            DType::Complex128 => Scalar::Complex(self.to_complex()),
        }
    }

    pub fn is_nonzero(&self) -> bool {
        match *self {
            Scalar::Bool(value) => value,
            Scalar::Int(value) => value != 0,
            Scalar::Float(value) => value != 0.0,
            Scalar::Complex(value) => !value.is_zero(),
        }
    }

    pub fn to_i64(&self) -> i64 {
        match *self {
            Scalar::Bool(value) => i64::from(value),
            Scalar::Int(value) => value,
            Scalar::Float(value) => value.to_i64().unwrap_or(
                if value.is_nan() || value.is_sign_negative() {
                    i64::MIN
                } else {
                    i64::MAX
                },
            ),
            Scalar::Complex(value) => Scalar::Float(value.re).to_i64(),
        }
    }

    /// Real value; the imaginary part of a complex scalar is discarded.
    pub fn to_f64(&self) -> f64 {
        match *self {
            Scalar::Bool(value) => f64::from(u8::from(value)),
            Scalar::Int(value) => value as f64,
            Scalar::Float(value) => value,
            Scalar::Complex(value) => value.re,
        }
    }

    pub fn to_complex(&self) -> Complex64 {
        match *self {
            Scalar::Complex(value) => value,
            other => Complex64::new(other.to_f64(), 0.0),
        }
    }

    /// Numeric equality after promotion to the common dtype (`1 == 1.0 == True`).
    pub fn equals(&self, other: &Scalar) -> bool {
        let common = self.dtype().promote(other.dtype());
        match (self.cast(common), other.cast(common)) {
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::Int(a), Scalar::Int(b)) => a == b,
            (Scalar::Float(a), Scalar::Float(b)) => a == b,
            (Scalar::Complex(a), Scalar::Complex(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(value) => write!(f, "{}", if *value { "True" } else { "False" }),
            Scalar::Int(value) => write!(f, "{value}"),
            Scalar::Float(value) => write!(f, "{value:?}"),
            Scalar::Complex(value) => write!(f, "({}{:+}j)", value.re, value.im),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(i64::from(value))
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<Complex64> for Scalar {
    fn from(value: Complex64) -> Self {
        Scalar::Complex(value)
    }
}

/// Rust element types that back an array buffer.
pub trait Element: Copy + Send + Sync + PartialEq + fmt::Debug + 'static {
    const DTYPE: DType;

    fn from_scalar(value: Scalar) -> Self;
    fn into_scalar(self) -> Scalar;
    fn wrap(data: Vec<Self>) -> Storage;
    fn slice(storage: &Storage) -> Option<&[Self]>;
}

macro_rules! impl_element {
    ($t:ty, $dtype:ident, $variant:ident, $scalar:ident, $convert:expr) => {
        impl Element for $t {
            const DTYPE: DType = DType::$dtype;

            fn from_scalar(value: Scalar) -> Self {
                match value.cast(DType::$dtype) {
                    Scalar::$scalar(inner) => inner,
                    other => $convert(other),
                }
            }

            fn into_scalar(self) -> Scalar {
                Scalar::$scalar(self)
            }

            fn wrap(data: Vec<Self>) -> Storage {
                Storage::$variant(data)
            }

            fn slice(storage: &Storage) -> Option<&[Self]> {
                match storage {
                    Storage::$variant(data) => Some(data.as_slice()),
                    _ => None,
                }
            }
        }
    };
}

impl_element!(bool, Bool, Bool, Bool, |s: Scalar| s.is_nonzero());
impl_element!(i64, Int64, Int64, Int, |s: Scalar| s.to_i64());
impl_element!(f64, Float64, Float64, Float, |s: Scalar| s.to_f64());
impl_element!(Complex64, Complex128, Complex128, Complex, |s: Scalar| s
    .to_complex());
