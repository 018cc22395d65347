//! Slice-based entry points that validate once, then call the raw kernels.
//!
//! Lengths are "at least" checks: operands may be longer than the shape
//! needs and only the leading elements are read or written. Operands that
//! feed an aligned full-register pass must start on a 16-byte boundary;
//! `Aligned` and `AlignedBuf` guarantee that.

use log::{trace, warn};
use serde::{Deserialize, Serialize};

use crate::core::{Dims, KernelError};
use crate::ops::dispatch::{Dynamic, Fixed, General, MatVec3, MatVec4, RowVectors, Square3, Square4};
use crate::ops::matmul::{self, FixedMatMul};
use crate::ops::{elementwise, scalar};
use crate::simd::{Element, REGISTER_BYTES};

/// Element-wise operator selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BinaryKind {
    Add,
    Sub,
    Schur,
}

/// Scalar operator selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Mul,
    Div,
}

/// Binds `$shape` to the compile-time tag for `$len` (2, 3, 4, 9, 16) or
/// to `Dynamic` for any other length, then evaluates `$body`.
macro_rules! with_shape {
    ($len:expr, $shape:ident => $body:expr) => {
        match $len {
            2 => {
                let $shape = Fixed::<2>;
                $body
            }
            3 => {
                let $shape = Fixed::<3>;
                $body
            }
            4 => {
                let $shape = Fixed::<4>;
                $body
            }
            9 => {
                let $shape = Fixed::<9>;
                $body
            }
            16 => {
                let $shape = Fixed::<16>;
                $body
            }
            n => {
                let $shape = Dynamic::new(n);
                $body
            }
        }
    };
}

fn is_aligned<T>(values: &[T]) -> bool {
    values.as_ptr() as usize % REGISTER_BYTES == 0
}

fn require_len<T>(operand: &'static str, values: &[T], expected: usize) -> Result<(), KernelError> {
    if values.len() < expected {
        return Err(KernelError::LengthMismatch {
            operand,
            expected,
            actual: values.len(),
        });
    }
    Ok(())
}

/// Element count of `dims`, rejected when it overflows `usize`
fn element_count(dims: Dims) -> Result<usize, KernelError> {
    dims.checked_len().ok_or(KernelError::TooLarge { dims })
}

fn require_shape<T>(operand: &'static str, values: &[T], dims: Dims) -> Result<(), KernelError> {
    require_len(operand, values, element_count(dims)?)
}

fn require_aligned<T>(operand: &'static str, values: &[T]) -> Result<(), KernelError> {
    if !is_aligned(values) {
        return Err(KernelError::Misaligned {
            operand,
            align: REGISTER_BYTES,
        });
    }
    Ok(())
}

/// `out[..len] = kind(lhs[..len], rhs[..len])` with `len = out.len()`.
///
/// `lhs` and `out` must be 16-byte aligned once `len` reaches one register.
pub fn elementwise<T: Element>(kind: BinaryKind, lhs: &[T], rhs: &[T], out: &mut [T]) -> Result<(), KernelError> {
    let len = out.len();
    let checks = require_len("lhs", lhs, len)
        .and_then(|_| require_len("rhs", rhs, len))
        .and_then(|_| {
            if len >= T::LANES {
                require_aligned("lhs", lhs)?;
                require_aligned("out", out)?;
            }
            Ok(())
        });
    checks.inspect_err(|e| warn!("rejected {kind:?}: {e}"))?;

    let (a, b, c) = (lhs.as_ptr(), rhs.as_ptr(), out.as_mut_ptr());
    // SAFETY: lengths and alignment checked above
    unsafe {
        with_shape!(len, shape => match kind {
            BinaryKind::Add => elementwise::add(a, b, c, shape),
            BinaryKind::Sub => elementwise::sub(a, b, c, shape),
            BinaryKind::Schur => elementwise::schur(a, b, c, shape),
        })
    }
    Ok(())
}

/// `out[..len] = kind(lhs[..len], scalar)` with `len = out.len()`.
pub fn scale<T: Element>(kind: ScalarKind, lhs: &[T], value: T, out: &mut [T]) -> Result<(), KernelError> {
    let len = out.len();
    let checks = require_len("lhs", lhs, len).and_then(|_| {
        if len >= T::LANES {
            require_aligned("lhs", lhs)?;
            require_aligned("out", out)?;
        }
        Ok(())
    });
    checks.inspect_err(|e| warn!("rejected {kind:?}: {e}"))?;

    let (a, c) = (lhs.as_ptr(), out.as_mut_ptr());
    // SAFETY: lengths and alignment checked above
    unsafe {
        with_shape!(len, shape => match kind {
            ScalarKind::Mul => scalar::mul(a, value, c, shape),
            ScalarKind::Div => scalar::div(a, value, c, shape),
        })
    }
    Ok(())
}

/// Kernel a product of the given shapes runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MulKernel {
    Square4,
    Square3,
    MatVec4,
    MatVec3,
    General,
}

/// Picks the fixed kernel when the shapes match one and its alignment
/// contract holds, the general kernel otherwise.
///
/// The 4x4 kernels load both inputs with aligned loads; `out` is written one
/// element at a time and may sit anywhere.
pub fn select_kernel<T>(lhs: &[T], lhs_dims: Dims, rhs: &[T], rhs_dims: Dims, _out: &[T]) -> MulKernel {
    let aligned = is_aligned(lhs) && is_aligned(rhs);
    match (lhs_dims.rows, lhs_dims.cols, rhs_dims.cols) {
        (4, 4, 4) if aligned => MulKernel::Square4,
        (4, 4, 1) if aligned => MulKernel::MatVec4,
        (3, 3, 3) => MulKernel::Square3,
        (3, 3, 1) => MulKernel::MatVec3,
        _ => MulKernel::General,
    }
}

/// `out = lhs · rhs` for row-major operands; returns the product's dims.
pub fn multiply<T: FixedMatMul>(
    lhs: &[T],
    lhs_dims: Dims,
    rhs: &[T],
    rhs_dims: Dims,
    out: &mut [T],
) -> Result<Dims, KernelError> {
    let out_dims = Dims::new(lhs_dims.rows, rhs_dims.cols);
    let checks = if lhs_dims.cols != rhs_dims.rows {
        Err(KernelError::ShapeMismatch {
            lhs: lhs_dims,
            rhs: rhs_dims,
        })
    } else {
        require_shape("lhs", lhs, lhs_dims)
            .and_then(|_| require_shape("rhs", rhs, rhs_dims))
            .and_then(|_| require_shape("out", out, out_dims))
    };
    checks.inspect_err(|e| warn!("rejected multiply: {e}"))?;
    if out_dims.is_empty() {
        return Ok(out_dims);
    }

    let kernel = select_kernel(lhs, lhs_dims, rhs, rhs_dims, out);
    trace!("multiply {lhs_dims} * {rhs_dims} on {kernel:?}");

    let (a, b, c) = (lhs.as_ptr(), rhs.as_ptr(), out.as_mut_ptr());
    // SAFETY: shapes and lengths checked above; fixed 4x4 kernels only
    // selected when both inputs are aligned
    unsafe {
        match kernel {
            MulKernel::Square4 => matmul::multiply(a, b, c, Square4),
            MulKernel::Square3 => matmul::multiply(a, b, c, Square3),
            MulKernel::MatVec4 => matmul::multiply(a, b, c, MatVec4),
            MulKernel::MatVec3 => matmul::multiply(a, b, c, MatVec3),
            MulKernel::General => matmul::multiply(
                a,
                b,
                c,
                General {
                    m: lhs_dims.rows,
                    k: lhs_dims.cols,
                    n: rhs_dims.cols,
                },
            ),
        }
    }
    Ok(out_dims)
}

/// `out = lhs · rhs_rowsᵀ`: each row of `rhs_rows` is one column of the
/// right operand. `rhs_dims` describes `rhs_rows` (N×K).
pub fn multiply_rows<T: FixedMatMul>(
    lhs: &[T],
    lhs_dims: Dims,
    rhs_rows: &[T],
    rhs_dims: Dims,
    out: &mut [T],
) -> Result<Dims, KernelError> {
    let out_dims = Dims::new(lhs_dims.rows, rhs_dims.rows);
    let checks = if lhs_dims.cols != rhs_dims.cols {
        Err(KernelError::ShapeMismatch {
            lhs: lhs_dims,
            rhs: rhs_dims,
        })
    } else {
        require_shape("lhs", lhs, lhs_dims)
            .and_then(|_| require_shape("rhs", rhs_rows, rhs_dims))
            .and_then(|_| require_shape("out", out, out_dims))
    };
    checks.inspect_err(|e| warn!("rejected multiply_rows: {e}"))?;
    if out_dims.is_empty() {
        return Ok(out_dims);
    }

    let shape = RowVectors {
        m: lhs_dims.rows,
        k: lhs_dims.cols,
        n: rhs_dims.rows,
    };
    // SAFETY: shapes and lengths checked above; no alignment required
    unsafe { matmul::multiply(lhs.as_ptr(), rhs_rows.as_ptr(), out.as_mut_ptr(), shape) };
    Ok(out_dims)
}

/// Transposes a `dims` matrix into `out` (which becomes `cols`×`rows`).
pub fn transpose<T: Element>(src: &[T], dims: Dims, out: &mut [T]) -> Result<Dims, KernelError> {
    require_shape("src", src, dims)
        .and_then(|_| require_shape("out", out, dims))
        .inspect_err(|e| warn!("rejected transpose: {e}"))?;
    if dims.is_empty() {
        return Ok(Dims::new(dims.cols, dims.rows));
    }
    // SAFETY: lengths checked; `out` is a distinct mutable borrow
    unsafe { crate::ops::transpose::transpose(src.as_ptr(), out.as_mut_ptr(), dims.rows, dims.cols) };
    Ok(Dims::new(dims.cols, dims.rows))
}
