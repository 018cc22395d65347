//! Dense matrix multiplication kernels
//!
//! All variants compute `out[i][j] = sum_k(lhs[i][k] * rhs[k][j])` over
//! row-major buffers. Each output element is one dot product: the row of
//! `lhs` and the column of `rhs` are held as register sequences, multiplied
//! lane-wise into an accumulator, then folded with the pairwise horizontal add.
//!
//! Variants:
//! - `matmul_rows`: dynamic, the right operand already supplies its columns as rows
//! - `matmul`: dynamic, general row-major right operand (block transposed first)
//! - `FixedMatMul`: 4x4, 3x3, 4x4·4x1 and 3x3·3x1 without heap allocation

use log::{debug, trace};

use crate::core::types::Aligned;
use crate::simd::{Element, F32x4, Register, load_partial};

use super::dispatch::MulShape;
use super::transpose::{block_transpose, load_rows, stack_columns, stack_rows};

/// Multiply-accumulate two register sequences and reduce to a scalar
#[inline(always)]
fn dot<T: Element>(a: &[T::Reg], b: &[T::Reg]) -> T {
    let mut acc = T::Reg::zero();
    for (x, y) in a.iter().zip(b) {
        acc = acc.add(x.mul(*y));
    }
    acc.reduce_sum()
}

/// Single-register dot product
#[inline(always)]
fn dot1<T: Element>(a: T::Reg, b: T::Reg) -> T {
    a.mul(b).reduce_sum()
}

/// M×K · (N×K)ᵀ: `rhs` holds N rows of K elements, each one a column of the
/// logical right operand. With N = 1 this is a matrix-vector product.
///
/// # Safety
/// `lhs` must be valid for `m * k` reads, `rhs` for `n * k` reads and `out`
/// for `m * n` writes. No alignment is required.
pub unsafe fn matmul_rows<T: Element>(
    lhs: *const T,
    rhs: *const T,
    out: *mut T,
    m: usize,
    k: usize,
    n: usize,
) {
    let blocks = k.div_ceil(T::LANES);
    let lhs_regs = unsafe { load_rows::<T>(lhs, m, k) };
    let rhs_regs = unsafe { load_rows::<T>(rhs, n, k) };
    trace!(
        "matmul_rows {m}x{k} by {n} rows: {} registers staged",
        lhs_regs.len() + rhs_regs.len()
    );

    for i in 0..m {
        let row = &lhs_regs[i * blocks..(i + 1) * blocks];
        for j in 0..n {
            let col = &rhs_regs[j * blocks..(j + 1) * blocks];
            unsafe { *out.add(i * n + j) = dot::<T>(row, col) };
        }
    }
}

/// M×K · K×N with both operands row-major.
///
/// `rhs` is staged into registers, block-transposed so each of its columns
/// becomes a contiguous register row, then multiplied as in [`matmul_rows`].
///
/// # Safety
/// `lhs` must be valid for `m * k` reads, `rhs` for `k * n` reads and `out`
/// for `m * n` writes. No alignment is required.
pub unsafe fn matmul<T: Element>(
    lhs: *const T,
    rhs: *const T,
    out: *mut T,
    m: usize,
    k: usize,
    n: usize,
) {
    let lanes = T::LANES;
    let k_blocks = k.div_ceil(lanes);
    let n_blocks = n.div_ceil(lanes);

    let rhs_regs = unsafe { load_rows::<T>(rhs, k, n) };
    let rhs_t = block_transpose::<T>(&rhs_regs, k, n_blocks);
    let lhs_regs = unsafe { load_rows::<T>(lhs, m, k) };
    debug!(
        "matmul {m}x{k} * {k}x{n}: {} transpose blocks, {} registers staged",
        k_blocks * n_blocks,
        rhs_regs.len() + rhs_t.len() + lhs_regs.len()
    );

    for i in 0..m {
        let row = &lhs_regs[i * k_blocks..(i + 1) * k_blocks];
        for j in 0..n {
            let col = &rhs_t[j * k_blocks..(j + 1) * k_blocks];
            unsafe { *out.add(i * n + j) = dot::<T>(row, col) };
        }
    }
}

/// Fixed-shape products that never touch the heap.
///
/// Pointer contracts per kernel:
/// - `mul_4x4`, `mul_4x4_vec`: `lhs` and `rhs` 16-byte aligned
/// - `mul_3x3`, `mul_3x3_vec`: no alignment requirement
/// - `out` never overlaps an input
pub trait FixedMatMul: Element {
    /// 4x4 · 4x4
    ///
    /// # Safety
    /// `lhs`, `rhs` and `out` valid for 16 elements, `lhs` and `rhs`
    /// 16-byte aligned.
    unsafe fn mul_4x4(lhs: *const Self, rhs: *const Self, out: *mut Self);

    /// 3x3 · 3x3
    ///
    /// # Safety
    /// `lhs`, `rhs` and `out` valid for 9 elements.
    unsafe fn mul_3x3(lhs: *const Self, rhs: *const Self, out: *mut Self);

    /// 4x4 · 4x1
    ///
    /// # Safety
    /// `lhs` valid for 16 elements, `rhs` and `out` for 4; `lhs` and `rhs`
    /// 16-byte aligned.
    unsafe fn mul_4x4_vec(lhs: *const Self, rhs: *const Self, out: *mut Self);

    /// 3x3 · 3x1
    ///
    /// # Safety
    /// `lhs` valid for 9 elements, `rhs` and `out` for 3.
    unsafe fn mul_3x3_vec(lhs: *const Self, rhs: *const Self, out: *mut Self);
}

/// The three packed rows of a 3x3 matrix with lane 3 cleared.
///
/// Rows 0 and 1 are read with a full unaligned load (lane 3 is the first
/// element of the next row, still inside the buffer); row 2 is staged.
#[inline(always)]
unsafe fn rows_3x3_f32(src: *const f32) -> [F32x4; 3] {
    unsafe {
        [
            F32x4::loadu(src).truncate(3),
            F32x4::loadu(src.add(3)).truncate(3),
            load_partial::<f32>(src.add(6), 3),
        ]
    }
}

impl FixedMatMul for f32 {
    #[inline(always)]
    unsafe fn mul_4x4(lhs: *const f32, rhs: *const f32, out: *mut f32) {
        let (rows, mut cols) = unsafe {
            (
                [
                    F32x4::load(lhs),
                    F32x4::load(lhs.add(4)),
                    F32x4::load(lhs.add(8)),
                    F32x4::load(lhs.add(12)),
                ],
                [
                    F32x4::load(rhs),
                    F32x4::load(rhs.add(4)),
                    F32x4::load(rhs.add(8)),
                    F32x4::load(rhs.add(12)),
                ],
            )
        };
        F32x4::transpose_block(&mut cols);

        for (i, row) in rows.iter().enumerate() {
            for (j, col) in cols.iter().enumerate() {
                unsafe { *out.add(i * 4 + j) = dot1::<f32>(*row, *col) };
            }
        }
    }

    #[inline(always)]
    unsafe fn mul_3x3(lhs: *const f32, rhs: *const f32, out: *mut f32) {
        let rows = unsafe { rows_3x3_f32(lhs) };
        let cols = unsafe {
            [
                Aligned([*rhs, *rhs.add(3), *rhs.add(6), 0.0]),
                Aligned([*rhs.add(1), *rhs.add(4), *rhs.add(7), 0.0]),
                Aligned([*rhs.add(2), *rhs.add(5), *rhs.add(8), 0.0]),
            ]
        }
        .map(|col| unsafe { F32x4::load(col.as_ptr()) });

        for (i, row) in rows.iter().enumerate() {
            for (j, col) in cols.iter().enumerate() {
                unsafe { *out.add(i * 3 + j) = dot1::<f32>(*row, *col) };
            }
        }
    }

    #[inline(always)]
    unsafe fn mul_4x4_vec(lhs: *const f32, rhs: *const f32, out: *mut f32) {
        let v = unsafe { F32x4::load(rhs) };
        for i in 0..4 {
            unsafe {
                let row = F32x4::load(lhs.add(i * 4));
                *out.add(i) = dot1::<f32>(row, v);
            }
        }
    }

    #[inline(always)]
    unsafe fn mul_3x3_vec(lhs: *const f32, rhs: *const f32, out: *mut f32) {
        let (rows, v) = unsafe { (rows_3x3_f32(lhs), load_partial::<f32>(rhs, 3)) };
        for (i, row) in rows.iter().enumerate() {
            unsafe { *out.add(i) = dot1::<f32>(*row, v) };
        }
    }
}

// f64 holds two lanes, so a 4-wide row spans two registers. The fixed shapes
// run the block-transpose algorithm over stack arrays instead.

/// D×D · D×D for D ≤ 4 with every register on the stack
#[inline(always)]
unsafe fn square_on_stack<T: Element, const D: usize>(lhs: *const T, rhs: *const T, out: *mut T) {
    let blocks = D.div_ceil(T::LANES);
    let a = unsafe { stack_rows::<T, D>(lhs, D) };
    let cols = stack_columns::<T, D>(&unsafe { stack_rows::<T, D>(rhs, D) });

    for i in 0..D {
        for j in 0..D {
            let row = &a[i * blocks..(i + 1) * blocks];
            let col = &cols[j * blocks..(j + 1) * blocks];
            unsafe { *out.add(i * D + j) = dot::<T>(row, col) };
        }
    }
}

/// D×D · D×1 for D ≤ 4
#[inline(always)]
unsafe fn matvec_on_stack<T: Element, const D: usize>(lhs: *const T, rhs: *const T, out: *mut T) {
    let blocks = D.div_ceil(T::LANES);
    let a = unsafe { stack_rows::<T, D>(lhs, D) };
    let v = unsafe { stack_rows::<T, D>(rhs, 1) };
    for i in 0..D {
        let row = &a[i * blocks..(i + 1) * blocks];
        unsafe { *out.add(i) = dot::<T>(row, &v[..blocks]) };
    }
}

impl FixedMatMul for f64 {
    #[inline(always)]
    unsafe fn mul_4x4(lhs: *const f64, rhs: *const f64, out: *mut f64) {
        unsafe { square_on_stack::<f64, 4>(lhs, rhs, out) }
    }

    #[inline(always)]
    unsafe fn mul_3x3(lhs: *const f64, rhs: *const f64, out: *mut f64) {
        unsafe { square_on_stack::<f64, 3>(lhs, rhs, out) }
    }

    #[inline(always)]
    unsafe fn mul_4x4_vec(lhs: *const f64, rhs: *const f64, out: *mut f64) {
        unsafe { matvec_on_stack::<f64, 4>(lhs, rhs, out) }
    }

    #[inline(always)]
    unsafe fn mul_3x3_vec(lhs: *const f64, rhs: *const f64, out: *mut f64) {
        unsafe { matvec_on_stack::<f64, 3>(lhs, rhs, out) }
    }
}

/// Multiplies through the kernel `shape` selects at compile time.
///
/// # Safety
/// See the `MulShape` implementation for `S`: buffer lengths are
/// `shape.lhs_len()`, `shape.rhs_len()` and `shape.out_len()`, plus the
/// alignment of the selected fixed kernel.
#[inline(always)]
pub unsafe fn multiply<T: FixedMatMul, S: MulShape>(lhs: *const T, rhs: *const T, out: *mut T, shape: S) {
    unsafe { shape.multiply::<T>(lhs, rhs, out) }
}
