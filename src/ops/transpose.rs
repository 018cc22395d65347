//! Register-level matrix transposition
//!
//! A row-major matrix is staged as rows of registers (each row zero-padded
//! to a whole number of registers), then every LANES×LANES block is swapped
//! into place with `Register::transpose_block`. The dynamic multiply uses the
//! same helpers to turn the right operand's columns into rows.

use crate::simd::{Element, Register, load_partial, store_partial};

/// Loads `rows` packed rows of `cols` elements into registers.
///
/// Row `r` occupies `regs[r * blocks .. (r + 1) * blocks]` where
/// `blocks = cols.div_ceil(LANES)`; lanes past `cols` are zero.
///
/// # Safety
/// `src` must be valid for reads of `rows * cols` elements.
pub(crate) unsafe fn load_rows<T: Element>(src: *const T, rows: usize, cols: usize) -> Vec<T::Reg> {
    let lanes = T::LANES;
    let whole = cols / lanes;
    let tail = cols % lanes;
    let mut regs = Vec::with_capacity(rows * cols.div_ceil(lanes));

    for r in 0..rows {
        let row = unsafe { src.add(r * cols) };
        for b in 0..whole {
            regs.push(unsafe { T::Reg::loadu(row.add(b * lanes)) });
        }
        if tail != 0 {
            regs.push(unsafe { load_partial::<T>(row.add(whole * lanes), tail) });
        }
    }
    regs
}

/// Writes `rows` rows of `cols` elements from padded register rows, dropping the padding.
///
/// # Safety
/// `dst` must be valid for writes of `rows * cols` elements, and `regs`
/// must hold at least `rows * cols.div_ceil(LANES)` registers.
pub(crate) unsafe fn store_rows<T: Element>(regs: &[T::Reg], dst: *mut T, rows: usize, cols: usize) {
    let lanes = T::LANES;
    let blocks = cols.div_ceil(lanes);
    let whole = cols / lanes;
    let tail = cols % lanes;

    for r in 0..rows {
        let row = unsafe { dst.add(r * cols) };
        let src = &regs[r * blocks..(r + 1) * blocks];
        for b in 0..whole {
            unsafe { src[b].storeu(row.add(b * lanes)) };
        }
        if tail != 0 {
            unsafe { store_partial::<T>(src[whole], row.add(whole * lanes), tail) };
        }
    }
}

/// Transposes a padded register matrix.
///
/// `regs` holds `rows` rows of `blocks` registers each. The result holds
/// `blocks * LANES` rows (one per input column, padding columns included)
/// of `rows.div_ceil(LANES)` registers each. Missing rows of a partial
/// row-block are treated as zero.
pub(crate) fn block_transpose<T: Element>(regs: &[T::Reg], rows: usize, blocks: usize) -> Vec<T::Reg> {
    let lanes = T::LANES;
    let row_blocks = rows.div_ceil(lanes);
    let mut out = vec![T::Reg::zero(); blocks * lanes * row_blocks];
    let mut block = [T::Reg::zero(); 4];

    for rb in 0..row_blocks {
        for cb in 0..blocks {
            for (t, slot) in block[..lanes].iter_mut().enumerate() {
                let r = rb * lanes + t;
                *slot = if r < rows {
                    regs[r * blocks + cb]
                } else {
                    T::Reg::zero()
                };
            }
            T::Reg::transpose_block(&mut block[..lanes]);
            for (t, reg) in block[..lanes].iter().enumerate() {
                out[(cb * lanes + t) * row_blocks + rb] = *reg;
            }
        }
    }
    out
}

/// Register capacity of the stack-resident D×D helpers (D ≤ 4)
pub(crate) const STACK_REGS: usize = 16;

#[inline(always)]
unsafe fn load_block<T: Element>(src: *const T, count: usize) -> T::Reg {
    if count == T::LANES {
        unsafe { T::Reg::loadu(src) }
    } else {
        unsafe { load_partial::<T>(src, count) }
    }
}

/// Loads `rows` packed rows of `D` elements onto the stack, `D.div_ceil(LANES)`
/// registers per row.
///
/// # Safety
/// `src` must be valid for reads of `rows * D` elements, `rows <= D <= 4`.
#[inline(always)]
pub(crate) unsafe fn stack_rows<T: Element, const D: usize>(src: *const T, rows: usize) -> [T::Reg; STACK_REGS] {
    let lanes = T::LANES;
    let blocks = D.div_ceil(lanes);
    let mut regs = [T::Reg::zero(); STACK_REGS];
    for r in 0..rows {
        for b in 0..blocks {
            let count = lanes.min(D - b * lanes);
            regs[r * blocks + b] = unsafe { load_block::<T>(src.add(r * D + b * lanes), count) };
        }
    }
    regs
}

/// Columns of a D×D register matrix from [`stack_rows`]: column `c` lands in
/// `cols[c * blocks..(c + 1) * blocks]`, zero-padded past row `D`.
#[inline(always)]
pub(crate) fn stack_columns<T: Element, const D: usize>(rows: &[T::Reg; STACK_REGS]) -> [T::Reg; STACK_REGS] {
    let lanes = T::LANES;
    let blocks = D.div_ceil(lanes);
    let mut cols = [T::Reg::zero(); STACK_REGS];
    let mut block = [T::Reg::zero(); 4];
    for rb in 0..blocks {
        for cb in 0..blocks {
            for (t, slot) in block[..lanes].iter_mut().enumerate() {
                let r = rb * lanes + t;
                *slot = if r < D { rows[r * blocks + cb] } else { T::Reg::zero() };
            }
            T::Reg::transpose_block(&mut block[..lanes]);
            for (t, reg) in block[..lanes].iter().enumerate() {
                let c = cb * lanes + t;
                if c < D {
                    cols[c * blocks + rb] = *reg;
                }
            }
        }
    }
    cols
}

/// `dst = srcᵀ` for a D×D matrix, D ≤ 4, without touching the heap.
///
/// # Safety
/// `src` must be valid for reads and `dst` for writes of `D * D` elements.
/// No alignment is required.
#[inline(always)]
pub unsafe fn transpose_fixed<T: Element, const D: usize>(src: *const T, dst: *mut T) {
    let lanes = T::LANES;
    let blocks = D.div_ceil(lanes);
    let cols = stack_columns::<T, D>(&unsafe { stack_rows::<T, D>(src, D) });
    for c in 0..D {
        for b in 0..blocks {
            let count = lanes.min(D - b * lanes);
            let at = unsafe { dst.add(c * D + b * lanes) };
            let reg = cols[c * blocks + b];
            if count == lanes {
                unsafe { reg.storeu(at) };
            } else {
                unsafe { store_partial::<T>(reg, at, count) };
            }
        }
    }
}

/// `dst = srcᵀ`: `src` is `rows`×`cols`, `dst` becomes `cols`×`rows`.
///
/// # Safety
/// `src` must be valid for reads and `dst` for writes of `rows * cols`
/// elements, and the two must not overlap. No alignment is required.
pub unsafe fn transpose<T: Element>(src: *const T, dst: *mut T, rows: usize, cols: usize) {
    let blocks = cols.div_ceil(T::LANES);
    let staged = unsafe { load_rows::<T>(src, rows, cols) };
    let flipped = block_transpose::<T>(&staged, rows, blocks);
    unsafe { store_rows::<T>(&flipped, dst, cols, rows) };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive<T: Element>(src: &[T], rows: usize, cols: usize) -> Vec<T> {
        let mut out = vec![T::ZERO; rows * cols];
        for r in 0..rows {
            for c in 0..cols {
                out[c * rows + r] = src[r * cols + c];
            }
        }
        out
    }

    fn check<T: Element>(rows: usize, cols: usize) {
        let src: Vec<T> = (0..rows * cols).map(|i| T::from_f64(i as f64 + 1.0)).collect();
        let mut dst = vec![T::ZERO; rows * cols];
        unsafe { transpose(src.as_ptr(), dst.as_mut_ptr(), rows, cols) };
        assert_eq!(dst, naive(&src, rows, cols), "{rows}x{cols}");
    }

    #[test]
    fn test_transpose_square_f32() {
        check::<f32>(4, 4);
        check::<f32>(3, 3);
        check::<f32>(8, 8);
    }

    #[test]
    fn test_transpose_rectangular() {
        check::<f32>(2, 7);
        check::<f32>(5, 3);
        check::<f64>(3, 5);
        check::<f64>(1, 9);
        check::<f64>(9, 1);
    }

    fn check_fixed<T: Element, const D: usize>() {
        let src: Vec<T> = (0..D * D).map(|i| T::from_f64(i as f64 - 3.5)).collect();
        // one spare slot past the end must stay untouched
        let mut dst = vec![T::from_f64(99.0); D * D + 1];
        unsafe { transpose_fixed::<T, D>(src.as_ptr(), dst.as_mut_ptr()) };
        assert_eq!(&dst[..D * D], &naive(&src, D, D)[..], "{D}x{D}");
        assert_eq!(dst[D * D], T::from_f64(99.0));
    }

    #[test]
    fn test_transpose_fixed_matches_naive() {
        check_fixed::<f32, 2>();
        check_fixed::<f32, 3>();
        check_fixed::<f32, 4>();
        check_fixed::<f64, 2>();
        check_fixed::<f64, 3>();
        check_fixed::<f64, 4>();
    }

    #[test]
    fn test_transpose_empty() {
        check::<f32>(0, 4);
        check::<f64>(4, 0);
    }

    #[test]
    fn test_load_rows_pads_with_zero() {
        let src = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let regs = unsafe { load_rows::<f32>(src.as_ptr(), 2, 3) };
        assert_eq!(regs.len(), 2);
        let mut out = [0.0f32; 8];
        unsafe { store_rows::<f32>(&regs, out.as_mut_ptr(), 2, 4) };
        assert_eq!(out, [1.0, 2.0, 3.0, 0.0, 4.0, 5.0, 6.0, 0.0]);
    }
}
