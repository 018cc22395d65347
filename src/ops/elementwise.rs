//! Element-wise binary kernels: Add, Subtract, Schur (Hadamard) multiply
//!
//! Full passes load `lhs` aligned and `rhs` unaligned, and store `out`
//! aligned. A tail shorter than one register (shapes 2, 3 and 9 for f32;
//! 3 and 9 for f64) is staged through a zero-padded local so no access leaves
//! `[0, len)`.

use crate::simd::{Element, Register, load_partial, store_partial};

use super::dispatch::ShapeTag;

/// A lane-wise binary operation on registers
pub trait BinaryOp {
    const NAME: &'static str;

    fn apply<T: Element>(lhs: T::Reg, rhs: T::Reg) -> T::Reg;

    /// Same operation on one scalar (reference path for tests and `verify`)
    fn scalar<T: Element>(lhs: T, rhs: T) -> T;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Add;

#[derive(Debug, Clone, Copy, Default)]
pub struct Sub;

#[derive(Debug, Clone, Copy, Default)]
pub struct Schur;

impl BinaryOp for Add {
    const NAME: &'static str = "add";

    #[inline(always)]
    fn apply<T: Element>(lhs: T::Reg, rhs: T::Reg) -> T::Reg {
        lhs.add(rhs)
    }

    fn scalar<T: Element>(lhs: T, rhs: T) -> T {
        lhs + rhs
    }
}

impl BinaryOp for Sub {
    const NAME: &'static str = "sub";

    #[inline(always)]
    fn apply<T: Element>(lhs: T::Reg, rhs: T::Reg) -> T::Reg {
        lhs.sub(rhs)
    }

    fn scalar<T: Element>(lhs: T, rhs: T) -> T {
        lhs - rhs
    }
}

impl BinaryOp for Schur {
    const NAME: &'static str = "schur";

    #[inline(always)]
    fn apply<T: Element>(lhs: T::Reg, rhs: T::Reg) -> T::Reg {
        lhs.mul(rhs)
    }

    fn scalar<T: Element>(lhs: T, rhs: T) -> T {
        lhs * rhs
    }
}

/// Applies `Op` lane-wise: `out[i] = Op(lhs[i], rhs[i])` for `i < shape.elements()`.
///
/// # Safety
/// - `lhs`, `rhs` and `out` must be valid for `shape.elements()` elements
/// - when the shape has at least one full register pass, `lhs` and `out`
///   must be 16-byte aligned
/// - `out` may alias `lhs` or `rhs` exactly, but must not partially overlap them
#[inline(always)]
pub unsafe fn combine<T: Element, Op: BinaryOp, S: ShapeTag>(
    lhs: *const T,
    rhs: *const T,
    out: *mut T,
    shape: S,
) {
    shape.drive::<T>(
        |at| unsafe {
            let a = T::Reg::load(lhs.add(at));
            let b = T::Reg::loadu(rhs.add(at));
            Op::apply::<T>(a, b).store(out.add(at));
        },
        |at, count| unsafe {
            let a = load_partial::<T>(lhs.add(at), count);
            let b = load_partial::<T>(rhs.add(at), count);
            store_partial::<T>(Op::apply::<T>(a, b), out.add(at), count);
        },
    );
}

/// `out = lhs + rhs`
///
/// # Safety
/// See [`combine`].
#[inline(always)]
pub unsafe fn add<T: Element, S: ShapeTag>(lhs: *const T, rhs: *const T, out: *mut T, shape: S) {
    unsafe { combine::<T, Add, S>(lhs, rhs, out, shape) }
}

/// `out = lhs - rhs`
///
/// # Safety
/// See [`combine`].
#[inline(always)]
pub unsafe fn sub<T: Element, S: ShapeTag>(lhs: *const T, rhs: *const T, out: *mut T, shape: S) {
    unsafe { combine::<T, Sub, S>(lhs, rhs, out, shape) }
}

/// `out = lhs ∘ rhs` (Schur / Hadamard product)
///
/// # Safety
/// See [`combine`].
#[inline(always)]
pub unsafe fn schur<T: Element, S: ShapeTag>(lhs: *const T, rhs: *const T, out: *mut T, shape: S) {
    unsafe { combine::<T, Schur, S>(lhs, rhs, out, shape) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Aligned, AlignedBuf};
    use crate::ops::dispatch::{Dynamic, Fixed};

    #[test]
    fn test_schur_2x2() {
        let a = Aligned([1.0f32, 2.0, 3.0, 4.0]);
        let b = Aligned([5.0f32, 6.0, 7.0, 8.0]);
        let mut out = Aligned([0.0f32; 4]);
        unsafe { schur(a.as_ptr(), b.as_ptr(), out.as_mut_ptr(), Fixed::<4>) };
        assert_eq!(out.0, [5.0, 12.0, 21.0, 32.0]);
    }

    #[test]
    fn test_add_16_f32() {
        let a = Aligned(std::array::from_fn::<f32, 16, _>(|i| i as f32));
        let b = Aligned([1.0f32; 16]);
        let mut out = Aligned([0.0f32; 16]);
        unsafe { add(a.as_ptr(), b.as_ptr(), out.as_mut_ptr(), Fixed::<16>) };
        for i in 0..16 {
            assert!((out[i] - (i as f32 + 1.0)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_sub_9_writes_exactly_nine() {
        // 12 slots, only the first 9 belong to the matrix
        let a = Aligned([3.0f32; 12]);
        let b = Aligned([1.0f32; 12]);
        let mut out = Aligned([-7.0f32; 12]);
        unsafe { sub(a.as_ptr(), b.as_ptr(), out.as_mut_ptr(), Fixed::<9>) };
        assert!(out[..9].iter().all(|&v| v == 2.0));
        assert!(out[9..].iter().all(|&v| v == -7.0));
    }

    #[test]
    fn test_sub_3_f64() {
        let a = Aligned([1.0f64, 2.0, 3.0]);
        let b = Aligned([0.5f64, 0.5, 0.5]);
        let mut out = Aligned([0.0f64; 3]);
        unsafe { sub(a.as_ptr(), b.as_ptr(), out.as_mut_ptr(), Fixed::<3>) };
        assert_eq!(out.0, [0.5, 1.5, 2.5]);
    }

    #[test]
    fn test_dynamic_matches_fixed() {
        let a = Aligned(std::array::from_fn::<f64, 9, _>(|i| i as f64 * 0.5));
        let b = Aligned(std::array::from_fn::<f64, 9, _>(|i| 9.0 - i as f64));
        let mut fixed = Aligned([0.0f64; 9]);
        let mut dynamic = Aligned([0.0f64; 9]);
        unsafe {
            schur(a.as_ptr(), b.as_ptr(), fixed.as_mut_ptr(), Fixed::<9>);
            schur(a.as_ptr(), b.as_ptr(), dynamic.as_mut_ptr(), Dynamic::from_bytes::<f64>(72));
        }
        assert_eq!(fixed.0, dynamic.0);
    }

    #[test]
    fn test_dynamic_odd_length() {
        let a = AlignedBuf::from_slice(&(0..11).map(|i| i as f32).collect::<Vec<_>>());
        let b = AlignedBuf::from_slice(&[2.0f32; 11]);
        let mut out = AlignedBuf::<f32>::zeroed(11);
        unsafe { add(a.as_ptr(), b.as_ptr(), out.as_mut_ptr(), Dynamic::new(11)) };
        for i in 0..11 {
            assert_eq!(out[i], i as f32 + 2.0);
        }
    }

    #[test]
    fn test_in_place() {
        let mut a = Aligned([1.0f32, 2.0, 3.0, 4.0]);
        let b = Aligned([1.0f32; 4]);
        let ptr = a.as_mut_ptr();
        unsafe { add(ptr, b.as_ptr(), ptr, Fixed::<4>) };
        assert_eq!(a.0, [2.0, 3.0, 4.0, 5.0]);
    }
}
