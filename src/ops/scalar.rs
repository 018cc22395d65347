//! Scalar kernels: broadcast one value and multiply or divide every lane
//!
//! Same pass plan and alignment rules as the element-wise kernels. Division
//! by zero follows IEEE-754 (infinity or NaN per lane).

use crate::simd::{Element, Register, load_partial, store_partial};

use super::dispatch::ShapeTag;

/// A lane-wise operation against a broadcast scalar
pub trait ScalarOp {
    const NAME: &'static str;

    fn apply<T: Element>(lhs: T::Reg, scalar: T::Reg) -> T::Reg;

    fn scalar<T: Element>(lhs: T, scalar: T) -> T;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Scale;

#[derive(Debug, Clone, Copy, Default)]
pub struct Divide;

impl ScalarOp for Scale {
    const NAME: &'static str = "scalar_mul";

    #[inline(always)]
    fn apply<T: Element>(lhs: T::Reg, scalar: T::Reg) -> T::Reg {
        lhs.mul(scalar)
    }

    fn scalar<T: Element>(lhs: T, scalar: T) -> T {
        lhs * scalar
    }
}

impl ScalarOp for Divide {
    const NAME: &'static str = "scalar_div";

    #[inline(always)]
    fn apply<T: Element>(lhs: T::Reg, scalar: T::Reg) -> T::Reg {
        lhs.div(scalar)
    }

    fn scalar<T: Element>(lhs: T, scalar: T) -> T {
        lhs / scalar
    }
}

/// `out[i] = Op(lhs[i], scalar)` for `i < shape.elements()`.
///
/// # Safety
/// - `lhs` and `out` must be valid for `shape.elements()` elements
/// - when the shape has at least one full register pass, both must be
///   16-byte aligned
#[inline(always)]
pub unsafe fn apply<T: Element, Op: ScalarOp, S: ShapeTag>(
    lhs: *const T,
    scalar: T,
    out: *mut T,
    shape: S,
) {
    let broadcast = T::Reg::splat(scalar);
    shape.drive::<T>(
        |at| unsafe {
            let a = T::Reg::load(lhs.add(at));
            Op::apply::<T>(a, broadcast).store(out.add(at));
        },
        |at, count| unsafe {
            let a = load_partial::<T>(lhs.add(at), count);
            store_partial::<T>(Op::apply::<T>(a, broadcast), out.add(at), count);
        },
    );
}

/// `out = lhs * scalar`
///
/// # Safety
/// See [`apply`].
#[inline(always)]
pub unsafe fn mul<T: Element, S: ShapeTag>(lhs: *const T, scalar: T, out: *mut T, shape: S) {
    unsafe { apply::<T, Scale, S>(lhs, scalar, out, shape) }
}

/// `out = lhs / scalar`
///
/// # Safety
/// See [`apply`].
#[inline(always)]
pub unsafe fn div<T: Element, S: ShapeTag>(lhs: *const T, scalar: T, out: *mut T, shape: S) {
    unsafe { apply::<T, Divide, S>(lhs, scalar, out, shape) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Aligned;
    use crate::ops::dispatch::{Dynamic, Fixed};

    #[test]
    fn test_divide_four() {
        let a = Aligned([2.0f32, 4.0, 6.0, 8.0]);
        let mut out = Aligned([0.0f32; 4]);
        unsafe { div(a.as_ptr(), 2.0, out.as_mut_ptr(), Fixed::<4>) };
        assert_eq!(out.0, [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_scale_sixteen_f64() {
        let a = Aligned(std::array::from_fn::<f64, 16, _>(|i| i as f64));
        let mut out = Aligned([0.0f64; 16]);
        unsafe { mul(a.as_ptr(), 0.5, out.as_mut_ptr(), Fixed::<16>) };
        for i in 0..16 {
            assert!((out[i] - i as f64 * 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_scale_nine_leaves_padding() {
        let a = Aligned([2.0f32; 12]);
        let mut out = Aligned([5.0f32; 12]);
        unsafe { mul(a.as_ptr(), 3.0, out.as_mut_ptr(), Fixed::<9>) };
        assert!(out[..9].iter().all(|&v| v == 6.0));
        assert!(out[9..].iter().all(|&v| v == 5.0));
    }

    #[test]
    fn test_divide_by_zero_is_ieee() {
        let a = Aligned([1.0f32, -1.0, 0.0, 2.0]);
        let mut out = Aligned([0.0f32; 4]);
        unsafe { div(a.as_ptr(), 0.0, out.as_mut_ptr(), Dynamic::new(4)) };
        assert_eq!(out[0], f32::INFINITY);
        assert_eq!(out[1], f32::NEG_INFINITY);
        assert!(out[2].is_nan());
    }

    #[test]
    fn test_scale_two_partial() {
        let a = Aligned([1.5f32, -2.0]);
        let mut out = Aligned([0.0f32; 2]);
        unsafe { mul(a.as_ptr(), 2.0, out.as_mut_ptr(), Fixed::<2>) };
        assert_eq!(out.0, [3.0, -4.0]);
    }
}
