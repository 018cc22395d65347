use std::fmt::{Debug, Display};
use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::core::types::{Aligned, ElementType};

use super::{F32x4, F64x2};

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// One 128-bit register's worth of `T` lanes.
///
/// Pointer arguments must reference at least `LANES` readable (or writable)
/// elements; `load`/`store` additionally require 16-byte alignment.
pub trait Register<T>: Copy + Debug {
    /// Number of `T` lanes in one register
    const LANES: usize;

    /// Aligned load of `LANES` elements
    unsafe fn load(ptr: *const T) -> Self;

    /// Unaligned load of `LANES` elements
    unsafe fn loadu(ptr: *const T) -> Self;

    /// Aligned store of every lane
    unsafe fn store(self, ptr: *mut T);

    /// Unaligned store of every lane
    unsafe fn storeu(self, ptr: *mut T);

    /// Broadcast `value` into every lane
    fn splat(value: T) -> Self;

    fn zero() -> Self;

    fn add(self, rhs: Self) -> Self;
    fn sub(self, rhs: Self) -> Self;
    fn mul(self, rhs: Self) -> Self;
    fn div(self, rhs: Self) -> Self;

    /// Folds adjacent lane pairs until a single lane remains
    fn reduce_sum(self) -> T;

    /// Clears every lane at index `lanes` and above
    fn truncate(self, lanes: usize) -> Self;

    /// Transposes a `LANES`×`LANES` block of registers in place.
    ///
    /// `block.len()` must equal `LANES`. Register `i` becomes the register
    /// holding lane `i` of every input register.
    fn transpose_block(block: &mut [Self]);
}

/// Scalar element types the kernels are instantiated for (`f32`, `f64`)
pub trait Element:
    sealed::Sealed
    + Copy
    + Default
    + Debug
    + Display
    + PartialEq
    + PartialOrd
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    /// Native 128-bit register for this element type
    type Reg: Register<Self>;

    /// Lanes per register: 4 for `f32`, 2 for `f64`
    const LANES: usize = <Self::Reg as Register<Self>>::LANES;

    const ZERO: Self;
    const ONE: Self;
    const KIND: ElementType;

    fn from_f64(value: f64) -> Self;
    fn to_f64(self) -> f64;
    fn abs(self) -> Self;
    fn sqrt(self) -> Self;
    fn sin_cos(self) -> (Self, Self);
}

impl Element for f32 {
    type Reg = F32x4;

    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
    const KIND: ElementType = ElementType::F32;

    #[inline(always)]
    fn from_f64(value: f64) -> Self {
        value as f32
    }

    #[inline(always)]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline(always)]
    fn abs(self) -> Self {
        f32::abs(self)
    }

    #[inline(always)]
    fn sqrt(self) -> Self {
        f32::sqrt(self)
    }

    #[inline(always)]
    fn sin_cos(self) -> (Self, Self) {
        f32::sin_cos(self)
    }
}

impl Element for f64 {
    type Reg = F64x2;

    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
    const KIND: ElementType = ElementType::F64;

    #[inline(always)]
    fn from_f64(value: f64) -> Self {
        value
    }

    #[inline(always)]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline(always)]
    fn abs(self) -> Self {
        f64::abs(self)
    }

    #[inline(always)]
    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    #[inline(always)]
    fn sin_cos(self) -> (Self, Self) {
        f64::sin_cos(self)
    }
}

/// Loads `count` elements (fewer than one register) into a zero-padded register.
///
/// Staging through an aligned local keeps the read inside `src[..count]`.
///
/// # Safety
/// `src` must be valid for reads of `count` elements and `count <= T::LANES`.
#[inline(always)]
pub unsafe fn load_partial<T: Element>(src: *const T, count: usize) -> T::Reg {
    debug_assert!(count <= T::LANES);
    let mut stage = Aligned([T::ZERO; 4]);
    unsafe {
        std::ptr::copy_nonoverlapping(src, stage.0.as_mut_ptr(), count);
        T::Reg::load(stage.0.as_ptr())
    }
}

/// Writes the first `count` lanes of `reg` to `dst`, leaving `dst[count..]` untouched.
///
/// # Safety
/// `dst` must be valid for writes of `count` elements and `count <= T::LANES`.
#[inline(always)]
pub unsafe fn store_partial<T: Element>(reg: T::Reg, dst: *mut T, count: usize) {
    debug_assert!(count <= T::LANES);
    let mut stage = Aligned([T::ZERO; 4]);
    unsafe {
        reg.store(stage.0.as_mut_ptr());
        std::ptr::copy_nonoverlapping(stage.0.as_ptr(), dst, count);
    }
}
