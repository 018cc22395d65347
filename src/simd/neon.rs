//! NEON registers for aarch64.
//!
//! NEON has no separate aligned load/store instructions, so `load`/`loadu`
//! and `store`/`storeu` share an encoding.

use std::arch::aarch64::*;

use super::lanes::Register;

/// Four `f32` lanes in a `float32x4_t`.
#[derive(Clone, Copy, Debug)]
#[repr(transparent)]
pub struct F32x4(float32x4_t);

/// Two `f64` lanes in a `float64x2_t`.
#[derive(Clone, Copy, Debug)]
#[repr(transparent)]
pub struct F64x2(float64x2_t);

impl Register<f32> for F32x4 {
    const LANES: usize = 4;

    #[inline(always)]
    unsafe fn load(ptr: *const f32) -> Self {
        unsafe { Self(vld1q_f32(ptr)) }
    }

    #[inline(always)]
    unsafe fn loadu(ptr: *const f32) -> Self {
        unsafe { Self(vld1q_f32(ptr)) }
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut f32) {
        unsafe { vst1q_f32(ptr, self.0) }
    }

    #[inline(always)]
    unsafe fn storeu(self, ptr: *mut f32) {
        unsafe { vst1q_f32(ptr, self.0) }
    }

    #[inline(always)]
    fn splat(value: f32) -> Self {
        unsafe { Self(vdupq_n_f32(value)) }
    }

    #[inline(always)]
    fn zero() -> Self {
        unsafe { Self(vdupq_n_f32(0.0)) }
    }

    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        unsafe { Self(vaddq_f32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        unsafe { Self(vsubq_f32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        unsafe { Self(vmulq_f32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn div(self, rhs: Self) -> Self {
        unsafe { Self(vdivq_f32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn reduce_sum(self) -> f32 {
        unsafe {
            let sum = vpaddq_f32(self.0, self.0);
            let sum = vpaddq_f32(sum, sum);
            vgetq_lane_f32::<0>(sum)
        }
    }

    #[inline(always)]
    fn truncate(self, lanes: usize) -> Self {
        let bits: [u32; 4] = std::array::from_fn(|i| if i < lanes { u32::MAX } else { 0 });
        unsafe {
            let mask = vld1q_u32(bits.as_ptr());
            Self(vreinterpretq_f32_u32(vandq_u32(
                vreinterpretq_u32_f32(self.0),
                mask,
            )))
        }
    }

    #[inline(always)]
    fn transpose_block(block: &mut [Self]) {
        debug_assert_eq!(block.len(), 4);
        unsafe {
            // zip1/zip2 are unpack-low/unpack-high
            let y0 = vzip1q_f32(block[0].0, block[1].0);
            let y1 = vzip2q_f32(block[0].0, block[1].0);
            let y2 = vzip1q_f32(block[2].0, block[3].0);
            let y3 = vzip2q_f32(block[2].0, block[3].0);

            block[0] = Self(vcombine_f32(vget_low_f32(y0), vget_low_f32(y2)));
            block[1] = Self(vcombine_f32(vget_high_f32(y0), vget_high_f32(y2)));
            block[2] = Self(vcombine_f32(vget_low_f32(y1), vget_low_f32(y3)));
            block[3] = Self(vcombine_f32(vget_high_f32(y1), vget_high_f32(y3)));
        }
    }
}

impl Register<f64> for F64x2 {
    const LANES: usize = 2;

    #[inline(always)]
    unsafe fn load(ptr: *const f64) -> Self {
        unsafe { Self(vld1q_f64(ptr)) }
    }

    #[inline(always)]
    unsafe fn loadu(ptr: *const f64) -> Self {
        unsafe { Self(vld1q_f64(ptr)) }
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut f64) {
        unsafe { vst1q_f64(ptr, self.0) }
    }

    #[inline(always)]
    unsafe fn storeu(self, ptr: *mut f64) {
        unsafe { vst1q_f64(ptr, self.0) }
    }

    #[inline(always)]
    fn splat(value: f64) -> Self {
        unsafe { Self(vdupq_n_f64(value)) }
    }

    #[inline(always)]
    fn zero() -> Self {
        unsafe { Self(vdupq_n_f64(0.0)) }
    }

    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        unsafe { Self(vaddq_f64(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        unsafe { Self(vsubq_f64(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        unsafe { Self(vmulq_f64(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn div(self, rhs: Self) -> Self {
        unsafe { Self(vdivq_f64(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn reduce_sum(self) -> f64 {
        unsafe { vgetq_lane_f64::<0>(vpaddq_f64(self.0, self.0)) }
    }

    #[inline(always)]
    fn truncate(self, lanes: usize) -> Self {
        let bits: [u64; 2] = std::array::from_fn(|i| if i < lanes { u64::MAX } else { 0 });
        unsafe {
            let mask = vld1q_u64(bits.as_ptr());
            Self(vreinterpretq_f64_u64(vandq_u64(
                vreinterpretq_u64_f64(self.0),
                mask,
            )))
        }
    }

    #[inline(always)]
    fn transpose_block(block: &mut [Self]) {
        debug_assert_eq!(block.len(), 2);
        unsafe {
            let low = vzip1q_f64(block[0].0, block[1].0);
            let high = vzip2q_f64(block[0].0, block[1].0);
            block[0] = Self(low);
            block[1] = Self(high);
        }
    }
}
