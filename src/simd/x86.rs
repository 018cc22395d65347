//! SSE2 registers for x86_64.

use std::arch::x86_64::*;

use super::lanes::Register;

/// Four `f32` lanes in an `__m128`.
#[derive(Clone, Copy, Debug)]
#[repr(transparent)]
pub struct F32x4(__m128);

/// Two `f64` lanes in an `__m128d`.
#[derive(Clone, Copy, Debug)]
#[repr(transparent)]
pub struct F64x2(__m128d);

impl Register<f32> for F32x4 {
    const LANES: usize = 4;

    #[inline(always)]
    unsafe fn load(ptr: *const f32) -> Self {
        unsafe { Self(_mm_load_ps(ptr)) }
    }

    #[inline(always)]
    unsafe fn loadu(ptr: *const f32) -> Self {
        unsafe { Self(_mm_loadu_ps(ptr)) }
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut f32) {
        unsafe { _mm_store_ps(ptr, self.0) }
    }

    #[inline(always)]
    unsafe fn storeu(self, ptr: *mut f32) {
        unsafe { _mm_storeu_ps(ptr, self.0) }
    }

    #[inline(always)]
    fn splat(value: f32) -> Self {
        unsafe { Self(_mm_set1_ps(value)) }
    }

    #[inline(always)]
    fn zero() -> Self {
        unsafe { Self(_mm_setzero_ps()) }
    }

    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        unsafe { Self(_mm_add_ps(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        unsafe { Self(_mm_sub_ps(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        unsafe { Self(_mm_mul_ps(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn div(self, rhs: Self) -> Self {
        unsafe { Self(_mm_div_ps(self.0, rhs.0)) }
    }

    #[cfg(target_feature = "sse3")]
    #[inline(always)]
    fn reduce_sum(self) -> f32 {
        unsafe {
            let sum = _mm_hadd_ps(self.0, self.0);
            let sum = _mm_hadd_ps(sum, sum);
            _mm_cvtss_f32(sum)
        }
    }

    #[cfg(not(target_feature = "sse3"))]
    #[inline(always)]
    fn reduce_sum(self) -> f32 {
        unsafe {
            // [a0+a2, a1+a3, ..] then lane 1 folded onto lane 0
            let high = _mm_movehl_ps(self.0, self.0);
            let pairs = _mm_add_ps(self.0, high);
            let odd = _mm_shuffle_ps::<0b01>(pairs, pairs);
            _mm_cvtss_f32(_mm_add_ss(pairs, odd))
        }
    }

    #[inline(always)]
    fn truncate(self, lanes: usize) -> Self {
        let bits: [u32; 4] = std::array::from_fn(|i| if i < lanes { u32::MAX } else { 0 });
        unsafe {
            let mask = _mm_loadu_ps(bits.as_ptr().cast::<f32>());
            Self(_mm_and_ps(self.0, mask))
        }
    }

    #[inline(always)]
    fn transpose_block(block: &mut [Self]) {
        debug_assert_eq!(block.len(), 4);
        unsafe {
            let y0 = _mm_unpacklo_ps(block[0].0, block[1].0);
            let y1 = _mm_unpackhi_ps(block[0].0, block[1].0);
            let y2 = _mm_unpacklo_ps(block[2].0, block[3].0);
            let y3 = _mm_unpackhi_ps(block[2].0, block[3].0);

            block[0] = Self(_mm_movelh_ps(y0, y2));
            block[1] = Self(_mm_movehl_ps(y2, y0));
            block[2] = Self(_mm_movelh_ps(y1, y3));
            block[3] = Self(_mm_movehl_ps(y3, y1));
        }
    }
}

impl Register<f64> for F64x2 {
    const LANES: usize = 2;

    #[inline(always)]
    unsafe fn load(ptr: *const f64) -> Self {
        unsafe { Self(_mm_load_pd(ptr)) }
    }

    #[inline(always)]
    unsafe fn loadu(ptr: *const f64) -> Self {
        unsafe { Self(_mm_loadu_pd(ptr)) }
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut f64) {
        unsafe { _mm_store_pd(ptr, self.0) }
    }

    #[inline(always)]
    unsafe fn storeu(self, ptr: *mut f64) {
        unsafe { _mm_storeu_pd(ptr, self.0) }
    }

    #[inline(always)]
    fn splat(value: f64) -> Self {
        unsafe { Self(_mm_set1_pd(value)) }
    }

    #[inline(always)]
    fn zero() -> Self {
        unsafe { Self(_mm_setzero_pd()) }
    }

    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        unsafe { Self(_mm_add_pd(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        unsafe { Self(_mm_sub_pd(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        unsafe { Self(_mm_mul_pd(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn div(self, rhs: Self) -> Self {
        unsafe { Self(_mm_div_pd(self.0, rhs.0)) }
    }

    #[cfg(target_feature = "sse3")]
    #[inline(always)]
    fn reduce_sum(self) -> f64 {
        unsafe { _mm_cvtsd_f64(_mm_hadd_pd(self.0, self.0)) }
    }

    #[cfg(not(target_feature = "sse3"))]
    #[inline(always)]
    fn reduce_sum(self) -> f64 {
        unsafe {
            let high = _mm_unpackhi_pd(self.0, self.0);
            _mm_cvtsd_f64(_mm_add_sd(self.0, high))
        }
    }

    #[inline(always)]
    fn truncate(self, lanes: usize) -> Self {
        let bits: [u64; 2] = std::array::from_fn(|i| if i < lanes { u64::MAX } else { 0 });
        unsafe {
            let mask = _mm_loadu_pd(bits.as_ptr().cast::<f64>());
            Self(_mm_and_pd(self.0, mask))
        }
    }

    #[inline(always)]
    fn transpose_block(block: &mut [Self]) {
        debug_assert_eq!(block.len(), 2);
        unsafe {
            let low = _mm_unpacklo_pd(block[0].0, block[1].0);
            let high = _mm_unpackhi_pd(block[0].0, block[1].0);
            block[0] = Self(low);
            block[1] = Self(high);
        }
    }
}
