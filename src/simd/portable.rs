//! Portable registers: fixed-width arrays the optimizer can vectorize.
//!
//! Used as the native backend on targets without SSE2/NEON, and compiled
//! everywhere so the intrinsic backends can be checked against it.

use super::lanes::Register;

macro_rules! portable_register {
    ($name:ident, $elem:ty, $lanes:literal) => {
        #[derive(Clone, Copy, Debug, Default, PartialEq)]
        #[repr(C, align(16))]
        pub struct $name(pub [$elem; $lanes]);

        impl $name {
            #[inline(always)]
            fn zip(self, rhs: Self, f: impl Fn($elem, $elem) -> $elem) -> Self {
                Self(std::array::from_fn(|i| f(self.0[i], rhs.0[i])))
            }
        }

        impl Register<$elem> for $name {
            const LANES: usize = $lanes;

            #[inline(always)]
            unsafe fn load(ptr: *const $elem) -> Self {
                debug_assert_eq!(ptr as usize % 16, 0, "unaligned register load");
                unsafe { Self(std::ptr::read(ptr.cast::<[$elem; $lanes]>())) }
            }

            #[inline(always)]
            unsafe fn loadu(ptr: *const $elem) -> Self {
                unsafe { Self(std::ptr::read_unaligned(ptr.cast::<[$elem; $lanes]>())) }
            }

            #[inline(always)]
            unsafe fn store(self, ptr: *mut $elem) {
                debug_assert_eq!(ptr as usize % 16, 0, "unaligned register store");
                unsafe { std::ptr::write(ptr.cast::<[$elem; $lanes]>(), self.0) }
            }

            #[inline(always)]
            unsafe fn storeu(self, ptr: *mut $elem) {
                unsafe { std::ptr::write_unaligned(ptr.cast::<[$elem; $lanes]>(), self.0) }
            }

            #[inline(always)]
            fn splat(value: $elem) -> Self {
                Self([value; $lanes])
            }

            #[inline(always)]
            fn zero() -> Self {
                Self([0.0; $lanes])
            }

            #[inline(always)]
            fn add(self, rhs: Self) -> Self {
                self.zip(rhs, |a, b| a + b)
            }

            #[inline(always)]
            fn sub(self, rhs: Self) -> Self {
                self.zip(rhs, |a, b| a - b)
            }

            #[inline(always)]
            fn mul(self, rhs: Self) -> Self {
                self.zip(rhs, |a, b| a * b)
            }

            #[inline(always)]
            fn div(self, rhs: Self) -> Self {
                self.zip(rhs, |a, b| a / b)
            }

            #[inline(always)]
            fn reduce_sum(self) -> $elem {
                let mut lanes = self.0;
                let mut width = $lanes;
                while width > 1 {
                    width /= 2;
                    for i in 0..width {
                        lanes[i] = lanes[2 * i] + lanes[2 * i + 1];
                    }
                }
                lanes[0]
            }

            #[inline(always)]
            fn truncate(self, lanes: usize) -> Self {
                Self(std::array::from_fn(|i| if i < lanes { self.0[i] } else { 0.0 }))
            }

            #[inline(always)]
            fn transpose_block(block: &mut [Self]) {
                debug_assert_eq!(block.len(), $lanes);
                let rows: [[$elem; $lanes]; $lanes] = std::array::from_fn(|i| block[i].0);
                for (i, reg) in block.iter_mut().enumerate() {
                    *reg = Self(std::array::from_fn(|j| rows[j][i]));
                }
            }
        }
    };
}

portable_register!(F32x4, f32, 4);
portable_register!(F64x2, f64, 2);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Aligned;

    #[test]
    fn test_pairwise_reduction() {
        let reg = F32x4([1.0, 2.0, 3.0, 4.0]);
        assert_eq!(reg.reduce_sum(), 10.0);
        assert_eq!(F64x2([0.5, 0.25]).reduce_sum(), 0.75);
    }

    #[test]
    fn test_transpose_matches_native() {
        use crate::simd::Element;

        let data = Aligned([
            0.5f32, 1.5, 2.5, 3.5, 4.5, 5.5, 6.5, 7.5, 8.5, 9.5, 10.5, 11.5, 12.5, 13.5, 14.5, 15.5,
        ]);
        let mut portable: Vec<F32x4> = (0..4)
            .map(|i| unsafe { F32x4::load(data.0.as_ptr().add(i * 4)) })
            .collect();
        let mut native: Vec<<f32 as Element>::Reg> = (0..4)
            .map(|i| unsafe { <f32 as Element>::Reg::load(data.0.as_ptr().add(i * 4)) })
            .collect();
        F32x4::transpose_block(&mut portable);
        <f32 as Element>::Reg::transpose_block(&mut native);

        for (p, n) in portable.iter().zip(&native) {
            let mut out = Aligned([0.0f32; 4]);
            unsafe { n.store(out.0.as_mut_ptr()) };
            assert_eq!(p.0, out.0);
        }
    }

    #[test]
    fn test_truncate() {
        assert_eq!(F32x4([1.0; 4]).truncate(2).0, [1.0, 1.0, 0.0, 0.0]);
    }
}
