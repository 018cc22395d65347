use std::ops::{Add, Div, Index, IndexMut, Mul, Neg, Sub};

use crate::core::types::Aligned;
use crate::ops::dispatch::Fixed;
use crate::ops::{elementwise, scalar};
use crate::simd::Element;

macro_rules! vector_type {
    ($name:ident, $len:literal, [$($field:ident => $idx:literal),+]) => {
        /// Column vector stored on a 16-byte boundary
        #[derive(Debug, Clone, Copy, PartialEq, Default)]
        pub struct $name<T: Element> {
            pub(crate) data: Aligned<[T; $len]>,
        }

        impl<T: Element> $name<T> {
            pub fn new($($field: T),+) -> Self {
                Self { data: Aligned([$($field),+]) }
            }

            pub fn zero() -> Self {
                Self::splat(T::ZERO)
            }

            pub fn splat(value: T) -> Self {
                Self { data: Aligned([value; $len]) }
            }

            pub fn from_array(values: [T; $len]) -> Self {
                Self { data: Aligned(values) }
            }

            pub fn to_array(self) -> [T; $len] {
                self.data.0
            }

            $(
                pub fn $field(&self) -> T {
                    self.data[$idx]
                }
            )+

            pub fn dot(&self, rhs: &Self) -> T {
                let mut products = Aligned([T::ZERO; $len]);
                // SAFETY: all three buffers are aligned and hold $len elements
                unsafe {
                    elementwise::schur(
                        self.data.as_ptr(),
                        rhs.data.as_ptr(),
                        products.as_mut_ptr(),
                        Fixed::<$len>,
                    )
                };
                products.iter().fold(T::ZERO, |acc, &v| acc + v)
            }

            pub fn length(&self) -> T {
                self.dot(self).sqrt()
            }

            /// Unit vector in the same direction; the zero vector stays zero
            pub fn normalize(&self) -> Self {
                let len = self.length();
                if len == T::ZERO { *self } else { *self / len }
            }

            fn combine(self, rhs: Self, op: unsafe fn(*const T, *const T, *mut T, Fixed<$len>)) -> Self {
                let mut out = Self::zero();
                // SAFETY: aligned storage of exactly $len elements
                unsafe { op(self.data.as_ptr(), rhs.data.as_ptr(), out.data.as_mut_ptr(), Fixed::<$len>) };
                out
            }

            fn scaled(self, value: T, op: unsafe fn(*const T, T, *mut T, Fixed<$len>)) -> Self {
                let mut out = Self::zero();
                // SAFETY: aligned storage of exactly $len elements
                unsafe { op(self.data.as_ptr(), value, out.data.as_mut_ptr(), Fixed::<$len>) };
                out
            }
        }

        impl<T: Element> Index<usize> for $name<T> {
            type Output = T;

            fn index(&self, index: usize) -> &T {
                &self.data[index]
            }
        }

        impl<T: Element> IndexMut<usize> for $name<T> {
            fn index_mut(&mut self, index: usize) -> &mut T {
                &mut self.data[index]
            }
        }

        impl<T: Element> Add for $name<T> {
            type Output = Self;

            fn add(self, rhs: Self) -> Self {
                self.combine(rhs, elementwise::add::<T, Fixed<$len>>)
            }
        }

        impl<T: Element> Sub for $name<T> {
            type Output = Self;

            fn sub(self, rhs: Self) -> Self {
                self.combine(rhs, elementwise::sub::<T, Fixed<$len>>)
            }
        }

        impl<T: Element> Mul<T> for $name<T> {
            type Output = Self;

            fn mul(self, rhs: T) -> Self {
                self.scaled(rhs, scalar::mul::<T, Fixed<$len>>)
            }
        }

        impl<T: Element> Div<T> for $name<T> {
            type Output = Self;

            fn div(self, rhs: T) -> Self {
                self.scaled(rhs, scalar::div::<T, Fixed<$len>>)
            }
        }

        impl<T: Element> Neg for $name<T> {
            type Output = Self;

            fn neg(self) -> Self {
                self * -T::ONE
            }
        }
    };
}

vector_type!(Vec3, 3, [x => 0, y => 1, z => 2]);
vector_type!(Vec4, 4, [x => 0, y => 1, z => 2, w => 3]);

impl<T: Element> Vec3<T> {
    pub fn cross(&self, rhs: &Self) -> Self {
        Self::new(
            self.y() * rhs.z() - self.z() * rhs.y(),
            self.z() * rhs.x() - self.x() * rhs.z(),
            self.x() * rhs.y() - self.y() * rhs.x(),
        )
    }

    /// Homogeneous point (w = 1)
    pub fn extend(self, w: T) -> Vec4<T> {
        Vec4::new(self.x(), self.y(), self.z(), w)
    }
}

impl<T: Element> Vec4<T> {
    pub fn truncate(self) -> Vec3<T> {
        Vec3::new(self.x(), self.y(), self.z())
    }
}
