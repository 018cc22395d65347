use std::fmt;
use std::ops::{Add, Div, Index, IndexMut, Mul, Sub};

use crate::core::types::{Aligned, Dims};
use crate::core::KernelError;
use crate::ops::dispatch::{Fixed, MatVec3, MatVec4, Square3, Square4};
use crate::ops::matmul::{self, FixedMatMul};
use crate::ops::{elementwise, scalar, transpose};
use crate::simd::Element;

use super::vector::{Vec3, Vec4};

macro_rules! square_matrix {
    ($name:ident, $dim:literal, $len:literal, $vec:ident, $square:ident, $matvec:ident) => {
        /// Row-major square matrix stored on a 16-byte boundary
        #[derive(Clone, Copy, PartialEq, Default)]
        pub struct $name<T: Element> {
            data: Aligned<[T; $len]>,
        }

        impl<T: Element> $name<T> {
            pub const DIMS: Dims = Dims::new($dim, $dim);

            pub fn zero() -> Self {
                Self {
                    data: Aligned([T::ZERO; $len]),
                }
            }

            pub fn identity() -> Self {
                let mut m = Self::zero();
                for i in 0..$dim {
                    m.data[i * $dim + i] = T::ONE;
                }
                m
            }

            pub fn from_rows(rows: [[T; $dim]; $dim]) -> Self {
                let mut m = Self::zero();
                for (r, row) in rows.iter().enumerate() {
                    m.data[r * $dim..(r + 1) * $dim].copy_from_slice(row);
                }
                m
            }

            /// Builds a matrix from exactly `$len` row-major values
            pub fn from_slice(values: &[T]) -> Result<Self, KernelError> {
                let data: [T; $len] = values.try_into().map_err(|_| KernelError::DataLength {
                    dims: Self::DIMS,
                    expected: $len,
                    actual: values.len(),
                })?;
                Ok(Self {
                    data: Aligned(data),
                })
            }

            /// Row-major elements
            pub fn data(&self) -> &[T; $len] {
                &self.data.0
            }

            pub fn data_mut(&mut self) -> &mut [T; $len] {
                &mut self.data.0
            }

            pub fn transpose(&self) -> Self {
                let mut out = Self::zero();
                // SAFETY: distinct buffers of $len elements
                unsafe { transpose::transpose_fixed::<T, $dim>(self.data.as_ptr(), out.data.as_mut_ptr()) };
                out
            }

            /// Element-wise (Schur) product
            pub fn schur(&self, rhs: &Self) -> Self {
                self.combine(rhs, elementwise::schur::<T, Fixed<$len>>)
            }

            fn combine(&self, rhs: &Self, op: unsafe fn(*const T, *const T, *mut T, Fixed<$len>)) -> Self {
                let mut out = Self::zero();
                // SAFETY: aligned storage of exactly $len elements
                unsafe {
                    op(
                        self.data.as_ptr(),
                        rhs.data.as_ptr(),
                        out.data.as_mut_ptr(),
                        Fixed::<$len>,
                    )
                };
                out
            }

            fn scaled(&self, value: T, op: unsafe fn(*const T, T, *mut T, Fixed<$len>)) -> Self {
                let mut out = Self::zero();
                // SAFETY: aligned storage of exactly $len elements
                unsafe { op(self.data.as_ptr(), value, out.data.as_mut_ptr(), Fixed::<$len>) };
                out
            }
        }

        impl<T: FixedMatMul> $name<T> {
            pub fn mul_vec(&self, v: &$vec<T>) -> $vec<T> {
                let mut out = $vec::zero();
                // SAFETY: aligned operands of the fixed shape
                unsafe {
                    matmul::multiply(self.data.as_ptr(), v.data.as_ptr(), out.data.as_mut_ptr(), $matvec)
                };
                out
            }
        }

        impl<T: Element> Index<(usize, usize)> for $name<T> {
            type Output = T;

            fn index(&self, (row, col): (usize, usize)) -> &T {
                &self.data[row * $dim + col]
            }
        }

        impl<T: Element> IndexMut<(usize, usize)> for $name<T> {
            fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
                &mut self.data[row * $dim + col]
            }
        }

        impl<T: Element> Add for $name<T> {
            type Output = Self;

            fn add(self, rhs: Self) -> Self {
                self.combine(&rhs, elementwise::add::<T, Fixed<$len>>)
            }
        }

        impl<T: Element> Sub for $name<T> {
            type Output = Self;

            fn sub(self, rhs: Self) -> Self {
                self.combine(&rhs, elementwise::sub::<T, Fixed<$len>>)
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

        impl<T: FixedMatMul> Mul for $name<T> {
            type Output = Self;

            fn mul(self, rhs: Self) -> Self {
                let mut out = Self::zero();
                // SAFETY: aligned, non-overlapping operands of the fixed shape
                unsafe {
                    matmul::multiply(self.data.as_ptr(), rhs.data.as_ptr(), out.data.as_mut_ptr(), $square)
                };
                out
            }
        }

        impl<T: FixedMatMul> Mul<$vec<T>> for $name<T> {
            type Output = $vec<T>;

            fn mul(self, rhs: $vec<T>) -> $vec<T> {
                self.mul_vec(&rhs)
            }
        }

        impl<T: Element> fmt::Debug for $name<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_list().entries(self.data.chunks($dim)).finish()
            }
        }
    };
}

square_matrix!(Mat3, 3, 9, Vec3, Square3, MatVec3);
square_matrix!(Mat4, 4, 16, Vec4, Square4, MatVec4);

impl<T: Element> Mat3<T> {
    /// Rotation about the x axis by `angle` radians
    pub fn rotation_x(angle: T) -> Self {
        let (s, c) = angle.sin_cos();
        let (o, z) = (T::ONE, T::ZERO);
        Self::from_rows([[o, z, z], [z, c, -s], [z, s, c]])
    }

    pub fn rotation_y(angle: T) -> Self {
        let (s, c) = angle.sin_cos();
        let (o, z) = (T::ONE, T::ZERO);
        Self::from_rows([[c, z, s], [z, o, z], [-s, z, c]])
    }

    pub fn rotation_z(angle: T) -> Self {
        let (s, c) = angle.sin_cos();
        let (o, z) = (T::ONE, T::ZERO);
        Self::from_rows([[c, -s, z], [s, c, z], [z, z, o]])
    }

    pub fn scaling(factors: Vec3<T>) -> Self {
        let mut m = Self::zero();
        for i in 0..3 {
            m[(i, i)] = factors[i];
        }
        m
    }
}

impl<T: Element> Mat4<T> {
    /// Embeds a 3x3 linear part; the rest is identity
    pub fn from_linear(linear: &Mat3<T>) -> Self {
        let mut m = Self::identity();
        for r in 0..3 {
            for c in 0..3 {
                m[(r, c)] = linear[(r, c)];
            }
        }
        m
    }

    /// Upper-left 3x3 block
    pub fn linear(&self) -> Mat3<T> {
        let mut m = Mat3::zero();
        for r in 0..3 {
            for c in 0..3 {
                m[(r, c)] = self[(r, c)];
            }
        }
        m
    }

    /// Translation by `offset`, carried in the last column
    pub fn translation(offset: Vec3<T>) -> Self {
        let mut m = Self::identity();
        for r in 0..3 {
            m[(r, 3)] = offset[r];
        }
        m
    }

    pub fn translation_part(&self) -> Vec3<T> {
        Vec3::new(self[(0, 3)], self[(1, 3)], self[(2, 3)])
    }

    pub fn rotation_x(angle: T) -> Self {
        Self::from_linear(&Mat3::rotation_x(angle))
    }

    pub fn rotation_y(angle: T) -> Self {
        Self::from_linear(&Mat3::rotation_y(angle))
    }

    pub fn rotation_z(angle: T) -> Self {
        Self::from_linear(&Mat3::rotation_z(angle))
    }

    pub fn scaling(factors: Vec3<T>) -> Self {
        Self::from_linear(&Mat3::scaling(factors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::angle::radians;

    fn assert_mat4_close(a: &Mat4<f32>, b: &Mat4<f32>) {
        for (x, y) in a.data().iter().zip(b.data()) {
            assert!((x - y).abs() < 1e-5, "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn test_identity_product() {
        let m = Mat4::from_slice(&std::array::from_fn::<f32, 16, _>(|i| i as f32 + 1.0)).unwrap();
        assert_eq!(Mat4::identity() * m, m);
        assert_eq!(m * Mat4::identity(), m);

        let m3 = Mat3::from_rows([[1.0f64, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
        assert_eq!(m3 * Mat3::identity(), m3);
    }

    #[test]
    fn test_translation_moves_points() {
        let t = Mat4::translation(Vec3::new(1.0f32, 2.0, 3.0));
        let p = t * Vec4::new(1.0, 1.0, 1.0, 1.0);
        assert_eq!(p.to_array(), [2.0, 3.0, 4.0, 1.0]);
        assert_eq!(t.translation_part(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_rotation_z_quarter_turn() {
        let r = Mat4::rotation_z(radians(90.0f32));
        let p = r * Vec4::new(1.0, 0.0, 0.0, 1.0);
        assert!(p.x().abs() < 1e-6);
        assert!((p.y() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rotation_is_orthonormal() {
        let r = Mat4::rotation_x(0.3f32) * Mat4::rotation_y(-1.1) * Mat4::rotation_z(2.0);
        assert_mat4_close(&(r * r.transpose()), &Mat4::identity());
    }

    #[test]
    fn test_mat3_agrees_with_extended_mat4() {
        let a = Mat3::from_rows([[1.0f32, -2.0, 0.5], [3.0, 0.25, 4.0], [-1.0, 2.0, 6.0]]);
        let b = Mat3::rotation_y(0.7f32) * 2.0;
        let small = a * b;
        let big = Mat4::from_linear(&a) * Mat4::from_linear(&b);
        for (x, y) in small.data().iter().zip(big.linear().data()) {
            assert!((x - y).abs() < 1e-5);
        }
    }

    #[test]
    fn test_elementwise_operators() {
        let a = Mat3::from_rows([[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
        assert_eq!((a - a), Mat3::zero());
        assert_eq!((a + a), a * 2.0);
        assert_eq!((a * 2.0) / 2.0, a);
        assert_eq!(a.schur(&Mat3::identity()).data(), &[1.0, 0.0, 0.0, 0.0, 5.0, 0.0, 0.0, 0.0, 9.0]);
        assert_eq!(a.transpose()[(0, 2)], 7.0);
    }

    #[test]
    fn test_transpose_f64_swaps_indices() {
        let m = Mat4::from_slice(&std::array::from_fn::<f64, 16, _>(|i| i as f64)).unwrap();
        let t = m.transpose();
        for r in 0..4 {
            for c in 0..4 {
                assert_eq!(t[(r, c)], m[(c, r)]);
            }
        }
        assert_eq!(t.transpose(), m);
    }

    #[test]
    fn test_from_slice_rejects_wrong_length() {
        let err = Mat4::<f64>::from_slice(&[0.0; 9]).unwrap_err();
        assert_eq!(
            err,
            KernelError::DataLength {
                dims: Dims::new(4, 4),
                expected: 16,
                actual: 9
            }
        );
    }
}
