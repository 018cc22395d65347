//! Compile-time kernel selection
//!
//! Shape tags are zero-sized (or plain-data) types; every decision below is
//! made on const generics and associated consts, so after monomorphization
//! no shape check survives in the generated code.
//!
//! Element-wise and scalar operators are described as a pass plan: a
//! sequence of full-register passes at fixed element offsets plus at most
//! one trailing partial pass. `ShapeTag::drive` emits that plan; the
//! operator supplies what a pass does.

use crate::simd::Element;

use super::matmul::{self, FixedMatMul};

/// Shape of an element-wise or scalar operation
pub trait ShapeTag: Copy {
    /// Number of elements every operand holds
    fn elements(self) -> usize;

    /// Emits the pass plan for `T`: `full(offset)` for each whole register,
    /// then `partial(offset, count)` for a tail shorter than one register.
    fn drive<T: Element>(self, full: impl FnMut(usize), partial: impl FnMut(usize, usize));
}

/// Compile-time element count. 2, 3, 4, 9 and 16 are unrolled; any other
/// count runs the generic strided loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fixed<const N: usize>;

/// Element count known only at runtime (the generic path)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dynamic {
    elements: usize,
}

impl Dynamic {
    pub const fn new(elements: usize) -> Self {
        Self { elements }
    }

    /// Length given in bytes of `T`; trailing bytes short of one element are ignored
    pub const fn from_bytes<T: Element>(bytes: usize) -> Self {
        Self {
            elements: bytes / std::mem::size_of::<T>(),
        }
    }
}

impl<const N: usize> Fixed<N> {
    /// Whether `N` has an unrolled pass plan
    pub const SPECIALIZED: bool = matches!(N, 2 | 3 | 4 | 9 | 16);
}

impl<const N: usize> ShapeTag for Fixed<N> {
    #[inline(always)]
    fn elements(self) -> usize {
        N
    }

    #[inline(always)]
    fn drive<T: Element>(
        self,
        mut full: impl FnMut(usize),
        mut partial: impl FnMut(usize, usize),
    ) {
        match (N, T::LANES) {
            // f32: 4 lanes
            (2, 4) => partial(0, 2),
            (3, 4) => partial(0, 3),
            (4, 4) => full(0),
            (9, 4) => {
                full(0);
                full(4);
                partial(8, 1);
            }
            (16, 4) => {
                full(0);
                full(4);
                full(8);
                full(12);
            }
            // f64: 2 lanes
            (2, 2) => full(0),
            (3, 2) => {
                full(0);
                partial(2, 1);
            }
            (4, 2) => {
                full(0);
                full(2);
            }
            (9, 2) => {
                full(0);
                full(2);
                full(4);
                full(6);
                partial(8, 1);
            }
            (16, 2) => {
                full(0);
                full(2);
                full(4);
                full(6);
                full(8);
                full(10);
                full(12);
                full(14);
            }
            _ => Dynamic::new(N).drive::<T>(full, partial),
        }
    }
}

impl ShapeTag for Dynamic {
    #[inline(always)]
    fn elements(self) -> usize {
        self.elements
    }

    #[inline(always)]
    fn drive<T: Element>(
        self,
        mut full: impl FnMut(usize),
        mut partial: impl FnMut(usize, usize),
    ) {
        let lanes = T::LANES;
        let whole = self.elements / lanes;
        for pass in 0..whole {
            full(pass * lanes);
        }
        let tail = self.elements % lanes;
        if tail != 0 {
            partial(whole * lanes, tail);
        }
    }
}

/// Shape of a matrix product
pub trait MulShape: Copy {
    fn lhs_len(self) -> usize;
    fn rhs_len(self) -> usize;
    fn out_len(self) -> usize;

    /// # Safety
    /// `lhs`, `rhs` and `out` must be valid for `lhs_len`, `rhs_len` and
    /// `out_len` elements, with the alignment the selected kernel documents.
    unsafe fn multiply<T: FixedMatMul>(self, lhs: *const T, rhs: *const T, out: *mut T);
}

/// 4x4 · 4x4, both operands 16-byte aligned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Square4;

/// 3x3 · 3x3, packed rows, no alignment requirement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Square3;

/// 4x4 · 4x1, both operands 16-byte aligned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatVec4;

/// 3x3 · 3x1, no alignment requirement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatVec3;

/// M×K · K×N with the right operand in row-major order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct General {
    pub m: usize,
    pub k: usize,
    pub n: usize,
}

/// M×K · (N×K)ᵀ: the right operand supplies each column as a contiguous row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowVectors {
    pub m: usize,
    pub k: usize,
    pub n: usize,
}

impl MulShape for Square4 {
    fn lhs_len(self) -> usize {
        16
    }
    fn rhs_len(self) -> usize {
        16
    }
    fn out_len(self) -> usize {
        16
    }

    #[inline(always)]
    unsafe fn multiply<T: FixedMatMul>(self, lhs: *const T, rhs: *const T, out: *mut T) {
        unsafe { T::mul_4x4(lhs, rhs, out) }
    }
}

impl MulShape for Square3 {
    fn lhs_len(self) -> usize {
        9
    }
    fn rhs_len(self) -> usize {
        9
    }
    fn out_len(self) -> usize {
        9
    }

    #[inline(always)]
    unsafe fn multiply<T: FixedMatMul>(self, lhs: *const T, rhs: *const T, out: *mut T) {
        unsafe { T::mul_3x3(lhs, rhs, out) }
    }
}

impl MulShape for MatVec4 {
    fn lhs_len(self) -> usize {
        16
    }
    fn rhs_len(self) -> usize {
        4
    }
    fn out_len(self) -> usize {
        4
    }

    #[inline(always)]
    unsafe fn multiply<T: FixedMatMul>(self, lhs: *const T, rhs: *const T, out: *mut T) {
        unsafe { T::mul_4x4_vec(lhs, rhs, out) }
    }
}

impl MulShape for MatVec3 {
    fn lhs_len(self) -> usize {
        9
    }
    fn rhs_len(self) -> usize {
        3
    }
    fn out_len(self) -> usize {
        3
    }

    #[inline(always)]
    unsafe fn multiply<T: FixedMatMul>(self, lhs: *const T, rhs: *const T, out: *mut T) {
        unsafe { T::mul_3x3_vec(lhs, rhs, out) }
    }
}

impl MulShape for General {
    fn lhs_len(self) -> usize {
        self.m * self.k
    }
    fn rhs_len(self) -> usize {
        self.k * self.n
    }
    fn out_len(self) -> usize {
        self.m * self.n
    }

    unsafe fn multiply<T: FixedMatMul>(self, lhs: *const T, rhs: *const T, out: *mut T) {
        unsafe { matmul::matmul(lhs, rhs, out, self.m, self.k, self.n) }
    }
}

impl MulShape for RowVectors {
    fn lhs_len(self) -> usize {
        self.m * self.k
    }
    fn rhs_len(self) -> usize {
        self.n * self.k
    }
    fn out_len(self) -> usize {
        self.m * self.n
    }

    unsafe fn multiply<T: FixedMatMul>(self, lhs: *const T, rhs: *const T, out: *mut T) {
        unsafe { matmul::matmul_rows(lhs, rhs, out, self.m, self.k, self.n) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan<T: Element, S: ShapeTag>(shape: S) -> (Vec<usize>, Vec<(usize, usize)>) {
        let mut full = Vec::new();
        let mut partial = Vec::new();
        shape.drive::<T>(|at| full.push(at), |at, count| partial.push((at, count)));
        (full, partial)
    }

    #[test]
    fn test_fixed_plans_f32() {
        assert_eq!(plan::<f32, _>(Fixed::<16>), (vec![0, 4, 8, 12], vec![]));
        assert_eq!(plan::<f32, _>(Fixed::<9>), (vec![0, 4], vec![(8, 1)]));
        assert_eq!(plan::<f32, _>(Fixed::<4>), (vec![0], vec![]));
        assert_eq!(plan::<f32, _>(Fixed::<3>), (vec![], vec![(0, 3)]));
        assert_eq!(plan::<f32, _>(Fixed::<2>), (vec![], vec![(0, 2)]));
    }

    #[test]
    fn test_fixed_plans_f64() {
        assert_eq!(
            plan::<f64, _>(Fixed::<16>),
            (vec![0, 2, 4, 6, 8, 10, 12, 14], vec![])
        );
        assert_eq!(plan::<f64, _>(Fixed::<9>), (vec![0, 2, 4, 6], vec![(8, 1)]));
        assert_eq!(plan::<f64, _>(Fixed::<3>), (vec![0], vec![(2, 1)]));
        assert_eq!(plan::<f64, _>(Fixed::<2>), (vec![0], vec![]));
    }

    #[test]
    fn test_pass_count_is_ceil_of_lanes() {
        fn passes<T: Element, S: ShapeTag>(shape: S) -> usize {
            let (full, partial) = plan::<T, S>(shape);
            full.len() + partial.len()
        }
        assert_eq!(passes::<f32, _>(Fixed::<9>), 3);
        assert_eq!(passes::<f64, _>(Fixed::<9>), 5);
        assert_eq!(passes::<f32, _>(Fixed::<16>), 4);
        assert_eq!(passes::<f32, _>(Dynamic::new(13)), 4);
    }

    #[test]
    fn test_unspecialized_fixed_matches_dynamic() {
        assert!(!Fixed::<7>::SPECIALIZED);
        assert!(Fixed::<9>::SPECIALIZED);
        assert_eq!(plan::<f32, _>(Fixed::<7>), plan::<f32, _>(Dynamic::new(7)));
        assert_eq!(plan::<f32, _>(Dynamic::new(7)), (vec![0], vec![(4, 3)]));
    }

    #[test]
    fn test_dynamic_from_bytes() {
        assert_eq!(Dynamic::from_bytes::<f32>(64).elements(), 16);
        assert_eq!(Dynamic::from_bytes::<f64>(72).elements(), 9);
        assert_eq!(Dynamic::from_bytes::<f32>(0).elements(), 0);
    }

    #[test]
    fn test_mul_shape_lengths() {
        let shape = General { m: 2, k: 3, n: 5 };
        assert_eq!((shape.lhs_len(), shape.rhs_len(), shape.out_len()), (6, 15, 10));
        let rows = RowVectors { m: 2, k: 3, n: 5 };
        assert_eq!(rows.rhs_len(), 15);
        assert_eq!(MatVec3.out_len(), 3);
    }
}
