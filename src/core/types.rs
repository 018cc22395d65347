use std::fmt;
use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::simd::Element;

/// Element type identifier - drives lane width and kernel selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// Single precision, 4 lanes per 128-bit register
    F32,
    /// Double precision, 2 lanes per 128-bit register
    F64,
}

impl ElementType {
    /// Size of one element in bytes
    pub fn size(&self) -> usize {
        match self {
            ElementType::F32 => 4,
            ElementType::F64 => 8,
        }
    }

    /// Lanes held by one 128-bit register
    pub fn lanes(&self) -> usize {
        16 / self.size()
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::F32 => f.pad("f32"),
            ElementType::F64 => f.pad("f64"),
        }
    }
}

/// Logical shape of a row-major matrix buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dims {
    pub rows: usize,
    pub cols: usize,
}

impl Dims {
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Total number of elements (rows * cols)
    pub const fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// `rows * cols`, or `None` when the product does not fit in `usize`
    pub const fn checked_len(&self) -> Option<usize> {
        self.rows.checked_mul(self.cols)
    }

    pub const fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }
}

impl fmt::Display for Dims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// Forces 16-byte (one register) alignment on the wrapped value.
///
/// `Aligned([f32; 16])` is a 4x4 matrix buffer usable with the aligned
/// load/store paths.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[repr(C, align(16))]
pub struct Aligned<A>(pub A);

impl<A> Deref for Aligned<A> {
    type Target = A;

    fn deref(&self) -> &A {
        &self.0
    }
}

impl<A> DerefMut for Aligned<A> {
    fn deref_mut(&mut self) -> &mut A {
        &mut self.0
    }
}

/// Heap buffer whose first element sits on a 16-byte boundary.
///
/// Backing storage is a vector of aligned 4-element chunks, so every
/// register-sized offset from the start stays aligned as well. Only the
/// kernel element types are accepted: a chunk of four f32 or f64 fills its
/// 16-byte alignment exactly, which keeps the chunks contiguous.
///
/// ```compile_fail
/// let bytes = simd_calc::AlignedBuf::<u8>::zeroed(8);
/// ```
#[derive(Clone, PartialEq)]
pub struct AlignedBuf<T: Element> {
    chunks: Vec<Aligned<[T; 4]>>,
    len: usize,
}

impl<T: Element> AlignedBuf<T> {
    /// Buffer of `len` zero elements
    pub fn zeroed(len: usize) -> Self {
        Self {
            chunks: vec![Aligned([T::ZERO; 4]); len.div_ceil(4)],
            len,
        }
    }

    pub fn from_slice(values: &[T]) -> Self {
        let mut buf = Self::zeroed(values.len());
        buf.copy_from_slice(values);
        buf
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T: Element> Deref for AlignedBuf<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        // SAFETY: Aligned<[T; 4]> is exactly 4 * size_of::<T>() bytes for
        // f32 and f64, so the chunks form one packed run of elements
        unsafe { std::slice::from_raw_parts(self.chunks.as_ptr().cast::<T>(), self.len) }
    }
}

impl<T: Element> DerefMut for AlignedBuf<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        // SAFETY: see `deref`
        unsafe { std::slice::from_raw_parts_mut(self.chunks.as_mut_ptr().cast::<T>(), self.len) }
    }
}

impl<T: Element> fmt::Debug for AlignedBuf<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
