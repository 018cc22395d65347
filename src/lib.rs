//! 128-bit SIMD kernels for small dense matrices.
//!
//! Layers, bottom-up:
//! - `simd`: the `Register`/`Element` lane abstraction and its SSE2, NEON and
//!   portable backends
//! - `ops`: raw pointer kernels (element-wise, scalar, multiply, transpose)
//!   selected at compile time through shape tags
//! - `checked`: slice API validating lengths, shapes and alignment once
//! - `math`: `Mat4`/`Mat3`/`Vec4`/`Vec3` transform types over the kernels
//! - `harness`: verification, timing and JSON plumbing for the binary

pub mod checked;
pub mod core;
pub mod harness;
pub mod math;
pub mod ops;
pub mod simd;

pub use crate::checked::{BinaryKind, MulKernel, ScalarKind};
pub use crate::core::{Aligned, AlignedBuf, Dims, ElementType, KernelError};
pub use crate::math::{Mat3, Mat4, Vec3, Vec4, degrees, radians};
pub use crate::ops::FixedMatMul;
pub use crate::simd::{Element, Register};
