//! 128-bit vector-lane abstraction
//!
//! Every kernel in `ops` is written against the `Register` and `Element`
//! traits defined here; this is the only module that touches
//! architecture-specific intrinsics.
//!
//! Backend selection is compile-time:
//! - x86_64: SSE2 (`__m128` / `__m128d`), SSE3 horizontal adds when enabled
//! - aarch64: NEON (`float32x4_t` / `float64x2_t`)
//! - anything else: the portable array backend

pub mod lanes;
pub mod portable;

#[cfg(target_arch = "x86_64")]
mod x86;
#[cfg(target_arch = "x86_64")]
pub use x86::{F32x4, F64x2};

#[cfg(target_arch = "aarch64")]
mod neon;
#[cfg(target_arch = "aarch64")]
pub use neon::{F32x4, F64x2};

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
pub use portable::{F32x4, F64x2};

pub use lanes::{Element, Register, load_partial, store_partial};

/// Name of the register backend this build was compiled against
#[cfg(all(target_arch = "x86_64", target_feature = "sse3"))]
pub const BACKEND: &str = "SSE2+SSE3";
#[cfg(all(target_arch = "x86_64", not(target_feature = "sse3")))]
pub const BACKEND: &str = "SSE2";
#[cfg(target_arch = "aarch64")]
pub const BACKEND: &str = "NEON";
#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
pub const BACKEND: &str = "portable";

/// Register width in bytes, identical for every backend
pub const REGISTER_BYTES: usize = 16;
