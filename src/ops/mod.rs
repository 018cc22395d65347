// Shape tags and compile-time kernel selection
pub mod dispatch;

// Lane-wise kernels
pub mod elementwise;
pub mod scalar;

// Multiplication and register-level transposition
pub mod matmul;
pub mod transpose;

// Utility functions
pub mod cpu_features;

pub use dispatch::{Dynamic, Fixed, General, MatVec3, MatVec4, MulShape, RowVectors, ShapeTag, Square3, Square4};
pub use matmul::FixedMatMul;
