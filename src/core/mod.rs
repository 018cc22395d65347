pub mod error;
pub mod types;

pub use error::KernelError;
pub use types::{Aligned, AlignedBuf, Dims, ElementType};
