use thiserror::Error;

use super::types::Dims;

/// Contract violations reported by the checked kernel layer.
///
/// The raw kernels in `ops` never produce these; they treat the same
/// conditions as caller preconditions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KernelError {
    #[error("{operand} holds {actual} elements, expected at least {expected}")]
    LengthMismatch {
        operand: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{operand} is not aligned to {align} bytes")]
    Misaligned { operand: &'static str, align: usize },

    #[error("cannot multiply a {lhs} matrix by a {rhs} matrix")]
    ShapeMismatch { lhs: Dims, rhs: Dims },

    #[error("{dims} matrix has more elements than fit in memory")]
    TooLarge { dims: Dims },

    #[error("{dims} matrix needs {expected} values, got {actual}")]
    DataLength {
        dims: Dims,
        expected: usize,
        actual: usize,
    },
}
