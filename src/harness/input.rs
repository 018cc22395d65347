//! JSON matrices for the `multiply` command

use serde::{Deserialize, Serialize};

use crate::checked::{self, MulKernel};
use crate::core::{AlignedBuf, Dims, ElementType, KernelError};
use crate::ops::matmul::FixedMatMul;

/// `{ "rows": 2, "cols": 2, "data": [1, 2, 3, 4] }`, row-major
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixJson {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f64>,
}

impl MatrixJson {
    pub fn dims(&self) -> Dims {
        Dims::new(self.rows, self.cols)
    }

    fn to_buffer<T: FixedMatMul>(&self) -> Result<AlignedBuf<T>, KernelError> {
        let dims = self.dims();
        let expected = dims.checked_len().ok_or(KernelError::TooLarge { dims })?;
        if self.data.len() != expected {
            return Err(KernelError::DataLength {
                dims,
                expected,
                actual: self.data.len(),
            });
        }
        let values: Vec<T> = self.data.iter().map(|&v| T::from_f64(v)).collect();
        Ok(AlignedBuf::from_slice(&values))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MultiplyInput {
    pub lhs: MatrixJson,
    pub rhs: MatrixJson,
}

#[derive(Debug, Clone, Serialize)]
pub struct MultiplyOutput {
    pub precision: ElementType,
    pub kernel: MulKernel,
    pub product: MatrixJson,
}

fn multiply_as<T: FixedMatMul>(input: &MultiplyInput) -> Result<MultiplyOutput, KernelError> {
    let lhs = input.lhs.to_buffer::<T>()?;
    let rhs = input.rhs.to_buffer::<T>()?;
    let out_dims = Dims::new(input.lhs.rows, input.rhs.cols);
    let out_len = out_dims.checked_len().ok_or(KernelError::TooLarge { dims: out_dims })?;
    let mut out = AlignedBuf::<T>::zeroed(out_len);

    let kernel = checked::select_kernel(&lhs, input.lhs.dims(), &rhs, input.rhs.dims(), &out);
    let dims = checked::multiply(&lhs, input.lhs.dims(), &rhs, input.rhs.dims(), &mut out)?;

    Ok(MultiplyOutput {
        precision: T::KIND,
        kernel,
        product: MatrixJson {
            rows: dims.rows,
            cols: dims.cols,
            data: out.iter().map(|v| v.to_f64()).collect(),
        },
    })
}

/// Multiplies the two matrices at the requested precision
pub fn multiply(input: &MultiplyInput, precision: ElementType) -> Result<MultiplyOutput, KernelError> {
    match precision {
        ElementType::F32 => multiply_as::<f32>(input),
        ElementType::F64 => multiply_as::<f64>(input),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> MultiplyInput {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_multiply_json_4x4_uses_fixed_kernel() {
        let input = parse(
            r#"{
                "lhs": { "rows": 4, "cols": 4, "data": [1,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,1] },
                "rhs": { "rows": 4, "cols": 4, "data": [1,2,3,4, 5,6,7,8, 9,10,11,12, 13,14,15,16] }
            }"#,
        );
        let output = multiply(&input, ElementType::F32).unwrap();
        assert_eq!(output.kernel, MulKernel::Square4);
        assert_eq!(output.product, input.rhs);
    }

    #[test]
    fn test_multiply_json_rectangular() {
        let input = parse(
            r#"{
                "lhs": { "rows": 1, "cols": 2, "data": [1, 2] },
                "rhs": { "rows": 2, "cols": 3, "data": [1, 2, 3, 4, 5, 6] }
            }"#,
        );
        let output = multiply(&input, ElementType::F64).unwrap();
        assert_eq!(output.kernel, MulKernel::General);
        assert_eq!(output.product.data, vec![9.0, 12.0, 15.0]);
        assert_eq!((output.product.rows, output.product.cols), (1, 3));
    }

    #[test]
    fn test_multiply_json_bad_data_length() {
        let input = parse(
            r#"{
                "lhs": { "rows": 2, "cols": 2, "data": [1, 2, 3] },
                "rhs": { "rows": 2, "cols": 1, "data": [1, 2] }
            }"#,
        );
        let err = multiply(&input, ElementType::F32).unwrap_err();
        assert!(matches!(err, KernelError::DataLength { expected: 4, actual: 3, .. }));
    }

    #[test]
    fn test_multiply_json_oversized_rows() {
        let input = parse(
            r#"{
                "lhs": { "rows": 9223372036854775808, "cols": 2, "data": [] },
                "rhs": { "rows": 2, "cols": 2, "data": [1, 0, 0, 1] }
            }"#,
        );
        let err = multiply(&input, ElementType::F32).unwrap_err();
        assert!(matches!(err, KernelError::TooLarge { .. }));
    }

    #[test]
    fn test_multiply_json_oversized_product() {
        // both operands are empty but the product would not fit
        let input = parse(
            r#"{
                "lhs": { "rows": 9223372036854775808, "cols": 0, "data": [] },
                "rhs": { "rows": 0, "cols": 4, "data": [] }
            }"#,
        );
        let err = multiply(&input, ElementType::F64).unwrap_err();
        assert_eq!(err, KernelError::TooLarge { dims: Dims::new(1 << 63, 4) });
    }

    #[test]
    fn test_multiply_json_shape_mismatch() {
        let input = parse(
            r#"{
                "lhs": { "rows": 2, "cols": 3, "data": [1, 2, 3, 4, 5, 6] },
                "rhs": { "rows": 2, "cols": 1, "data": [1, 2] }
            }"#,
        );
        let err = multiply(&input, ElementType::F64).unwrap_err();
        assert!(matches!(err, KernelError::ShapeMismatch { .. }));
    }
}
