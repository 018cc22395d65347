use proptest::prelude::*;

use simd_calc::checked::{self, BinaryKind, ScalarKind};
use simd_calc::harness::verify::reference_product;
use simd_calc::{AlignedBuf, Dims, FixedMatMul, Mat3, Mat4, Vec3};

fn values(len: usize) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-100.0f32..100.0, len)
}

fn pair() -> impl Strategy<Value = (Vec<f32>, Vec<f32>)> {
    (1usize..64).prop_flat_map(|len| (values(len), values(len)))
}

fn binary(kind: BinaryKind, a: &[f32], b: &[f32]) -> Vec<f32> {
    let (a, b) = (AlignedBuf::from_slice(a), AlignedBuf::from_slice(b));
    let mut out = AlignedBuf::<f32>::zeroed(a.len());
    checked::elementwise(kind, &a, &b, &mut out).unwrap();
    out.to_vec()
}

fn scaled(kind: ScalarKind, a: &[f32], value: f32) -> Vec<f32> {
    let a = AlignedBuf::from_slice(a);
    let mut out = AlignedBuf::<f32>::zeroed(a.len());
    checked::scale(kind, &a, value, &mut out).unwrap();
    out.to_vec()
}

fn close<T: FixedMatMul>(actual: &[T], expected: &[f64]) -> bool {
    actual
        .iter()
        .zip(expected)
        .all(|(&a, &e)| (a.to_f64() - e).abs() <= 1e-5 * e.abs().max(1.0))
}

fn narrow<T: FixedMatMul>(values: &[f64]) -> Vec<T> {
    values.iter().map(|&v| T::from_f64(v)).collect()
}

fn wide<T: FixedMatMul>(values: &[T]) -> Vec<f64> {
    values.iter().map(|v| v.to_f64()).collect()
}

fn product_matches<T: FixedMatMul>(m: usize, k: usize, n: usize, seed: u64) -> Result<(), TestCaseError> {
    let fill = |len: usize, salt: u64| -> Vec<f64> {
        (0..len)
            .map(|i| (((i as u64 + 1).wrapping_mul(seed ^ salt) % 2001) as f64 - 1000.0) / 250.0)
            .collect()
    };
    let lhs = AlignedBuf::<T>::from_slice(&narrow(&fill(m * k, 0x9e37)));
    let rhs = AlignedBuf::<T>::from_slice(&narrow(&fill(k * n, 0x79b9)));
    let mut out = AlignedBuf::<T>::zeroed(m * n);
    checked::multiply(&lhs, Dims::new(m, k), &rhs, Dims::new(k, n), &mut out).unwrap();

    let expected = reference_product(&wide(&lhs), &wide(&rhs), m, k, n);
    prop_assert!(close(&out, &expected), "{} {m}x{k}x{n}", T::KIND);

    // block transpose then row-vector multiply agrees with the same product
    let mut rhs_rows = AlignedBuf::<T>::zeroed(k * n);
    checked::transpose(&rhs, Dims::new(k, n), &mut rhs_rows).unwrap();
    let mut rows_out = AlignedBuf::<T>::zeroed(m * n);
    checked::multiply_rows(&lhs, Dims::new(m, k), &rhs_rows, Dims::new(n, k), &mut rows_out).unwrap();
    prop_assert!(close(&rows_out, &expected), "{} rows {m}x{k}x{n}", T::KIND);
    Ok(())
}

fn identity_neutral<T: FixedMatMul>(data: &[f64]) -> Result<(), TestCaseError> {
    let data: Vec<T> = narrow(data);
    let m = Mat4::from_slice(&data).unwrap();
    prop_assert_eq!(m * Mat4::identity(), m);
    prop_assert_eq!(Mat4::identity() * m, m);

    let m3 = Mat3::from_slice(&data[..9]).unwrap();
    prop_assert_eq!(m3 * Mat3::identity(), m3);
    prop_assert_eq!(Mat3::identity() * m3, m3);
    Ok(())
}

fn mat3_matches_mat4<T: FixedMatMul>(a: &[f64], b: &[f64]) -> Result<(), TestCaseError> {
    let a = Mat3::<T>::from_slice(&narrow(a)).unwrap();
    let b = Mat3::<T>::from_slice(&narrow(b)).unwrap();
    let small = a * b;
    let big = (Mat4::from_linear(&a) * Mat4::from_linear(&b)).linear();
    prop_assert!(close(small.data(), &wide(big.data())), "{}", T::KIND);

    let v = Vec3::new(a[(0, 0)], b[(1, 1)], a[(2, 1)]);
    let small_v = a * v;
    let big_v = (Mat4::from_linear(&a) * v.extend(T::ZERO)).truncate();
    prop_assert!(close(&small_v.to_array(), &wide(&big_v.to_array())), "{} vec", T::KIND);
    Ok(())
}

proptest! {
    #[test]
    fn add_commutes((a, b) in pair()) {
        prop_assert_eq!(binary(BinaryKind::Add, &a, &b), binary(BinaryKind::Add, &b, &a));
    }

    #[test]
    fn sub_antisymmetric((a, b) in pair()) {
        let ab = binary(BinaryKind::Sub, &a, &b);
        let ba = binary(BinaryKind::Sub, &b, &a);
        for (x, y) in ab.iter().zip(&ba) {
            prop_assert_eq!(*x, -*y);
        }
    }

    #[test]
    fn sub_self_is_zero(a in (1usize..64).prop_flat_map(values)) {
        prop_assert!(binary(BinaryKind::Sub, &a, &a).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn scale_by_one_is_identity(a in (1usize..64).prop_flat_map(values)) {
        prop_assert_eq!(scaled(ScalarKind::Mul, &a, 1.0), a.clone());
        prop_assert_eq!(scaled(ScalarKind::Div, &a, 1.0), a);
    }

    #[test]
    fn multiply_matches_triple_loop(m in 1usize..17, k in 1usize..17, n in 1usize..17, seed in any::<u64>()) {
        product_matches::<f32>(m, k, n, seed)?;
        product_matches::<f64>(m, k, n, seed)?;
    }

    #[test]
    fn fixed_shapes_match_triple_loop(shape in prop::sample::select(vec![(4, 4, 4), (3, 3, 3), (4, 4, 1), (3, 3, 1)]), seed in any::<u64>()) {
        let (m, k, n) = shape;
        product_matches::<f32>(m, k, n, seed)?;
        product_matches::<f64>(m, k, n, seed)?;
    }

    #[test]
    fn identity_is_neutral(data in prop::collection::vec(-100.0f64..100.0, 16)) {
        identity_neutral::<f32>(&data)?;
        identity_neutral::<f64>(&data)?;
    }

    #[test]
    fn mat3_matches_identity_extended_mat4(
        a in prop::collection::vec(-100.0f64..100.0, 9),
        b in prop::collection::vec(-100.0f64..100.0, 9),
    ) {
        mat3_matches_mat4::<f32>(&a, &b)?;
        mat3_matches_mat4::<f64>(&a, &b)?;
    }
}
