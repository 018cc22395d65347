//! Randomized comparison of every kernel family against scalar references

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::checked::{self, BinaryKind, MulKernel, ScalarKind};
use crate::core::{Aligned, AlignedBuf, Dims, ElementType, KernelError};
use crate::ops::matmul::FixedMatMul;
use crate::simd;

use super::config::VerifyConfig;

/// Worst error one kernel showed across all its cases
#[derive(Debug, Clone, Serialize)]
pub struct KernelReport {
    pub kernel: String,
    pub precision: ElementType,
    pub cases: usize,
    pub max_rel_error: f64,
    pub passed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub backend: &'static str,
    pub seed: u64,
    pub tolerance: f64,
    pub kernels: Vec<KernelReport>,
}

impl VerifyReport {
    pub fn passed(&self) -> bool {
        self.kernels.iter().all(|k| k.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &KernelReport> {
        self.kernels.iter().filter(|k| !k.passed)
    }
}

/// Error relative to the expected magnitude, floored at 1
pub fn rel_error(actual: f64, expected: f64) -> f64 {
    if actual == expected {
        return 0.0;
    }
    (actual - expected).abs() / expected.abs().max(1.0)
}

struct Tally {
    kernel: String,
    cases: usize,
    worst: f64,
}

impl Tally {
    fn new(kernel: impl Into<String>) -> Self {
        Self {
            kernel: kernel.into(),
            cases: 0,
            worst: 0.0,
        }
    }

    fn record<T: FixedMatMul>(&mut self, actual: &[T], expected: &[f64]) {
        self.cases += 1;
        for (a, e) in actual.iter().zip(expected) {
            // NaN compares false everywhere, keep it visible
            let err = rel_error(a.to_f64(), *e);
            if err.is_nan() || err > self.worst {
                self.worst = if err.is_nan() { f64::INFINITY } else { err };
            }
        }
    }

    fn finish(self, precision: ElementType, tolerance: f64) -> KernelReport {
        let passed = self.worst <= tolerance;
        if passed {
            debug!("{} {}: {} cases, max error {:e}", self.kernel, precision, self.cases, self.worst);
        } else {
            warn!(
                "{} {}: max error {:e} exceeds {:e}",
                self.kernel, precision, self.worst, tolerance
            );
        }
        KernelReport {
            kernel: self.kernel,
            precision,
            cases: self.cases,
            max_rel_error: self.worst,
            passed,
        }
    }
}

fn random_values<T: FixedMatMul>(rng: &mut StdRng, len: usize) -> AlignedBuf<T> {
    let values: Vec<T> = (0..len).map(|_| T::from_f64(rng.gen_range(-1.0..1.0))).collect();
    AlignedBuf::from_slice(&values)
}

fn widen<T: FixedMatMul>(values: &[T]) -> Vec<f64> {
    values.iter().map(|v| v.to_f64()).collect()
}

/// Triple-loop product in f64
pub fn reference_product(lhs: &[f64], rhs: &[f64], m: usize, k: usize, n: usize) -> Vec<f64> {
    let mut out = vec![0.0; m * n];
    for i in 0..m {
        for j in 0..n {
            out[i * n + j] = (0..k).map(|p| lhs[i * k + p] * rhs[p * n + j]).sum();
        }
    }
    out
}

fn kernel_label(kernel: MulKernel) -> &'static str {
    match kernel {
        MulKernel::Square4 => "multiply_4x4",
        MulKernel::Square3 => "multiply_3x3",
        MulKernel::MatVec4 => "multiply_4x4_vec",
        MulKernel::MatVec3 => "multiply_3x3_vec",
        MulKernel::General => "multiply_general",
    }
}

fn verify_precision<T: FixedMatMul>(
    config: &VerifyConfig,
    rng: &mut StdRng,
) -> Result<Vec<KernelReport>, KernelError> {
    let max_dim = config.max_dim.max(1);
    let square = Dims::new(max_dim, max_dim);
    let max_len = square.checked_len().ok_or(KernelError::TooLarge { dims: square })?;
    let mut reports = Vec::new();

    for kind in [BinaryKind::Add, BinaryKind::Sub, BinaryKind::Schur] {
        let mut tally = Tally::new(format!("{kind:?}").to_lowercase());
        for trial in 0..config.trials {
            // the specialized lengths first, then random ones
            let len = match trial {
                0..5 => [2, 3, 4, 9, 16][trial],
                _ => rng.gen_range(1..=max_len),
            };
            let lhs = random_values::<T>(rng, len);
            let rhs = random_values::<T>(rng, len);
            let mut out = AlignedBuf::<T>::zeroed(len);
            checked::elementwise(kind, &lhs, &rhs, &mut out)?;

            let expected: Vec<f64> = lhs
                .iter()
                .zip(rhs.iter())
                .map(|(&a, &b)| match kind {
                    BinaryKind::Add => (a + b).to_f64(),
                    BinaryKind::Sub => (a - b).to_f64(),
                    BinaryKind::Schur => (a * b).to_f64(),
                })
                .collect();
            tally.record(&out, &expected);
        }
        reports.push(tally.finish(T::KIND, config.tolerance));
    }

    for kind in [ScalarKind::Mul, ScalarKind::Div] {
        let mut tally = Tally::new(format!("scalar_{kind:?}").to_lowercase());
        for trial in 0..config.trials {
            let len = match trial {
                0..5 => [2, 3, 4, 9, 16][trial],
                _ => rng.gen_range(1..=max_len),
            };
            let lhs = random_values::<T>(rng, len);
            let magnitude: f64 = rng.gen_range(0.25..4.0);
            let value = T::from_f64(if rng.gen_bool(0.5) { magnitude } else { -magnitude });
            let mut out = AlignedBuf::<T>::zeroed(len);
            checked::scale(kind, &lhs, value, &mut out)?;

            let expected: Vec<f64> = lhs
                .iter()
                .map(|&a| match kind {
                    ScalarKind::Mul => (a * value).to_f64(),
                    ScalarKind::Div => (a / value).to_f64(),
                })
                .collect();
            tally.record(&out, &expected);
        }
        reports.push(tally.finish(T::KIND, config.tolerance));
    }

    let fixed = [(4, 4, 4), (3, 3, 3), (4, 4, 1), (3, 3, 1)];
    let mut tallies: Vec<Tally> = [
        MulKernel::Square4,
        MulKernel::Square3,
        MulKernel::MatVec4,
        MulKernel::MatVec3,
        MulKernel::General,
    ]
    .into_iter()
    .map(|kernel| Tally::new(kernel_label(kernel)))
    .collect();
    let mut rows_tally = Tally::new("multiply_rows");
    let mut transpose_tally = Tally::new("transpose");

    for trial in 0..config.trials {
        let (m, k, n) = match fixed.get(trial % 8) {
            Some(&shape) => shape,
            None => (
                rng.gen_range(1..=max_dim),
                rng.gen_range(1..=max_dim),
                rng.gen_range(1..=max_dim),
            ),
        };
        let (lhs_dims, rhs_dims) = (Dims::new(m, k), Dims::new(k, n));
        let lhs = random_values::<T>(rng, m * k);
        let rhs = random_values::<T>(rng, k * n);
        let mut out = AlignedBuf::<T>::zeroed(m * n);

        let kernel = checked::select_kernel(&lhs, lhs_dims, &rhs, rhs_dims, &out);
        checked::multiply(&lhs, lhs_dims, &rhs, rhs_dims, &mut out)?;
        let expected = reference_product(&widen(&lhs), &widen(&rhs), m, k, n);
        let slot = match kernel {
            MulKernel::Square4 => 0,
            MulKernel::Square3 => 1,
            MulKernel::MatVec4 => 2,
            MulKernel::MatVec3 => 3,
            MulKernel::General => 4,
        };
        tallies[slot].record(&out, &expected);

        let mut rhs_rows = AlignedBuf::<T>::zeroed(k * n);
        checked::transpose(&rhs, rhs_dims, &mut rhs_rows)?;
        let naive: Vec<f64> = (0..n * k).map(|i| rhs[(i % k) * n + i / k].to_f64()).collect();
        transpose_tally.record(&rhs_rows, &naive);

        let mut out_rows = AlignedBuf::<T>::zeroed(m * n);
        checked::multiply_rows(&lhs, lhs_dims, &rhs_rows, Dims::new(n, k), &mut out_rows)?;
        rows_tally.record(&out_rows, &expected);
    }

    reports.extend(
        tallies
            .into_iter()
            .chain([rows_tally, transpose_tally])
            .filter(|t| t.cases > 0)
            .map(|t| t.finish(T::KIND, config.tolerance)),
    );
    Ok(reports)
}

/// Runs every kernel family for both precisions
pub fn run(config: &VerifyConfig) -> Result<VerifyReport, KernelError> {
    info!(
        "verifying on {} backend: {} trials, seed {:#x}, shapes up to {}x{}",
        simd::BACKEND,
        config.trials,
        config.seed,
        config.max_dim,
        config.max_dim
    );
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut kernels = verify_precision::<f32>(config, &mut rng)?;
    kernels.extend(verify_precision::<f64>(config, &mut rng)?);

    Ok(VerifyReport {
        backend: simd::BACKEND,
        seed: config.seed,
        tolerance: config.tolerance,
        kernels,
    })
}

/// Tiny Schur product `info` runs to confirm the compiled backend works
pub fn smoke() -> bool {
    let id = Aligned([1.0f32, 0.0, 0.0, 1.0]);
    let v = Aligned([3.0f32, -2.0, 5.0, 7.0]);
    let mut out = Aligned([0.0f32; 4]);
    checked::elementwise(BinaryKind::Schur, &id[..], &v[..], &mut out[..]).is_ok() && out.0 == [3.0, 0.0, 0.0, 7.0]
}
