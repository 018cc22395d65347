//! CPU feature detection for the 128-bit kernels
//! Reports which instruction sets the running CPU offers next to the backend
//! the crate was compiled against.
//!
//! Architecture Support:
//! - x86_64: SSE2 is part of the baseline, SSE3 adds horizontal adds
//! - ARM64 (aarch64): NEON is standard
//! - anything else runs the portable array backend
//!
//! Register selection itself is compile-time (see `simd`); this module only
//! answers whether the build makes full use of the host.

#[cfg(target_arch = "x86_64")]
use std::arch::is_x86_feature_detected;

#[cfg(target_arch = "aarch64")]
use std::arch::is_aarch64_feature_detected;

use crate::simd;

/// Detected CPU capabilities relevant to the kernels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuFeatures {
    /// x86 SSE2: 128-bit float registers, 4×f32 or 2×f64
    pub sse2: bool,

    /// x86 SSE3: `haddps`/`haddpd`
    pub sse3: bool,

    /// ARM NEON (Advanced SIMD)
    pub neon: bool,
}

impl CpuFeatures {
    /// Detect CPU features at runtime
    pub fn detect() -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            Self {
                sse2: is_x86_feature_detected!("sse2"),
                sse3: is_x86_feature_detected!("sse3"),
                neon: false,
            }
        }

        #[cfg(target_arch = "aarch64")]
        {
            Self {
                sse2: false,
                sse3: false,
                neon: is_aarch64_feature_detected!("neon"),
            }
        }

        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
        {
            Self {
                sse2: false,
                sse3: false,
                neon: false,
            }
        }
    }

    /// True if the host can run a native 128-bit backend
    pub fn has_simd(&self) -> bool {
        self.sse2 || self.neon
    }

    /// The host supports SSE3 but the build folds horizontally with shuffles
    pub fn sse3_unused(&self) -> bool {
        self.sse3 && !cfg!(target_feature = "sse3")
    }

    /// Backend the kernels were compiled against
    pub fn backend(&self) -> &'static str {
        simd::BACKEND
    }

    /// Get a human-readable description of detected features
    pub fn describe(&self) -> String {
        let mut features = Vec::new();

        if self.sse2 {
            features.push("SSE2");
        }
        if self.sse3 {
            features.push("SSE3");
        }
        if self.neon {
            features.push("NEON");
        }

        if features.is_empty() {
            "None (portable fallback)".to_string()
        } else {
            features.join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_features_detection() {
        let features = CpuFeatures::detect();
        let _ = features.describe();
        #[cfg(target_arch = "x86_64")]
        assert!(features.sse2);
        #[cfg(target_arch = "aarch64")]
        assert!(features.neon);
    }

    #[test]
    fn test_cpu_features_describe() {
        let features = CpuFeatures {
            sse2: true,
            sse3: true,
            neon: false,
        };
        assert_eq!(features.describe(), "SSE2, SSE3");
        assert!(features.has_simd());

        let features = CpuFeatures {
            sse2: false,
            sse3: false,
            neon: false,
        };
        assert!(features.describe().contains("None"));
        assert!(!features.has_simd());
    }

    #[test]
    fn test_backend_name() {
        let backend = CpuFeatures::detect().backend();
        assert!(["SSE2", "SSE2+SSE3", "NEON", "portable"].contains(&backend));
    }
}
