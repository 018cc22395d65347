use std::f64::consts::PI;

use crate::simd::Element;

/// Degrees to radians
pub fn radians<T: Element>(degrees: T) -> T {
    degrees * T::from_f64(PI / 180.0)
}

/// Radians to degrees
pub fn degrees<T: Element>(radians: T) -> T {
    radians * T::from_f64(180.0 / PI)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radians() {
        assert!((radians(180.0f64) - PI).abs() < 1e-12);
        assert!((radians(90.0f32) - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert!((degrees(radians(37.5f64)) - 37.5).abs() < 1e-12);
    }
}
