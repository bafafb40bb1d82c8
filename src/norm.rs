//! Error-norm computation and tolerance policy
//!
//! Reduces the disagreement between a reference output and a
//! device-computed output to a single non-negative scalar,
//! `||ref - computed|| / ||ref||`, accumulated in `f64` regardless of the
//! element type. The companion tolerance check scales machine epsilon by the
//! problem size; nothing stricter is attempted.

use crate::element::Element;

/// Norm selector for the error reduction
///
/// For the one-row (vector) regions the harness compares, the one-norm is
/// the largest absolute entry, the infinity-norm is the absolute sum, and
/// Frobenius is the Euclidean norm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormKind {
    /// Maximum absolute column sum
    One,
    /// Maximum absolute row sum
    Inf,
    /// Square root of the sum of squares
    Frobenius,
}

/// Normalized distance between two equal-shaped strided regions
///
/// Walks `len` logical elements spaced `inc` apart in each slice. An empty
/// region trivially yields `0.0`; a zero reference norm degrades to the
/// absolute (unnormalized) distance so a broken kernel cannot hide behind a
/// zero denominator.
#[must_use]
pub fn norm_error<T: Element>(
    kind: NormKind,
    len: usize,
    inc: usize,
    reference: &[T],
    computed: &[T],
) -> f64 {
    if len == 0 {
        return 0.0;
    }
    let inc = inc.max(1);
    let diff = vector_norm(
        kind,
        (0..len).map(|i| reference[i * inc].to_f64() - computed[i * inc].to_f64()),
    );
    let denom = vector_norm(kind, (0..len).map(|i| reference[i * inc].to_f64()));
    if denom == 0.0 {
        diff
    } else {
        diff / denom
    }
}

fn vector_norm(kind: NormKind, values: impl Iterator<Item = f64>) -> f64 {
    match kind {
        NormKind::One => values.fold(0.0, |acc, v| acc.max(v.abs())),
        NormKind::Inf => values.map(f64::abs).sum(),
        NormKind::Frobenius => values.map(|v| v * v).sum::<f64>().sqrt(),
    }
}

/// Scaled error bound: `size * machine_epsilon` for the element type
#[must_use]
pub fn error_bound<T: Element>(n: i64) -> f64 {
    n.max(1) as f64 * T::EPSILON
}

/// Tolerance check against the scaled bound
#[must_use]
pub fn within_tolerance<T: Element>(error: f64, n: i64) -> bool {
    error.is_finite() && error <= error_bound::<T>(n)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_regions_yield_zero() {
        let a = [1.0f64, 2.0, 3.0];
        assert_eq!(norm_error(NormKind::One, 3, 1, &a, &a), 0.0);
        assert_eq!(norm_error(NormKind::Frobenius, 3, 1, &a, &a), 0.0);
    }

    #[test]
    fn test_empty_region_is_zero() {
        let a: [f32; 0] = [];
        assert_eq!(norm_error(NormKind::One, 0, 1, &a, &a), 0.0);
    }

    #[test]
    fn test_one_norm_is_max_abs_diff_relative() {
        let reference = [2.0f64, -4.0];
        let computed = [2.0f64, -5.0];
        // diff = [0, 1], max 1; ref max 4
        assert!((norm_error(NormKind::One, 2, 1, &reference, &computed) - 0.25).abs() < 1e-15);
    }

    #[test]
    fn test_inf_norm_sums() {
        let reference = [1.0f64, 1.0];
        let computed = [0.0f64, 0.0];
        assert!((norm_error(NormKind::Inf, 2, 1, &reference, &computed) - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_strided_regions_skip_gaps() {
        let reference = [1.0f64, 777.0, 2.0];
        let computed = [1.0f64, -777.0, 2.0];
        assert_eq!(norm_error(NormKind::One, 2, 2, &reference, &computed), 0.0);
    }

    #[test]
    fn test_zero_reference_degrades_to_absolute() {
        let reference = [0.0f32, 0.0];
        let computed = [0.5f32, 0.0];
        assert!((norm_error(NormKind::One, 2, 1, &reference, &computed) - 0.5).abs() < 1e-7);
    }

    #[test]
    fn test_tolerance_scales_with_size() {
        assert!(error_bound::<f64>(100) > error_bound::<f64>(10));
        assert!(within_tolerance::<f64>(0.0, 0));
        assert!(!within_tolerance::<f64>(f64::NAN, 50));
        assert!(within_tolerance::<f32>(40.0 * f32::EPSILON as f64, 50));
        assert!(!within_tolerance::<f32>(60.0 * f32::EPSILON as f64, 50));
    }
}
