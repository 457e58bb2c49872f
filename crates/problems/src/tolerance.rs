//! Absolute + relative closeness checks.

use crate::report::{Mismatch, VerificationReport};
use anyhow::{ensure, Result};
use kernelbench_kernels::tensor::Tensor;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Values shown on each side of a mismatch.
pub const DIAGNOSTIC_WINDOW: usize = 3;

/// Accept `actual` when `|actual - expected| <= atol + rtol * |expected|`
/// holds for every element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub atol: f32,
    pub rtol: f32,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            atol: 1e-5,
            rtol: 1e-5,
        }
    }
}

impl Tolerance {
    pub fn new(atol: f32, rtol: f32) -> Self {
        Self { atol, rtol }
    }

    /// NaN is never close to anything; equal infinities are close. Any
    /// other pair with an infinite difference is rejected even though the
    /// allowance `atol + rtol * |expected|` is itself infinite.
    pub fn is_close(&self, expected: f32, actual: f32) -> bool {
        if expected == actual {
            return true;
        }
        let diff = (actual - expected).abs();
        diff.is_finite() && diff <= self.atol + self.rtol * expected.abs()
    }

    /// Element the diagnostics point at: absolute difference above `atol`,
    /// or a NaN difference between unequal values.
    fn is_offending(&self, expected: f32, actual: f32) -> bool {
        let diff = (actual - expected).abs();
        diff > self.atol || (diff.is_nan() && expected != actual)
    }

    pub fn compare(&self, expected: &Tensor, actual: &Tensor) -> Result<VerificationReport> {
        ensure!(
            expected.is_comparable(actual),
            "cannot compare expected {:?} ({}) with actual {:?} ({})",
            expected.shape(),
            expected.dtype(),
            actual.shape(),
            actual.dtype()
        );

        let expected = expected.as_slice();
        let actual = actual.as_slice();

        let all_close = expected
            .par_iter()
            .zip(actual.par_iter())
            .all(|(&e, &a)| self.is_close(e, a));
        if all_close {
            return Ok(VerificationReport::passed());
        }

        // A rejection implies at least one element, and at least one element
        // failing `is_close`, so the fallback always finds an index.
        let first_index = expected
            .par_iter()
            .zip(actual.par_iter())
            .position_first(|(&e, &a)| self.is_offending(e, a))
            .or_else(|| {
                expected
                    .par_iter()
                    .zip(actual.par_iter())
                    .position_first(|(&e, &a)| !self.is_close(e, a))
            })
            .unwrap_or(0);

        let end = (first_index + DIAGNOSTIC_WINDOW).min(expected.len());
        Ok(VerificationReport::failed(Mismatch {
            first_index,
            actual_window: format_window(&actual[first_index..end]),
            expected_window: format_window(&expected[first_index..end]),
            max_abs_diff: max_abs_diff(expected, actual) as f64,
        }))
    }
}

/// Largest `|a - e|`; NaN if any difference is NaN.
pub fn max_abs_diff(expected: &[f32], actual: &[f32]) -> f32 {
    expected
        .par_iter()
        .zip(actual.par_iter())
        .map(|(&e, &a)| (a - e).abs())
        .reduce(
            || 0.0f32,
            |x, y| {
                if x.is_nan() || y.is_nan() {
                    f32::NAN
                } else {
                    x.max(y)
                }
            },
        )
}

/// Seven decimals; non-finite values render as `nan`, `inf` and `-inf`.
fn format_window(values: &[f32]) -> Vec<String> {
    values
        .iter()
        .map(|&value| {
            if value.is_nan() {
                "nan".to_string()
            } else if value == f32::INFINITY {
                "inf".to_string()
            } else if value == f32::NEG_INFINITY {
                "-inf".to_string()
            } else {
                format!("{:.7}", value)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use kernelbench_kernels::config::Device;

    fn tensor(values: &[f32]) -> Tensor {
        Tensor::from_vec(&[values.len()], values.to_vec(), Device::Cpu).unwrap()
    }

    #[test]
    fn identical_tensors_pass() {
        let t = tensor(&[1.0, -2.5, 3.25]);
        let report = Tolerance::default().compare(&t, &t.clone()).unwrap();
        assert!(report.is_correct());
        assert!(report.diagnostics().is_none());
    }

    #[test]
    fn relative_term_scales_with_magnitude() {
        let tol = Tolerance::default();
        assert!(tol.is_close(1000.0, 1000.005));
        assert!(!tol.is_close(1.0, 1.001));
        assert!(!tol.is_close(f32::NAN, f32::NAN));
        assert!(tol.is_close(f32::INFINITY, f32::INFINITY));
        assert!(tol.is_close(f32::NEG_INFINITY, f32::NEG_INFINITY));
        assert!(!tol.is_close(f32::INFINITY, 5.0));
        assert!(!tol.is_close(f32::INFINITY, f32::NEG_INFINITY));
        assert!(!tol.is_close(5.0, f32::INFINITY));
    }

    #[test]
    fn infinite_expected_rejects_finite_or_opposite_candidate() {
        let expected = tensor(&[1.0, f32::INFINITY]);

        for candidate in [5.0, f32::NEG_INFINITY] {
            let actual = tensor(&[1.0, candidate]);
            let report = Tolerance::default().compare(&expected, &actual).unwrap();
            assert!(!report.is_correct(), "accepted {} for inf", candidate);
            let mismatch = report.diagnostics().unwrap();
            assert_eq!(mismatch.first_index, 1);
            assert_eq!(mismatch.expected_window, vec!["inf"]);
            assert!(mismatch.max_abs_diff.is_infinite());
        }

        let report = Tolerance::default()
            .compare(&expected, &expected.clone())
            .unwrap();
        assert!(report.is_correct());
    }

    #[test]
    fn non_finite_window_values_use_lowercase_names() {
        assert_eq!(
            format_window(&[f32::NAN, f32::INFINITY, f32::NEG_INFINITY, 0.5]),
            vec!["nan", "inf", "-inf", "0.5000000"]
        );
    }

    #[test]
    fn reports_single_mismatch_index() {
        let expected = tensor(&[0.0; 10]);
        let mut values = vec![0.0; 10];
        values[6] = 0.5;
        let actual = tensor(&values);

        let report = Tolerance::default().compare(&expected, &actual).unwrap();
        let mismatch = report.diagnostics().unwrap();
        assert_eq!(mismatch.first_index, 6);
        assert_eq!(mismatch.actual_window, vec!["0.5000000", "0.0000000", "0.0000000"]);
        assert_eq!(mismatch.expected_window.len(), DIAGNOSTIC_WINDOW);
        assert_abs_diff_eq!(mismatch.max_abs_diff, 0.5, epsilon = 1e-7);
    }

    #[test]
    fn window_is_truncated_at_the_end() {
        let expected = tensor(&[11.0, 22.0, 33.0]);
        let actual = tensor(&[11.0, 22.0, 30.0]);

        let report = Tolerance::default().compare(&expected, &actual).unwrap();
        let mismatch = report.diagnostics().unwrap();
        assert_eq!(mismatch.first_index, 2);
        assert_eq!(mismatch.actual_window, vec!["30.0000000"]);
        assert_eq!(mismatch.expected_window, vec!["33.0000000"]);
        assert_abs_diff_eq!(mismatch.max_abs_diff, 3.0, epsilon = 1e-7);
    }

    #[test]
    fn locator_points_at_earliest_absolute_difference() {
        // Index 0 is within the relative tolerance but beyond atol; the
        // rejection comes from index 2.
        let expected = tensor(&[100.0, 1.0, 1.0]);
        let actual = tensor(&[100.0005, 1.0, 2.0]);

        let report = Tolerance::default().compare(&expected, &actual).unwrap();
        assert!(!report.is_correct());
        assert_eq!(report.diagnostics().unwrap().first_index, 0);
    }

    #[test]
    fn nan_candidate_is_located() {
        let expected = tensor(&[1.0, 2.0, 3.0]);
        let actual = tensor(&[1.0, f32::NAN, 3.0]);

        let report = Tolerance::default().compare(&expected, &actual).unwrap();
        let mismatch = report.diagnostics().unwrap();
        assert_eq!(mismatch.first_index, 1);
        assert_eq!(mismatch.actual_window[0], "nan");
        assert!(mismatch.max_abs_diff.is_nan());
    }

    #[test]
    fn empty_tensors_pass_vacuously() {
        let empty = tensor(&[]);
        let report = Tolerance::default().compare(&empty, &empty.clone()).unwrap();
        assert!(report.is_correct());
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        let a = tensor(&[1.0, 2.0]);
        let b = tensor(&[1.0, 2.0, 3.0]);
        assert!(Tolerance::default().compare(&a, &b).is_err());
    }
}
