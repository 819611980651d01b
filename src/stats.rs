//! Small numeric helpers for score post-processing: row statistics,
//! Gaussian tail p-values and z-score normalization.

use log::warn;

/// Arithmetic mean. Returns NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Unbiased (Bessel-corrected) sample standard deviation.
/// Returns 0.0 when fewer than two values are given.
pub fn sample_sd(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let ss: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Error function via Abramowitz & Stegun 7.1.26 (max error ~1.5e-7).
pub fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.3275911 * x);
    let poly = t
        * (0.254829592
            + t * (-0.284496736 + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));
    sign * (1.0 - poly * (-x * x).exp())
}

/// One-sided upper-tail probability of `score` under a Gaussian null with
/// the given mean and standard deviation:
/// `0.5 − 0.5·erf((score − mean) / (√2·sd))`.
pub fn gaussian_tail_pvalue(score: f64, mean: f64, sd: f64) -> f64 {
    0.5 - 0.5 * erf((score - mean) / (std::f64::consts::SQRT_2 * sd))
}

/// Normalize a row of scores in place to zero mean and unit sample
/// standard deviation.
///
/// A degenerate row (fewer than two entries, or all entries equal) is set
/// to all zeros with a warning instead of dividing by zero; returns false
/// in that case.
pub fn z_normalize(row: &mut [f64], label: &str) -> bool {
    let mu = mean(row);
    let sd = sample_sd(row, mu);
    if sd == 0.0 || !sd.is_finite() {
        warn!(
            "row '{}' has no score variance, z-scores set to 0",
            label
        );
        row.fill(0.0);
        return false;
    }
    for v in row.iter_mut() {
        *v = (*v - mu) / sd;
    }
    true
}
