//! Ordinary least squares for a single predictor variable.

use chrono::Utc;
use itertools::Itertools;
use statrs::statistics::Statistics;

use crate::prelude::*;
use crate::regression::FittedModel;

/// Minimal number of samples to fit a line through.
pub const MIN_SAMPLES: usize = 2;

/// Fits `targets ≈ slope × features + intercept` and evaluates the fit on the same samples.
///
/// Everything but `trained_at` depends only on the samples.
#[instrument(level = "debug", skip_all, fields(n_samples = features.len()))]
pub fn fit(features: &[f64], targets: &[f64]) -> StdResult<FittedModel, ModelError> {
    validate(features, targets)?;

    if is_constant(features) {
        return Err(ModelError::degenerate(
            "All X values are identical, the slope is undefined",
        ));
    }

    let mean_x = features.mean();
    let mean_y = targets.mean();
    let (sxx, sxy) = features.iter().zip(targets).fold((0.0, 0.0), |(sxx, sxy), (x, y)| {
        let dx = x - mean_x;
        (sxx + dx * dx, sxy + dx * (y - mean_y))
    });
    if sxx == 0.0 {
        return Err(ModelError::degenerate("X values have zero variance"));
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    if !slope.is_finite() || !intercept.is_finite() {
        return Err(ModelError::degenerate("fitted coefficients are not finite"));
    }

    let residual_sum_of_squares: f64 = features
        .iter()
        .zip(targets)
        .map(|(x, y)| {
            let residual = y - (slope * x + intercept);
            residual * residual
        })
        .sum();
    let total_sum_of_squares: f64 = if is_constant(targets) {
        0.0
    } else {
        targets.iter().map(|y| (y - mean_y) * (y - mean_y)).sum()
    };

    if !residual_sum_of_squares.is_finite() || !total_sum_of_squares.is_finite() {
        return Err(ModelError::degenerate(
            "the sums of squares overflow, the values are too large to evaluate the fit",
        ));
    }

    let n_samples = features.len();
    let r_squared = r_squared(residual_sum_of_squares, total_sum_of_squares, mean_y, n_samples)?;
    let mean_squared_error = residual_sum_of_squares / n_samples as f64;
    debug!(slope, intercept, r_squared, mean_squared_error);

    Ok(FittedModel {
        slope,
        intercept,
        r_squared,
        mean_squared_error,
        n_samples,
        trained_at: Utc::now(),
    })
}

fn validate(features: &[f64], targets: &[f64]) -> StdResult<(), ModelError> {
    if features.len() != targets.len() {
        return Err(ModelError::invalid("X and Y must have the same length"));
    }
    if features.len() < MIN_SAMPLES {
        return Err(ModelError::invalid("Need at least 2 data points to train"));
    }
    ensure_finite("X", features)?;
    ensure_finite("Y", targets)
}

pub(crate) fn ensure_finite(name: &str, values: &[f64]) -> StdResult<(), ModelError> {
    match values.iter().find_position(|value| !value.is_finite()) {
        Some((index, value)) => Err(ModelError::invalid(format!(
            "{}[{}] is not a finite number: {}",
            name, index, value
        ))),
        None => Ok(()),
    }
}

fn is_constant(values: &[f64]) -> bool {
    values.iter().all_equal()
}

/// Coefficient of determination.
///
/// Constant targets leave it undefined: then a zero residual (up to rounding) counts as a
/// perfect fit, anything else is a degenerate input.
fn r_squared(
    residual_sum_of_squares: f64,
    total_sum_of_squares: f64,
    mean_y: f64,
    n_samples: usize,
) -> StdResult<f64, ModelError> {
    if total_sum_of_squares != 0.0 {
        return Ok(1.0 - residual_sum_of_squares / total_sum_of_squares);
    }
    let tolerance = f64::EPSILON * n_samples as f64 * (1.0 + mean_y * mean_y);
    if residual_sum_of_squares <= tolerance {
        Ok(1.0)
    } else {
        Err(ModelError::degenerate(
            "All Y values are identical but the fit leaves residuals",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_line_ok() {
        let model = fit(&[1.0, 2.0, 3.0, 4.0], &[2.0, 4.0, 6.0, 8.0]).unwrap();
        assert!((model.slope - 2.0).abs() < 1e-12);
        assert!(model.intercept.abs() < 1e-12);
        assert!((model.r_squared - 1.0).abs() < 1e-12);
        assert!(model.mean_squared_error.abs() < 1e-12);
        assert_eq!(model.n_samples, 4);
    }

    #[test]
    fn noisy_data_ok() {
        let features = [1.0, 2.0, 3.0, 4.0, 5.0];
        let targets = [1.1, 1.9, 3.2, 3.8, 5.1];
        let model = fit(&features, &targets).unwrap();
        assert!((model.slope - 0.99).abs() < 1e-9);
        assert!((model.intercept - 0.05).abs() < 1e-9);
        assert!(model.r_squared > 0.98 && model.r_squared < 1.0);
    }

    #[test]
    fn residuals_match_mean_squared_error_ok() {
        let features = [0.5, -1.25, 3.0, 8.75, 2.0, 4.5];
        let targets = [1.0, -3.5, 7.25, 14.0, 2.5, 10.0];
        let model = fit(&features, &targets).unwrap();
        let mean_squared_error = features
            .iter()
            .zip(targets)
            .map(|(x, y)| (model.predict_one(*x) - y).powi(2))
            .sum::<f64>()
            / features.len() as f64;
        assert!((mean_squared_error - model.mean_squared_error).abs() < 1e-9);
        for (x, y) in features.iter().zip(targets) {
            let residual = model.predict_one(*x) - y;
            assert!(residual * residual <= model.mean_squared_error * features.len() as f64 + 1e-9);
        }
    }

    #[test]
    fn deterministic_ok() {
        let features = [0.5, -1.25, 3.0, 8.75];
        let targets = [1.0, -3.5, 7.25, 14.0];
        let first = fit(&features, &targets).unwrap();
        let second = FittedModel {
            trained_at: first.trained_at,
            ..fit(&features, &targets).unwrap()
        };
        assert_eq!(first, second);
    }

    #[test]
    fn two_points_ok() {
        let model = fit(&[0.0, 10.0], &[3.0, -2.0]).unwrap();
        assert!((model.slope + 0.5).abs() < 1e-12);
        assert!((model.intercept - 3.0).abs() < 1e-12);
    }

    #[test]
    fn mismatched_lengths_error() {
        let error = fit(&[1.0, 2.0, 3.0], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(error, ModelError::InvalidInput(_)));
    }

    #[test]
    fn single_point_error() {
        let error = fit(&[1.0], &[1.0]).unwrap_err();
        assert!(matches!(error, ModelError::InvalidInput(_)));
    }

    #[test]
    fn empty_error() {
        let error = fit(&[], &[]).unwrap_err();
        assert!(matches!(error, ModelError::InvalidInput(_)));
    }

    #[test]
    fn non_finite_error() {
        let error = fit(&[1.0, f64::NAN, 3.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(error, ModelError::InvalidInput(_)));
        let error = fit(&[1.0, 2.0, 3.0], &[1.0, f64::INFINITY, 3.0]).unwrap_err();
        assert!(matches!(error, ModelError::InvalidInput(_)));
    }

    #[test]
    fn constant_features_error() {
        let error = fit(&[5.0, 5.0, 5.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(error, ModelError::DegenerateInput(_)));
    }

    #[test]
    fn constant_targets_ok() {
        let model = fit(&[1.0, 2.0, 3.0], &[0.1, 0.1, 0.1]).unwrap();
        assert!(model.slope.abs() < 1e-12);
        assert!((model.intercept - 0.1).abs() < 1e-12);
        assert!((model.r_squared - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn overflowing_sums_of_squares_error() {
        let error = fit(&[0.0, 1.0, 2.0], &[1e200, -1e200, 1e200]).unwrap_err();
        assert!(matches!(error, ModelError::DegenerateInput(_)));
    }

    #[test]
    fn large_finite_values_ok() {
        let model = fit(&[0.0, 1.0, 2.0], &[1e150, -1e150, 1e150]).unwrap();
        assert!(model.r_squared.is_finite());
        assert!(model.mean_squared_error.is_finite());
    }

    #[test]
    fn overflowing_coefficients_error() {
        let error = fit(&[0.0, 1e-300], &[-1e300, 1e300]).unwrap_err();
        assert!(matches!(error, ModelError::DegenerateInput(_)));
    }
}
