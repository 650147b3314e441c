use chrono::{DateTime, Utc};

use crate::prelude::*;
use crate::regression::fit::ensure_finite;

/// Trained simple linear regression along with the metrics measured on its training samples.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    pub slope: f64,
    pub intercept: f64,

    /// Coefficient of determination, `1.0` means a perfect fit.
    pub r_squared: f64,

    pub mean_squared_error: f64,
    pub n_samples: usize,
    pub trained_at: DateTime<Utc>,
}

impl FittedModel {
    #[must_use]
    #[inline]
    pub fn predict_one(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// The only feature has the only coefficient.
    #[must_use]
    pub fn coefficients(&self) -> Vec<f64> {
        vec![self.slope]
    }
}

/// Applies the model to each of the inputs.
pub fn predict(model: &FittedModel, inputs: &[f64]) -> StdResult<Vec<f64>, ModelError> {
    if inputs.is_empty() {
        return Err(ModelError::invalid("Need at least 1 value to predict"));
    }
    ensure_finite("X", inputs)?;
    let predictions: Vec<f64> = inputs.iter().map(|x| model.predict_one(*x)).collect();
    ensure_finite("prediction", &predictions)?;
    Ok(predictions)
}
