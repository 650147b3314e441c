use serde::{Deserialize, Serialize};

use crate::regression::FittedModel;
use crate::state::{ModelSource, ModelStatus};

#[derive(Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub status: &'static str,
}

#[derive(Serialize, Deserialize)]
pub struct TrainingResponse {
    pub message: String,
    pub r2_score: f64,
    pub mse: f64,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl From<&FittedModel> for TrainingResponse {
    fn from(model: &FittedModel) -> Self {
        Self {
            message: "Model trained successfully".to_string(),
            r2_score: model.r_squared,
            mse: model.mean_squared_error,
            coefficients: model.coefficients(),
            intercept: model.intercept,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct PredictionResponse {
    pub predictions: Vec<f64>,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub trained: bool,

    /// Whether the stored model record exists.
    pub model_exists: bool,

    pub source: ModelSource,
}

impl From<ModelStatus> for StatusResponse {
    fn from(status: ModelStatus) -> Self {
        Self {
            trained: status.trained,
            model_exists: status.persisted_exists,
            source: status.source,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    /// Stable error code.
    pub error: &'static str,

    pub detail: String,
}
