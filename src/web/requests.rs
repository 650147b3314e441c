use serde::{Deserialize, Serialize};

use crate::prelude::*;
use crate::regression::MIN_SAMPLES;

#[derive(Serialize, Deserialize)]
pub struct TrainingRequest {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl TrainingRequest {
    pub fn validate(&self) -> StdResult<(), ModelError> {
        if self.x.len() != self.y.len() {
            return Err(ModelError::invalid("X and Y must have the same length"));
        }
        if self.x.len() < MIN_SAMPLES {
            return Err(ModelError::invalid("Need at least 2 data points to train"));
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
pub struct PredictionRequest {
    pub x: Vec<f64>,
}

impl PredictionRequest {
    pub fn validate(&self) -> StdResult<(), ModelError> {
        match self.x.is_empty() {
            false => Ok(()),
            true => Err(ModelError::invalid("Need at least 1 value to predict")),
        }
    }
}
