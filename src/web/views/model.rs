use poem::web::{Data, Json};
use poem::handler;

use crate::prelude::*;
use crate::regression;
use crate::state::ModelState;
use crate::tracing::format_elapsed;
use crate::web::requests::{PredictionRequest, TrainingRequest};
use crate::web::responses::{PredictionResponse, StatusResponse, TrainingResponse};

#[handler]
#[instrument(skip_all, level = "info")]
pub async fn post_train(
    Json(request): Json<TrainingRequest>,
    Data(state): Data<&Arc<ModelState>>,
) -> poem::Result<Json<TrainingResponse>> {
    let start_instant = Instant::now();
    debug!(n_x = request.x.len(), n_y = request.y.len());

    request.validate()?;
    let model = regression::fit(&request.x, &request.y)?;
    let model = state.install_and_save(model).await?;

    info!(
        n_samples = model.n_samples,
        slope = model.slope,
        intercept = model.intercept,
        r_squared = model.r_squared,
        elapsed = format_elapsed(start_instant).as_str(),
        "trained",
    );
    Ok(Json(TrainingResponse::from(model.as_ref())))
}

#[handler]
#[instrument(skip_all, level = "info")]
pub async fn post_predict(
    Json(request): Json<PredictionRequest>,
    Data(state): Data<&Arc<ModelState>>,
) -> poem::Result<Json<PredictionResponse>> {
    let start_instant = Instant::now();
    request.validate()?;
    let model = state.get_or_load().await?;
    let predictions = regression::predict(&model, &request.x)?;
    debug!(n_predictions = predictions.len(), elapsed = format_elapsed(start_instant).as_str());
    Ok(Json(PredictionResponse { predictions }))
}

#[handler]
#[instrument(skip_all, level = "debug")]
pub async fn get_status(Data(state): Data<&Arc<ModelState>>) -> Json<StatusResponse> {
    Json(StatusResponse::from(state.status().await))
}
