use poem::http::StatusCode;
use poem::web::Json;
use poem::{handler, IntoResponse, Response};

use crate::prelude::*;
use crate::web::responses::RootResponse;

const CACHE_CONTROL: &str = "no-cache";

#[handler]
#[instrument(skip_all, level = "debug")]
pub async fn get_root() -> impl IntoResponse {
    Json(RootResponse {
        message: "Regression Model API",
        status: "running",
    })
    .with_header("Cache-Control", CACHE_CONTROL)
}

#[handler]
#[instrument(skip_all, level = "debug")]
pub async fn get_health() -> Result<impl IntoResponse> {
    Ok(Response::from(StatusCode::NO_CONTENT).with_header("Cache-Control", CACHE_CONTROL))
}
