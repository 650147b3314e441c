use poem::error::ResponseError;
use poem::http::StatusCode;
use poem::web::Json;
use poem::{IntoResponse, Response};

use crate::prelude::*;
use crate::web::responses::ErrorResponse;

impl ResponseError for ModelError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) | Self::NotTrained => StatusCode::BAD_REQUEST,
            Self::DegenerateInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::StorageError(_) | Self::CorruptRecord(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub fn render_model_error(error: &ModelError) -> Response {
    render_error(error.status(), error.code(), error.to_string())
}

pub fn render_error(status: StatusCode, code: &'static str, detail: String) -> Response {
    Json(ErrorResponse {
        error: code,
        detail,
    })
    .with_status(status)
    .into_response()
}
