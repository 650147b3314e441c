use poem::error::{MethodNotAllowedError, NotFoundError, ParseJsonError};
use poem::http::StatusCode;
use poem::{Endpoint, IntoResponse, Middleware, Request, Response, Result};

use crate::prelude::*;
use crate::web::error::{render_error, render_model_error};

/// Translates the errors into JSON error responses.
pub struct ErrorMiddleware;

impl<E: Endpoint<Output = Response>> Middleware<E> for ErrorMiddleware {
    type Output = ErrorMiddlewareImpl<E>;

    fn transform(&self, ep: E) -> Self::Output {
        ErrorMiddlewareImpl { ep }
    }
}

pub struct ErrorMiddlewareImpl<E> {
    ep: E,
}

#[poem::async_trait]
impl<E: Endpoint<Output = Response>> Endpoint for ErrorMiddlewareImpl<E> {
    type Output = Response;

    async fn call(&self, request: Request) -> Result<Self::Output> {
        let method = request.method().clone();
        let uri = request.uri().clone();
        match self.ep.call(request).await {
            Err(error) => match error.downcast_ref::<ModelError>() {
                Some(model_error) => {
                    match model_error {
                        ModelError::StorageError(_) | ModelError::CorruptRecord(_) => {
                            error!(?method, ?uri, "{:#}", error);
                        }
                        _ => {
                            info!(?method, ?uri, code = model_error.code(), "{:#}", error);
                        }
                    }
                    Ok(render_model_error(model_error))
                }
                None if error.is::<NotFoundError>() => {
                    info!(?method, ?uri, "{:#}", error);
                    Ok(StatusCode::NOT_FOUND.into_response())
                }
                None if error.is::<MethodNotAllowedError>() => {
                    info!(?method, ?uri, "{:#}", error);
                    Ok(StatusCode::METHOD_NOT_ALLOWED.into_response())
                }
                None if error.is::<ParseJsonError>() => {
                    info!(?method, ?uri, "{:#}", error);
                    Ok(render_error(StatusCode::BAD_REQUEST, "invalid_request", error.to_string()))
                }
                None => {
                    error!(?method, ?uri, "{:#}", error);
                    Ok(render_error(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal_error",
                        "Internal server error".to_string(),
                    ))
                }
            },
            result => result,
        }
    }
}
