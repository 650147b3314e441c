use std::net::IpAddr;
use std::str::FromStr;

use poem::listener::TcpListener;
use poem::middleware::{CatchPanic, Tracing};
use poem::{get, post, Endpoint, EndpointExt, Route, Server};

use crate::prelude::*;
use crate::state::ModelState;
use crate::web::middleware::{ErrorMiddleware, SecurityHeadersMiddleware, SentryMiddleware};

mod error;
mod middleware;
mod requests;
mod responses;
mod views;

pub fn create_app(state: Arc<ModelState>) -> impl Endpoint {
    Route::new()
        .at("/", get(views::api::get_root))
        .at("/health", get(views::api::get_health))
        .at("/train", post(views::model::post_train))
        .at("/predict", post(views::model::post_predict))
        .at("/model/status", get(views::model::get_status))
        .at("/app", get(views::app::get_app))
        .at("/static/script.js", get(views::r#static::get_script_js))
        .data(state)
        .with(Tracing)
        .with(CatchPanic::new())
        .with(ErrorMiddleware)
        .with(SecurityHeadersMiddleware)
        .with(SentryMiddleware)
}

pub async fn run(
    host: &str,
    port: u16,
    shutdown_timeout: StdDuration,
    state: Arc<ModelState>,
) -> Result {
    let app = create_app(state);
    info!(host, port, "listening…");
    Server::new(TcpListener::bind((IpAddr::from_str(host)?, port)))
        .run_with_graceful_shutdown(
            app,
            async {
                if let Err(error) = tokio::signal::ctrl_c().await {
                    error!("failed to listen for the shutdown signal: {:#}", error);
                }
                info!("shutting down…");
            },
            Some(shutdown_timeout),
        )
        .await?;
    Ok(())
}
