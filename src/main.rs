#![warn(clippy::all)]

use crate::persistence::FileStore;
use crate::prelude::*;
use crate::state::ModelState;

mod error;
mod opts;
mod persistence;
mod prelude;
mod regression;
mod state;
mod tracing;
mod web;

#[tokio::main]
async fn main() -> Result {
    let opts = opts::parse();
    let _sentry_guard = crate::tracing::init(opts.sentry_dsn.clone(), opts.traces_sample_rate)?;
    info!(version = env!("CARGO_PKG_VERSION"), "starting…");

    let store = FileStore::new(&opts.model_path);
    info!(path = ?store.path(), "using the model store");
    let state = Arc::new(ModelState::new(Arc::new(store)));
    let status = state.status().await;
    info!(trained = status.trained, persisted_exists = status.persisted_exists, "model store checked");

    web::run(&opts.host, opts.port, opts.shutdown_timeout, state).await
}
