//! Exploratory data analysis for tabular files.
//!
//! A loaded [`services::dataset::Dataset`] goes through four independent
//! passes (column profile, missing values, correlation, category
//! frequencies) and a set of quality heuristics derived from them. The
//! results can be written out as a report directory or served as JSON.

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod services;

// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
}

impl AppState {
    pub fn new(config: config::Config) -> Self {
        Self { config }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::routes::<Arc<AppState>>())
        .merge(routes::datasets::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
