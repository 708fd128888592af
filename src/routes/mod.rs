use axum::{routing::get, Router};

pub mod datasets;

pub fn routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
}

pub async fn health_check() -> &'static str {
    "OK"
}
