use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, state::AppState};

pub fn librarian_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::index))
        .route("/put", post(handlers::put_data))
        .route("/get", get(handlers::get_data))
}

pub fn observability_routes() -> Router<AppState> {
    Router::new().route("/metrics", get(handlers::metrics_endpoint))
}
