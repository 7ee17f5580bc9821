pub mod config;
pub mod error;
pub mod handlers;
pub mod input;
pub mod metrics;
pub mod observability;
pub mod routes;
pub mod state;

use axum::{
    extract::{DefaultBodyLimit, MatchedPath},
    middleware, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::state::AppState;

/// The full HTTP surface. `server.cors` enables permissive cross-origin
/// access, which also answers `OPTIONS /put` preflights.
pub fn app(state: AppState, server: &ServerConfig) -> Router {
    let body_limit = match server.body_limit {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    let router = Router::new()
        .merge(routes::librarian_routes())
        .merge(routes::observability_routes())
        .fallback(handlers::route_not_found)
        .layer(body_limit)
        .layer(middleware::from_fn(request_logger))
        .layer(TraceLayer::new_for_http());

    let router = if server.cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };
    router.with_state(state)
}

async fn request_logger(
    req: axum::http::Request<axum::body::Body>,
    next: middleware::Next,
) -> axum::response::Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let start = std::time::Instant::now();

    let response = next.run(req).await;

    let elapsed = start.elapsed();
    let status = response.status().as_u16();

    tracing::info!("{method} {uri} {status} {}ms", elapsed.as_millis());
    metrics::observe_http(method.as_str(), &path, status, elapsed.as_secs_f64());

    response
}
