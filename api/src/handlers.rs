use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use librarian_core::{InputError, PipelineError};
use serde_json::{json, Value};

use crate::{
    error::{ApiError, ApiResult},
    input,
    metrics::{self, outcome},
    state::AppState,
};

pub async fn index(State(state): State<AppState>) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, state.homepage)]).into_response()
}

/// Labels from the query string, data from the body; validate, then act.
pub async fn put_data(State(state): State<AppState>, req: Request) -> ApiResult<Json<Value>> {
    let (labels, data) = input::extract(state.librarian.input(), req)
        .await
        .map_err(|err| {
            metrics::observe_put(match &err {
                InputError::TooLarge(_) => outcome::TOO_LARGE,
                _ => outcome::INVALID_INPUT,
            });
            tracing::warn!(error = %err, "Rejected request input");
            ApiError::from(err)
        })?;

    let receipt = state
        .librarian
        .process(&labels, &data)
        .await
        .map_err(|err| {
            let result = match &err {
                PipelineError::Validation { .. } => outcome::VALIDATION_FAILED,
                PipelineError::LabelAction(_) => outcome::LABEL_ACTOR_FAILED,
                PipelineError::DataAction(_) => outcome::DATA_ACTOR_FAILED,
            };
            metrics::observe_put(result);
            tracing::warn!(error = %err, outcome = result, "Request not processed");
            ApiError::from(err)
        })?;

    metrics::observe_put(outcome::ACCEPTED);
    Ok(Json(json!({
        "message": receipt.summary(),
        "uid": receipt.uid,
        "label_response": receipt.label_response,
        "data_response": receipt.data_response,
    })))
}

/// Reserved for a retrieval API.
pub async fn get_data() -> ApiError {
    ApiError::not_implemented("API call not implemented")
}

pub async fn route_not_found() -> ApiError {
    ApiError::not_found("NotFound", "Route not found")
}

/// Prometheus text exposition of the state's registry.
pub async fn metrics_endpoint(State(state): State<AppState>) -> Response {
    let body = metrics::gather_metrics(&state.registry);
    ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response()
}
