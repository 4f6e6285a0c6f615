use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::admin::InternalState;
use crate::config::Environment;

/// Header carrying the shared internal key.
pub const X_INTERNAL_KEY: &str = "x-internal-key";

/// Outside development, require `x-internal-key` to match the configured key.
pub async fn internal_key_middleware(
    State(state): State<InternalState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if state.environment == Environment::Development {
        return next.run(request).await;
    }

    let provided = request
        .headers()
        .get(X_INTERNAL_KEY)
        .and_then(|h| h.to_str().ok());

    match (state.api_key.as_deref(), provided) {
        (Some(expected), Some(provided)) if !expected.is_empty() && expected == provided => {
            next.run(request).await
        }
        _ => {
            tracing::warn!(path = %request.uri().path(), "Rejected internal request");
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "message": "Invalid internal key" })),
            )
                .into_response()
        }
    }
}
