//! HTTP handlers for the best-value search

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use crate::best_value::BestValueRanker;
use crate::config::FarescoutConfig;
use crate::tequila::FlightApi;
use crate::FarescoutError;

/// Shared state for the web handlers
pub struct AppState {
    pub api: Box<dyn FlightApi>,
    pub config: FarescoutConfig,
}

/// Body of `POST /api/best`
#[derive(Debug, Deserialize)]
pub struct BestValueRequest {
    pub from: Option<String>,
    pub to: Option<Vec<String>>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/best", post(best_value))
        .with_state(state)
}

async fn best_value(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BestValueRequest>,
) -> (StatusCode, Json<Value>) {
    let from = request.from.filter(|from| !from.trim().is_empty());
    let to = request.to.filter(|to| !to.is_empty());
    let (Some(from), Some(to)) = (from, to) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Body must include 'from' and 'to' (as a list)."})),
        );
    };

    let ranker = BestValueRanker::new(state.api.as_ref(), state.config.search.currency.as_str());
    match ranker.rank(&from, &to).await {
        Ok(Some(candidate)) => (StatusCode::OK, Json(json!(candidate))),
        Ok(None) => (
            StatusCode::OK,
            Json(json!({"message": "No results found within the next 24 hours."})),
        ),
        Err(err) if err.is_client_error() => {
            (StatusCode::BAD_REQUEST, Json(json!({"error": err.to_string()})))
        }
        Err(err) => {
            error!("Best-value search failed: {}", err);
            let status = match err {
                FarescoutError::Upstream { .. } => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(json!({"error": err.to_string()})))
        }
    }
}
