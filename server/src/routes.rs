//! HTTP route handlers for the API.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use goforit_engine::{ExecutionResult, Language, UnknownLanguage, evaluate_with};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::last_code::{self, Submission};
use crate::state::AppState;

/// Build the API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/languages", get(languages))
        .route("/last-code", get(get_last_code))
        .route("/evaluate", post(evaluate))
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub detail: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn bad_request(detail: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            detail: detail.into(),
        }),
    )
}

/// POST /api/evaluate - run a snippet and return its result.
async fn evaluate(
    State(state): State<AppState>,
    Json(request): Json<Submission>,
) -> Result<Json<ExecutionResult>, ApiError> {
    let language = request
        .language
        .parse::<Language>()
        .map_err(|err: UnknownLanguage| bad_request(err.to_string()))?;

    if let Err(err) = last_code::save(&state.last_code_path, &request) {
        warn!(
            error = ?err,
            path = %state.last_code_path.display(),
            "failed to save last code"
        );
    }

    let result = evaluate_with(language, &request.code, &state.config, &state.executor).await;
    info!(%language, exit_code = result.exit_code, "evaluated");
    Ok(Json(result))
}

/// GET /api/last-code - the most recent submission, or the built-in default.
async fn get_last_code(State(state): State<AppState>) -> Json<Submission> {
    Json(last_code::load(&state.last_code_path))
}

#[derive(Debug, Serialize)]
struct LanguageEntry {
    id: &'static str,
    name: &'static str,
}

/// GET /api/languages - supported languages in registry order.
async fn languages() -> Json<Vec<LanguageEntry>> {
    Json(
        Language::ALL
            .into_iter()
            .map(|language| LanguageEntry {
                id: language.as_str(),
                name: language.display_name(),
            })
            .collect(),
    )
}
