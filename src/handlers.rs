//! Axum handlers for the gateway's routes.
//!
//! Handlers stay thin: validate input via the extractor, delegate to the
//! service resolved from [`AppState`], and return its result untouched.
use axum::Json;
use axum::extract::{FromRequest, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;
use validator::Validate;

use crate::AppState;
use crate::errors::AppError;
use crate::schemas::{ChatRequest, ChatResponse, EmbeddingsRequest, EmbeddingsResponse};

/// JSON extractor that also runs `validator` bounds checks.
///
/// Deserialization failures (including unknown fields) use axum's standard
/// rejection; bounds violations produce a 422 with the structured error
/// detail. Either way, invalid bodies never reach a service.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;

        if let Err(errors) = value.validate() {
            let body = Json(serde_json::json!({ "detail": errors }));
            return Err((StatusCode::UNPROCESSABLE_ENTITY, body).into_response());
        }

        Ok(ValidatedJson(value))
    }
}

#[instrument(skip(state, request))]
pub async fn chat(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    Ok(Json(state.chat.chat(request).await?))
}

#[instrument(skip(state, request))]
pub async fn embeddings(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<EmbeddingsRequest>,
) -> Result<Json<EmbeddingsResponse>, AppError> {
    Ok(Json(state.embeddings.embed(request).await?))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Always 200, regardless of provider configuration.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
