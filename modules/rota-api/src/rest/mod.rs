pub mod chores;

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use tracing::error;

use rota_common::RotaError;
use rota_core::User;

use crate::AppState;

/// Wraps the domain taxonomy into HTTP responses.
pub struct ApiError(RotaError);

impl From<RotaError> for ApiError {
    fn from(e: RotaError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            RotaError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            RotaError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
            RotaError::InvalidState(m) => (StatusCode::BAD_REQUEST, m.clone()),
            RotaError::Unauthenticated(m) => (StatusCode::UNAUTHORIZED, m.clone()),
            RotaError::Infra(e) => {
                error!(error = %e, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// The authenticated caller. Extract this in handlers that require auth.
pub struct CurrentUser(pub User);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| RotaError::Unauthenticated("Missing bearer token".into()))?;

        let user_id = state
            .auth
            .verify_token(token)
            .ok_or_else(|| RotaError::Unauthenticated("Invalid or expired token".into()))?;

        let user = state
            .service
            .users()
            .get(&user_id)
            .await
            .map_err(RotaError::from)?
            .ok_or_else(|| RotaError::Unauthenticated("Unknown user".into()))?;

        Ok(CurrentUser(user))
    }
}
