use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Json;
use serde::Deserialize;

use rota_common::RotaError;
use rota_core::{AddPersonBy, Chore};

use crate::rest::{ApiError, CurrentUser};
use crate::AppState;

// --- Request bodies ---

#[derive(Deserialize)]
pub struct CreateChoreRequest {
    name: String,
}

/// Either a free-text display name or the email of a registered account.
#[derive(Deserialize)]
pub struct AddPersonRequest {
    name: Option<String>,
    email: Option<String>,
}

// --- Handlers ---

pub async fn list_chores(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Chore>>, ApiError> {
    Ok(Json(state.service.list_chores(&user.id).await?))
}

pub async fn get_chore(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(chore_id): Path<String>,
) -> Result<Json<Chore>, ApiError> {
    Ok(Json(state.service.get_chore(&user.id, &chore_id).await?))
}

pub async fn create_chore(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<CreateChoreRequest>,
) -> Result<Json<Chore>, ApiError> {
    Ok(Json(state.service.create_chore(&user, &body.name).await?))
}

pub async fn delete_chore(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(chore_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.service.delete_chore(&user.id, &chore_id).await?;
    Ok(Json(
        serde_json::json!({ "message": "Chore deleted successfully" }),
    ))
}

pub async fn join_chore(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(chore_id): Path<String>,
) -> Result<Json<Chore>, ApiError> {
    Ok(Json(state.service.join_chore(&user, &chore_id).await?))
}

pub async fn add_person(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(chore_id): Path<String>,
    Json(body): Json<AddPersonRequest>,
) -> Result<Json<Chore>, ApiError> {
    let by = match (body.name, body.email) {
        (Some(name), None) => AddPersonBy::Name(name),
        (None, Some(email)) => AddPersonBy::Email(email),
        _ => {
            return Err(
                RotaError::InvalidState("Provide either a name or an email".into()).into(),
            )
        }
    };
    Ok(Json(
        state.service.add_person(&user.id, &chore_id, by).await?,
    ))
}

pub async fn remove_person(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path((chore_id, person_id)): Path<(String, String)>,
) -> Result<Json<Chore>, ApiError> {
    Ok(Json(
        state
            .service
            .remove_person(&user.id, &chore_id, &person_id)
            .await?,
    ))
}

pub async fn advance_queue(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(chore_id): Path<String>,
) -> Result<Json<Chore>, ApiError> {
    Ok(Json(state.service.advance(&user.id, &chore_id).await?))
}
