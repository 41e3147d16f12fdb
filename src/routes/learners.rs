use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use crate::extractors::JsonBody;
use crate::response::{created, ok, AppError};
use crate::state::AppState;
use crate::store::operations::users::User;
use crate::validation::validate_username;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_learner))
        .route("/:username", get(get_learner))
        .route("/:username/stats", get(get_learner_stats))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateLearnerRequest {
    username: String,
}

async fn create_learner(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateLearnerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let username = req.username.trim();
    validate_username(username).map_err(|msg| AppError::bad_request("VALIDATION_ERROR", msg))?;

    let user = User::new(username);
    state.store().create_user(&user).map_err(|e| match e {
        crate::store::StoreError::Conflict { .. } => {
            AppError::conflict("LEARNER_EXISTS", "Learner name already taken")
        }
        other => other.into(),
    })?;

    tracing::info!(user_id = %user.id, username = %user.username, "Learner registered");
    Ok(created(user))
}

fn find_learner(state: &AppState, username: &str) -> Result<User, AppError> {
    state
        .store()
        .get_user_by_username(username)?
        .ok_or_else(|| AppError::not_found("Learner not found"))
}

async fn get_learner(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(find_learner(&state, &username)?))
}

/// Current skill snapshot over the learner's whole attempt history.
async fn get_learner_stats(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let learner = find_learner(&state, &username)?;
    let questions = state.store().list_questions()?;
    let snapshot = state.engine().learner_snapshot(&learner.id, &questions)?;
    Ok(ok(snapshot))
}
