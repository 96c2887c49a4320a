use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{PublicUser, UpdateUserRequest, UserProfile, UserSummary},
    repo::{User, UserPatch},
};
use crate::{
    auth::CurrentUser,
    error::ApiError,
    extract::{data, ApiJson, Data},
    state::AppState,
    validate::{parse_id_param, FieldValidator},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route(
            "/users/me",
            get(get_me).patch(update_me).delete(delete_me),
        )
        .route("/users/:id", get(get_user))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Data<Vec<UserSummary>>>, ApiError> {
    let users = User::list_active(&state.db).await?;
    Ok(data(users.into_iter().map(UserSummary::from).collect()))
}

#[instrument(skip_all)]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<Data<UserProfile>> {
    data(UserProfile::from(user))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Data<PublicUser>>, ApiError> {
    let id = parse_id_param(&id)?;
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user with id {id} is not exist")))?;
    Ok(data(PublicUser::from(user)))
}

#[instrument(skip_all)]
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> Result<Json<Data<UserProfile>>, ApiError> {
    let mut v = FieldValidator::new();
    if let Some(name) = &payload.name {
        v.length("name", name, 1, 128);
    }
    v.finish()?;

    let updated = User::apply_patch(&state.db, user.id, UserPatch { name: payload.name }).await?;

    info!(user_id = updated.id, "profile updated");
    Ok(data(UserProfile::from(updated)))
}

#[instrument(skip_all)]
pub async fn delete_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Data<UserProfile>>, ApiError> {
    User::soft_delete(&state.db, user.id).await?;
    info!(user_id = user.id, "account soft-deleted");
    // Pre-deletion snapshot.
    Ok(data(UserProfile::from(user)))
}
