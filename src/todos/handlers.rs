use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use super::{
    dto::{CreateTodoRequest, TodoDetails, TodoSummary, UpdateTodoRequest},
    repo::{Todo, TodoPatch},
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
        .route("/todos", get(list_todos).post(create_todo))
        .route(
            "/todos/:id",
            get(get_todo).patch(update_todo).delete(delete_todo),
        )
        .route("/todos/:id/complete", patch(complete_todo))
        .route("/todos/:id/uncomplete", patch(uncomplete_todo))
}

/// Ownership decision for a fetched row: a missing row is 404 before any
/// ownership question arises, a row owned by someone else is 403.
fn resolve_owned(todo: Option<Todo>, id: i64, user_id: i64) -> Result<Todo, ApiError> {
    let todo =
        todo.ok_or_else(|| ApiError::NotFound(format!("todo with id {id} is not exist")))?;
    if todo.user_id != user_id {
        warn!(todo_id = id, owner = todo.user_id, caller = user_id, "ownership check failed");
        return Err(ApiError::Forbidden(
            "you don't have permissions to access this todo".into(),
        ));
    }
    Ok(todo)
}

async fn load_owned(db: &PgPool, id: i64, user_id: i64) -> Result<Todo, ApiError> {
    resolve_owned(Todo::find_by_id(db, id).await?, id, user_id)
}

#[instrument(skip_all)]
pub async fn create_todo(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<CreateTodoRequest>,
) -> Result<(StatusCode, Json<Data<TodoDetails>>), ApiError> {
    let mut v = FieldValidator::new();
    let name = v.required("name", payload.name);
    v.length("name", &name, 1, 128);
    let description = v.required("description", payload.description);
    v.length("description", &description, 1, 256);
    v.finish()?;

    let todo = Todo::create(&state.db, user.id, &name, &description).await?;

    info!(todo_id = todo.id, user_id = user.id, "todo created");
    Ok((StatusCode::CREATED, data(TodoDetails::from(todo))))
}

#[instrument(skip_all)]
pub async fn list_todos(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Data<Vec<TodoSummary>>>, ApiError> {
    let todos = Todo::list_by_user(&state.db, user.id).await?;
    Ok(data(todos.into_iter().map(TodoSummary::from).collect()))
}

#[instrument(skip(state, user))]
pub async fn get_todo(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Data<TodoDetails>>, ApiError> {
    let id = parse_id_param(&id)?;
    let todo = load_owned(&state.db, id, user.id).await?;
    Ok(data(TodoDetails::from(todo)))
}

#[instrument(skip(state, user, payload))]
pub async fn update_todo(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateTodoRequest>,
) -> Result<Json<Data<TodoDetails>>, ApiError> {
    // One validation pass: a bad id lands in the same 400 map as body errors.
    let mut v = FieldValidator::new();
    let id = v.integer_param("id", &id);
    if let Some(name) = &payload.name {
        v.length("name", name, 1, 128);
    }
    if let Some(description) = &payload.description {
        v.length("description", description, 1, 256);
    }
    v.finish()?;

    let todo = load_owned(&state.db, id, user.id).await?;
    let patch = TodoPatch {
        name: payload.name,
        description: payload.description,
    };
    let updated = Todo::apply_patch(&state.db, todo.id, patch).await?;

    info!(todo_id = updated.id, user_id = user.id, "todo updated");
    Ok(data(TodoDetails::from(updated)))
}

#[instrument(skip(state, user))]
pub async fn complete_todo(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Data<TodoDetails>>, ApiError> {
    set_completed(&state, user.id, &id, true).await
}

#[instrument(skip(state, user))]
pub async fn uncomplete_todo(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Data<TodoDetails>>, ApiError> {
    set_completed(&state, user.id, &id, false).await
}

/// Idempotent: setting the flag to its current value changes nothing and
/// answers with the same record.
async fn set_completed(
    state: &AppState,
    user_id: i64,
    raw_id: &str,
    completed: bool,
) -> Result<Json<Data<TodoDetails>>, ApiError> {
    let id = parse_id_param(raw_id)?;
    let todo = load_owned(&state.db, id, user_id).await?;
    let updated = Todo::set_completed(&state.db, todo.id, completed).await?;
    info!(todo_id = updated.id, completed, "todo completion flag set");
    Ok(data(TodoDetails::from(updated)))
}

#[instrument(skip(state, user))]
pub async fn delete_todo(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Data<TodoDetails>>, ApiError> {
    let id = parse_id_param(&id)?;
    let todo = load_owned(&state.db, id, user.id).await?;
    Todo::soft_delete(&state.db, todo.id).await?;
    info!(todo_id = todo.id, user_id = user.id, "todo soft-deleted");
    // Pre-deletion snapshot.
    Ok(data(TodoDetails::from(todo)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn todo_owned_by(user_id: i64) -> Todo {
        Todo {
            id: 7,
            name: "groceries".into(),
            description: "milk and eggs".into(),
            completed: false,
            user_id,
            created_at: datetime!(2023-01-02 03:04:05 UTC),
            updated_at: None,
        }
    }

    #[test]
    fn missing_todo_is_not_found() {
        let err = resolve_owned(None, 7, 1).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "todo with id 7 is not exist");
    }

    #[test]
    fn someone_elses_todo_is_forbidden() {
        let err = resolve_owned(Some(todo_owned_by(2)), 7, 1).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::FORBIDDEN);
        assert_eq!(
            err.to_string(),
            "you don't have permissions to access this todo"
        );
    }

    #[test]
    fn own_todo_is_returned() {
        let todo = resolve_owned(Some(todo_owned_by(1)), 7, 1).expect("owned");
        assert_eq!(todo.id, 7);
        assert_eq!(todo.user_id, 1);
    }

    #[test]
    fn absence_wins_over_ownership() {
        // A soft-deleted or never-existing row reads as absent, so even the
        // wrong caller sees 404, never 403.
        let err = resolve_owned(None, 7, 99).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);
    }
}
