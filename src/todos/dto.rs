use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo::Todo;

/// Request body for POST /todos.
#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Request body for PATCH /todos/:id.
#[derive(Debug, Deserialize)]
pub struct UpdateTodoRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Full record, returned by every by-id operation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoDetails {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub completed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl From<Todo> for TodoDetails {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id,
            name: todo.name,
            description: todo.description,
            completed: todo.completed,
            created_at: todo.created_at,
            updated_at: todo.updated_at,
        }
    }
}

/// Listing entry for GET /todos.
#[derive(Debug, Serialize)]
pub struct TodoSummary {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub completed: bool,
}

impl From<Todo> for TodoSummary {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id,
            name: todo.name,
            description: todo.description,
            completed: todo.completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn details_use_camel_case_and_hide_the_owner() {
        let todo = Todo {
            id: 7,
            name: "groceries".into(),
            description: "milk and eggs".into(),
            completed: false,
            user_id: 1,
            created_at: datetime!(2023-01-02 03:04:05 UTC),
            updated_at: Some(datetime!(2023-01-03 00:00:00 UTC)),
        };
        let json = serde_json::to_value(TodoDetails::from(todo)).expect("serialize");
        assert_eq!(json["completed"], false);
        assert!(json["createdAt"].is_string());
        assert!(json["updatedAt"].is_string());
        assert!(json.get("userId").is_none());
    }

    #[test]
    fn patch_body_fields_are_independent() {
        let body: UpdateTodoRequest =
            serde_json::from_str(r#"{"description":"just milk"}"#).expect("deserialize");
        assert!(body.name.is_none());
        assert_eq!(body.description.as_deref(), Some("just milk"));
    }
}
