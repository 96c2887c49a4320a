use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

#[derive(Debug, Clone, FromRow)]
pub struct Todo {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub completed: bool,
    pub user_id: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: Option<OffsetDateTime>,
}

/// Partial update: a present field overrides the stored value, an absent
/// field leaves it untouched.
#[derive(Debug, Default)]
pub struct TodoPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Writes the flag regardless of its current value, which is what makes
/// complete/uncomplete idempotent.
const SET_COMPLETED_SQL: &str = r#"
    UPDATE todo
    SET completed = $2, updated_at = now()
    WHERE id = $1 AND deleted_at IS NULL
    RETURNING id, name, description, completed, user_id, created_at, updated_at
"#;

impl Todo {
    pub async fn create(
        db: &PgPool,
        user_id: i64,
        name: &str,
        description: &str,
    ) -> anyhow::Result<Todo> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            INSERT INTO todo (name, description, user_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, completed, user_id, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(user_id)
        .fetch_one(db)
        .await?;
        Ok(todo)
    }

    pub async fn list_by_user(db: &PgPool, user_id: i64) -> anyhow::Result<Vec<Todo>> {
        let todos = sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, name, description, completed, user_id, created_at, updated_at
            FROM todo
            WHERE user_id = $1 AND deleted_at IS NULL
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(todos)
    }

    /// Not scoped to an owner; the handler decides between 404 and 403.
    pub async fn find_by_id(db: &PgPool, id: i64) -> anyhow::Result<Option<Todo>> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, name, description, completed, user_id, created_at, updated_at
            FROM todo
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(todo)
    }

    pub async fn apply_patch(db: &PgPool, id: i64, patch: TodoPatch) -> anyhow::Result<Todo> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            UPDATE todo
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, name, description, completed, user_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.description)
        .fetch_one(db)
        .await?;
        Ok(todo)
    }

    pub async fn set_completed(db: &PgPool, id: i64, completed: bool) -> anyhow::Result<Todo> {
        let todo = sqlx::query_as::<_, Todo>(SET_COMPLETED_SQL)
            .bind(id)
            .bind(completed)
            .fetch_one(db)
            .await?;
        Ok(todo)
    }

    pub async fn soft_delete(db: &PgPool, id: i64) -> anyhow::Result<()> {
        sqlx::query(r#"UPDATE todo SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL"#)
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_write_does_not_depend_on_the_current_flag() {
        assert!(SET_COMPLETED_SQL.contains("SET completed = $2"));
        let where_clause = SET_COMPLETED_SQL
            .split("WHERE")
            .nth(1)
            .and_then(|rest| rest.split("RETURNING").next())
            .expect("where clause");
        assert!(!where_clause.contains("completed"));
    }
}
