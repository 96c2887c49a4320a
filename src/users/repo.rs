use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

/// User row; soft-deleted rows never leave this module.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub created_at: OffsetDateTime,
    pub updated_at: Option<OffsetDateTime>,
}

/// Profile update: a present field overrides the stored value, an absent
/// field leaves it untouched.
#[derive(Debug, Default)]
pub struct UserPatch {
    pub name: Option<String>,
}

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password, created_at, updated_at
            FROM "user"
            WHERE email = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password, created_at, updated_at
            FROM "user"
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn list_active(db: &PgPool) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password, created_at, updated_at
            FROM "user"
            WHERE deleted_at IS NULL
            ORDER BY id
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    /// Returns the raw sqlx error so the caller can tell a unique-email
    /// violation apart from everything else.
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO "user" (name, email, password)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await
    }

    pub async fn apply_patch(db: &PgPool, id: i64, patch: UserPatch) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE "user"
            SET name = COALESCE($2, name), updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, name, email, password, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(patch.name)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn soft_delete(db: &PgPool, id: i64) -> anyhow::Result<()> {
        sqlx::query(r#"UPDATE "user" SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL"#)
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}
