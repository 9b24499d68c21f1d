use crate::auth::repo_types::User;
use sqlx::PgPool;

impl User {
    /// Find a user by exact username.
    pub async fn find_by_username(db: &PgPool, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, description, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: i32) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, description, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with a hashed password. Returns the raw sqlx error
    /// so callers can map a unique-constraint violation to a conflict; the
    /// database constraint is the authoritative guard against concurrent
    /// signups with the same username.
    pub async fn create(db: &PgPool, username: &str, password_hash: &str) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, password_hash, description, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(db)
        .await
    }

    /// Replace the user's description, returning the updated row if present.
    pub async fn update_description(
        db: &PgPool,
        id: i32,
        description: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET description = $1
            WHERE id = $2
            RETURNING id, username, password_hash, description, created_at
            "#,
        )
        .bind(description)
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }
}
