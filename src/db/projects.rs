use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::project::{Project, DEFAULT_PROJECT_NAME};

/// Any project owned by the user, preferring the default one.
pub async fn find_first_for_user<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "SELECT * FROM projects WHERE user_id = $1
         ORDER BY is_default DESC, created_at ASC LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

pub async fn find_default<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE user_id = $1 AND is_default")
        .bind(user_id)
        .fetch_optional(executor)
        .await
}

/// Insert the default project. Returns `None` when a concurrent writer won
/// the unique `(user_id) WHERE is_default` slot first.
pub async fn insert_default<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "INSERT INTO projects (user_id, name, is_default) VALUES ($1, $2, true)
         ON CONFLICT (user_id) WHERE is_default DO NOTHING
         RETURNING *",
    )
    .bind(user_id)
    .bind(DEFAULT_PROJECT_NAME)
    .fetch_optional(executor)
    .await
}

/// All of the user's projects, oldest first. Nothing in the request path
/// lists projects; integration tests use this to inspect what expense
/// creation provisioned.
pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "SELECT * FROM projects WHERE user_id = $1 ORDER BY created_at ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
