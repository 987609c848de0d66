//! Resolves session identities to users and provisions each user's default
//! project.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::db;
use crate::models::{Project, User};

pub async fn resolve_user(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    db::users::find_by_email(pool, email).await
}

/// Return one of the user's projects, creating "Default Project" when the user
/// has none.
///
/// Concurrent first writes converge on a single default project: the insert
/// is guarded by a partial unique index, and the loser re-reads the winner's
/// row. Runs on the caller's connection so a transaction that later fails
/// also discards a project created here.
pub async fn ensure_default_project(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Project, sqlx::Error> {
    if let Some(project) = db::projects::find_first_for_user(&mut *conn, user_id).await? {
        return Ok(project);
    }

    if let Some(project) = db::projects::insert_default(&mut *conn, user_id).await? {
        tracing::info!(%user_id, project_id = %project.id, "Created default project");
        return Ok(project);
    }

    db::projects::find_default(&mut *conn, user_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}
