use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Upload;

/// Every column except `content`.
const UPLOAD_COLUMNS: &str =
    "id, user_id, filename, content_type, size_bytes, row_count, checksum, summary, uploaded_at";

pub struct NewUpload<'a> {
    pub filename: &'a str,
    pub content_type: Option<&'a str>,
    pub size_bytes: i64,
    pub row_count: i64,
    pub checksum: &'a str,
    pub summary: &'a str,
    pub content: &'a str,
}

pub async fn create(
    pool: &PgPool,
    user_id: Uuid,
    upload: &NewUpload<'_>,
) -> Result<Upload, sqlx::Error> {
    sqlx::query_as::<_, Upload>(&format!(
        "INSERT INTO uploads (user_id, filename, content_type, size_bytes, row_count, checksum, summary, content)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {UPLOAD_COLUMNS}"
    ))
    .bind(user_id)
    .bind(upload.filename)
    .bind(upload.content_type)
    .bind(upload.size_bytes)
    .bind(upload.row_count)
    .bind(upload.checksum)
    .bind(upload.summary)
    .bind(upload.content)
    .fetch_one(pool)
    .await
}

pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Upload>, sqlx::Error> {
    sqlx::query_as::<_, Upload>(&format!(
        "SELECT {UPLOAD_COLUMNS} FROM uploads WHERE user_id = $1 ORDER BY uploaded_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// CSV text of the user's most recent upload with this filename.
pub async fn find_latest_content(
    pool: &PgPool,
    user_id: Uuid,
    filename: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT content FROM uploads WHERE user_id = $1 AND filename = $2
         ORDER BY uploaded_at DESC LIMIT 1",
    )
    .bind(user_id)
    .bind(filename)
    .fetch_optional(pool)
    .await
}
