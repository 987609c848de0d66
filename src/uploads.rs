//! CSV upload intake: multipart extraction, validation and summary.

use axum::http::HeaderMap;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::db::uploads::NewUpload;
use crate::error::AppError;
use crate::models::Upload;

/// Multipart field that carries the file.
pub const FILE_FIELD: &str = "file";

#[derive(Debug)]
pub enum UploadError {
    Invalid(String),
    Storage(sqlx::Error),
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadError::Invalid(msg) => write!(f, "{msg}"),
            UploadError::Storage(err) => write!(f, "storage failure: {err}"),
        }
    }
}

impl From<sqlx::Error> for UploadError {
    fn from(err: sqlx::Error) -> Self {
        UploadError::Storage(err)
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Invalid(msg) => AppError::BadRequest(msg),
            UploadError::Storage(err) => AppError::Database(err),
        }
    }
}

/// The file part pulled out of a multipart body.
#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Read the `file` part from a multipart request body. Other parts are
/// skipped.
pub async fn extract_file(headers: &HeaderMap, body: Bytes) -> Result<UploadedFile, UploadError> {
    let boundary = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| UploadError::Invalid("Expected multipart/form-data".to_string()))?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::Invalid(format!("Multipart error: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload.csv").to_string();
        let content_type = field.content_type().map(|m| m.essence_str().to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| UploadError::Invalid(format!("Field read error: {e}")))?;

        return Ok(UploadedFile {
            filename,
            content_type,
            data,
        });
    }

    Err(UploadError::Invalid("No file uploaded".to_string()))
}

/// Shape of an accepted CSV file.
#[derive(Debug, PartialEq)]
pub struct CsvSummary {
    pub row_count: i64,
    pub checksum: String,
    /// Short human-readable description, e.g. `2 rows, header: a,b`.
    pub summary: String,
}

/// Header text longer than this is cut in the summary.
const SUMMARY_HEADER_CHARS: usize = 120;

fn describe(row_count: usize, header: &str) -> String {
    let rows = if row_count == 1 { "row" } else { "rows" };
    let header = header.trim();
    match header.char_indices().nth(SUMMARY_HEADER_CHARS) {
        Some((cut, _)) => format!("{row_count} {rows}, header: {}...", &header[..cut]),
        None => format!("{row_count} {rows}, header: {header}"),
    }
}

fn is_csv(file: &UploadedFile) -> bool {
    file.filename.to_ascii_lowercase().ends_with(".csv")
        || file.content_type.as_deref() == Some("text/csv")
}

/// Check that the file is a non-empty UTF-8 CSV and summarise it. The first
/// non-blank line is treated as the header row.
pub fn inspect_csv(file: &UploadedFile) -> Result<(&str, CsvSummary), UploadError> {
    if !is_csv(file) {
        return Err(UploadError::Invalid("Only CSV files are allowed".to_string()));
    }

    // PostgreSQL TEXT cannot hold NUL
    let text = std::str::from_utf8(&file.data)
        .ok()
        .filter(|text| !text.contains('\0'))
        .ok_or_else(|| UploadError::Invalid("CSV file must be UTF-8 text".to_string()))?;

    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let header = lines
        .next()
        .ok_or_else(|| UploadError::Invalid("CSV file is empty".to_string()))?;
    let row_count = lines.count();

    let checksum = hex::encode(Sha256::digest(&file.data));

    Ok((
        text,
        CsvSummary {
            row_count: row_count as i64,
            checksum,
            summary: describe(row_count, header),
        },
    ))
}

pub async fn store(pool: &PgPool, user_id: Uuid, file: &UploadedFile) -> Result<Upload, UploadError> {
    let (content, summary) = inspect_csv(file)?;

    let upload = db::uploads::create(
        pool,
        user_id,
        &NewUpload {
            filename: &file.filename,
            content_type: file.content_type.as_deref(),
            size_bytes: file.data.len() as i64,
            row_count: summary.row_count,
            checksum: &summary.checksum,
            summary: &summary.summary,
            content,
        },
    )
    .await?;

    tracing::info!(
        %user_id,
        upload_id = %upload.id,
        filename = %upload.filename,
        rows = upload.row_count,
        "CSV uploaded"
    );
    Ok(upload)
}

pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Upload>, sqlx::Error> {
    db::uploads::list_for_user(pool, user_id).await
}

/// The stored text of the user's newest upload named `filename`.
pub async fn latest_content(
    pool: &PgPool,
    user_id: Uuid,
    filename: &str,
) -> Result<Option<String>, sqlx::Error> {
    db::uploads::find_latest_content(pool, user_id, filename).await
}
