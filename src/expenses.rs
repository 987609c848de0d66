//! Expense recording: input validation, default-project resolution and
//! persistence.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::directory;
use crate::error::AppError;
use crate::models::{Expense, NewExpense, User};

#[derive(Debug)]
pub enum ExpenseError {
    Validation(String),
    Storage(sqlx::Error),
}

impl std::fmt::Display for ExpenseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpenseError::Validation(msg) => write!(f, "{msg}"),
            ExpenseError::Storage(err) => write!(f, "storage failure: {err}"),
        }
    }
}

impl From<sqlx::Error> for ExpenseError {
    fn from(err: sqlx::Error) -> Self {
        ExpenseError::Storage(err)
    }
}

impl From<ExpenseError> for AppError {
    fn from(err: ExpenseError) -> Self {
        match err {
            ExpenseError::Validation(msg) => AppError::BadRequest(msg),
            ExpenseError::Storage(err) => AppError::Database(err),
        }
    }
}

/// Create-expense request body. Every field is optional at the wire level so
/// missing values surface as validation errors instead of decode failures.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpense {
    pub description: Option<String>,
    pub amount: Option<Value>,
    pub category: Option<String>,
    pub date: Option<String>,
    /// Accepted for compatibility; expenses always land in the default project.
    pub project_id: Option<Value>,
}

impl CreateExpense {
    pub fn validate(self) -> Result<NewExpense, ExpenseError> {
        let description = required_text("description", self.description)?;
        let amount = parse_amount(self.amount.as_ref())?;
        let category = required_text("category", self.category)?;
        let date = parse_date(self.date.as_deref())?;

        Ok(NewExpense {
            description,
            amount,
            category,
            date,
        })
    }
}

fn required_text(field: &str, value: Option<String>) -> Result<String, ExpenseError> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(ExpenseError::Validation(format!("{field} is required"))),
    }
}

/// Accepts a JSON number or a numeric string. Non-finite and negative values
/// are rejected.
pub fn parse_amount(value: Option<&Value>) -> Result<f64, ExpenseError> {
    let amount = match value {
        None | Some(Value::Null) => {
            return Err(ExpenseError::Validation("amount is required".to_string()));
        }
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => {
            return Err(ExpenseError::Validation("amount is required".to_string()));
        }
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match amount {
        Some(a) if a.is_finite() && a >= 0.0 => Ok(a),
        Some(a) if a.is_finite() => Err(ExpenseError::Validation(
            "amount must not be negative".to_string(),
        )),
        _ => Err(ExpenseError::Validation("amount must be a number".to_string())),
    }
}

/// Years accepted for an expense date. PostgreSQL's DATE is wider, but
/// chrono's `%Y` also takes signed and five-digit years.
const DATE_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, keeping its UTC calendar
/// date.
pub fn parse_date(value: Option<&str>) -> Result<NaiveDate, ExpenseError> {
    let raw = value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ExpenseError::Validation("date is required".to_string()))?;

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| {
            DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc).date_naive())
        })
        .map_err(|_| ExpenseError::Validation("date must be an ISO-8601 date".to_string()))?;

    if !DATE_YEARS.contains(&date.year()) {
        return Err(ExpenseError::Validation("date is out of range".to_string()));
    }
    Ok(date)
}

pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Expense>, sqlx::Error> {
    db::expenses::list_for_user(pool, user_id).await
}

/// Validate and record an expense for `user` under their default project.
pub async fn create(
    pool: &PgPool,
    user: &User,
    input: CreateExpense,
) -> Result<Expense, ExpenseError> {
    if input.project_id.is_some() {
        tracing::debug!(user_id = %user.id, "Ignoring caller-supplied projectId");
    }
    let expense = input.validate()?;

    // Project and expense commit together or not at all
    let mut tx = pool.begin().await?;
    let project = directory::ensure_default_project(&mut *tx, user.id).await?;
    let created = db::expenses::create(&mut *tx, user.id, project.id, &expense).await?;
    tx.commit().await?;

    tracing::info!(
        user_id = %user.id,
        project_id = %project.id,
        expense_id = %created.id,
        "Expense recorded"
    );
    Ok(created)
}
