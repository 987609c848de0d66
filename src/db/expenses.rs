use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::{Expense, NewExpense};

pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Expense>, sqlx::Error> {
    sqlx::query_as::<_, Expense>(
        "SELECT * FROM expenses WHERE user_id = $1 ORDER BY date DESC, created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn create<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
    project_id: Uuid,
    expense: &NewExpense,
) -> Result<Expense, sqlx::Error> {
    sqlx::query_as::<_, Expense>(
        "INSERT INTO expenses (description, amount, category, date, user_id, project_id)
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(&expense.description)
    .bind(expense.amount)
    .bind(&expense.category)
    .bind(expense.date)
    .bind(user_id)
    .bind(project_id)
    .fetch_one(executor)
    .await
}
