//! Loans repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use super::page_bounds;
use crate::{
    error::{AppError, AppResult},
    models::{
        loan::{Loan, LoanQuery, NewLoan},
        LoanStatus,
    },
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Get loan by ID and lock it for the rest of the transaction
    pub async fn lock_by_id(&self, conn: &mut PgConnection, id: Uuid) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Whether `username` holds a loan of `book_id` that is not yet returned
    pub async fn has_open_loan(
        &self,
        conn: &mut PgConnection,
        username: &str,
        book_id: Uuid,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM loans WHERE username = $1 AND book_id = $2 AND status <> $3)",
        )
        .bind(username)
        .bind(book_id)
        .bind(LoanStatus::Returned)
        .fetch_one(conn)
        .await?;
        Ok(exists)
    }

    /// Insert a new loan
    pub async fn create(&self, conn: &mut PgConnection, loan: &NewLoan) -> AppResult<Loan> {
        let created = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (id, username, book_id, book_title, status, date, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&loan.username)
        .bind(loan.book_id)
        .bind(&loan.book_title)
        .bind(loan.status)
        .bind(loan.date)
        .bind(loan.due_date)
        .fetch_one(conn)
        .await?;

        Ok(created)
    }

    /// Write a new status and due date
    pub async fn update_state(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        status: LoanStatus,
        due_date: DateTime<Utc>,
    ) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>(
            "UPDATE loans SET status = $2, due_date = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .bind(due_date)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// List loans with optional status and title filters
    pub async fn list(&self, query: &LoanQuery) -> AppResult<(Vec<Loan>, i64)> {
        let (limit, offset) = page_bounds(query.page, query.per_page);

        let loans = sqlx::query_as::<_, Loan>(
            r#"
            SELECT * FROM loans
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR book_title = $2)
            ORDER BY date DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(query.status)
        .bind(&query.book_title)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM loans
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR book_title = $2)
            "#,
        )
        .bind(query.status)
        .bind(&query.book_title)
        .fetch_one(&self.pool)
        .await?;

        Ok((loans, total))
    }

    /// Get loans for a borrower
    pub async fn list_for_user(
        &self,
        username: &str,
        page: Option<i64>,
        per_page: Option<i64>,
    ) -> AppResult<(Vec<Loan>, i64)> {
        let (limit, offset) = page_bounds(page, per_page);

        let loans = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE username = $1 ORDER BY date DESC LIMIT $2 OFFSET $3",
        )
        .bind(username)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE username = $1")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;

        Ok((loans, total))
    }

    /// Delete a loan together with its renewal and return records
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM loans WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Loan with id {} not found", id)));
        }
        Ok(())
    }
}
