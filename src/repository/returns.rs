//! Loan return requests repository

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use super::page_bounds;
use crate::{
    error::{AppError, AppResult},
    models::{loan_return::RequestQuery, ApprovalStatus, LoanReturn},
};

#[derive(Clone)]
pub struct ReturnsRepository {
    pool: Pool<Postgres>,
}

impl ReturnsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get return request by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<LoanReturn> {
        sqlx::query_as::<_, LoanReturn>("SELECT * FROM loan_returns WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan return request {} not found", id)))
    }

    /// Get return request by ID and lock it
    pub async fn lock_by_id(&self, conn: &mut PgConnection, id: Uuid) -> AppResult<LoanReturn> {
        sqlx::query_as::<_, LoanReturn>("SELECT * FROM loan_returns WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan return request {} not found", id)))
    }

    /// Whether the loan already carries a return request
    pub async fn exists_for_loan(&self, conn: &mut PgConnection, loan_id: Uuid) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM loan_returns WHERE loan_id = $1)")
                .bind(loan_id)
                .fetch_one(conn)
                .await?;
        Ok(exists)
    }

    /// Insert a return request
    pub async fn create(
        &self,
        conn: &mut PgConnection,
        loan_id: Uuid,
        status: ApprovalStatus,
        date: DateTime<Utc>,
    ) -> AppResult<LoanReturn> {
        let created = sqlx::query_as::<_, LoanReturn>(
            r#"
            INSERT INTO loan_returns (id, loan_id, status, date)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(loan_id)
        .bind(status)
        .bind(date)
        .fetch_one(conn)
        .await?;

        Ok(created)
    }

    /// Set the librarian decision on a return request
    pub async fn set_status(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        status: ApprovalStatus,
    ) -> AppResult<LoanReturn> {
        sqlx::query_as::<_, LoanReturn>(
            "UPDATE loan_returns SET status = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Loan return request {} not found", id)))
    }

    /// List return requests
    pub async fn list(&self, query: &RequestQuery) -> AppResult<(Vec<LoanReturn>, i64)> {
        let (limit, offset) = page_bounds(query.page, query.per_page);

        let returns = sqlx::query_as::<_, LoanReturn>(
            r#"
            SELECT * FROM loan_returns
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR loan_id = $2)
            ORDER BY date DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(query.status)
        .bind(query.loan_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM loan_returns
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR loan_id = $2)
            "#,
        )
        .bind(query.status)
        .bind(query.loan_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((returns, total))
    }
}
