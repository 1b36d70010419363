//! Repository layer for database operations
//!
//! Methods taking a `&mut PgConnection` run inside the caller's transaction;
//! the `lock_*` variants take a row lock (`FOR UPDATE`) held until commit.

pub mod books;
pub mod loans;
pub mod renewals;
pub mod returns;
pub mod users;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub users: users::UsersRepository,
    pub loans: loans::LoansRepository,
    pub renewals: renewals::RenewalsRepository,
    pub returns: returns::ReturnsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            renewals: renewals::RenewalsRepository::new(pool.clone()),
            returns: returns::ReturnsRepository::new(pool.clone()),
            pool,
        }
    }

    /// Check database connectivity
    pub async fn ping(&self) -> crate::error::AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Normalize client paging input into `(page, per_page)`
pub fn page_params(page: Option<i64>, per_page: Option<i64>) -> (i64, i64) {
    (page.unwrap_or(1).max(1), per_page.unwrap_or(20).clamp(1, 100))
}

/// Convert 1-based page numbers into `(limit, offset)`
pub fn page_bounds(page: Option<i64>, per_page: Option<i64>) -> (i64, i64) {
    let (page, per_page) = page_params(page, per_page);
    (per_page, (page - 1).saturating_mul(per_page))
}
