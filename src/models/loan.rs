//! Loan model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::enums::LoanStatus;

/// Loan model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: Uuid,
    /// Borrower username
    pub username: String,
    pub book_id: Uuid,
    pub book_title: String,
    pub status: LoanStatus,
    /// Creation date
    pub date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

impl Loan {
    pub fn is_borrowed_by(&self, username: &str) -> bool {
        self.username == username
    }
}

/// Loan to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoan {
    pub username: String,
    pub book_id: Uuid,
    pub book_title: String,
    pub status: LoanStatus,
    pub date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

/// Create loan request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLoan {
    /// Borrower; required for librarians, ignored for members
    pub username: Option<String>,
    pub book_title: String,
}

/// Loan list filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct LoanQuery {
    pub status: Option<LoanStatus>,
    pub book_title: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
