//! Loan renewal request model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::enums::ApprovalStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoanRenewal {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub status: ApprovalStatus,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLoanRenewal {
    pub loan_id: Uuid,
}
