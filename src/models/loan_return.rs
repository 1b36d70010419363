//! Loan return request model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::enums::ApprovalStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoanReturn {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub status: ApprovalStatus,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLoanReturn {
    pub loan_id: Uuid,
}

/// Filters shared by the renewal and return request listings
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct RequestQuery {
    pub status: Option<ApprovalStatus>,
    pub loan_id: Option<Uuid>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
