//! Loan renewal endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{loan_return::RequestQuery, renewal::CreateLoanRenewal, LoanRenewal},
    AppState,
};

use super::{ApiJson, ApiPath, ApiQuery, AuthenticatedUser, PaginatedRenewals, PaginatedResponse};

/// Request the renewal of a loan
#[utoipa::path(
    post,
    path = "/renewals",
    tag = "renewals",
    security(("bearer_auth" = [])),
    request_body = CreateLoanRenewal,
    responses(
        (status = 201, description = "Renewal recorded", body = LoanRenewal),
        (status = 403, description = "Loan belongs to another user"),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan can't be renewed or was already renewed")
    )
)]
pub async fn request_renewal(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(request): ApiJson<CreateLoanRenewal>,
) -> AppResult<(StatusCode, Json<LoanRenewal>)> {
    let renewal = state
        .services
        .lifecycle
        .request_renewal(&user.actor(), request.loan_id)
        .await?;

    Ok((StatusCode::CREATED, Json(renewal)))
}

/// Approve a pending renewal
#[utoipa::path(
    post,
    path = "/renewals/{id}/approve",
    tag = "renewals",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Renewal request ID")
    ),
    responses(
        (status = 200, description = "Renewal approved", body = LoanRenewal),
        (status = 403, description = "Members can't approve renewals"),
        (status = 404, description = "Renewal request not found"),
        (status = 409, description = "Already approved or loan not awaiting renewal")
    )
)]
pub async fn approve_renewal(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<LoanRenewal>> {
    let renewal = state.services.lifecycle.approve_renewal(&user.actor(), id).await?;
    Ok(Json(renewal))
}

/// List renewal requests
#[utoipa::path(
    get,
    path = "/renewals",
    tag = "renewals",
    security(("bearer_auth" = [])),
    params(RequestQuery),
    responses(
        (status = 200, description = "Renewal requests", body = PaginatedRenewals),
        (status = 403, description = "Librarian privileges required")
    )
)]
pub async fn list_renewals(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<RequestQuery>,
) -> AppResult<Json<PaginatedRenewals>> {
    let (renewals, total) = state.services.loans.list_renewals(&user.actor(), &query).await?;
    Ok(Json(PaginatedResponse::new(renewals, total, query.page, query.per_page)))
}

/// Get a renewal request
#[utoipa::path(
    get,
    path = "/renewals/{id}",
    tag = "renewals",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Renewal request ID")
    ),
    responses(
        (status = 200, description = "Renewal request", body = LoanRenewal),
        (status = 404, description = "Renewal request not found")
    )
)]
pub async fn get_renewal(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<LoanRenewal>> {
    let renewal = state.services.loans.get_renewal(&user.actor(), id).await?;
    Ok(Json(renewal))
}
