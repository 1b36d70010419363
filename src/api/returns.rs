//! Loan return endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        loan_return::{CreateLoanReturn, RequestQuery},
        LoanReturn,
    },
    AppState,
};

use super::{ApiJson, ApiPath, ApiQuery, AuthenticatedUser, PaginatedResponse, PaginatedReturns};

/// Request the return of a loan.
///
/// The loan is closed right away; the copy goes back on the shelf when a
/// librarian records or approves the return.
#[utoipa::path(
    post,
    path = "/returns",
    tag = "returns",
    security(("bearer_auth" = [])),
    request_body = CreateLoanReturn,
    responses(
        (status = 201, description = "Return recorded", body = LoanReturn),
        (status = 403, description = "Loan belongs to another user"),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan already returned or not checked out")
    )
)]
pub async fn request_return(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(request): ApiJson<CreateLoanReturn>,
) -> AppResult<(StatusCode, Json<LoanReturn>)> {
    let record = state
        .services
        .lifecycle
        .request_return(&user.actor(), request.loan_id)
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// Approve a pending return
#[utoipa::path(
    post,
    path = "/returns/{id}/approve",
    tag = "returns",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Return request ID")
    ),
    responses(
        (status = 200, description = "Return approved", body = LoanReturn),
        (status = 403, description = "Members can't approve returns"),
        (status = 404, description = "Return request not found"),
        (status = 409, description = "Return already approved")
    )
)]
pub async fn approve_return(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<LoanReturn>> {
    let record = state.services.lifecycle.approve_return(&user.actor(), id).await?;
    Ok(Json(record))
}

/// List return requests
#[utoipa::path(
    get,
    path = "/returns",
    tag = "returns",
    security(("bearer_auth" = [])),
    params(RequestQuery),
    responses(
        (status = 200, description = "Return requests", body = PaginatedReturns),
        (status = 403, description = "Librarian privileges required")
    )
)]
pub async fn list_returns(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<RequestQuery>,
) -> AppResult<Json<PaginatedReturns>> {
    let (records, total) = state.services.loans.list_returns(&user.actor(), &query).await?;
    Ok(Json(PaginatedResponse::new(records, total, query.page, query.per_page)))
}

/// Get a return request
#[utoipa::path(
    get,
    path = "/returns/{id}",
    tag = "returns",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Return request ID")
    ),
    responses(
        (status = 200, description = "Return request", body = LoanReturn),
        (status = 404, description = "Return request not found")
    )
)]
pub async fn get_return(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<LoanReturn>> {
    let record = state.services.loans.get_return(&user.actor(), id).await?;
    Ok(Json(record))
}
