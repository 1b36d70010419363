//! Loan endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::loan::{CreateLoan, Loan, LoanQuery},
    AppState,
};

use super::{ApiJson, ApiPath, ApiQuery, AuthenticatedUser, PaginatedLoans, PaginatedResponse};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Request a loan.
///
/// Members borrow for themselves and their request waits for approval;
/// librarians name the borrower and the loan is approved at once.
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = CreateLoan,
    responses(
        (status = 201, description = "Loan created", body = Loan),
        (status = 404, description = "Book or borrower not found"),
        (status = 409, description = "Already borrowed or out of stock")
    )
)]
pub async fn request_loan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(request): ApiJson<CreateLoan>,
) -> AppResult<(StatusCode, Json<Loan>)> {
    let loan = state
        .services
        .lifecycle
        .request_loan(&user.actor(), request.username.as_deref(), &request.book_title)
        .await?;

    Ok((StatusCode::CREATED, Json(loan)))
}

/// Approve a pending loan
#[utoipa::path(
    put,
    path = "/loans/{id}/approve",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan approved", body = Loan),
        (status = 403, description = "Members can't approve loans"),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan is not pending or book is out of stock")
    )
)]
pub async fn approve_loan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.lifecycle.approve_loan(&user.actor(), id).await?;
    Ok(Json(loan))
}

/// List all loans
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(LoanQuery),
    responses(
        (status = 200, description = "Loans", body = PaginatedLoans),
        (status = 403, description = "Librarian privileges required")
    )
)]
pub async fn list_loans(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<LoanQuery>,
) -> AppResult<Json<PaginatedLoans>> {
    let (loans, total) = state.services.loans.list_loans(&user.actor(), &query).await?;
    Ok(Json(PaginatedResponse::new(loans, total, query.page, query.per_page)))
}

/// List the loans of the current user
#[utoipa::path(
    get,
    path = "/loans/mine",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageParams),
    responses(
        (status = 200, description = "Own loans", body = PaginatedLoans)
    )
)]
pub async fn my_loans(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiQuery(params): ApiQuery<PageParams>,
) -> AppResult<Json<PaginatedLoans>> {
    let (loans, total) = state
        .services
        .loans
        .list_own_loans(&user.actor(), params.page, params.per_page)
        .await?;
    Ok(Json(PaginatedResponse::new(loans, total, params.page, params.per_page)))
}

/// Get a loan
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan", body = Loan),
        (status = 403, description = "Loan belongs to another user"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get_loan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.loans.get_loan(&user.actor(), id).await?;
    Ok(Json(loan))
}

/// Delete a loan and its renewal and return records
#[utoipa::path(
    delete,
    path = "/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Loan ID")
    ),
    responses(
        (status = 204, description = "Loan deleted"),
        (status = 403, description = "Librarian privileges required"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn delete_loan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<StatusCode> {
    state.services.loans.delete_loan(&user.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
