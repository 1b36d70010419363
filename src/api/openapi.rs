//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, health, loans, renewals, returns, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Libris API",
        version = "0.3.0",
        description = "Library catalog and loan lifecycle REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::token,
        auth::me,
        // Users
        users::list_users,
        users::get_user,
        users::get_user_by_username,
        users::create_user,
        users::update_user,
        users::delete_user,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Loans
        loans::request_loan,
        loans::approve_loan,
        loans::list_loans,
        loans::my_loans,
        loans::get_loan,
        loans::delete_loan,
        // Renewals
        renewals::request_renewal,
        renewals::approve_renewal,
        renewals::list_renewals,
        renewals::get_renewal,
        // Returns
        returns::request_return,
        returns::approve_return,
        returns::list_returns,
        returns::get_return,
    ),
    components(
        schemas(
            // Auth
            auth::TokenRequest,
            auth::TokenResponse,
            auth::UserInfo,
            // Users
            crate::models::user::Role,
            crate::models::user::User,
            crate::models::user::UserShort,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            // Books
            crate::models::book::Book,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            // Loans
            crate::models::enums::LoanStatus,
            crate::models::enums::ApprovalStatus,
            crate::models::loan::Loan,
            crate::models::loan::CreateLoan,
            crate::models::renewal::LoanRenewal,
            crate::models::renewal::CreateLoanRenewal,
            crate::models::loan_return::LoanReturn,
            crate::models::loan_return::CreateLoanReturn,
            // Pages
            super::PaginatedUsers,
            super::PaginatedBooks,
            super::PaginatedLoans,
            super::PaginatedRenewals,
            super::PaginatedReturns,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "User management"),
        (name = "books", description = "Catalog management"),
        (name = "loans", description = "Loan requests and approvals"),
        (name = "renewals", description = "Loan renewals"),
        (name = "returns", description = "Loan returns")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
