//! Loan lifecycle engine
//!
//! Runs each lifecycle operation as one database transaction. Rows are
//! locked in a fixed order (request record, loan, book) so concurrent
//! operations on the same entities serialize instead of deadlocking, and
//! nothing becomes visible unless the whole operation commits.

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    lifecycle::{renewal, returns, state, LoanPolicy},
    models::{Actor, Loan, LoanRenewal, LoanReturn},
    repository::Repository,
};

#[derive(Clone)]
pub struct LifecycleService {
    repository: Repository,
    policy: LoanPolicy,
}

impl LifecycleService {
    pub fn new(repository: Repository, policy: LoanPolicy) -> Self {
        Self { repository, policy }
    }

    /// Request a loan of the book titled `book_title`
    pub async fn request_loan(
        &self,
        actor: &Actor,
        borrower: Option<&str>,
        book_title: &str,
    ) -> AppResult<Loan> {
        self.request_loan_tx(actor, borrower, book_title)
            .await
            .inspect_err(|e| rejected("request_loan", actor, e))
    }

    async fn request_loan_tx(
        &self,
        actor: &Actor,
        borrower: Option<&str>,
        book_title: &str,
    ) -> AppResult<Loan> {
        let mut tx = self.repository.pool.begin().await?;

        let borrower = if actor.is_elevated() {
            if let Some(username) = borrower {
                if self.repository.users.lock_by_username(&mut *tx, username).await?.is_none() {
                    return Err(AppError::NotFound(format!("User {} not found", username)));
                }
            }
            borrower
        } else {
            Some(actor.username.as_str())
        };

        let book = self
            .repository
            .books
            .lock_by_title(&mut *tx, book_title)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No book titled '{}'", book_title)))?;

        if let Some(username) = borrower {
            if self.repository.loans.has_open_loan(&mut *tx, username, book.id).await? {
                return Err(AppError::Conflict(format!(
                    "{} already has a loan of '{}'",
                    username, book.title
                )));
            }
        }

        let plan = state::request(actor, borrower, &book, &self.policy, Utc::now())?;

        if plan.stock_delta != 0 {
            self.repository
                .books
                .adjust_availability(&mut *tx, &book, plan.stock_delta)
                .await?;
        }
        let loan = self.repository.loans.create(&mut *tx, &plan.loan).await?;

        tx.commit().await?;

        tracing::info!(
            loan_id = %loan.id,
            actor = %actor.username,
            borrower = %loan.username,
            status = %loan.status,
            "Loan requested"
        );
        Ok(loan)
    }

    /// Approve a pending loan and check the copy out
    pub async fn approve_loan(&self, actor: &Actor, loan_id: Uuid) -> AppResult<Loan> {
        self.approve_loan_tx(actor, loan_id)
            .await
            .inspect_err(|e| rejected("approve_loan", actor, e))
    }

    async fn approve_loan_tx(&self, actor: &Actor, loan_id: Uuid) -> AppResult<Loan> {
        actor.require_elevated("approve loan requests")?;

        let mut tx = self.repository.pool.begin().await?;

        let loan = self.repository.loans.lock_by_id(&mut *tx, loan_id).await?;
        let book = self.repository.books.lock_by_id(&mut *tx, loan.book_id).await?;

        let plan = state::approve(actor, &loan, &book, &self.policy, Utc::now())?;

        self.repository
            .books
            .adjust_availability(&mut *tx, &book, plan.stock_delta)
            .await?;
        let loan = self
            .repository
            .loans
            .update_state(&mut *tx, loan.id, plan.status, plan.due_date)
            .await?;

        tx.commit().await?;

        tracing::info!(loan_id = %loan.id, actor = %actor.username, "Loan approved");
        Ok(loan)
    }

    /// Request the renewal of a loan
    pub async fn request_renewal(&self, actor: &Actor, loan_id: Uuid) -> AppResult<LoanRenewal> {
        self.request_renewal_tx(actor, loan_id)
            .await
            .inspect_err(|e| rejected("request_renewal", actor, e))
    }

    async fn request_renewal_tx(&self, actor: &Actor, loan_id: Uuid) -> AppResult<LoanRenewal> {
        let mut tx = self.repository.pool.begin().await?;

        let loan = self.repository.loans.lock_by_id(&mut *tx, loan_id).await?;
        let plan = renewal::request(actor, &loan, &self.policy)?;

        if self.repository.renewals.exists_for_loan(&mut *tx, loan.id).await? {
            return Err(AppError::Conflict(
                "This loan renewal already exists".to_string(),
            ));
        }

        self.repository
            .loans
            .update_state(&mut *tx, loan.id, plan.loan_status, plan.due_date)
            .await?;
        let record = self
            .repository
            .renewals
            .create(&mut *tx, loan.id, plan.record_status, Utc::now())
            .await?;

        tx.commit().await?;

        tracing::info!(
            renewal_id = %record.id,
            loan_id = %loan.id,
            actor = %actor.username,
            status = %record.status,
            "Loan renewal requested"
        );
        Ok(record)
    }

    /// Approve a pending renewal request
    pub async fn approve_renewal(&self, actor: &Actor, renewal_id: Uuid) -> AppResult<LoanRenewal> {
        self.approve_renewal_tx(actor, renewal_id)
            .await
            .inspect_err(|e| rejected("approve_renewal", actor, e))
    }

    async fn approve_renewal_tx(&self, actor: &Actor, renewal_id: Uuid) -> AppResult<LoanRenewal> {
        actor.require_elevated("approve loan renewal requests")?;

        let mut tx = self.repository.pool.begin().await?;

        let record = self.repository.renewals.lock_by_id(&mut *tx, renewal_id).await?;
        let loan = self.repository.loans.lock_by_id(&mut *tx, record.loan_id).await?;

        let plan = renewal::approve(actor, &record, &loan, &self.policy)?;

        self.repository
            .loans
            .update_state(&mut *tx, loan.id, plan.loan_status, plan.due_date)
            .await?;
        let record = self
            .repository
            .renewals
            .set_status(&mut *tx, record.id, plan.record_status)
            .await?;

        tx.commit().await?;

        tracing::info!(renewal_id = %record.id, loan_id = %loan.id, actor = %actor.username, "Loan renewal approved");
        Ok(record)
    }

    /// Request the return of a loan; the loan is closed immediately
    pub async fn request_return(&self, actor: &Actor, loan_id: Uuid) -> AppResult<LoanReturn> {
        self.request_return_tx(actor, loan_id)
            .await
            .inspect_err(|e| rejected("request_return", actor, e))
    }

    async fn request_return_tx(&self, actor: &Actor, loan_id: Uuid) -> AppResult<LoanReturn> {
        let mut tx = self.repository.pool.begin().await?;

        let loan = self.repository.loans.lock_by_id(&mut *tx, loan_id).await?;

        if self.repository.returns.exists_for_loan(&mut *tx, loan.id).await? {
            return Err(AppError::Conflict(
                "This loan return already exists".to_string(),
            ));
        }

        let book = self.repository.books.lock_by_id(&mut *tx, loan.book_id).await?;
        let plan = returns::request(actor, &loan, &book)?;

        self.repository
            .loans
            .update_state(&mut *tx, loan.id, plan.loan_status, loan.due_date)
            .await?;
        if plan.stock_delta != 0 {
            self.repository
                .books
                .adjust_availability(&mut *tx, &book, plan.stock_delta)
                .await?;
        }
        let record = self
            .repository
            .returns
            .create(&mut *tx, loan.id, plan.record_status, Utc::now())
            .await?;

        tx.commit().await?;

        tracing::info!(
            return_id = %record.id,
            loan_id = %loan.id,
            actor = %actor.username,
            status = %record.status,
            "Loan return requested"
        );
        Ok(record)
    }

    /// Approve a pending return request and put the copy back on the shelf
    pub async fn approve_return(&self, actor: &Actor, return_id: Uuid) -> AppResult<LoanReturn> {
        self.approve_return_tx(actor, return_id)
            .await
            .inspect_err(|e| rejected("approve_return", actor, e))
    }

    async fn approve_return_tx(&self, actor: &Actor, return_id: Uuid) -> AppResult<LoanReturn> {
        actor.require_elevated("approve loan return requests")?;

        let mut tx = self.repository.pool.begin().await?;

        let record = self.repository.returns.lock_by_id(&mut *tx, return_id).await?;
        let loan = self.repository.loans.lock_by_id(&mut *tx, record.loan_id).await?;
        let book = self.repository.books.lock_by_id(&mut *tx, loan.book_id).await?;

        let plan = returns::approve(actor, &record, &loan, &book)?;

        self.repository
            .books
            .adjust_availability(&mut *tx, &book, plan.stock_delta)
            .await?;
        let record = self
            .repository
            .returns
            .set_status(&mut *tx, record.id, plan.record_status)
            .await?;

        tx.commit().await?;

        tracing::info!(return_id = %record.id, loan_id = %loan.id, actor = %actor.username, "Loan return approved");
        Ok(record)
    }
}

fn rejected(operation: &str, actor: &Actor, error: &AppError) {
    tracing::debug!(operation, actor = %actor.username, error = %error, "Lifecycle operation rejected");
}
