//! Loan, renewal and return lookups
//!
//! State changes go through [`LifecycleService`](super::lifecycle::LifecycleService);
//! this service only reads, plus the administrative loan deletion.

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        loan::LoanQuery,
        loan_return::RequestQuery,
        Actor, Loan, LoanRenewal, LoanReturn,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Get a loan visible to `actor`
    pub async fn get_loan(&self, actor: &Actor, id: Uuid) -> AppResult<Loan> {
        let loan = self.repository.loans.get_by_id(id).await?;
        check_visible(actor, &loan)?;
        Ok(loan)
    }

    /// List all loans
    pub async fn list_loans(&self, actor: &Actor, query: &LoanQuery) -> AppResult<(Vec<Loan>, i64)> {
        actor.require_elevated("list other users' loans")?;
        self.repository.loans.list(query).await
    }

    /// List the loans of the acting user
    pub async fn list_own_loans(
        &self,
        actor: &Actor,
        page: Option<i64>,
        per_page: Option<i64>,
    ) -> AppResult<(Vec<Loan>, i64)> {
        self.repository
            .loans
            .list_for_user(&actor.username, page, per_page)
            .await
    }

    /// Delete a loan outside of the lifecycle; its request records go with it
    pub async fn delete_loan(&self, actor: &Actor, id: Uuid) -> AppResult<()> {
        actor.require_elevated("delete loans")?;
        self.repository.loans.delete(id).await?;
        tracing::warn!(loan_id = %id, actor = %actor.username, "Loan deleted");
        Ok(())
    }

    pub async fn get_renewal(&self, actor: &Actor, id: Uuid) -> AppResult<LoanRenewal> {
        let renewal = self.repository.renewals.get_by_id(id).await?;
        if !actor.is_elevated() {
            let loan = self.repository.loans.get_by_id(renewal.loan_id).await?;
            check_visible(actor, &loan)?;
        }
        Ok(renewal)
    }

    pub async fn list_renewals(
        &self,
        actor: &Actor,
        query: &RequestQuery,
    ) -> AppResult<(Vec<LoanRenewal>, i64)> {
        actor.require_elevated("list loan renewal requests")?;
        self.repository.renewals.list(query).await
    }

    pub async fn get_return(&self, actor: &Actor, id: Uuid) -> AppResult<LoanReturn> {
        let record = self.repository.returns.get_by_id(id).await?;
        if !actor.is_elevated() {
            let loan = self.repository.loans.get_by_id(record.loan_id).await?;
            check_visible(actor, &loan)?;
        }
        Ok(record)
    }

    pub async fn list_returns(
        &self,
        actor: &Actor,
        query: &RequestQuery,
    ) -> AppResult<(Vec<LoanReturn>, i64)> {
        actor.require_elevated("list loan return requests")?;
        self.repository.returns.list(query).await
    }
}

fn check_visible(actor: &Actor, loan: &Loan) -> AppResult<()> {
    if actor.is_elevated() || loan.is_borrowed_by(&actor.username) {
        Ok(())
    } else {
        Err(AppError::Forbidden("This loan belongs to another user".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        lifecycle::fixtures,
        models::{LoanStatus, Role},
    };

    #[test]
    fn test_loan_visibility() {
        let book = fixtures::book(2, 1);
        let loan = fixtures::loan("bob", &book, LoanStatus::Approved);

        assert!(check_visible(&Actor::new("bob", Role::Member), &loan).is_ok());
        assert!(check_visible(&Actor::new("eve", Role::Librarian), &loan).is_ok());
        assert!(matches!(
            check_visible(&Actor::new("alice", Role::Member), &loan),
            Err(AppError::Forbidden(_))
        ));
    }
}
