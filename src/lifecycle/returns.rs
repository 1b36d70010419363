//! Return workflow
//!
//! The loan is marked `RETURNED` as soon as a return is requested. A
//! member's copy only goes back on the shelf once a librarian approves the
//! return record.

use super::state::transition;
use crate::{
    error::{AppError, AppResult},
    models::{Actor, ApprovalStatus, Book, Loan, LoanReturn, LoanStatus},
};

/// Writes produced by a return decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnPlan {
    pub loan_status: LoanStatus,
    pub record_status: ApprovalStatus,
    /// Change to the book's available count
    pub stock_delta: i32,
}

/// Decide a return request on `loan`
pub fn request(actor: &Actor, loan: &Loan, book: &Book) -> AppResult<ReturnPlan> {
    if !actor.is_elevated() && !loan.is_borrowed_by(&actor.username) {
        return Err(AppError::Forbidden(
            "You can't request return of other users loans".to_string(),
        ));
    }

    let loan_status = transition(loan.status, LoanStatus::Returned)?;

    if actor.is_elevated() {
        book.availability_after(1)?;
        Ok(ReturnPlan {
            loan_status,
            record_status: ApprovalStatus::Approved,
            stock_delta: 1,
        })
    } else {
        Ok(ReturnPlan {
            loan_status,
            record_status: ApprovalStatus::Pending,
            stock_delta: 0,
        })
    }
}

/// Decide the approval of a pending return request
pub fn approve(
    actor: &Actor,
    record: &LoanReturn,
    loan: &Loan,
    book: &Book,
) -> AppResult<ReturnPlan> {
    actor.require_elevated("approve loan return requests")?;

    if record.status == ApprovalStatus::Approved {
        return Err(AppError::Conflict(
            "This return request is already approved".to_string(),
        ));
    }
    if loan.status != LoanStatus::Returned {
        return Err(AppError::InvalidState(format!(
            "The loan is {} instead of RETURNED",
            loan.status
        )));
    }
    book.availability_after(1)?;

    Ok(ReturnPlan {
        loan_status: loan.status,
        record_status: ApprovalStatus::Approved,
        stock_delta: 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::fixtures::{book, loan, loan_return};
    use crate::models::Role;

    #[test]
    fn test_member_return_closes_loan_without_restock() {
        let member = Actor::new("alice", Role::Member);
        let shelf = book(1, 0);
        let approved = loan("alice", &shelf, LoanStatus::Approved);

        let plan = request(&member, &approved, &shelf).unwrap();

        assert_eq!(plan.loan_status, LoanStatus::Returned);
        assert_eq!(plan.record_status, ApprovalStatus::Pending);
        assert_eq!(plan.stock_delta, 0);
    }

    #[test]
    fn test_member_returns_only_own_loan() {
        let member = Actor::new("bob", Role::Member);
        let shelf = book(1, 0);
        let approved = loan("alice", &shelf, LoanStatus::Approved);

        let result = request(&member, &approved, &shelf);
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_elevated_return_restocks() {
        let librarian = Actor::new("lib", Role::Librarian);
        let shelf = book(2, 1);
        let renewing = loan("alice", &shelf, LoanStatus::RenewPending);

        let plan = request(&librarian, &renewing, &shelf).unwrap();

        assert_eq!(plan.loan_status, LoanStatus::Returned);
        assert_eq!(plan.record_status, ApprovalStatus::Approved);
        assert_eq!(plan.stock_delta, 1);
    }

    #[test]
    fn test_pending_loan_cannot_be_returned() {
        let librarian = Actor::new("lib", Role::Librarian);
        let shelf = book(1, 1);
        let pending = loan("alice", &shelf, LoanStatus::Pending);

        let result = request(&librarian, &pending, &shelf);
        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[test]
    fn test_returned_loan_cannot_be_returned_again() {
        let member = Actor::new("alice", Role::Member);
        let shelf = book(1, 0);
        let returned = loan("alice", &shelf, LoanStatus::Returned);

        let result = request(&member, &returned, &shelf);
        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[test]
    fn test_approve_restocks_once() {
        let librarian = Actor::new("lib", Role::Librarian);
        let shelf = book(1, 0);
        let returned = loan("alice", &shelf, LoanStatus::Returned);
        let pending = loan_return(&returned, ApprovalStatus::Pending);

        let plan = approve(&librarian, &pending, &returned, &shelf).unwrap();
        assert_eq!(plan.record_status, ApprovalStatus::Approved);
        assert_eq!(shelf.availability_after(plan.stock_delta).unwrap(), 1);

        let approved = loan_return(&returned, ApprovalStatus::Approved);
        let result = approve(&librarian, &approved, &returned, &shelf);
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_member_cannot_approve() {
        let member = Actor::new("alice", Role::Member);
        let shelf = book(1, 0);
        let returned = loan("alice", &shelf, LoanStatus::Returned);
        let pending = loan_return(&returned, ApprovalStatus::Pending);

        let result = approve(&member, &pending, &returned, &shelf);
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
