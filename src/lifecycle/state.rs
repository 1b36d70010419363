//! Loan state machine
//!
//! `PENDING -> APPROVED -> {RENEW_PENDING -> APPROVED} -> RETURNED`, with
//! `APPROVED -> APPROVED` for renewals granted directly by a librarian.

use chrono::{DateTime, Utc};

use super::LoanPolicy;
use crate::{
    error::{AppError, AppResult},
    models::{loan::NewLoan, Actor, Book, Loan, LoanStatus},
};

/// Check a status change, returning the target status when it is legal
pub fn transition(from: LoanStatus, to: LoanStatus) -> AppResult<LoanStatus> {
    use LoanStatus::*;

    let legal = matches!(
        (from, to),
        (Pending, Approved)
            | (Approved, Approved)
            | (Approved, RenewPending)
            | (RenewPending, Approved)
            | (Approved, Returned)
            | (RenewPending, Returned)
    );

    if legal {
        Ok(to)
    } else {
        Err(AppError::InvalidState(format!(
            "A {} loan can't become {}",
            from, to
        )))
    }
}

/// Outcome of a loan request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanRequestPlan {
    pub loan: NewLoan,
    /// Change to the book's available count
    pub stock_delta: i32,
}

/// Outcome of a loan approval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanApprovalPlan {
    pub status: LoanStatus,
    pub due_date: DateTime<Utc>,
    pub stock_delta: i32,
}

/// Decide how a borrow request is recorded.
///
/// Members always borrow for themselves and wait for approval. Librarians and
/// admins lend on behalf of a named borrower and hand the copy out at once,
/// so the book must have a copy on the shelf.
pub fn request(
    actor: &Actor,
    borrower: Option<&str>,
    book: &Book,
    policy: &LoanPolicy,
    now: DateTime<Utc>,
) -> AppResult<LoanRequestPlan> {
    let (username, status, stock_delta) = if actor.is_elevated() {
        let username = borrower
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .ok_or_else(|| AppError::Validation("A borrower username is required".to_string()))?;
        book.availability_after(-1)?;
        (username.to_string(), LoanStatus::Approved, -1)
    } else {
        (actor.username.clone(), LoanStatus::Pending, 0)
    };

    Ok(LoanRequestPlan {
        loan: NewLoan {
            username,
            book_id: book.id,
            book_title: book.title.clone(),
            status,
            date: now,
            due_date: now + policy.loan_duration,
        },
        stock_delta,
    })
}

/// Decide the approval of a pending loan
pub fn approve(
    actor: &Actor,
    loan: &Loan,
    book: &Book,
    policy: &LoanPolicy,
    now: DateTime<Utc>,
) -> AppResult<LoanApprovalPlan> {
    actor.require_elevated("approve loan requests")?;

    if loan.status != LoanStatus::Pending {
        return Err(AppError::InvalidState(format!(
            "Only pending loans can be approved, this one is {}",
            loan.status
        )));
    }
    let status = transition(loan.status, LoanStatus::Approved)?;
    book.availability_after(-1)?;

    Ok(LoanApprovalPlan {
        status,
        due_date: now + policy.loan_duration,
        stock_delta: -1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::fixtures::{book, loan, now};
    use crate::models::Role;
    use chrono::Duration;

    #[test]
    fn test_transition_table() {
        use LoanStatus::*;

        assert!(transition(Pending, Approved).is_ok());
        assert!(transition(Approved, Approved).is_ok());
        assert!(transition(Approved, RenewPending).is_ok());
        assert!(transition(RenewPending, Approved).is_ok());
        assert!(transition(Approved, Returned).is_ok());
        assert!(transition(RenewPending, Returned).is_ok());

        assert!(transition(Pending, RenewPending).is_err());
        assert!(transition(Pending, Returned).is_err());
        assert!(transition(Approved, Pending).is_err());
        assert!(transition(RenewPending, RenewPending).is_err());
    }

    #[test]
    fn test_returned_is_terminal() {
        for next in LoanStatus::VARIANTS {
            assert!(matches!(
                transition(LoanStatus::Returned, next),
                Err(AppError::InvalidState(_))
            ));
        }
    }

    #[test]
    fn test_member_request_is_pending_without_stock() {
        let member = Actor::new("alice", Role::Member);
        let empty = book(1, 0);

        let plan = request(&member, Some("mallory"), &empty, &LoanPolicy::default(), now()).unwrap();

        assert_eq!(plan.loan.username, "alice");
        assert_eq!(plan.loan.status, LoanStatus::Pending);
        assert_eq!(plan.loan.due_date, now() + Duration::days(14));
        assert_eq!(plan.stock_delta, 0);
    }

    #[test]
    fn test_elevated_request_out_of_stock() {
        let librarian = Actor::new("lib", Role::Librarian);
        let empty = book(1, 0);

        let result = request(&librarian, Some("alice"), &empty, &LoanPolicy::default(), now());
        assert!(matches!(result, Err(AppError::OutOfStock(_))));
    }

    #[test]
    fn test_elevated_request_is_approved_and_checks_out() {
        let admin = Actor::new("root", Role::Admin);
        let shelf = book(2, 2);

        let plan = request(&admin, Some("alice"), &shelf, &LoanPolicy::default(), now()).unwrap();

        assert_eq!(plan.loan.username, "alice");
        assert_eq!(plan.loan.status, LoanStatus::Approved);
        assert_eq!(plan.stock_delta, -1);
    }

    #[test]
    fn test_elevated_request_needs_borrower() {
        let librarian = Actor::new("lib", Role::Librarian);
        let result = request(&librarian, Some("  "), &book(1, 1), &LoanPolicy::default(), now());
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_approve_pending_loan() {
        let librarian = Actor::new("lib", Role::Librarian);
        let shelf = book(1, 1);
        let pending = loan("alice", &shelf, LoanStatus::Pending);
        let later = now() + Duration::days(3);

        let plan = approve(&librarian, &pending, &shelf, &LoanPolicy::default(), later).unwrap();

        assert_eq!(plan.status, LoanStatus::Approved);
        assert_eq!(plan.due_date, later + Duration::days(14));
        assert_eq!(plan.stock_delta, -1);
        assert_eq!(shelf.availability_after(plan.stock_delta).unwrap(), 0);
    }

    #[test]
    fn test_second_approval_is_invalid_state() {
        let librarian = Actor::new("lib", Role::Librarian);
        let shelf = book(1, 0);
        let approved = loan("alice", &shelf, LoanStatus::Approved);

        let result = approve(&librarian, &approved, &shelf, &LoanPolicy::default(), now());
        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[test]
    fn test_member_cannot_approve() {
        let member = Actor::new("alice", Role::Member);
        let shelf = book(1, 1);
        let pending = loan("alice", &shelf, LoanStatus::Pending);

        let result = approve(&member, &pending, &shelf, &LoanPolicy::default(), now());
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_approve_without_stock() {
        let librarian = Actor::new("lib", Role::Librarian);
        let empty = book(1, 0);
        let pending = loan("alice", &empty, LoanStatus::Pending);

        let result = approve(&librarian, &pending, &empty, &LoanPolicy::default(), now());
        assert!(matches!(result, Err(AppError::OutOfStock(_))));
    }
}
