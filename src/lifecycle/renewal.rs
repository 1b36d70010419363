//! Renewal workflow

use chrono::{DateTime, Utc};

use super::{state::transition, LoanPolicy};
use crate::{
    error::{AppError, AppResult},
    models::{Actor, ApprovalStatus, Loan, LoanRenewal, LoanStatus},
};

/// Writes produced by a renewal decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenewalPlan {
    pub loan_status: LoanStatus,
    pub due_date: DateTime<Utc>,
    pub record_status: ApprovalStatus,
}

/// Decide a renewal request on `loan`.
///
/// A librarian's request is granted on the spot and pushes the due date back
/// by one renewal period. A member's request parks the loan in
/// `RENEW_PENDING` until a librarian approves it.
pub fn request(actor: &Actor, loan: &Loan, policy: &LoanPolicy) -> AppResult<RenewalPlan> {
    if actor.is_elevated() {
        let loan_status = transition(loan.status, LoanStatus::Approved)?;
        return Ok(RenewalPlan {
            loan_status,
            due_date: loan.due_date + policy.renewal_duration,
            record_status: ApprovalStatus::Approved,
        });
    }

    if !loan.is_borrowed_by(&actor.username) {
        return Err(AppError::Forbidden(
            "You can't request renewal of other users loans".to_string(),
        ));
    }
    if loan.status != LoanStatus::Approved {
        return Err(AppError::InvalidState(
            "You can only renew approved loans".to_string(),
        ));
    }

    Ok(RenewalPlan {
        loan_status: transition(loan.status, LoanStatus::RenewPending)?,
        due_date: loan.due_date,
        record_status: ApprovalStatus::Pending,
    })
}

/// Decide the approval of a pending renewal request
pub fn approve(
    actor: &Actor,
    renewal: &LoanRenewal,
    loan: &Loan,
    policy: &LoanPolicy,
) -> AppResult<RenewalPlan> {
    actor.require_elevated("approve loan renewal requests")?;

    if renewal.status == ApprovalStatus::Approved {
        return Err(AppError::Conflict(
            "This renewal request is already approved".to_string(),
        ));
    }
    if loan.status != LoanStatus::RenewPending {
        return Err(AppError::InvalidState(format!(
            "The loan is {} and no longer awaits renewal",
            loan.status
        )));
    }

    Ok(RenewalPlan {
        loan_status: transition(loan.status, LoanStatus::Approved)?,
        due_date: loan.due_date + policy.renewal_duration,
        record_status: ApprovalStatus::Approved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::fixtures::{book, loan, renewal};
    use crate::models::Role;
    use chrono::Duration;

    #[test]
    fn test_member_renewal_waits_for_approval() {
        let member = Actor::new("alice", Role::Member);
        let approved = loan("alice", &book(1, 0), LoanStatus::Approved);

        let plan = request(&member, &approved, &LoanPolicy::default()).unwrap();

        assert_eq!(plan.loan_status, LoanStatus::RenewPending);
        assert_eq!(plan.record_status, ApprovalStatus::Pending);
        assert_eq!(plan.due_date, approved.due_date);
    }

    #[test]
    fn test_member_renews_only_own_loan() {
        let member = Actor::new("bob", Role::Member);
        let approved = loan("alice", &book(1, 0), LoanStatus::Approved);

        let result = request(&member, &approved, &LoanPolicy::default());
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_member_renews_only_approved_loan() {
        let member = Actor::new("alice", Role::Member);
        let shelf = book(1, 1);

        for status in [LoanStatus::Pending, LoanStatus::RenewPending, LoanStatus::Returned] {
            let current = loan("alice", &shelf, status);
            let result = request(&member, &current, &LoanPolicy::default());
            assert!(matches!(result, Err(AppError::InvalidState(_))), "{}", status);
        }
    }

    #[test]
    fn test_elevated_renewal_is_immediate() {
        let librarian = Actor::new("lib", Role::Librarian);
        let approved = loan("alice", &book(1, 0), LoanStatus::Approved);

        let plan = request(&librarian, &approved, &LoanPolicy::default()).unwrap();

        assert_eq!(plan.loan_status, LoanStatus::Approved);
        assert_eq!(plan.record_status, ApprovalStatus::Approved);
        assert_eq!(plan.due_date, approved.due_date + Duration::days(14));
    }

    #[test]
    fn test_elevated_cannot_revive_returned_loan() {
        let admin = Actor::new("root", Role::Admin);
        let returned = loan("alice", &book(1, 1), LoanStatus::Returned);

        let result = request(&admin, &returned, &LoanPolicy::default());
        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[test]
    fn test_approve_extends_from_previous_due_date() {
        let librarian = Actor::new("lib", Role::Librarian);
        let waiting = loan("alice", &book(1, 0), LoanStatus::RenewPending);
        let pending = renewal(&waiting, ApprovalStatus::Pending);

        let plan = approve(&librarian, &pending, &waiting, &LoanPolicy::default()).unwrap();

        assert_eq!(plan.loan_status, LoanStatus::Approved);
        assert_eq!(plan.record_status, ApprovalStatus::Approved);
        assert_eq!(plan.due_date, waiting.due_date + Duration::days(14));
    }

    #[test]
    fn test_second_approval_conflicts() {
        let librarian = Actor::new("lib", Role::Librarian);
        let renewed = loan("alice", &book(1, 0), LoanStatus::Approved);
        let approved = renewal(&renewed, ApprovalStatus::Approved);

        let result = approve(&librarian, &approved, &renewed, &LoanPolicy::default());
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_member_cannot_approve() {
        let member = Actor::new("alice", Role::Member);
        let waiting = loan("alice", &book(1, 0), LoanStatus::RenewPending);
        let pending = renewal(&waiting, ApprovalStatus::Pending);

        let result = approve(&member, &pending, &waiting, &LoanPolicy::default());
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_returned_loan_renewal_cannot_be_approved() {
        let librarian = Actor::new("lib", Role::Librarian);
        let returned = loan("alice", &book(1, 0), LoanStatus::Returned);
        let pending = renewal(&returned, ApprovalStatus::Pending);

        let result = approve(&librarian, &pending, &returned, &LoanPolicy::default());
        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }
}
