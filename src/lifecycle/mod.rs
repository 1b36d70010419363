//! Loan lifecycle rules
//!
//! Pure decision functions for the loan state machine and the renewal and
//! return workflows. Each function receives the current (locked) entities,
//! the acting principal and the clock, and returns a plan describing the
//! writes to perform, or the typed error that rejects the operation.
//! Persistence and locking live in [`crate::services::lifecycle`].

pub mod renewal;
pub mod returns;
pub mod state;

use chrono::Duration;

use crate::config::LoansConfig;

/// Loan and renewal periods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanPolicy {
    pub loan_duration: Duration,
    pub renewal_duration: Duration,
}

impl Default for LoanPolicy {
    fn default() -> Self {
        Self {
            loan_duration: Duration::days(14),
            renewal_duration: Duration::days(14),
        }
    }
}

impl From<&LoansConfig> for LoanPolicy {
    fn from(config: &LoansConfig) -> Self {
        Self {
            loan_duration: Duration::days(config.loan_duration_days),
            renewal_duration: Duration::days(config.renewal_duration_days),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, TimeZone, Utc};
    use uuid::Uuid;

    use crate::models::{ApprovalStatus, Book, Loan, LoanStatus};

    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    pub fn book(total: i32, available: i32) -> Book {
        Book {
            id: Uuid::new_v4(),
            title: "The Left Hand of Darkness".to_string(),
            author: "Ursula K. Le Guin".to_string(),
            category: "Science Fiction".to_string(),
            total_count: total,
            available_count: available,
            created_at: now(),
        }
    }

    pub fn loan(username: &str, book: &Book, status: LoanStatus) -> Loan {
        Loan {
            id: Uuid::new_v4(),
            username: username.to_string(),
            book_id: book.id,
            book_title: book.title.clone(),
            status,
            date: now(),
            due_date: now() + chrono::Duration::days(14),
        }
    }

    pub fn renewal(loan: &Loan, status: ApprovalStatus) -> crate::models::LoanRenewal {
        crate::models::LoanRenewal {
            id: Uuid::new_v4(),
            loan_id: loan.id,
            status,
            date: now(),
        }
    }

    pub fn loan_return(loan: &Loan, status: ApprovalStatus) -> crate::models::LoanReturn {
        crate::models::LoanReturn {
            id: Uuid::new_v4(),
            loan_id: loan.id,
            status,
            date: now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_config() {
        let policy = LoanPolicy::from(&LoansConfig {
            loan_duration_days: 21,
            renewal_duration_days: 7,
        });
        assert_eq!(policy.loan_duration, Duration::days(21));
        assert_eq!(policy.renewal_duration, Duration::days(7));
        assert_eq!(LoanPolicy::default().loan_duration, Duration::days(14));
    }
}
