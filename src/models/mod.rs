//! Data models for Libris

pub mod book;
pub mod enums;
pub mod loan;
pub mod loan_return;
pub mod renewal;
pub mod user;

// Re-export commonly used types
pub use book::Book;
pub use enums::{ApprovalStatus, LoanStatus};
pub use loan::Loan;
pub use loan_return::LoanReturn;
pub use renewal::LoanRenewal;
pub use user::{Actor, Role, User, UserShort};
