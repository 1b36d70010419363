//! Shared domain enums stored as upper-case text columns

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Implements `FromStr`, `Display` and the SQLx text conversions for an enum
/// that already provides `as_str()` and a `VARIANTS` table.
macro_rules! text_enum {
    ($name:ident) => {
        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::VARIANTS
                    .iter()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s))
                    .copied()
                    .ok_or_else(|| format!("Invalid {}: {}", stringify!($name), s))
            }
        }

        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
                let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl sqlx::Encode<'_, sqlx::Postgres> for $name {
            fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
                <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }
    };
}

pub(crate) use text_enum;

// ---------------------------------------------------------------------------
// LoanStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    Pending,
    Approved,
    RenewPending,
    Returned,
}

impl LoanStatus {
    pub const VARIANTS: [LoanStatus; 4] = [
        LoanStatus::Pending,
        LoanStatus::Approved,
        LoanStatus::RenewPending,
        LoanStatus::Returned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Pending => "PENDING",
            LoanStatus::Approved => "APPROVED",
            LoanStatus::RenewPending => "RENEW_PENDING",
            LoanStatus::Returned => "RETURNED",
        }
    }
}

text_enum!(LoanStatus);

// ---------------------------------------------------------------------------
// ApprovalStatus
// ---------------------------------------------------------------------------

/// Librarian decision on a renewal or return request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
}

impl ApprovalStatus {
    pub const VARIANTS: [ApprovalStatus; 2] = [ApprovalStatus::Pending, ApprovalStatus::Approved];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "PENDING",
            ApprovalStatus::Approved => "APPROVED",
        }
    }
}

text_enum!(ApprovalStatus);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loan_status_round_trip() {
        assert_eq!("RENEW_PENDING".parse::<LoanStatus>(), Ok(LoanStatus::RenewPending));
        assert_eq!("approved".parse::<LoanStatus>(), Ok(LoanStatus::Approved));
        assert!("LOST".parse::<LoanStatus>().is_err());
        assert_eq!(LoanStatus::Returned.to_string(), "RETURNED");
    }

    #[test]
    fn test_serde_matches_column_format() {
        let json = serde_json::to_string(&LoanStatus::RenewPending).unwrap();
        assert_eq!(json, "\"RENEW_PENDING\"");

        let status: ApprovalStatus = serde_json::from_str("\"APPROVED\"").unwrap();
        assert_eq!(status, ApprovalStatus::Approved);
    }
}
