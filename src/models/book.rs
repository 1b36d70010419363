//! Book (catalog) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub category: String,
    /// Copies owned by the library
    pub total_count: i32,
    /// Copies currently on the shelf
    pub available_count: i32,
    pub created_at: DateTime<Utc>,
}

impl Book {
    /// Availability after applying `delta`, keeping it within `[0, total_count]`
    pub fn availability_after(&self, delta: i32) -> AppResult<i32> {
        let next = self.available_count + delta;
        if next < 0 {
            return Err(AppError::OutOfStock(format!(
                "There is no available copy of '{}' in the library",
                self.title
            )));
        }
        if next > self.total_count {
            return Err(AppError::InvalidState(format!(
                "All {} copies of '{}' are already on the shelf",
                self.total_count, self.title
            )));
        }
        Ok(next)
    }
}

/// Book search parameters; filters are OR-ed and case-insensitive
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    pub category: String,
    #[validate(range(min = 0, message = "The count of books can not be negative"))]
    pub total_count: i32,
    /// Defaults to `total_count`
    #[validate(range(min = 0, message = "The count of books can not be negative"))]
    pub available_count: Option<i32>,
}

/// Update book request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, message = "Title can not be empty"))]
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    #[validate(range(min = 0, message = "The count of books can not be negative"))]
    pub total_count: Option<i32>,
    #[validate(range(min = 0, message = "The count of books can not be negative"))]
    pub available_count: Option<i32>,
}

/// Reject counts where more copies are on the shelf than owned
pub fn check_counts(total_count: i32, available_count: i32) -> AppResult<()> {
    if available_count > total_count {
        return Err(AppError::Validation(
            "Total count of books cannot be less than available count".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(total: i32, available: i32) -> Book {
        Book {
            id: Uuid::new_v4(),
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            category: "Science Fiction".to_string(),
            total_count: total,
            available_count: available,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_checkout_last_copy() {
        assert_eq!(book(3, 1).availability_after(-1).unwrap(), 0);
    }

    #[test]
    fn test_checkout_empty_shelf() {
        assert!(matches!(
            book(3, 0).availability_after(-1),
            Err(AppError::OutOfStock(_))
        ));
    }

    #[test]
    fn test_checkin_never_exceeds_total() {
        assert_eq!(book(3, 2).availability_after(1).unwrap(), 3);
        assert!(matches!(
            book(3, 3).availability_after(1),
            Err(AppError::InvalidState(_))
        ));
    }

    #[test]
    fn test_check_counts() {
        assert!(check_counts(2, 2).is_ok());
        assert!(check_counts(1, 2).is_err());
    }

    #[test]
    fn test_negative_count_rejected() {
        let request = CreateBook {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            category: "Science Fiction".to_string(),
            total_count: -1,
            available_count: None,
        };
        assert!(request.validate().is_err());
    }
}
