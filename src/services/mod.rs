//! Business logic services

pub mod catalog;
pub mod lifecycle;
pub mod loans;
pub mod users;

use crate::{config::AppConfig, lifecycle::LoanPolicy, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub lifecycle: lifecycle::LifecycleService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        Self {
            users: users::UsersService::new(repository.clone(), config.auth.clone()),
            catalog: catalog::CatalogService::new(repository.clone()),
            loans: loans::LoansService::new(repository.clone()),
            lifecycle: lifecycle::LifecycleService::new(repository, LoanPolicy::from(&config.loans)),
        }
    }
}
