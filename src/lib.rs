//! Libris Library Management Server
//!
//! A REST JSON API for a library catalog, its members and the lifecycle of
//! their loans: loan requests and approvals, renewals and returns.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repository: repository::Repository,
    pub services: Arc<services::Services>,
}

impl AppState {
    pub fn new(config: AppConfig, repository: repository::Repository) -> Self {
        let services = services::Services::new(repository.clone(), &config);
        Self {
            config: Arc::new(config),
            repository,
            services: Arc::new(services),
        }
    }
}
