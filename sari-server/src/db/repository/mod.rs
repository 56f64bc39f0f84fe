//! Repository Module
//!
//! CRUD operations over the SQLite schema. Repositories are plain module
//! functions taking `&SqlitePool`; multi-write operations open their own
//! transaction and rely on UNIQUE indexes for correctness.

// Auth
pub mod employee;
pub mod role;

// Parties & assets
pub mod customer;
pub mod vehicle;

// Catalog
pub mod category;
pub mod product;

// Pricing
pub mod price_rule;

// Orders & money
pub mod order;
pub mod payment;
pub mod shift;

// Dispatch & settlement
pub mod clearance;
pub mod delivery_run;
pub mod remittance;

// System
pub mod store_info;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err
            && db_err.is_unique_violation()
        {
            return RepoError::Duplicate(db_err.message().to_string());
        }
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
