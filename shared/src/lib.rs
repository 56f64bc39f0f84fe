//! Shared types for the Sari POS framework
//!
//! Data models and utility types shared between sari-server and the POS /
//! back-office clients (via API). DB row types derive `sqlx::FromRow` behind
//! the `db` feature so clients don't pull the database stack.

pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
