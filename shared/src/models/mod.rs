//! Data models
//!
//! Shared between sari-server and the POS / back-office clients (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY), timestamps Unix millis.

pub mod category;
pub mod clearance;
pub mod customer;
pub mod delivery_run;
pub mod employee;
pub mod order;
pub mod payment;
pub mod price_rule;
pub mod product;
pub mod remittance;
pub mod role;
pub mod shift;
pub mod store_info;
pub mod sync;
pub mod vehicle;

// Re-exports
pub use category::*;
pub use clearance::*;
pub use customer::*;
pub use delivery_run::*;
pub use employee::*;
pub use order::*;
pub use payment::*;
pub use price_rule::*;
pub use product::*;
pub use remittance::*;
pub use role::*;
pub use shift::*;
pub use store_info::*;
pub use sync::*;
pub use vehicle::*;
