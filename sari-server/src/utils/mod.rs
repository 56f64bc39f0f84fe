//! Utility Module

pub mod error;
pub mod logger;
pub mod money;
pub mod phone;
pub mod result;
pub mod time;
pub mod validation;

pub use error::{AppError, AppResponse, ok, ok_with_message};
pub use result::AppResult;
