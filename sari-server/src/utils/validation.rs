//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! SQLite TEXT has no built-in length enforcement, so every handler
//! validates inbound strings before they reach the repository layer.

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: product, category, vehicle, role, customer, etc.
pub const MAX_NAME_LEN: usize = 200;

/// Receipt names (80mm thermal = 48 chars, allow overflow for wrapping)
pub const MAX_RECEIPT_NAME_LEN: usize = 64;

/// Notes, descriptions, reasons (void note, expense label, remit note, etc.)
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: phone, plate number, SKU, etc.
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Passwords (before hashing)
pub const MAX_PASSWORD_LEN: usize = 128;

/// Addresses
pub const MAX_ADDRESS_LEN: usize = 500;

// ── Validation helpers (CRUD handlers) ──────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

/// Validate a cash amount is finite and non-negative
pub fn validate_cash(value: f64, field: &str) -> Result<(), AppError> {
    if !value.is_finite() {
        return Err(AppError::validation(format!(
            "{field} must be a finite number"
        )));
    }
    if value < 0.0 {
        return Err(AppError::validation(format!(
            "{field} must be non-negative, got {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_rejects_empty_and_oversize() {
        assert!(validate_required_text("ok", "name", 10).is_ok());
        assert!(validate_required_text("   ", "name", 10).is_err());
        assert!(validate_required_text("0123456789x", "name", 10).is_err());
    }

    #[test]
    fn optional_text_ignores_none() {
        assert!(validate_optional_text(&None, "note", 5).is_ok());
        assert!(validate_optional_text(&Some("ok".into()), "note", 5).is_ok());
        assert!(validate_optional_text(&Some("toolong".into()), "note", 5).is_err());
    }

    #[test]
    fn cash_rejects_nan_and_negative() {
        assert!(validate_cash(0.0, "amount").is_ok());
        assert!(validate_cash(12.5, "amount").is_ok());
        assert!(validate_cash(-0.01, "amount").is_err());
        assert!(validate_cash(f64::NAN, "amount").is_err());
        assert!(validate_cash(f64::INFINITY, "amount").is_err());
    }
}
