//! Phone normalization
//!
//! 所有客户手机号入库前统一规范化，UNIQUE 索引建立在规范化结果上，
//! 同一个号码的不同写法 (0917..., +63917..., 63 917...) 都会命中同一条记录。
//!
//! Canonical forms:
//! - PH mobile (`09XXXXXXXXX`, `9XXXXXXXXX`, `639XXXXXXXXX`) → `+639XXXXXXXXX`
//! - Other `+` numbers → `+` followed by digits only
//! - Landlines / everything else → bare digits

use crate::utils::AppError;

const MIN_DIGITS: usize = 7;
const MAX_DIGITS: usize = 15;

/// Normalize a raw phone string to its canonical form.
///
/// Separators (space, dash, dot, parentheses) are stripped; any other
/// non-digit character is a validation error.
pub fn normalize_phone(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    let has_plus = trimmed.starts_with('+');

    let mut digits = String::with_capacity(trimmed.len());
    for (i, c) in trimmed.chars().enumerate() {
        match c {
            '0'..='9' => digits.push(c),
            '+' if i == 0 => {}
            ' ' | '-' | '.' | '(' | ')' => {}
            _ => {
                return Err(AppError::validation(format!(
                    "Invalid character '{c}' in phone number"
                )));
            }
        }
    }

    if digits.len() < MIN_DIGITS || digits.len() > MAX_DIGITS {
        return Err(AppError::validation(format!(
            "Phone number must have {MIN_DIGITS}-{MAX_DIGITS} digits, got {}",
            digits.len()
        )));
    }

    // PH mobile canonicalization
    if digits.len() == 11 && digits.starts_with("09") {
        return Ok(format!("+63{}", &digits[1..]));
    }
    if digits.len() == 12 && digits.starts_with("639") {
        return Ok(format!("+{digits}"));
    }
    if digits.len() == 10 && digits.starts_with('9') && !has_plus {
        return Ok(format!("+63{digits}"));
    }

    if has_plus {
        return Ok(format!("+{digits}"));
    }
    Ok(digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ph_mobile_forms_canonicalize_identically() {
        let canonical = "+639171234567";
        assert_eq!(normalize_phone("09171234567").unwrap(), canonical);
        assert_eq!(normalize_phone("0917 123 4567").unwrap(), canonical);
        assert_eq!(normalize_phone("+63 917-123-4567").unwrap(), canonical);
        assert_eq!(normalize_phone("639171234567").unwrap(), canonical);
        assert_eq!(normalize_phone("9171234567").unwrap(), canonical);
    }

    #[test]
    fn landline_keeps_digits() {
        assert_eq!(normalize_phone("(02) 8123-4567").unwrap(), "0281234567");
    }

    #[test]
    fn foreign_number_keeps_plus() {
        assert_eq!(normalize_phone("+1 415 555 0100").unwrap(), "+14155550100");
    }

    #[test]
    fn rejects_garbage() {
        assert!(normalize_phone("12345").is_err());
        assert!(normalize_phone("0917abc4567").is_err());
        assert!(normalize_phone("1234567890123456").is_err());
    }
}
