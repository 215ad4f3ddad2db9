//! # Input Normalisation
//!
//! Item names and serial numbers are trimmed before any comparison.
//! Phone numbers must be exactly ten ASCII digits.

use crate::domain::errors::LedgerError;

/// Length of an accepted phone number.
pub const PHONE_DIGITS: usize = 10;

/// Trimmed, non-empty item name.
pub fn item_name(raw: &str) -> Result<String, LedgerError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::validation("itemName", "must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Trimmed serial number. Blank means "no serial".
#[must_use]
pub fn serial_number(raw: Option<&str>) -> Option<String> {
    optional_text(raw)
}

/// Trimmed phone number, checked for exactly ten digits. Blank means
/// "no phone".
pub fn phone_number(raw: Option<&str>) -> Result<Option<String>, LedgerError> {
    let Some(phone) = optional_text(raw) else {
        return Ok(None);
    };
    if phone.len() != PHONE_DIGITS || !phone.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LedgerError::validation(
            "phoneNumber",
            format!("{:?} is not exactly {} digits", phone, PHONE_DIGITS),
        ));
    }
    Ok(Some(phone))
}

/// Trimmed free text. Blank becomes `None`.
#[must_use]
pub fn optional_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Trimmed, non-empty free text for a required field.
pub fn required_text(field: &'static str, raw: &str) -> Result<String, LedgerError> {
    optional_text(Some(raw)).ok_or_else(|| LedgerError::validation(field, "must not be empty"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_name_trimmed() {
        assert_eq!(item_name("  Mouse ").unwrap(), "Mouse");
        assert!(item_name("   ").is_err());
    }

    #[test]
    fn test_serial_blank_is_none() {
        assert_eq!(serial_number(Some(" SN-100 ")), Some("SN-100".to_string()));
        assert_eq!(serial_number(Some("  ")), None);
        assert_eq!(serial_number(None), None);
    }

    #[test]
    fn test_phone_requires_ten_digits() {
        assert_eq!(
            phone_number(Some(" 0712345678 ")).unwrap(),
            Some("0712345678".to_string())
        );
        assert_eq!(phone_number(Some("")).unwrap(), None);
        assert!(phone_number(Some("071234567")).is_err());
        assert!(phone_number(Some("07123456789")).is_err());
        assert!(phone_number(Some("07123-5678")).is_err());
        // Non-ASCII digits are rejected even if the count matches.
        assert!(phone_number(Some("０７１２３４５６７８")).is_err());
    }

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("reason", " damaged ").unwrap(), "damaged");
        assert!(matches!(
            required_text("reason", ""),
            Err(LedgerError::Validation { field: "reason", .. })
        ));
    }
}
