//! Internal helpers for input validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so every store enforces the same rules.

use chrono::{DateTime, NaiveDate, Utc};
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{AuthError, EngineError, ResultEngine};

pub(crate) const GOAL_TITLE_MAX: usize = 100;
pub(crate) const SAVING_ITEM_NAME_MAX: usize = 200;
pub(crate) const SAVING_CATEGORY_MAX: usize = 50;
pub(crate) const SAVING_MEMO_MAX: usize = 500;
pub(crate) const FEEDBACK_TITLE_MAX: usize = 200;
pub(crate) const FEEDBACK_DESCRIPTION_MAX: usize = 2000;
pub(crate) const DISPLAY_NAME_MAX: usize = 50;
pub(crate) const EMAIL_MAX: usize = 254;
pub(crate) const PASSWORD_MIN: usize = 8;
pub(crate) const PASSWORD_MAX: usize = 128;

pub(crate) const AMOUNT_MIN: i64 = 1;
pub(crate) const AMOUNT_MAX: i64 = 999_999_999;

/// Trim, NFC-normalize and bound a required text field.
///
/// `single_line` rejects embedded line breaks.
pub(crate) fn normalize_required_text(
    value: &str,
    label: &str,
    max_chars: usize,
    single_line: bool,
) -> ResultEngine<String> {
    let normalized: String = value.trim().nfc().collect();
    if normalized.is_empty() {
        return Err(EngineError::InvalidInput(format!(
            "{label} must not be empty"
        )));
    }
    check_text(&normalized, label, max_chars, single_line)?;
    Ok(normalized)
}

/// Like [`normalize_required_text`], but blank input becomes `None`.
pub(crate) fn normalize_optional_text(
    value: Option<&str>,
    label: &str,
    max_chars: usize,
) -> ResultEngine<Option<String>> {
    let Some(normalized) = value
        .map(|v| v.trim().nfc().collect::<String>())
        .filter(|v| !v.is_empty())
    else {
        return Ok(None);
    };
    check_text(&normalized, label, max_chars, false)?;
    Ok(Some(normalized))
}

fn check_text(value: &str, label: &str, max_chars: usize, single_line: bool) -> ResultEngine<()> {
    if value.chars().count() > max_chars {
        return Err(EngineError::InvalidInput(format!(
            "{label} must be at most {max_chars} characters"
        )));
    }
    if single_line && value.contains(['\n', '\r']) {
        return Err(EngineError::InvalidInput(format!(
            "{label} must not contain line breaks"
        )));
    }
    Ok(())
}

/// Validate a strictly positive amount within the accepted range.
pub(crate) fn validate_amount(value: i64, label: &str) -> ResultEngine<i64> {
    if !(AMOUNT_MIN..=AMOUNT_MAX).contains(&value) {
        return Err(EngineError::InvalidInput(format!(
            "{label} must be between {AMOUNT_MIN} and {AMOUNT_MAX}"
        )));
    }
    Ok(value)
}

/// Validate a non-negative amount (a goal's starting balance may be 0).
pub(crate) fn validate_balance(value: i64, label: &str) -> ResultEngine<i64> {
    if !(0..=AMOUNT_MAX).contains(&value) {
        return Err(EngineError::InvalidInput(format!(
            "{label} must be between 0 and {AMOUNT_MAX}"
        )));
    }
    Ok(value)
}

/// Normalize an email address (trimmed, lowercase) and check its shape.
pub(crate) fn normalize_email(value: &str) -> Result<String, AuthError> {
    let email = value.trim().to_lowercase();
    if email.is_empty() || email.len() > EMAIL_MAX || email.chars().any(char::is_whitespace) {
        return Err(AuthError::InvalidEmail);
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(AuthError::InvalidEmail);
    };
    if local.is_empty() || domain.contains('@') {
        return Err(AuthError::InvalidEmail);
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(email),
        _ => Err(AuthError::InvalidEmail),
    }
}

/// Passwords need a letter and a digit within the length bounds.
pub(crate) fn validate_password(value: &str) -> Result<(), AuthError> {
    let len = value.chars().count();
    let has_letter = value.chars().any(char::is_alphabetic);
    let has_digit = value.chars().any(|c| c.is_ascii_digit());
    if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&len) || !has_letter || !has_digit {
        return Err(AuthError::WeakPassword);
    }
    Ok(())
}

/// Parse a deadline given either as `YYYY-MM-DD` (midnight UTC) or RFC 3339.
pub(crate) fn parse_deadline(value: &str) -> ResultEngine<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| EngineError::InvalidInput(format!("invalid deadline: {value}")))
}

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn required_text_is_trimmed_and_bounded() {
        assert_eq!(
            normalize_required_text("  Trip  ", "title", 10, true).unwrap(),
            "Trip"
        );
        assert!(normalize_required_text("   ", "title", 10, true).is_err());
        assert!(normalize_required_text("abcdefghijk", "title", 10, true).is_err());
        assert!(normalize_required_text("a\nb", "title", 10, true).is_err());
        assert_eq!(
            normalize_required_text("a\nb", "description", 10, false).unwrap(),
            "a\nb"
        );
    }

    #[test]
    fn length_is_counted_in_characters() {
        // Five kana are fifteen bytes but five characters.
        assert!(normalize_required_text("りょこう！", "title", 5, true).is_ok());
    }

    #[test]
    fn optional_text_blank_is_none() {
        assert_eq!(normalize_optional_text(Some("  "), "memo", 5).unwrap(), None);
        assert_eq!(normalize_optional_text(None, "memo", 5).unwrap(), None);
        assert_eq!(
            normalize_optional_text(Some(" coffee "), "memo", 10).unwrap(),
            Some("coffee".to_string())
        );
    }

    #[test]
    fn amount_bounds() {
        assert!(validate_amount(0, "amount").is_err());
        assert!(validate_amount(1, "amount").is_ok());
        assert!(validate_amount(AMOUNT_MAX, "amount").is_ok());
        assert!(validate_amount(AMOUNT_MAX + 1, "amount").is_err());
        assert!(validate_balance(0, "current amount").is_ok());
        assert!(validate_balance(-1, "current amount").is_err());
    }

    #[test]
    fn email_shape() {
        assert_eq!(
            normalize_email(" Alice@Example.COM ").unwrap(),
            "alice@example.com"
        );
        assert_eq!(normalize_email("alice"), Err(AuthError::InvalidEmail));
        assert_eq!(normalize_email("alice@example"), Err(AuthError::InvalidEmail));
        assert_eq!(normalize_email("@example.com"), Err(AuthError::InvalidEmail));
        assert_eq!(normalize_email("a b@example.com"), Err(AuthError::InvalidEmail));
    }

    #[test]
    fn password_strength() {
        assert!(validate_password("abcd1234").is_ok());
        assert_eq!(validate_password("abcdefgh"), Err(AuthError::WeakPassword));
        assert_eq!(validate_password("12345678"), Err(AuthError::WeakPassword));
        assert_eq!(validate_password("abc123"), Err(AuthError::WeakPassword));
    }

    #[test]
    fn deadline_formats() {
        let date = parse_deadline("2025-12-31").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2025, 12, 31));
        assert_eq!(date.hour(), 0);

        let rfc = parse_deadline("2025-12-31T09:00:00+09:00").unwrap();
        assert_eq!(rfc.hour(), 0);
        assert_eq!(rfc.day(), 31);

        assert!(parse_deadline("next friday").is_err());
    }
}
