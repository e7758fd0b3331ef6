//! Request field validation. Field names in errors are the camelCase names the caller sent.

use crate::error::AppError;
use regex::Regex;
use std::str::FromStr;
use std::sync::OnceLock;

type Compiled = OnceLock<Result<Regex, regex::Error>>;

fn compiled(cell: &'static Compiled, pattern: &str) -> Result<&'static Regex, AppError> {
    cell.get_or_init(|| Regex::new(pattern))
        .as_ref()
        .map_err(|e| AppError::Internal(format!("invalid pattern {}: {}", pattern, e)))
}

fn key_regex() -> Result<&'static Regex, AppError> {
    static RE: Compiled = OnceLock::new();
    compiled(&RE, r"^[A-Za-z0-9][A-Za-z0-9_.\-]{0,63}$")
}

fn phone_regex() -> Result<&'static Regex, AppError> {
    static RE: Compiled = OnceLock::new();
    compiled(&RE, r"^\+?[0-9]{6,15}$")
}

fn email_regex() -> Result<&'static Regex, AppError> {
    static RE: Compiled = OnceLock::new();
    compiled(&RE, r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)+$")
}

pub struct RequestValidator;

impl RequestValidator {
    /// Present, non-null value.
    pub fn required<T>(value: Option<T>, field: &str) -> Result<T, AppError> {
        value.ok_or_else(|| AppError::MissingParameter(field.to_string()))
    }

    /// Present text with something other than whitespace. Returned trimmed.
    pub fn required_text(value: Option<String>, field: &str) -> Result<String, AppError> {
        let s = Self::required(value, field)?;
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AppError::MissingParameter(field.to_string()));
        }
        Ok(trimmed.to_string())
    }

    /// Blank text becomes None.
    pub fn optional_text(value: Option<String>) -> Option<String> {
        value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
    }

    /// Business key: 1-64 of `[A-Za-z0-9_.-]`, starting alphanumeric.
    pub fn business_key(value: Option<String>, field: &str) -> Result<String, AppError> {
        let s = Self::required_text(value, field)?;
        if !is_business_key(&s)? {
            return Err(AppError::InvalidFormat(format!("{} '{}'", field, s)));
        }
        Ok(s)
    }

    pub fn phone(value: Option<String>, field: &str) -> Result<String, AppError> {
        let s = Self::required_text(value, field)?;
        if !phone_regex()?.is_match(&s) {
            return Err(AppError::InvalidFormat(format!("{} '{}'", field, s)));
        }
        Ok(s)
    }

    pub fn email(value: Option<String>, field: &str) -> Result<String, AppError> {
        let s = Self::required_text(value, field)?;
        if !email_regex()?.is_match(&s) {
            return Err(AppError::InvalidFormat(format!("{} '{}'", field, s)));
        }
        Ok(s)
    }

    /// Enumerated field sent as its string form. Unknown strings are InvalidValue.
    pub fn enumerated<E>(value: Option<String>, field: &str) -> Result<E, AppError>
    where
        E: FromStr<Err = AppError>,
    {
        let s = Self::required_text(value, field)?;
        s.parse::<E>()
            .map_err(|_| AppError::InvalidValue(format!("{} '{}'", field, s)))
    }

    pub fn non_negative(n: i32, field: &str) -> Result<i32, AppError> {
        if n < 0 {
            return Err(AppError::InvalidValue(format!("{} must not be negative", field)));
        }
        Ok(n)
    }
}

pub fn is_business_key(s: &str) -> Result<bool, AppError> {
    Ok(key_regex()?.is_match(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::State;

    #[test]
    fn business_keys() {
        let key = |s: &str| is_business_key(s).unwrap();
        assert!(key("S1"));
        assert!(key("sat-01.a_b"));
        assert!(!key("-S1"));
        assert!(!key("S 1"));
        assert!(!key(""));
        assert!(key(&"a".repeat(64)));
        assert!(!key(&"a".repeat(65)));
    }

    #[test]
    fn bad_pattern_is_internal_error() {
        static BROKEN: Compiled = OnceLock::new();
        let err = compiled(&BROKEN, "[unclosed").unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert!(compiled(&BROKEN, "[unclosed").is_err());
    }

    #[test]
    fn missing_and_blank_are_missing_parameter() {
        let err = RequestValidator::required_text(None, "satelliteId").unwrap_err();
        assert!(matches!(err, AppError::MissingParameter(ref f) if f == "satelliteId"));
        let err = RequestValidator::required_text(Some("  ".into()), "satelliteId").unwrap_err();
        assert!(matches!(err, AppError::MissingParameter(_)));
    }

    #[test]
    fn bad_key_is_invalid_format() {
        let err = RequestValidator::business_key(Some("S/1".into()), "satelliteId").unwrap_err();
        assert!(matches!(err, AppError::InvalidFormat(_)));
    }

    #[test]
    fn phone_and_email() {
        assert!(RequestValidator::phone(Some("+8613800000000".into()), "phone").is_ok());
        assert!(RequestValidator::phone(Some("12345".into()), "phone").is_err());
        assert!(RequestValidator::phone(Some("12ab5678".into()), "phone").is_err());
        assert!(RequestValidator::email(Some("ops@example.org".into()), "email").is_ok());
        assert!(RequestValidator::email(Some("ops@".into()), "email").is_err());
        assert!(RequestValidator::email(Some("ops.example.org".into()), "email").is_err());
    }

    #[test]
    fn enumerated_fields() {
        let s: State = RequestValidator::enumerated(Some("offline".into()), "runState").unwrap();
        assert_eq!(s, State::Offline);
        let err = RequestValidator::enumerated::<State>(Some("sleepy".into()), "runState").unwrap_err();
        assert!(matches!(err, AppError::InvalidValue(_)));
    }

    #[test]
    fn numbers() {
        assert!(matches!(
            RequestValidator::non_negative(-1, "satelliteUp"),
            Err(AppError::InvalidValue(_))
        ));
        assert_eq!(RequestValidator::non_negative(3, "satelliteUp").unwrap(), 3);
    }
}
