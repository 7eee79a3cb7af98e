use crate::utils::error::{CaseError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

// ---- 配置檢查 ----

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CaseError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(CaseError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_one_of(field_name: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if !allowed.iter().any(|a| a.eq_ignore_ascii_case(value)) {
        return Err(CaseError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Allowed values: {}", allowed.join(", ")),
        });
    }
    Ok(())
}

// ---- 服務輸入檢查 (不會呼叫資料庫) ----

pub fn require_text(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CaseError::validation(field_name, "value is required"));
    }
    Ok(())
}

pub fn require_id(field_name: &str, value: i64) -> Result<()> {
    if value <= 0 {
        return Err(CaseError::validation(
            field_name,
            format!("must be a positive identifier, got {}", value),
        ));
    }
    Ok(())
}

pub fn require_date_order(field_name: &str, start: NaiveDate, end: NaiveDate) -> Result<()> {
    if end < start {
        return Err(CaseError::validation(
            field_name,
            format!("end date {} is before start date {}", end, start),
        ));
    }
    Ok(())
}

pub fn require_positive_decimal(field_name: &str, value: Decimal) -> Result<()> {
    if value <= Decimal::ZERO {
        return Err(CaseError::validation(
            field_name,
            format!("must be greater than zero, got {}", value),
        ));
    }
    Ok(())
}

pub fn require_non_negative_decimal(field_name: &str, value: Decimal) -> Result<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(CaseError::validation(
            field_name,
            format!("cannot be negative, got {}", value),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("command_timeout_seconds", 30, 1).is_ok());
        assert!(validate_positive_number("command_timeout_seconds", 0, 1).is_err());
    }

    #[test]
    fn test_validate_one_of_ignores_case() {
        assert!(validate_one_of("logging.level", "INFO", &["info", "debug"]).is_ok());
        assert!(validate_one_of("logging.level", "loud", &["info", "debug"]).is_err());
    }

    #[test]
    fn test_require_date_order() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        assert!(require_date_order("period", start, end).is_ok());
        assert!(require_date_order("period", start, start).is_ok());
        assert!(matches!(
            require_date_order("period", end, start),
            Err(CaseError::Validation { .. })
        ));
    }

    #[test]
    fn test_decimal_checks() {
        assert!(require_positive_decimal("units", Decimal::new(15, 1)).is_ok());
        assert!(require_positive_decimal("units", Decimal::ZERO).is_err());
        assert!(require_non_negative_decimal("rate", Decimal::ZERO).is_ok());
        assert!(require_non_negative_decimal("rate", Decimal::new(-1, 0)).is_err());
    }

    #[test]
    fn test_require_id_and_text() {
        assert!(require_id("client_id", 42).is_ok());
        assert!(require_id("client_id", 0).is_err());
        assert!(require_text("user_name", "  ").is_err());
    }
}
