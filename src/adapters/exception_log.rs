use crate::config::toml_config::ExceptionPolicyConfig;
use crate::domain::ports::{ExceptionHandling, ExceptionPolicy};
use crate::utils::error::{CaseError, Result};
use crate::utils::validation::validate_one_of;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
}

impl LogLevel {
    pub const NAMES: [&'static str; 3] = ["error", "warn", "info"];

    pub fn parse(field: &str, value: &str) -> Result<Self> {
        validate_one_of(field, value, &Self::NAMES)?;
        Ok(match value.to_ascii_lowercase().as_str() {
            "error" => LogLevel::Error,
            "warn" => LogLevel::Warn,
            _ => LogLevel::Info,
        })
    }
}

/// 以 tracing 事件記錄例外，並依政策累計次數
pub struct TracingExceptionHandler {
    levels: HashMap<ExceptionPolicy, LogLevel>,
    counts: HashMap<ExceptionPolicy, AtomicU64>,
}

impl TracingExceptionHandler {
    pub fn new() -> Self {
        let levels = HashMap::from([
            (ExceptionPolicy::WebException, LogLevel::Error),
            (ExceptionPolicy::DatabaseException, LogLevel::Error),
            (ExceptionPolicy::AuditException, LogLevel::Warn),
        ]);
        let counts = ExceptionPolicy::ALL
            .iter()
            .map(|p| (*p, AtomicU64::new(0)))
            .collect();
        Self { levels, counts }
    }

    pub fn from_config(config: &ExceptionPolicyConfig) -> Result<Self> {
        let mut handler = Self::new();
        let overrides = [
            (ExceptionPolicy::WebException, "exception_policies.web_exception", &config.web_exception),
            (ExceptionPolicy::DatabaseException, "exception_policies.database_exception", &config.database_exception),
            (ExceptionPolicy::AuditException, "exception_policies.audit_exception", &config.audit_exception),
        ];
        for (policy, field, value) in overrides {
            if let Some(value) = value {
                handler.levels.insert(policy, LogLevel::parse(field, value)?);
            }
        }
        Ok(handler)
    }

    pub fn level(&self, policy: ExceptionPolicy) -> LogLevel {
        self.levels.get(&policy).copied().unwrap_or(LogLevel::Error)
    }

    pub fn logged_count(&self, policy: ExceptionPolicy) -> u64 {
        self.counts
            .get(&policy)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }
}

impl Default for TracingExceptionHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ExceptionHandling for TracingExceptionHandler {
    fn log_exception(&self, error: &CaseError, policy: ExceptionPolicy) {
        if let Some(count) = self.counts.get(&policy) {
            count.fetch_add(1, Ordering::Relaxed);
        }

        let category = error.category();
        let severity = error.severity();
        match self.level(policy) {
            LogLevel::Error => tracing::error!(
                policy = %policy,
                category = ?category,
                severity = ?severity,
                "❌ {}",
                error
            ),
            LogLevel::Warn => tracing::warn!(
                policy = %policy,
                category = ?category,
                severity = ?severity,
                "⚠️ {}",
                error
            ),
            LogLevel::Info => tracing::info!(
                policy = %policy,
                category = ?category,
                severity = ?severity,
                "{}",
                error
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_per_policy() {
        let handler = TracingExceptionHandler::new();
        let err = CaseError::database("prc_InvoiceSave", "timeout expired");

        handler.log_exception(&err, ExceptionPolicy::WebException);
        handler.log_exception(&err, ExceptionPolicy::WebException);
        handler.log_exception(&err, ExceptionPolicy::DatabaseException);

        assert_eq!(handler.logged_count(ExceptionPolicy::WebException), 2);
        assert_eq!(handler.logged_count(ExceptionPolicy::DatabaseException), 1);
        assert_eq!(handler.logged_count(ExceptionPolicy::AuditException), 0);
    }

    #[test]
    fn test_levels_from_config() {
        let config = ExceptionPolicyConfig {
            web_exception: Some("WARN".to_string()),
            database_exception: None,
            audit_exception: Some("info".to_string()),
        };
        let handler = TracingExceptionHandler::from_config(&config).unwrap();

        assert_eq!(handler.level(ExceptionPolicy::WebException), LogLevel::Warn);
        assert_eq!(handler.level(ExceptionPolicy::DatabaseException), LogLevel::Error);
        assert_eq!(handler.level(ExceptionPolicy::AuditException), LogLevel::Info);
    }

    #[test]
    fn test_rejects_unknown_level() {
        let config = ExceptionPolicyConfig {
            web_exception: Some("shout".to_string()),
            database_exception: None,
            audit_exception: None,
        };
        assert!(matches!(
            TracingExceptionHandler::from_config(&config),
            Err(CaseError::InvalidConfigValueError { .. })
        ));
    }

    #[test]
    fn test_policy_display_names() {
        assert_eq!(ExceptionPolicy::WebException.to_string(), "Web_Exception");
        assert_eq!(ExceptionPolicy::DatabaseException.to_string(), "Database_Exception");
        assert_eq!(ExceptionPolicy::AuditException.to_string(), "Audit_Exception");
    }
}
