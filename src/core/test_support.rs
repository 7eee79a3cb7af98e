use crate::core::context::ServiceContext;
use crate::domain::model::{param_value, SqlParam, SqlValue};
use crate::domain::ports::{ExceptionPolicy, MockDataAccess, MockExceptionHandling};
use crate::utils::error::CaseError;
use chrono::NaiveDate;
use std::sync::Arc;

pub fn context(data: MockDataAccess, errors: MockExceptionHandling) -> ServiceContext {
    ServiceContext::new(Arc::new(data), Arc::new(errors))
}

/// 期望剛好一次 Web_Exception 記錄
pub fn expect_web_exception_once() -> MockExceptionHandling {
    let mut errors = MockExceptionHandling::new();
    errors
        .expect_log_exception()
        .withf(|_, policy| *policy == ExceptionPolicy::WebException)
        .times(1)
        .return_const(());
    errors
}

/// 沒有設定期望：任何記錄呼叫都會讓測試失敗
pub fn no_exceptions() -> MockExceptionHandling {
    MockExceptionHandling::new()
}

pub fn db_error(procedure: &str) -> CaseError {
    CaseError::database(procedure, "Transaction (Process ID 61) was deadlocked")
}

pub fn has(params: &[SqlParam], name: &str, expected: impl Into<SqlValue>) -> bool {
    param_value(params, name) == Some(&expected.into())
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
