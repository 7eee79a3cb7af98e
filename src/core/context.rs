use crate::domain::model::{DataSet, DataTable, ProcedureOutput, SqlParam};
use crate::domain::ports::{DataAccess, ExceptionHandling, ExceptionPolicy};
use crate::utils::error::{CaseError, Result};
use std::sync::Arc;

pub const DELIMITER: char = '|';

/// 預存程序 @ResultCode 的成功值
pub const SUCCESS_CODE: &str = "0";

/// 所有服務共用的資料存取與例外記錄
#[derive(Clone)]
pub struct ServiceContext {
    data: Arc<dyn DataAccess>,
    errors: Arc<dyn ExceptionHandling>,
}

impl ServiceContext {
    pub fn new(data: Arc<dyn DataAccess>, errors: Arc<dyn ExceptionHandling>) -> Self {
        Self { data, errors }
    }

    pub fn exception_handler(&self) -> &dyn ExceptionHandling {
        self.errors.as_ref()
    }

    pub async fn execute_non_query(&self, procedure: &str, params: Vec<SqlParam>) -> Result<ProcedureOutput> {
        let result = self.data.execute_non_query(procedure, &params).await;
        self.observe(procedure, result)
    }

    pub async fn get_data_table(&self, procedure: &str, params: Vec<SqlParam>) -> Result<DataTable> {
        let result = self.data.get_data_table(procedure, &params).await;
        self.observe(procedure, result)
    }

    pub async fn get_data_set(&self, procedure: &str, params: Vec<SqlParam>) -> Result<DataSet> {
        let result = self.data.get_data_set(procedure, &params).await;
        self.observe(procedure, result)
    }

    // 記錄一次後原樣往上拋
    fn observe<T>(&self, procedure: &str, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            tracing::debug!(procedure, "Stored procedure call failed");
            self.errors.log_exception(e, ExceptionPolicy::WebException);
        }
        result
    }
}

/// 拆解 "A|B|C"，去除空白並略過空項目
pub fn split_delimited(input: &str) -> Vec<&str> {
    input
        .split(DELIMITER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn join_delimited<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(&DELIMITER.to_string())
}

/// 解析 "1|2|3"，任何一項不是正整數都視為輸入錯誤
pub fn parse_ids(field: &str, input: &str) -> Result<Vec<i64>> {
    let items = split_delimited(input);
    if items.is_empty() {
        return Err(CaseError::validation(field, "at least one id is required"));
    }
    items
        .into_iter()
        .map(|item| match item.parse::<i64>() {
            Ok(id) if id > 0 => Ok(id),
            _ => Err(CaseError::validation(
                field,
                format!("'{}' is not a valid id", item),
            )),
        })
        .collect()
}
