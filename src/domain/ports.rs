use crate::domain::model::{DataSet, DataTable, ProcedureOutput, SqlParam, SqlValue};
use crate::utils::error::{CaseError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 呼叫預存程序的唯一入口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataAccess: Send + Sync {
    async fn execute_non_query(&self, procedure: &str, params: &[SqlParam]) -> Result<ProcedureOutput>;

    /// 第一個結果集；程序沒有回傳結果集時為空表
    async fn get_data_table(&self, procedure: &str, params: &[SqlParam]) -> Result<DataTable>;

    async fn get_data_set(&self, procedure: &str, params: &[SqlParam]) -> Result<DataSet>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionPolicy {
    WebException,
    DatabaseException,
    AuditException,
}

impl ExceptionPolicy {
    pub const ALL: [ExceptionPolicy; 3] = [
        ExceptionPolicy::WebException,
        ExceptionPolicy::DatabaseException,
        ExceptionPolicy::AuditException,
    ];
}

impl fmt::Display for ExceptionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExceptionPolicy::WebException => "Web_Exception",
            ExceptionPolicy::DatabaseException => "Database_Exception",
            ExceptionPolicy::AuditException => "Audit_Exception",
        };
        f.write_str(name)
    }
}

/// 只負責記錄，不吞掉也不轉換錯誤
#[cfg_attr(test, mockall::automock)]
pub trait ExceptionHandling: Send + Sync {
    fn log_exception(&self, error: &CaseError, policy: ExceptionPolicy);
}

/// 已組好的 T-SQL 批次與依序綁定的參數值
#[derive(Debug, Clone, PartialEq)]
pub struct CommandBatch {
    pub procedure: String,
    pub sql: String,
    pub bindings: Vec<SqlValue>,
    /// 最後一個結果集中，輸出參數依序對應的名稱
    pub output_names: Vec<String>,
}

#[async_trait]
pub trait DbConnector: Send + Sync {
    async fn open(&self) -> Result<Box<dyn DbConnection>>;
}

#[async_trait]
pub trait DbConnection: Send {
    /// 回傳所有結果集，順序與伺服器送出的一致
    async fn execute(&mut self, batch: &CommandBatch) -> Result<Vec<DataTable>>;

    async fn close(&mut self) -> Result<()>;
}
