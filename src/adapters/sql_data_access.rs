use crate::adapters::command::{build_procedure_batch, split_results};
use crate::config::toml_config::DatabaseConfig;
use crate::domain::model::{DataSet, DataTable, ProcedureOutput, SqlParam};
use crate::domain::ports::{DataAccess, DbConnector, ExceptionHandling, ExceptionPolicy};
use crate::utils::error::{CaseError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 每次呼叫：開連線 → 執行 → 關連線
pub struct SqlDataAccess {
    connector: Arc<dyn DbConnector>,
    errors: Arc<dyn ExceptionHandling>,
    schema: String,
    command_timeout: Duration,
}

impl SqlDataAccess {
    pub fn new(
        connector: Arc<dyn DbConnector>,
        errors: Arc<dyn ExceptionHandling>,
        settings: &DatabaseConfig,
    ) -> Self {
        Self {
            connector,
            errors,
            schema: settings.schema().to_string(),
            command_timeout: Duration::from_secs(settings.command_timeout_seconds()),
        }
    }

    async fn run(&self, procedure: &str, params: &[SqlParam]) -> Result<(Vec<DataTable>, ProcedureOutput)> {
        match self.run_once(procedure, params).await {
            Ok(result) => Ok(result),
            Err(e) => {
                self.errors
                    .log_exception(&e, ExceptionPolicy::DatabaseException);
                Err(e)
            }
        }
    }

    async fn run_once(
        &self,
        procedure: &str,
        params: &[SqlParam],
    ) -> Result<(Vec<DataTable>, ProcedureOutput)> {
        let batch = build_procedure_batch(&self.schema, procedure, params)?;
        tracing::debug!(procedure, params = ?params, "Executing stored procedure");

        let mut connection = match tokio::time::timeout(self.command_timeout, self.connector.open()).await {
            Ok(opened) => opened?,
            Err(_) => {
                return Err(CaseError::Connection {
                    message: format!(
                        "connection not established within {} seconds",
                        self.command_timeout.as_secs()
                    ),
                })
            }
        };
        let started = Instant::now();

        let outcome = match tokio::time::timeout(self.command_timeout, connection.execute(&batch)).await {
            Ok(result) => result,
            Err(_) => Err(CaseError::Timeout {
                procedure: procedure.to_string(),
                seconds: self.command_timeout.as_secs(),
            }),
        };

        // 無論成功與否都只關閉一次
        if let Err(close_err) = connection.close().await {
            tracing::warn!(procedure, "Failed to close database connection: {}", close_err);
        }

        let result_sets = outcome?;
        tracing::debug!(
            procedure,
            result_sets = result_sets.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Stored procedure completed"
        );

        split_results(&batch, result_sets)
    }
}

#[async_trait]
impl DataAccess for SqlDataAccess {
    async fn execute_non_query(&self, procedure: &str, params: &[SqlParam]) -> Result<ProcedureOutput> {
        let (_, output) = self.run(procedure, params).await?;
        Ok(output)
    }

    async fn get_data_table(&self, procedure: &str, params: &[SqlParam]) -> Result<DataTable> {
        let (tables, _) = self.run(procedure, params).await?;
        Ok(tables.into_iter().next().unwrap_or_default())
    }

    async fn get_data_set(&self, procedure: &str, params: &[SqlParam]) -> Result<DataSet> {
        let (tables, _) = self.run(procedure, params).await?;
        Ok(DataSet { tables })
    }
}
