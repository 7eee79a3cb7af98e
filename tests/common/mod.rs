#![allow(dead_code)]

use async_trait::async_trait;
use caseflow::domain::model::{DataTable, SqlValue};
use caseflow::domain::ports::{CommandBatch, DbConnection, DbConnector};
use caseflow::{CaseError, DatabaseConfig, Result, SqlDataAccess, TracingExceptionHandler};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 連線被開啟後依序回放的一步
pub enum Step {
    /// 程序本身的結果集 + 最後的輸出參數列
    Sets(Vec<DataTable>),
    Fail(&'static str),
    Hang,
}

#[derive(Default)]
struct ScriptState {
    steps: VecDeque<Step>,
    batches: Vec<CommandBatch>,
    opened: usize,
    closed: usize,
    refuse_open: bool,
    hang_open: bool,
    fail_close: bool,
}

/// 記錄每個批次並回放預先排好的結果
#[derive(Clone, Default)]
pub struct ScriptedConnector {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(self, step: Step) -> Self {
        self.state.lock().unwrap().steps.push_back(step);
        self
    }

    /// 只有輸出參數 (回傳值在第一欄)
    pub fn then_outputs(self, return_value: i32, outputs: Vec<SqlValue>) -> Self {
        self.then(Step::Sets(vec![output_row(return_value, outputs)]))
    }

    pub fn refusing_connections(self) -> Self {
        self.state.lock().unwrap().refuse_open = true;
        self
    }

    /// 開連線時一直等不到伺服器回應
    pub fn hanging_on_open(self) -> Self {
        self.state.lock().unwrap().hang_open = true;
        self
    }

    pub fn failing_close(self) -> Self {
        self.state.lock().unwrap().fail_close = true;
        self
    }

    pub fn opened(&self) -> usize {
        self.state.lock().unwrap().opened
    }

    pub fn closed(&self) -> usize {
        self.state.lock().unwrap().closed
    }

    pub fn batches(&self) -> Vec<CommandBatch> {
        self.state.lock().unwrap().batches.clone()
    }

    pub fn procedures(&self) -> Vec<String> {
        self.batches().into_iter().map(|b| b.procedure).collect()
    }
}

#[async_trait]
impl DbConnector for ScriptedConnector {
    async fn open(&self) -> Result<Box<dyn DbConnection>> {
        let hang = self.state.lock().unwrap().hang_open;
        if hang {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }

        let mut state = self.state.lock().unwrap();
        if state.refuse_open {
            return Err(CaseError::Connection {
                message: "Login timeout expired".to_string(),
            });
        }
        state.opened += 1;
        Ok(Box::new(ScriptedConnection {
            state: self.state.clone(),
        }))
    }
}

struct ScriptedConnection {
    state: Arc<Mutex<ScriptState>>,
}

#[async_trait]
impl DbConnection for ScriptedConnection {
    async fn execute(&mut self, batch: &CommandBatch) -> Result<Vec<DataTable>> {
        let step = {
            let mut state = self.state.lock().unwrap();
            state.batches.push(batch.clone());
            state.steps.pop_front()
        };

        match step {
            Some(Step::Sets(sets)) => Ok(sets),
            Some(Step::Fail(message)) => Err(CaseError::database(&batch.procedure, message)),
            Some(Step::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
            None => Err(CaseError::database(&batch.procedure, "no scripted response")),
        }
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.closed += 1;
        if state.fail_close {
            return Err(CaseError::Connection {
                message: "connection reset while closing".to_string(),
            });
        }
        Ok(())
    }
}

pub fn output_row(return_value: i32, outputs: Vec<SqlValue>) -> DataTable {
    let mut columns = vec!["__return_value".to_string()];
    columns.extend((1..=outputs.len()).map(|i| format!("out{}", i)));
    let mut row = vec![SqlValue::Int(i64::from(return_value))];
    row.extend(outputs);
    DataTable::new("", columns).with_row(row)
}

pub fn settings(timeout_seconds: u64) -> DatabaseConfig {
    DatabaseConfig {
        command_timeout_seconds: Some(timeout_seconds),
        ..DatabaseConfig::new("server=tcp:localhost,1433;database=CaseFlow")
    }
}

pub fn data_access(
    connector: &ScriptedConnector,
    errors: &Arc<TracingExceptionHandler>,
) -> Arc<SqlDataAccess> {
    Arc::new(SqlDataAccess::new(
        Arc::new(connector.clone()),
        errors.clone(),
        &settings(30),
    ))
}
