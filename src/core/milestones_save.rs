use crate::core::context::{join_delimited, split_delimited, ServiceContext};
use crate::domain::model::{DataTable, SqlParam, SqlType};
use crate::domain::requests::MilestoneSaveRequest;
use crate::utils::error::{CaseError, Result};
use crate::utils::validation::{require_id, require_text};
use chrono::NaiveDate;

const SAVE_PROCEDURE: &str = "prc_ISISMilestoneSave";

pub struct MilestonesSave {
    ctx: ServiceContext,
}

impl MilestonesSave {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn get_milestones(&self, client_id: i64) -> Result<DataTable> {
        require_id("client_id", client_id)?;
        self.ctx
            .get_data_table(
                "prc_ISISMilestoneGet",
                vec![SqlParam::input("@ClientId", client_id)],
            )
            .await
    }

    /// 回傳 "MilestoneId|ResultCode"
    pub async fn save_milestone(&self, request: &MilestoneSaveRequest) -> Result<String> {
        require_id("client_id", request.client_id)?;
        require_id("worker_id", request.worker_id)?;
        require_text("milestone_code", &request.milestone_code)?;

        let (id, code) = self.save_one(request).await?;
        let id = id.map(|id| id.to_string()).unwrap_or_default();
        Ok(join_delimited([id, code]))
    }

    /// 一次記錄多個里程碑 ("A|B|C")；回傳各筆 ResultCode
    pub async fn save_milestones(
        &self,
        client_id: i64,
        milestone_codes: &str,
        milestone_date: NaiveDate,
        worker_id: i64,
    ) -> Result<String> {
        require_id("client_id", client_id)?;
        require_id("worker_id", worker_id)?;
        let codes = split_delimited(milestone_codes);
        if codes.is_empty() {
            return Err(CaseError::validation(
                "milestone_codes",
                "at least one milestone code is required",
            ));
        }

        let mut results = Vec::with_capacity(codes.len());
        for code in codes {
            let request = MilestoneSaveRequest {
                client_id,
                milestone_code: code.to_string(),
                milestone_date,
                program_request_id: None,
                notes: None,
                worker_id,
            };
            let (_, result_code) = self.save_one(&request).await?;
            results.push(result_code);
        }

        tracing::debug!(client_id, count = results.len(), "Milestones saved");
        Ok(join_delimited(results))
    }

    async fn save_one(&self, request: &MilestoneSaveRequest) -> Result<(Option<i64>, String)> {
        let output = self
            .ctx
            .execute_non_query(
                SAVE_PROCEDURE,
                vec![
                    SqlParam::input("@ClientId", request.client_id),
                    SqlParam::input("@MilestoneCode", request.milestone_code.trim()),
                    SqlParam::input("@MilestoneDate", request.milestone_date),
                    SqlParam::input("@ProgramRequestId", request.program_request_id),
                    SqlParam::input("@Notes", request.notes.clone()),
                    SqlParam::input("@WorkerId", request.worker_id),
                    SqlParam::output("@MilestoneId", SqlType::BigInt),
                    SqlParam::output("@ResultCode", SqlType::NVarChar(Some(10))),
                ],
            )
            .await?;

        Ok((
            output.int("@MilestoneId"),
            output.require_text(SAVE_PROCEDURE, "@ResultCode")?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::*;
    use crate::domain::model::{ProcedureOutput, SqlValue};
    use crate::domain::ports::MockDataAccess;

    fn request() -> MilestoneSaveRequest {
        MilestoneSaveRequest {
            client_id: 501,
            milestone_code: "INTAKE".to_string(),
            milestone_date: date(2024, 2, 14),
            program_request_id: Some(3001),
            notes: None,
            worker_id: 9,
        }
    }

    #[tokio::test]
    async fn test_get_milestones() {
        let mut data = MockDataAccess::new();
        data.expect_get_data_table()
            .withf(|procedure, params| {
                procedure == "prc_ISISMilestoneGet" && has(params, "@ClientId", 501i64)
            })
            .times(1)
            .returning(|_, _| Ok(DataTable::default()));

        let service = MilestonesSave::new(context(data, no_exceptions()));
        assert!(service.get_milestones(501).await.is_ok());
    }

    #[tokio::test]
    async fn test_get_milestones_db_error() {
        let mut data = MockDataAccess::new();
        data.expect_get_data_table()
            .times(1)
            .returning(|p, _| Err(db_error(p)));

        let service = MilestonesSave::new(context(data, expect_web_exception_once()));
        assert!(service.get_milestones(501).await.is_err());
    }

    #[tokio::test]
    async fn test_save_milestone() {
        let mut data = MockDataAccess::new();
        data.expect_execute_non_query()
            .withf(|procedure, params| {
                procedure == "prc_ISISMilestoneSave"
                    && has(params, "@MilestoneCode", "INTAKE")
                    && has(params, "@MilestoneDate", date(2024, 2, 14))
                    && has(params, "@ProgramRequestId", 3001i64)
                    && has(params, "@Notes", SqlValue::Null)
            })
            .times(1)
            .returning(|_, _| {
                Ok(ProcedureOutput::default()
                    .with_output("@MilestoneId", 70001i64)
                    .with_output("@ResultCode", "0"))
            });

        let service = MilestonesSave::new(context(data, no_exceptions()));
        assert_eq!(service.save_milestone(&request()).await.unwrap(), "70001|0");
    }

    #[tokio::test]
    async fn test_save_milestone_db_error() {
        let mut data = MockDataAccess::new();
        data.expect_execute_non_query()
            .times(1)
            .returning(|p, _| Err(db_error(p)));

        let service = MilestonesSave::new(context(data, expect_web_exception_once()));
        assert!(service.save_milestone(&request()).await.is_err());
    }

    #[tokio::test]
    async fn test_save_milestones_calls_once_per_code() {
        let mut data = MockDataAccess::new();
        data.expect_execute_non_query()
            .withf(|procedure, params| {
                procedure == "prc_ISISMilestoneSave" && has(params, "@MilestoneDate", date(2024, 2, 14))
            })
            .times(2)
            .returning(|_, params| {
                let code = if has(params, "@MilestoneCode", "ASSESS") { "M12" } else { "0" };
                Ok(ProcedureOutput::default().with_output("@ResultCode", code))
            });

        let service = MilestonesSave::new(context(data, no_exceptions()));
        let codes = service
            .save_milestones(501, "INTAKE| ASSESS", date(2024, 2, 14), 9)
            .await
            .unwrap();
        assert_eq!(codes, "0|M12");
    }

    #[tokio::test]
    async fn test_save_milestones_db_error() {
        let mut data = MockDataAccess::new();
        data.expect_execute_non_query()
            .times(1)
            .returning(|p, _| Err(db_error(p)));

        let service = MilestonesSave::new(context(data, expect_web_exception_once()));
        assert!(service
            .save_milestones(501, "INTAKE|ASSESS", date(2024, 2, 14), 9)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_save_milestones_requires_codes() {
        let service = MilestonesSave::new(context(MockDataAccess::new(), no_exceptions()));
        assert!(service
            .save_milestones(501, "", date(2024, 2, 14), 9)
            .await
            .is_err());
    }
}
