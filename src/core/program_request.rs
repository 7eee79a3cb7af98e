use crate::core::context::{join_delimited, ServiceContext};
use crate::domain::model::{DataTable, DateWindow, SqlParam, SqlType};
use crate::domain::requests::ProgramRequestInput;
use crate::utils::error::Result;
use crate::utils::validation::{require_date_order, require_id, require_text};

const RESULT_CODE: SqlType = SqlType::NVarChar(Some(10));

pub struct ProgramRequestService {
    ctx: ServiceContext,
}

impl ProgramRequestService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn get_program_requests(&self, client_id: i64) -> Result<DataTable> {
        require_id("client_id", client_id)?;
        self.ctx
            .get_data_table(
                "prc_ProgramRequestGet",
                vec![SqlParam::input("@ClientId", client_id)],
            )
            .await
    }

    /// 方案申請的有效日期區間；找不到申請 (開始日為 NULL) 時回傳 None
    pub async fn get_program_request_window(&self, program_request_id: i64) -> Result<Option<DateWindow>> {
        require_id("program_request_id", program_request_id)?;
        let output = self
            .ctx
            .execute_non_query(
                "prc_ProgramRequestDatesGet",
                vec![
                    SqlParam::input("@ProgramRequestId", program_request_id),
                    SqlParam::output("@StartDate", SqlType::Date),
                    SqlParam::output("@EndDate", SqlType::Date),
                ],
            )
            .await?;

        Ok(output.date("@StartDate").map(|start| DateWindow {
            start,
            end: output.date("@EndDate"),
        }))
    }

    /// 回傳 "ProgramRequestId|ResultCode"
    pub async fn save_program_request(&self, request: &ProgramRequestInput) -> Result<String> {
        require_id("client_id", request.client_id)?;
        require_id("worker_id", request.worker_id)?;
        require_text("program_code", &request.program_code)?;
        if let Some(end) = request.end_date {
            require_date_order("program_request_dates", request.start_date, end)?;
        }

        const PROCEDURE: &str = "prc_ProgramRequestSave";
        let output = self
            .ctx
            .execute_non_query(
                PROCEDURE,
                vec![
                    SqlParam::input_output(
                        "@ProgramRequestId",
                        request.program_request_id,
                        SqlType::BigInt,
                    ),
                    SqlParam::input("@ClientId", request.client_id),
                    SqlParam::input("@ProgramCode", request.program_code.trim()),
                    SqlParam::input("@RequestDate", request.request_date),
                    SqlParam::input("@StartDate", request.start_date),
                    SqlParam::input("@EndDate", request.end_date),
                    SqlParam::input("@WorkerId", request.worker_id),
                    SqlParam::output("@ResultCode", RESULT_CODE),
                ],
            )
            .await?;

        let id = output
            .int("@ProgramRequestId")
            .map(|id| id.to_string())
            .unwrap_or_default();
        Ok(join_delimited([id, output.require_text(PROCEDURE, "@ResultCode")?]))
    }

    pub async fn withdraw_program_request(
        &self,
        program_request_id: i64,
        worker_id: i64,
        reason: &str,
    ) -> Result<String> {
        require_id("program_request_id", program_request_id)?;
        require_id("worker_id", worker_id)?;
        require_text("reason", reason)?;

        const PROCEDURE: &str = "prc_ProgramRequestWithdraw";
        let output = self
            .ctx
            .execute_non_query(
                PROCEDURE,
                vec![
                    SqlParam::input("@ProgramRequestId", program_request_id),
                    SqlParam::input("@WorkerId", worker_id),
                    SqlParam::input("@Reason", reason.trim()),
                    SqlParam::output("@ResultCode", RESULT_CODE),
                ],
            )
            .await?;
        output.require_text(PROCEDURE, "@ResultCode")
    }
}
