use crate::core::context::{join_delimited, ServiceContext};
use crate::domain::model::{DataTable, DateWindow, SqlParam, SqlType};
use crate::domain::requests::ServiceSpanRequest;
use crate::utils::error::Result;
use crate::utils::validation::{require_date_order, require_id, require_positive_decimal, require_text};

const RESULT_CODE: SqlType = SqlType::NVarChar(Some(10));

pub struct ServiceSpanService {
    ctx: ServiceContext,
}

impl ServiceSpanService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn get_service_spans(&self, service_plan_id: i64) -> Result<DataTable> {
        require_id("service_plan_id", service_plan_id)?;
        self.ctx
            .get_data_table(
                "prc_ServiceSpanGet",
                vec![SqlParam::input("@ServicePlanId", service_plan_id)],
            )
            .await
    }

    /// 計畫底下所有服務區段的最早開始與最晚結束；沒有區段時為 None
    pub async fn get_span_date_range(&self, service_plan_id: i64) -> Result<Option<DateWindow>> {
        require_id("service_plan_id", service_plan_id)?;
        let output = self
            .ctx
            .execute_non_query(
                "prc_ServiceSpanDateRangeGet",
                vec![
                    SqlParam::input("@ServicePlanId", service_plan_id),
                    SqlParam::output("@EarliestStart", SqlType::Date),
                    SqlParam::output("@LatestEnd", SqlType::Date),
                ],
            )
            .await?;

        Ok(output.date("@EarliestStart").map(|start| DateWindow {
            start,
            end: output.date("@LatestEnd"),
        }))
    }

    /// 回傳 "ServiceSpanId|ResultCode"
    pub async fn save_service_span(&self, request: &ServiceSpanRequest) -> Result<String> {
        require_id("service_plan_id", request.service_plan_id)?;
        require_id("provider_id", request.provider_id)?;
        require_id("worker_id", request.worker_id)?;
        require_text("service_code", &request.service_code)?;
        require_date_order("span_dates", request.span_start, request.span_end)?;
        require_positive_decimal("units", request.units)?;

        const PROCEDURE: &str = "prc_ServiceSpanSave";
        let output = self
            .ctx
            .execute_non_query(
                PROCEDURE,
                vec![
                    SqlParam::input_output("@ServiceSpanId", request.service_span_id, SqlType::BigInt),
                    SqlParam::input("@ServicePlanId", request.service_plan_id),
                    SqlParam::input("@ServiceCode", request.service_code.trim()),
                    SqlParam::input("@ProviderId", request.provider_id),
                    SqlParam::input("@SpanStart", request.span_start),
                    SqlParam::input("@SpanEnd", request.span_end),
                    SqlParam::input("@Units", request.units),
                    SqlParam::input("@WorkerId", request.worker_id),
                    SqlParam::output("@ResultCode", RESULT_CODE),
                ],
            )
            .await?;

        let id = output
            .int("@ServiceSpanId")
            .map(|id| id.to_string())
            .unwrap_or_default();
        Ok(join_delimited([id, output.require_text(PROCEDURE, "@ResultCode")?]))
    }

    pub async fn delete_service_span(&self, service_span_id: i64, worker_id: i64) -> Result<String> {
        require_id("service_span_id", service_span_id)?;
        require_id("worker_id", worker_id)?;

        const PROCEDURE: &str = "prc_ServiceSpanDelete";
        let output = self
            .ctx
            .execute_non_query(
                PROCEDURE,
                vec![
                    SqlParam::input("@ServiceSpanId", service_span_id),
                    SqlParam::input("@WorkerId", worker_id),
                    SqlParam::output("@ResultCode", RESULT_CODE),
                ],
            )
            .await?;
        output.require_text(PROCEDURE, "@ResultCode")
    }

    /// 依計畫日期重新調整區段，回傳受影響的區段數 (程序回傳值)
    pub async fn realign_spans(&self, service_plan_id: i64, worker_id: i64) -> Result<i32> {
        require_id("service_plan_id", service_plan_id)?;
        let output = self
            .ctx
            .execute_non_query(
                "prc_ServiceSpanRealign",
                vec![
                    SqlParam::input("@ServicePlanId", service_plan_id),
                    SqlParam::input("@WorkerId", worker_id),
                ],
            )
            .await?;

        let realigned = output.return_value.unwrap_or(0);
        tracing::debug!(service_plan_id, realigned, "Service spans realigned");
        Ok(realigned)
    }
}
