use crate::core::context::{ServiceContext, DELIMITER, SUCCESS_CODE};
use crate::core::program_request::ProgramRequestService;
use crate::core::service_span::ServiceSpanService;
use crate::domain::model::{DataTable, SqlParam, SqlType};
use crate::domain::requests::ServicePlanRequest;
use crate::utils::error::Result;
use crate::utils::validation::require_id;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// 服務計畫驗證結果；code 為 "0" 代表通過
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanValidation {
    pub code: String,
    pub message: String,
}

impl PlanValidation {
    pub fn valid() -> Self {
        Self {
            code: SUCCESS_CODE.to_string(),
            message: String::new(),
        }
    }

    fn reject(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.code == SUCCESS_CODE
    }
}

impl fmt::Display for PlanValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.code, DELIMITER, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanSaveResult {
    pub service_plan_id: Option<i64>,
    pub result_code: String,
    /// 驗證未通過時的說明，此時不會呼叫儲存程序
    pub rejection: Option<String>,
    pub spans_realigned: i32,
}

impl PlanSaveResult {
    pub fn is_saved(&self) -> bool {
        self.rejection.is_none() && self.result_code == SUCCESS_CODE
    }
}

impl fmt::Display for PlanSaveResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.service_plan_id {
            Some(id) => write!(f, "{}{}{}", id, DELIMITER, self.result_code),
            None => write!(f, "{}{}", DELIMITER, self.result_code),
        }
    }
}

pub struct ServicePlanService {
    ctx: ServiceContext,
    spans: ServiceSpanService,
    program_requests: ProgramRequestService,
}

impl ServicePlanService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self {
            spans: ServiceSpanService::new(ctx.clone()),
            program_requests: ProgramRequestService::new(ctx.clone()),
            ctx,
        }
    }

    pub async fn get_service_plans(&self, client_id: i64) -> Result<DataTable> {
        require_id("client_id", client_id)?;
        self.ctx
            .get_data_table(
                "prc_ServicePlanGet",
                vec![SqlParam::input("@ClientId", client_id)],
            )
            .await
    }

    /// 依序檢查計畫日期，第一個不符合的規則即回傳
    pub async fn validate_plan_msg(&self, request: &ServicePlanRequest) -> Result<PlanValidation> {
        require_id("client_id", request.client_id)?;
        require_id("program_request_id", request.program_request_id)?;
        if let Some(plan_id) = request.service_plan_id {
            require_id("service_plan_id", plan_id)?;
        }

        if request.plan_end < request.plan_start {
            return Ok(PlanValidation::reject(
                "SP001",
                "Plan end date cannot be before the plan start date",
            ));
        }

        let Some(window) = self
            .program_requests
            .get_program_request_window(request.program_request_id)
            .await?
        else {
            return Ok(PlanValidation::reject(
                "SP002",
                format!("Program request {} was not found", request.program_request_id),
            ));
        };

        if request.plan_start < window.start {
            return Ok(PlanValidation::reject(
                "SP003",
                format!(
                    "Plan cannot start before the program request start date {}",
                    format_date(window.start)
                ),
            ));
        }
        if let Some(request_end) = window.end {
            if request.plan_end > request_end {
                return Ok(PlanValidation::reject(
                    "SP004",
                    format!(
                        "Plan cannot end after the program request end date {}",
                        format_date(request_end)
                    ),
                ));
            }
        }

        if let Some(plan_id) = request.service_plan_id {
            if let Some(spans) = self.spans.get_span_date_range(plan_id).await? {
                if spans.start < request.plan_start {
                    return Ok(PlanValidation::reject(
                        "SP005",
                        format!(
                            "Existing service spans start on {}, before the plan start",
                            format_date(spans.start)
                        ),
                    ));
                }
                if spans.ends_after(request.plan_end) {
                    return Ok(PlanValidation::reject(
                        "SP006",
                        "Existing service spans end after the plan end",
                    ));
                }
            }
        }

        let overlaps = self.overlap_count(request).await?;
        if overlaps > 0 {
            return Ok(PlanValidation::reject(
                "SP007",
                format!("Plan overlaps {} other service plan(s) for this client", overlaps),
            ));
        }

        Ok(PlanValidation::valid())
    }

    /// 先驗證再儲存；儲存成功且程序要求時重新調整服務區段
    pub async fn save_service_plan(&self, request: &ServicePlanRequest) -> Result<PlanSaveResult> {
        require_id("worker_id", request.worker_id)?;

        let validation = self.validate_plan_msg(request).await?;
        if !validation.is_valid() {
            tracing::info!(
                client_id = request.client_id,
                code = %validation.code,
                "Service plan rejected by validation"
            );
            return Ok(PlanSaveResult {
                service_plan_id: request.service_plan_id,
                result_code: validation.code,
                rejection: Some(validation.message),
                spans_realigned: 0,
            });
        }

        const PROCEDURE: &str = "prc_ServicePlanSave";
        let output = self
            .ctx
            .execute_non_query(
                PROCEDURE,
                vec![
                    SqlParam::input_output("@ServicePlanId", request.service_plan_id, SqlType::BigInt),
                    SqlParam::input("@ClientId", request.client_id),
                    SqlParam::input("@ProgramRequestId", request.program_request_id),
                    SqlParam::input("@PlanStart", request.plan_start),
                    SqlParam::input("@PlanEnd", request.plan_end),
                    SqlParam::input("@Comments", request.comments.clone()),
                    SqlParam::input("@WorkerId", request.worker_id),
                    SqlParam::output("@ResultCode", SqlType::NVarChar(Some(10))),
                    SqlParam::output("@SpansNeedRealign", SqlType::Bit),
                ],
            )
            .await?;

        let service_plan_id = output.int("@ServicePlanId").or(request.service_plan_id);
        let result_code = output.require_text(PROCEDURE, "@ResultCode")?;

        let mut spans_realigned = 0;
        if result_code == SUCCESS_CODE && output.bit("@SpansNeedRealign") {
            if let Some(plan_id) = service_plan_id {
                spans_realigned = self.spans.realign_spans(plan_id, request.worker_id).await?;
            }
        }

        Ok(PlanSaveResult {
            service_plan_id,
            result_code,
            rejection: None,
            spans_realigned,
        })
    }

    pub async fn close_service_plan(&self, service_plan_id: i64, end_date: NaiveDate, worker_id: i64) -> Result<String> {
        require_id("service_plan_id", service_plan_id)?;
        require_id("worker_id", worker_id)?;

        const PROCEDURE: &str = "prc_ServicePlanClose";
        let output = self
            .ctx
            .execute_non_query(
                PROCEDURE,
                vec![
                    SqlParam::input("@ServicePlanId", service_plan_id),
                    SqlParam::input("@EndDate", end_date),
                    SqlParam::input("@WorkerId", worker_id),
                    SqlParam::output("@ResultCode", SqlType::NVarChar(Some(10))),
                ],
            )
            .await?;
        output.require_text(PROCEDURE, "@ResultCode")
    }

    async fn overlap_count(&self, request: &ServicePlanRequest) -> Result<i64> {
        let output = self
            .ctx
            .execute_non_query(
                "prc_ServicePlanOverlapCheck",
                vec![
                    SqlParam::input("@ClientId", request.client_id),
                    SqlParam::input("@ServicePlanId", request.service_plan_id),
                    SqlParam::input("@PlanStart", request.plan_start),
                    SqlParam::input("@PlanEnd", request.plan_end),
                    SqlParam::output("@OverlapCount", SqlType::Int),
                ],
            )
            .await?;
        Ok(output.int("@OverlapCount").unwrap_or(0))
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}
