use crate::core::context::{join_delimited, parse_ids, ServiceContext};
use crate::domain::model::{DataTable, SqlParam, SqlType};
use crate::domain::requests::CashoutServiceRequest;
use crate::utils::error::Result;
use crate::utils::validation::{
    require_id, require_non_negative_decimal, require_positive_decimal, require_text,
};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

const RESULT_CODE: SqlType = SqlType::NVarChar(Some(10));

pub struct CashoutService {
    ctx: ServiceContext,
}

impl CashoutService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn get_cashout_services(&self, client_id: i64) -> Result<DataTable> {
        require_id("client_id", client_id)?;
        self.ctx
            .get_data_table(
                "prc_CashoutServiceGet",
                vec![SqlParam::input("@ClientId", client_id)],
            )
            .await
    }

    /// 回傳 "CashoutServiceId|ResultCode"
    pub async fn save_cashout_service(&self, request: &CashoutServiceRequest) -> Result<String> {
        require_id("client_id", request.client_id)?;
        require_id("provider_id", request.provider_id)?;
        require_id("worker_id", request.worker_id)?;
        require_text("service_code", &request.service_code)?;
        require_positive_decimal("units", request.units)?;
        require_non_negative_decimal("rate", request.rate)?;

        const PROCEDURE: &str = "prc_CashoutServiceSave";
        let output = self
            .ctx
            .execute_non_query(
                PROCEDURE,
                vec![
                    SqlParam::input_output(
                        "@CashoutServiceId",
                        request.cashout_service_id,
                        SqlType::BigInt,
                    ),
                    SqlParam::input("@ClientId", request.client_id),
                    SqlParam::input("@ServiceCode", request.service_code.trim()),
                    SqlParam::input("@ProviderId", request.provider_id),
                    SqlParam::input("@ServiceMonth", first_of_month(request.service_month)),
                    SqlParam::input("@Units", request.units),
                    SqlParam::input("@Rate", request.rate),
                    SqlParam::input("@WorkerId", request.worker_id),
                    SqlParam::output("@ResultCode", RESULT_CODE),
                ],
            )
            .await?;

        let id = output
            .int("@CashoutServiceId")
            .map(|id| id.to_string())
            .unwrap_or_default();
        let code = output.require_text(PROCEDURE, "@ResultCode")?;
        Ok(join_delimited([id, code]))
    }

    pub async fn delete_cashout_service(&self, cashout_service_id: i64, worker_id: i64) -> Result<String> {
        require_id("cashout_service_id", cashout_service_id)?;
        require_id("worker_id", worker_id)?;

        const PROCEDURE: &str = "prc_CashoutServiceDelete";
        let output = self
            .ctx
            .execute_non_query(
                PROCEDURE,
                vec![
                    SqlParam::input("@CashoutServiceId", cashout_service_id),
                    SqlParam::input("@WorkerId", worker_id),
                    SqlParam::output("@ResultCode", RESULT_CODE),
                ],
            )
            .await?;
        output.require_text(PROCEDURE, "@ResultCode")
    }

    /// 月份預算；程序回傳 NULL 時視為 0
    pub async fn get_cashout_budget(&self, client_id: i64, month: NaiveDate) -> Result<Decimal> {
        require_id("client_id", client_id)?;

        let output = self
            .ctx
            .execute_non_query(
                "prc_CashoutBudgetGet",
                vec![
                    SqlParam::input("@ClientId", client_id),
                    SqlParam::input("@BudgetMonth", first_of_month(month)),
                    SqlParam::output("@BudgetAmount", SqlType::Money),
                ],
            )
            .await?;
        Ok(output.decimal("@BudgetAmount").unwrap_or(Decimal::ZERO))
    }

    /// "id|id|id" 逐筆處理，遇到錯誤即停止
    pub async fn process_cashouts(&self, cashout_service_ids: &str, worker_id: i64) -> Result<String> {
        require_id("worker_id", worker_id)?;
        let ids = parse_ids("cashout_service_ids", cashout_service_ids)?;

        const PROCEDURE: &str = "prc_CashoutProcess";
        let mut codes = Vec::with_capacity(ids.len());
        for id in ids {
            let output = self
                .ctx
                .execute_non_query(
                    PROCEDURE,
                    vec![
                        SqlParam::input("@CashoutServiceId", id),
                        SqlParam::input("@WorkerId", worker_id),
                        SqlParam::output("@ResultCode", RESULT_CODE),
                    ],
                )
                .await?;
            codes.push(output.require_text(PROCEDURE, "@ResultCode")?);
        }

        tracing::info!(count = codes.len(), "Cashout services processed");
        Ok(join_delimited(codes))
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}
