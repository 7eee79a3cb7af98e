use crate::core::context::{join_delimited, ServiceContext, SUCCESS_CODE};
use crate::domain::model::{DataSet, DataTable, SqlParam, SqlType};
use crate::domain::requests::InvoiceRequest;
use crate::utils::error::Result;
use crate::utils::validation::{
    require_date_order, require_id, require_non_negative_decimal, require_positive_decimal,
    require_text,
};
use chrono::NaiveDate;

const RESULT_CODE: SqlType = SqlType::NVarChar(Some(10));

pub struct InvoiceService {
    ctx: ServiceContext,
}

impl InvoiceService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn get_invoices(&self, provider_id: i64, from: NaiveDate, to: NaiveDate) -> Result<DataTable> {
        require_id("provider_id", provider_id)?;
        require_date_order("invoice_period", from, to)?;

        self.ctx
            .get_data_table(
                "prc_InvoiceGet",
                vec![
                    SqlParam::input("@ProviderId", provider_id),
                    SqlParam::input("@FromDate", from),
                    SqlParam::input("@ToDate", to),
                ],
            )
            .await
    }

    /// 表頭與明細兩個結果集
    pub async fn get_invoice_detail(&self, invoice_id: i64) -> Result<DataSet> {
        require_id("invoice_id", invoice_id)?;
        let mut set = self
            .ctx
            .get_data_set(
                "prc_InvoiceDetailGet",
                vec![SqlParam::input("@InvoiceId", invoice_id)],
            )
            .await?;

        for (table, name) in set.tables.iter_mut().zip(["Invoice", "InvoiceLines"]) {
            table.name = name.to_string();
        }
        Ok(set)
    }

    /// 回傳 "InvoiceId|ResultCode"；超過授權額度時另外呼叫暫緩程序
    pub async fn save_invoice(&self, request: &InvoiceRequest) -> Result<String> {
        require_id("provider_id", request.provider_id)?;
        require_id("client_id", request.client_id)?;
        require_id("service_plan_id", request.service_plan_id)?;
        require_id("worker_id", request.worker_id)?;
        require_date_order("service_period", request.period_start, request.period_end)?;
        require_positive_decimal("units", request.units)?;
        require_non_negative_decimal("amount", request.amount)?;

        const PROCEDURE: &str = "prc_InvoiceSave";
        let output = self
            .ctx
            .execute_non_query(
                PROCEDURE,
                vec![
                    SqlParam::input_output("@InvoiceId", request.invoice_id, SqlType::BigInt),
                    SqlParam::input("@ProviderId", request.provider_id),
                    SqlParam::input("@ClientId", request.client_id),
                    SqlParam::input("@ServicePlanId", request.service_plan_id),
                    SqlParam::input("@InvoiceDate", request.invoice_date),
                    SqlParam::input("@PeriodStart", request.period_start),
                    SqlParam::input("@PeriodEnd", request.period_end),
                    SqlParam::input("@Units", request.units),
                    SqlParam::input("@Amount", request.amount),
                    SqlParam::input("@WorkerId", request.worker_id),
                    SqlParam::output("@ResultCode", RESULT_CODE),
                    SqlParam::output("@ExceedsAuthorization", SqlType::Bit),
                ],
            )
            .await?;

        let code = output.require_text(PROCEDURE, "@ResultCode")?;
        let invoice_id = output.int("@InvoiceId");

        if code == SUCCESS_CODE && output.bit("@ExceedsAuthorization") {
            if let Some(id) = invoice_id {
                tracing::info!(invoice_id = id, "Invoice exceeds authorization, placing on hold");
                self.ctx
                    .execute_non_query(
                        "prc_InvoiceHoldSave",
                        vec![
                            SqlParam::input("@InvoiceId", id),
                            SqlParam::input("@HoldReason", "EXCEEDS_AUTH"),
                            SqlParam::input("@WorkerId", request.worker_id),
                        ],
                    )
                    .await?;
            }
        }

        let id = invoice_id.map(|id| id.to_string()).unwrap_or_default();
        Ok(join_delimited([id, code]))
    }

    pub async fn void_invoice(&self, invoice_id: i64, worker_id: i64, reason: &str) -> Result<String> {
        require_id("invoice_id", invoice_id)?;
        require_id("worker_id", worker_id)?;
        require_text("reason", reason)?;

        const PROCEDURE: &str = "prc_InvoiceVoid";
        let output = self
            .ctx
            .execute_non_query(
                PROCEDURE,
                vec![
                    SqlParam::input("@InvoiceId", invoice_id),
                    SqlParam::input("@WorkerId", worker_id),
                    SqlParam::input("@Reason", reason.trim()),
                    SqlParam::output("@ResultCode", RESULT_CODE),
                ],
            )
            .await?;
        output.require_text(PROCEDURE, "@ResultCode")
    }
}
