use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashoutServiceRequest {
    pub cashout_service_id: Option<i64>,
    pub client_id: i64,
    pub service_code: String,
    pub provider_id: i64,
    pub service_month: NaiveDate,
    pub units: Decimal,
    pub rate: Decimal,
    pub worker_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceRequest {
    pub invoice_id: Option<i64>,
    pub provider_id: i64,
    pub client_id: i64,
    pub service_plan_id: i64,
    pub invoice_date: NaiveDate,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub units: Decimal,
    pub amount: Decimal,
    pub worker_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilestoneSaveRequest {
    pub client_id: i64,
    pub milestone_code: String,
    pub milestone_date: NaiveDate,
    pub program_request_id: Option<i64>,
    pub notes: Option<String>,
    pub worker_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramRequestInput {
    pub program_request_id: Option<i64>,
    pub client_id: i64,
    pub program_code: String,
    pub request_date: NaiveDate,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub worker_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicePlanRequest {
    pub service_plan_id: Option<i64>,
    pub client_id: i64,
    pub program_request_id: i64,
    pub plan_start: NaiveDate,
    pub plan_end: NaiveDate,
    pub comments: Option<String>,
    pub worker_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSpanRequest {
    pub service_span_id: Option<i64>,
    pub service_plan_id: i64,
    pub service_code: String,
    pub provider_id: i64,
    pub span_start: NaiveDate,
    pub span_end: NaiveDate,
    pub units: Decimal,
    pub worker_id: i64,
}
