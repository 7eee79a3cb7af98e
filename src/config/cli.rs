use crate::core::service_plan::PlanValidation;
use crate::core::CaseServices;
use crate::domain::model::{DataSet, DataTable};
use crate::domain::requests::ServicePlanRequest;
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, Validate};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(name = "caseflow")]
#[command(about = "Case management lookups and checks against the SQL Server business tier")]
pub struct CliConfig {
    #[arg(long, short = 'c', default_value = "caseflow.toml")]
    pub config: String,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// 驗證帳號密碼，輸出 "ResultCode|WorkerId"
    Authenticate {
        #[arg(long)]
        user: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "127.0.0.1")]
        address: String,
    },
    /// 代碼表，多個以 | 分隔
    CodeTable { names: String },
    References { category: String },
    ReferenceValue { category: String, key: String },
    Providers {
        service_code: String,
        #[arg(long)]
        county: Option<String>,
    },
    Workers {
        office_id: i64,
        #[arg(long)]
        include_inactive: bool,
    },
    ProgramRequests { client_id: i64 },
    Plans { client_id: i64 },
    Spans { service_plan_id: i64 },
    Milestones { client_id: i64 },
    Invoices {
        provider_id: i64,
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },
    CashoutBudget { client_id: i64, month: NaiveDate },
    /// 檢查服務計畫日期，輸出 "Code|Message"
    ValidatePlan {
        #[arg(long)]
        client_id: i64,
        #[arg(long)]
        program_request_id: i64,
        #[arg(long)]
        plan_id: Option<i64>,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
}

/// 子命令的結果
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    Text(String),
    Table(DataTable),
    Tables(DataSet),
    Amount(Decimal),
    Validation(PlanValidation),
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("config", &self.config)?;
        Ok(())
    }
}

impl Command {
    pub async fn run(&self, services: &CaseServices) -> Result<CommandOutput> {
        let output = match self {
            Command::Authenticate {
                user,
                password,
                address,
            } => {
                let outcome = services.login.authenticate(user, password, address).await?;
                CommandOutput::Text(outcome.to_string())
            }
            Command::CodeTable { names } => {
                CommandOutput::Tables(services.code_tables.get_code_tables(names).await?)
            }
            Command::References { category } => {
                CommandOutput::Table(services.reference.get_reference_list(category).await?)
            }
            Command::ReferenceValue { category, key } => CommandOutput::Text(
                services
                    .reference
                    .get_reference_value(category, key)
                    .await?
                    .unwrap_or_default(),
            ),
            Command::Providers {
                service_code,
                county,
            } => CommandOutput::Table(
                services
                    .reference
                    .get_providers(service_code, county.as_deref())
                    .await?,
            ),
            Command::Workers {
                office_id,
                include_inactive,
            } => CommandOutput::Table(
                services
                    .reference
                    .get_workers(*office_id, !include_inactive)
                    .await?,
            ),
            Command::ProgramRequests { client_id } => CommandOutput::Table(
                services
                    .program_request
                    .get_program_requests(*client_id)
                    .await?,
            ),
            Command::Plans { client_id } => {
                CommandOutput::Table(services.service_plan.get_service_plans(*client_id).await?)
            }
            Command::Spans { service_plan_id } => CommandOutput::Table(
                services
                    .service_span
                    .get_service_spans(*service_plan_id)
                    .await?,
            ),
            Command::Milestones { client_id } => {
                CommandOutput::Table(services.milestones_save.get_milestones(*client_id).await?)
            }
            Command::Invoices {
                provider_id,
                from,
                to,
            } => CommandOutput::Table(services.invoice.get_invoices(*provider_id, *from, *to).await?),
            Command::CashoutBudget { client_id, month } => {
                CommandOutput::Amount(services.cashout.get_cashout_budget(*client_id, *month).await?)
            }
            Command::ValidatePlan {
                client_id,
                program_request_id,
                plan_id,
                start,
                end,
            } => {
                let request = ServicePlanRequest {
                    service_plan_id: *plan_id,
                    client_id: *client_id,
                    program_request_id: *program_request_id,
                    plan_start: *start,
                    plan_end: *end,
                    comments: None,
                    worker_id: 0,
                };
                CommandOutput::Validation(services.service_plan.validate_plan_msg(&request).await?)
            }
        };
        Ok(output)
    }
}

impl CommandOutput {
    pub fn write<W: Write>(&self, format: OutputFormat, mut writer: W) -> Result<()> {
        match (self, format) {
            (CommandOutput::Text(text), _) => writeln!(writer, "{}", text)?,
            (CommandOutput::Amount(amount), _) => writeln!(writer, "{}", amount)?,
            (CommandOutput::Validation(result), OutputFormat::Json) => {
                serde_json::to_writer_pretty(&mut writer, result)?;
                writeln!(writer)?;
            }
            (CommandOutput::Validation(result), OutputFormat::Csv) => writeln!(writer, "{}", result)?,
            (CommandOutput::Table(table), OutputFormat::Json) => {
                serde_json::to_writer_pretty(&mut writer, &table.to_records())?;
                writeln!(writer)?;
            }
            (CommandOutput::Table(table), OutputFormat::Csv) => table.write_csv(writer)?,
            (CommandOutput::Tables(set), OutputFormat::Json) => {
                // 依原順序輸出，同名表格各自保留
                let tables: Vec<serde_json::Value> = set
                    .tables
                    .iter()
                    .map(|t| serde_json::json!({ "name": t.name, "rows": t.to_records() }))
                    .collect();
                serde_json::to_writer_pretty(&mut writer, &tables)?;
                writeln!(writer)?;
            }
            (CommandOutput::Tables(set), OutputFormat::Csv) => {
                for table in &set.tables {
                    writeln!(writer, "# {}", table.name)?;
                    table.write_csv(&mut writer)?;
                }
            }
        }
        Ok(())
    }
}
