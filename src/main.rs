use anyhow::Context;
use caseflow::utils::error::{CaseError, ErrorSeverity};
use caseflow::utils::{logger, validation::Validate};
use caseflow::{
    AppConfig, CaseServices, CliConfig, SqlDataAccess, TiberiusConnector, TracingExceptionHandler,
};
use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 驗證配置
    let config = AppConfig::from_file(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config))?;
    if let Err(e) = cli.validate().and_then(|_| config.validate()) {
        eprintln!("❌ Configuration validation failed: {}", e);
        eprintln!("💡 建議: {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    // 初始化日誌
    if config.json_logs() {
        logger::init_json_logger(config.log_level());
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::info!(schema = config.database.schema(), "Starting caseflow CLI");

    let errors = Arc::new(TracingExceptionHandler::from_config(&config.exception_policies())?);
    let connector = Arc::new(TiberiusConnector::from_ado_string(&config.database.connection_string)?);
    let data = Arc::new(SqlDataAccess::new(connector, errors.clone(), &config.database));
    let services = CaseServices::new(data, errors);

    match cli.command.run(&services).await {
        Ok(output) => {
            output.write(cli.format, std::io::stdout().lock())?;
            tracing::debug!("✅ Command completed");
        }
        Err(e) => {
            tracing::error!(
                "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e);
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(exit_code(&e));
        }
    }

    Ok(())
}

// 根據錯誤嚴重程度決定退出碼
fn exit_code(error: &CaseError) -> i32 {
    match error.severity() {
        ErrorSeverity::Low => 4,      // 輸入被拒絕
        ErrorSeverity::Medium => 2,   // 可重試 (逾時)
        ErrorSeverity::High => 1,     // 程序執行失敗
        ErrorSeverity::Critical => 3, // 連線或系統錯誤
    }
}
