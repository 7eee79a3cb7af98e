use crate::utils::error::{CaseError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_one_of, validate_positive_number, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_SCHEMA: &str = "dbo";
const DEFAULT_COMMAND_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: Option<LoggingConfig>,
    pub exception_policies: Option<ExceptionPolicyConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub connection_string: String,
    pub schema: Option<String>,
    pub command_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub json: Option<bool>,
}

/// 每個例外政策的日誌等級 (error / warn / info)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExceptionPolicyConfig {
    pub web_exception: Option<String>,
    pub database_exception: Option<String>,
    pub audit_exception: Option<String>,
}

impl DatabaseConfig {
    pub fn new(connection_string: &str) -> Self {
        Self {
            connection_string: connection_string.to_string(),
            schema: None,
            command_timeout_seconds: None,
        }
    }

    pub fn schema(&self) -> &str {
        self.schema.as_deref().unwrap_or(DEFAULT_SCHEMA)
    }

    pub fn command_timeout_seconds(&self) -> u64 {
        self.command_timeout_seconds
            .unwrap_or(DEFAULT_COMMAND_TIMEOUT_SECONDS)
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CaseError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| CaseError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DB_PASSWORD})，找不到的變數保留原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::LazyLock;

        static ENV_VAR: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or("info")
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }

    pub fn exception_policies(&self) -> ExceptionPolicyConfig {
        self.exception_policies.clone().unwrap_or_default()
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("database.connection_string", &self.database.connection_string)?;

        if self.database.connection_string.contains("${") {
            return Err(CaseError::ConfigValidationError {
                field: "database.connection_string".to_string(),
                message: "unresolved environment variable in connection string".to_string(),
            });
        }

        validate_non_empty_string("database.schema", self.database.schema())?;
        validate_positive_number(
            "database.command_timeout_seconds",
            self.database.command_timeout_seconds(),
            1,
        )?;

        validate_one_of(
            "logging.level",
            self.log_level(),
            &["trace", "debug", "info", "warn", "error"],
        )?;

        Ok(())
    }
}
