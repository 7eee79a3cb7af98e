use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaseError {
    #[error("Stored procedure {procedure} failed: {message}")]
    Database { procedure: String, message: String },

    #[error("Database connection failed: {message}")]
    Connection { message: String },

    #[error("Stored procedure {procedure} timed out after {seconds}s")]
    Timeout { procedure: String, seconds: u64 },

    #[error("Stored procedure {procedure} did not return output parameter {parameter}")]
    MissingOutput { procedure: String, parameter: String },

    #[error("Invalid stored procedure name: '{name}'")]
    InvalidProcedureName { name: String },

    #[error("Invalid parameter name: '{name}'")]
    InvalidParameterName { name: String },

    #[error("Validation failed for '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Access denied for user '{user_name}' (result code {result_code})")]
    AccessDenied {
        user_name: String,
        result_code: String,
    },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid configuration value for '{field}': '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[cfg(feature = "mssql")]
    #[error("SQL Server error: {0}")]
    Sql(#[from] tiberius::error::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ErrorCategory {
    Database,
    Input,
    Security,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CaseError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        CaseError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn database(procedure: &str, message: impl Into<String>) -> Self {
        CaseError::Database {
            procedure: procedure.to_string(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            CaseError::Database { .. }
            | CaseError::Connection { .. }
            | CaseError::Timeout { .. }
            | CaseError::MissingOutput { .. } => ErrorCategory::Database,
            #[cfg(feature = "mssql")]
            CaseError::Sql(_) => ErrorCategory::Database,
            CaseError::InvalidProcedureName { .. }
            | CaseError::InvalidParameterName { .. }
            | CaseError::Validation { .. } => ErrorCategory::Input,
            CaseError::AccessDenied { .. } => ErrorCategory::Security,
            CaseError::ConfigValidationError { .. }
            | CaseError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            CaseError::IoError(_) | CaseError::SerializationError(_) | CaseError::CsvError(_) => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input | ErrorCategory::Security => ErrorSeverity::Low,
            ErrorCategory::Database => match self {
                CaseError::Timeout { .. } => ErrorSeverity::Medium,
                CaseError::Connection { .. } => ErrorSeverity::Critical,
                _ => ErrorSeverity::High,
            },
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            CaseError::Connection { .. } => "Check the database connection string and that SQL Server is reachable",
            CaseError::Timeout { .. } => "Retry later or raise database.command_timeout_seconds",
            CaseError::Validation { .. } => "Correct the input value and submit again",
            CaseError::AccessDenied { .. } => "Verify the user name and password",
            CaseError::ConfigValidationError { .. }
            | CaseError::InvalidConfigValueError { .. } => "Fix the configuration file and try again",
            _ => "Contact the application administrator with the logged error details",
        }
    }
}

pub type Result<T> = std::result::Result<T, CaseError>;
