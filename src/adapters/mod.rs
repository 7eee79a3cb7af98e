// Adapters layer: 對外部系統的具體實作 (SQL Server、日誌)

pub mod command;
pub mod exception_log;
pub mod sql_data_access;

#[cfg(feature = "mssql")]
pub mod mssql;

pub use exception_log::TracingExceptionHandler;
pub use sql_data_access::SqlDataAccess;

#[cfg(feature = "mssql")]
pub use mssql::TiberiusConnector;
