pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command, CommandOutput, OutputFormat};
pub use config::{AppConfig, DatabaseConfig};

#[cfg(feature = "mssql")]
pub use adapters::TiberiusConnector;
pub use adapters::{SqlDataAccess, TracingExceptionHandler};

pub use core::{CaseServices, ServiceContext};
pub use domain::ports::{DataAccess, ExceptionHandling, ExceptionPolicy};
pub use utils::error::{CaseError, Result};
