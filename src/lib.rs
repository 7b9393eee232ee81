pub mod checks;
pub mod cli;
pub mod config;
pub mod error;
pub mod fs;
pub mod types;
pub mod util;

pub use checks::{CheckReport, CheckResult, Checker};
pub use config::CheckerConfig;
pub use error::{ProxsaveError, Result};
pub use types::{CancelToken, CheckCode, CheckName};
