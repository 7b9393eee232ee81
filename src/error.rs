use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::types::{CheckCode, CheckName};

#[derive(Debug, Error)]
pub enum ProxsaveError {
    #[error("{0}")]
    Message(String),
    #[error("{0}")]
    Config(ConfigError),
    #[error("pre-backup check {name} failed: {message}")]
    Check {
        name: CheckName,
        code: CheckCode,
        message: String,
    },
    #[error("pre-backup checks cancelled")]
    Cancelled,
    #[error("{op} {path}: {source}", path = .path.display())]
    IoContext {
        op: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("parse config: {0}")]
    Parse(String),
    #[error("{0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ProxsaveError>;

impl ProxsaveError {
    pub fn message(msg: impl Into<String>) -> Self {
        ProxsaveError::Message(msg.into())
    }

    pub fn io_context(op: &str, path: &Path, err: io::Error) -> Self {
        ProxsaveError::IoContext {
            op: op.to_string(),
            path: path.to_path_buf(),
            source: err,
        }
    }
}

impl From<ConfigError> for ProxsaveError {
    fn from(err: ConfigError) -> Self {
        ProxsaveError::Config(err)
    }
}
