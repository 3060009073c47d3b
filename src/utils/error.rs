// src/utils/error.rs
use thiserror::Error;

use crate::camera::ConnectionError;
use crate::core::recognition::RecognitionError;
use crate::notify::NotifyError;
use crate::storage::errors::{LoadError, StorageError};

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Recognition error: {0}")]
    Recognition(#[from] RecognitionError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("Logging setup error: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, NodeError>;
